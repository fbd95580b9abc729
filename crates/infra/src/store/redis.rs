//! Redis-backed job store (feature `redis`).
//!
//! Uses the engine's key layout so the facade can sit in front of an existing
//! queue:
//!
//! - `{p}:ids`: id counter
//! - `{p}:job:{id}`: job hash
//! - `{p}:job:{id}:log`: log list
//! - `{p}:jobs`: every job, scored by id
//! - `{p}:jobs:{state}`, `{p}:jobs:{type}:{state}`: scored by priority
//! - `{p}:job:types`: set of seen types
//! - `{p}:stats:work-time`: accumulated processing time
//!
//! Set members are length-prefixed ids (`02|42`) so equal scores sort in
//! creation order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use jobdeck_core::{Attempts, Backoff, Job, JobDraft, JobId, JobState, Priority};

use super::{JobStore, StoreError, counters, is_descending};
use crate::search::{RedisSearchIndex, indexable_text};

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn corrupt(id: JobId, field: &str) -> StoreError {
    StoreError::Serialization(format!("job {id}: bad or missing field {field:?}"))
}

/// Length-prefixed set member for `id`.
fn zid(id: JobId) -> String {
    let digits = id.to_string();
    format!("{:02}|{}", digits.len(), digits)
}

fn parse_zid(member: &str) -> Option<JobId> {
    member.split_once('|')?.1.parse().ok()
}

#[derive(Clone)]
pub struct RedisJobStore {
    conn: MultiplexedConnection,
    prefix: String,
    search: Option<RedisSearchIndex>,
}

impl RedisJobStore {
    /// Open a multiplexed connection and build a store plus its search index
    /// on top of it.
    pub async fn connect(redis_url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(backend)?;
        let conn = client.get_multiplexed_async_connection().await.map_err(backend)?;
        let prefix = prefix.into();
        let search = RedisSearchIndex::new(conn.clone(), prefix.clone());

        Ok(Self {
            conn,
            prefix,
            search: Some(search),
        })
    }

    /// Handle to the search index sharing this store's connection.
    pub fn search_index(&self) -> Option<RedisSearchIndex> {
        self.search.clone()
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.prefix, suffix)
    }

    fn job_key(&self, id: JobId) -> String {
        self.key(&format!("job:{id}"))
    }

    fn log_key(&self, id: JobId) -> String {
        self.key(&format!("job:{id}:log"))
    }

    fn state_key(&self, state: JobState) -> String {
        self.key(&format!("jobs:{state}"))
    }

    fn type_state_key(&self, job_type: &str, state: JobState) -> String {
        self.key(&format!("jobs:{job_type}:{state}"))
    }

    fn to_fields(job: &Job) -> Result<Vec<(&'static str, String)>, StoreError> {
        let mut fields = vec![
            ("type", job.job_type.clone()),
            ("data", to_json(&job.data)?),
            ("state", job.state.to_string()),
            ("priority", job.priority.level().to_string()),
            ("attempts", job.attempts.made.to_string()),
            ("max_attempts", job.attempts.max.to_string()),
            ("removeOnComplete", job.remove_on_complete.to_string()),
            ("searchKeys", to_json(&job.search_keys)?),
            ("created_at", job.created_at.timestamp_millis().to_string()),
            ("updated_at", job.updated_at.timestamp_millis().to_string()),
        ];
        if let Some(delay) = job.delay {
            fields.push(("delay", delay.to_string()));
        }
        if let Some(ttl) = job.ttl {
            fields.push(("ttl", ttl.to_string()));
        }
        if let Some(backoff) = &job.backoff {
            fields.push(("backoff", to_json(backoff)?));
        }
        Ok(fields)
    }

    fn from_fields(id: JobId, map: &HashMap<String, String>) -> Result<Job, StoreError> {
        let raw = |name: &str| map.get(name).ok_or_else(|| corrupt(id, name));
        let num = |name: &str| -> Result<i64, StoreError> {
            raw(name)?.parse::<i64>().map_err(|_| corrupt(id, name))
        };
        let opt_u64 = |name: &str| -> Result<Option<u64>, StoreError> {
            map.get(name)
                .map(|v| v.parse::<u64>().map_err(|_| corrupt(id, name)))
                .transpose()
        };
        let time = |name: &str| -> Result<DateTime<Utc>, StoreError> {
            DateTime::from_timestamp_millis(num(name)?).ok_or_else(|| corrupt(id, name))
        };

        let backoff: Option<Backoff> = map
            .get("backoff")
            .map(|v| serde_json::from_str(v).map_err(|_| corrupt(id, "backoff")))
            .transpose()?;
        let search_keys: Vec<String> = match map.get("searchKeys") {
            Some(v) => serde_json::from_str(v).map_err(|_| corrupt(id, "searchKeys"))?,
            None => Vec::new(),
        };

        Ok(Job {
            id,
            job_type: raw("type")?.clone(),
            data: serde_json::from_str(raw("data")?).map_err(|_| corrupt(id, "data"))?,
            state: raw("state")?.parse().map_err(|_| corrupt(id, "state"))?,
            priority: Priority::new(num("priority")?),
            attempts: Attempts {
                made: u32::try_from(num("attempts")?).map_err(|_| corrupt(id, "attempts"))?,
                max: u32::try_from(num("max_attempts")?).map_err(|_| corrupt(id, "max_attempts"))?,
            },
            delay: opt_u64("delay")?,
            backoff,
            ttl: opt_u64("ttl")?,
            remove_on_complete: map.get("removeOnComplete").is_some_and(|v| v == "true"),
            search_keys,
            created_at: time("created_at")?,
            updated_at: time("updated_at")?,
        })
    }

    /// Write the job hash and move its set memberships from `previous` to its
    /// current state, atomically.
    async fn write(&self, job: &Job, previous: Option<JobState>) -> Result<(), StoreError> {
        let member = zid(job.id);
        let priority = job.priority.level();

        let mut hset = redis::cmd("HSET");
        hset.arg(self.job_key(job.id));
        for (field, value) in Self::to_fields(job)? {
            hset.arg(field).arg(value);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        if let Some(previous) = previous {
            pipe.cmd("ZREM").arg(self.state_key(previous)).arg(&member).ignore();
            pipe.cmd("ZREM")
                .arg(self.type_state_key(&job.job_type, previous))
                .arg(&member)
                .ignore();
        }
        pipe.add_command(hset).ignore();
        pipe.cmd("ZADD")
            .arg(self.key("jobs"))
            .arg(job.id.get())
            .arg(&member)
            .ignore();
        pipe.cmd("ZADD")
            .arg(self.state_key(job.state))
            .arg(priority)
            .arg(&member)
            .ignore();
        pipe.cmd("ZADD")
            .arg(self.type_state_key(&job.job_type, job.state))
            .arg(priority)
            .arg(&member)
            .ignore();

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(backend)
    }

    async fn range_ids(
        &self,
        key: String,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<JobId>, StoreError> {
        let command = if is_descending(order) { "ZREVRANGE" } else { "ZRANGE" };
        let mut conn = self.conn.clone();
        let members: Vec<String> = redis::cmd(command)
            .arg(&key)
            .arg(from)
            .arg(to)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(members.iter().filter_map(|m| parse_zid(m)).collect())
    }

    /// Load several jobs in one round trip, skipping ids removed meanwhile.
    async fn load_many(&self, ids: Vec<JobId>) -> Result<Vec<Job>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.cmd("HGETALL").arg(self.job_key(*id));
        }
        let mut conn = self.conn.clone();
        let maps: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await.map_err(backend)?;

        ids.into_iter()
            .zip(maps)
            .filter(|(_, map)| !map.is_empty())
            .map(|(id, map)| Self::from_fields(id, &map))
            .collect()
    }
}

#[async_trait::async_trait]
impl JobStore for RedisJobStore {
    #[instrument(skip(self, draft), fields(job_type = %draft.job_type), err)]
    async fn create(&self, draft: JobDraft) -> Result<Job, StoreError> {
        let mut conn = self.conn.clone();
        let id: u64 = redis::cmd("INCR")
            .arg(self.key("ids"))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        let job = draft.into_job(JobId::new(id), Utc::now());

        redis::cmd("SADD")
            .arg(self.key("job:types"))
            .arg(&job.job_type)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)?;
        self.write(&job, None).await?;

        if let Some(search) = &self.search {
            if !job.search_keys.is_empty() {
                search
                    .index(job.id, &indexable_text(&job.data, &job.search_keys))
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }

        Ok(job)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: JobId) -> Result<Job, StoreError> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        if map.is_empty() {
            return Err(StoreError::NotFound(id));
        }
        Self::from_fields(id, &map)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id), err)]
    async fn save(&self, job: &Job) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let previous: Option<String> = redis::cmd("HGET")
            .arg(self.job_key(job.id))
            .arg("state")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        let previous: JobState = previous
            .ok_or(StoreError::NotFound(job.id))?
            .parse()
            .map_err(|_| corrupt(job.id, "state"))?;

        self.write(job, Some(previous)).await
    }

    #[instrument(skip(self), err)]
    async fn remove(&self, id: JobId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let (job_type, state): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(self.job_key(id))
            .arg("type")
            .arg("state")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        let (Some(job_type), Some(state)) = (job_type, state) else {
            return Err(StoreError::NotFound(id));
        };
        let state: JobState = state.parse().map_err(|_| corrupt(id, "state"))?;
        let member = zid(id);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZREM").arg(self.key("jobs")).arg(&member).ignore()
            .cmd("ZREM").arg(self.state_key(state)).arg(&member).ignore()
            .cmd("ZREM").arg(self.type_state_key(&job_type, state)).arg(&member).ignore()
            .cmd("DEL").arg(self.job_key(id)).ignore()
            .cmd("DEL").arg(self.log_key(id)).ignore();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(backend)?;

        if let Some(search) = &self.search {
            search
                .remove(id)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn range(&self, from: i64, to: i64, order: Option<&str>) -> Result<Vec<Job>, StoreError> {
        let ids = self.range_ids(self.key("jobs"), from, to, order).await?;
        self.load_many(ids).await
    }

    async fn range_by_state(
        &self,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        let ids = self.range_ids(self.state_key(state), from, to, order).await?;
        self.load_many(ids).await
    }

    async fn range_by_type(
        &self,
        job_type: &str,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        let ids = self
            .range_ids(self.type_state_key(job_type, state), from, to, order)
            .await?;
        self.load_many(ids).await
    }

    async fn card_by_type(&self, job_type: &str, state: JobState) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("ZCARD")
            .arg(self.type_state_key(job_type, state))
            .query_async(&mut conn)
            .await
            .map_err(backend)
    }

    async fn types(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut types: Vec<String> = redis::cmd("SMEMBERS")
            .arg(self.key("job:types"))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        types.sort();
        Ok(types)
    }

    async fn counter(&self, name: &str) -> Result<u64, StoreError> {
        let state = match name {
            counters::INACTIVE_COUNT => JobState::Inactive,
            counters::COMPLETE_COUNT => JobState::Complete,
            counters::ACTIVE_COUNT => JobState::Active,
            counters::FAILED_COUNT => JobState::Failed,
            counters::DELAYED_COUNT => JobState::Delayed,
            counters::WORK_TIME => {
                let mut conn = self.conn.clone();
                let total: Option<u64> = redis::cmd("GET")
                    .arg(self.key("stats:work-time"))
                    .query_async(&mut conn)
                    .await
                    .map_err(backend)?;
                return Ok(total.unwrap_or(0));
            }
            other => return Err(StoreError::Backend(format!("unknown counter: {other}"))),
        };

        let mut conn = self.conn.clone();
        redis::cmd("ZCARD")
            .arg(self.state_key(state))
            .query_async(&mut conn)
            .await
            .map_err(backend)
    }

    async fn log(&self, id: JobId) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        if !exists {
            return Err(StoreError::NotFound(id));
        }

        redis::cmd("LRANGE")
            .arg(self.log_key(id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zid_is_length_prefixed() {
        assert_eq!(zid(JobId::new(7)), "01|7");
        assert_eq!(zid(JobId::new(1234)), "04|1234");
        assert_eq!(parse_zid("04|1234"), Some(JobId::new(1234)));
        assert_eq!(parse_zid("garbage"), None);
    }

    #[test]
    fn hash_fields_round_trip() {
        let job = JobDraft::new("email", json!({"to": "tj"}))
            .priority(Priority::HIGH)
            .attempts(3)
            .delay(500)
            .backoff(Backoff::Enabled(true))
            .search_keys(vec!["to".to_string()])
            .into_job(JobId::new(9), Utc::now());

        let map: HashMap<String, String> = RedisJobStore::to_fields(&job)
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let back = RedisJobStore::from_fields(job.id, &map).unwrap();

        assert_eq!(back.job_type, "email");
        assert_eq!(back.priority, Priority::HIGH);
        assert_eq!(back.attempts.max, 3);
        assert_eq!(back.state, JobState::Delayed);
        assert_eq!(back.backoff, Some(Backoff::Enabled(true)));
        assert_eq!(back.search_keys, vec!["to".to_string()]);
        assert_eq!(back.created_at.timestamp_millis(), job.created_at.timestamp_millis());
    }

    #[test]
    fn missing_fields_are_serialization_errors() {
        let map = HashMap::from([("type".to_string(), "email".to_string())]);
        assert!(matches!(
            RedisJobStore::from_fields(JobId::new(1), &map),
            Err(StoreError::Serialization(_))
        ));
    }
}
