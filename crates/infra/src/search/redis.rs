//! Redis-backed search index (feature `redis`).
//!
//! `{p}:search:word:{word}` holds the ids containing a word and
//! `{p}:search:job:{id}` the words indexed for a job, so removal does not
//! need a scan.

use redis::aio::MultiplexedConnection;
use tracing::instrument;

use jobdeck_core::JobId;

use super::{SearchError, SearchIndex, words};

fn backend(e: redis::RedisError) -> SearchError {
    SearchError::Backend(e.to_string())
}

#[derive(Clone)]
pub struct RedisSearchIndex {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisSearchIndex {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn word_key(&self, word: &str) -> String {
        format!("{}:search:word:{}", self.prefix, word)
    }

    fn job_key(&self, id: JobId) -> String {
        format!("{}:search:job:{}", self.prefix, id)
    }

    /// Index `text` under `id`.
    pub async fn index(&self, id: JobId, text: &str) -> Result<(), SearchError> {
        let terms = words(text);
        if terms.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for term in &terms {
            pipe.cmd("SADD").arg(self.word_key(term)).arg(id.get()).ignore();
        }
        pipe.cmd("SADD").arg(self.job_key(id)).arg(&terms).ignore();

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(backend)
    }

    /// Drop every entry for `id`.
    pub async fn remove(&self, id: JobId) -> Result<(), SearchError> {
        let mut conn = self.conn.clone();
        let terms: Vec<String> = redis::cmd("SMEMBERS")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for term in &terms {
            pipe.cmd("SREM").arg(self.word_key(term)).arg(id.get()).ignore();
        }
        pipe.cmd("DEL").arg(self.job_key(id)).ignore();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(backend)
    }
}

#[async_trait::async_trait]
impl SearchIndex for RedisSearchIndex {
    #[instrument(skip(self), err)]
    async fn query(&self, text: &str) -> Result<Vec<JobId>, SearchError> {
        let terms = words(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = terms.iter().map(|t| self.word_key(t)).collect();
        let mut conn = self.conn.clone();
        let mut ids: Vec<u64> = redis::cmd("SINTER")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        ids.sort_unstable();

        Ok(ids.into_iter().map(JobId::new).collect())
    }
}
