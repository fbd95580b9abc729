//! Fan-out/fan-in over independent lookups.

use std::future::Future;

use futures::future::try_join_all;

/// Run every named lookup concurrently and join the results.
///
/// Resolves with all `(name, value)` pairs once every lookup has succeeded,
/// or with the first error observed. On error the remaining lookups are
/// dropped, so no partial result is ever produced. With no lookups it
/// resolves immediately with an empty collection.
pub async fn gather<K, V, E, F, C>(lookups: impl IntoIterator<Item = (K, F)>) -> Result<C, E>
where
    F: Future<Output = Result<V, E>>,
    C: FromIterator<(K, V)>,
{
    let (names, pending): (Vec<K>, Vec<F>) = lookups.into_iter().unzip();
    let values = try_join_all(pending).await?;
    Ok(names.into_iter().zip(values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use futures::FutureExt;
    use futures::future::{BoxFuture, pending};
    use tokio::sync::oneshot;

    type Lookup = BoxFuture<'static, Result<u64, String>>;

    fn after(ms: u64, value: Result<u64, String>) -> Lookup {
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            value
        }
        .boxed()
    }

    #[tokio::test]
    async fn joins_every_value_regardless_of_completion_order() {
        let joined: BTreeMap<&str, u64> = gather(vec![
            ("slow", after(30, Ok(1))),
            ("fast", after(1, Ok(2))),
            ("medium", after(10, Ok(3))),
        ])
        .await
        .unwrap();

        assert_eq!(joined, BTreeMap::from([("slow", 1), ("fast", 2), ("medium", 3)]));
    }

    #[tokio::test]
    async fn first_failure_wins_and_nothing_partial_escapes() {
        let result: Result<BTreeMap<&str, u64>, String> = gather(vec![
            ("ok", after(1, Ok(1))),
            ("never", pending().boxed()),
            ("broken", after(5, Err("boom".to_string()))),
        ])
        .await;

        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn later_failures_are_ignored_after_the_first() {
        let result: Result<Vec<(&str, u64)>, String> = gather(vec![
            ("first", after(1, Err("first".to_string()))),
            ("second", after(20, Err("second".to_string()))),
        ])
        .await;

        assert_eq!(result, Err("first".to_string()));
    }

    #[tokio::test]
    async fn empty_fan_out_resolves_immediately() {
        let joined: BTreeMap<&str, u64> = gather(Vec::<(&str, Lookup)>::new()).await.unwrap();
        assert!(joined.is_empty());
    }

    #[tokio::test]
    async fn result_is_only_delivered_after_the_last_completion() {
        let (tx_a, rx_a) = oneshot::channel::<u64>();
        let (tx_b, rx_b) = oneshot::channel::<u64>();
        let lookup = |rx: oneshot::Receiver<u64>| -> Lookup {
            async move { rx.await.map_err(|e| e.to_string()) }.boxed()
        };

        let join = tokio::spawn(gather::<_, _, _, _, BTreeMap<&str, u64>>(vec![
            ("a", lookup(rx_a)),
            ("b", lookup(rx_b)),
        ]));

        tx_a.send(1).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!join.is_finished());

        tx_b.send(2).unwrap();
        let joined = join.await.unwrap().unwrap();
        assert_eq!(joined, BTreeMap::from([("a", 1), ("b", 2)]));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: when every lookup succeeds the join holds exactly
            /// the requested names with their values.
            #[test]
            fn all_successes_join_completely(values in prop::collection::btree_map("[a-z]{1,8}", any::<u64>(), 0..12)) {
                let lookups = values
                    .iter()
                    .map(|(name, value)| (name.clone(), futures::future::ready(Ok::<u64, String>(*value))));
                let joined: BTreeMap<String, u64> = futures::executor::block_on(gather(lookups)).unwrap();
                prop_assert_eq!(joined, values);
            }
        }
    }
}
