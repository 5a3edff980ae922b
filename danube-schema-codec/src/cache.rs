use dashmap::DashMap;
use std::future::Future;
use tracing::trace;

/// Subject to schema id mapping owned by one serializer.
///
/// Entries are only ever added. Callers racing on the same unresolved subject
/// may each run their resolver; the first id stored wins and every caller
/// returns it. Failed resolutions leave no entry behind.
#[derive(Debug, Default)]
pub struct SubjectCache {
    ids: DashMap<String, u32>,
}

impl SubjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &str) -> Option<u32> {
        self.ids.get(subject).map(|id| *id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Return the cached id for `subject`, or run `resolve` once and cache its result.
    pub async fn get_or_resolve<F, Fut, E>(&self, subject: &str, resolve: F) -> Result<u32, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u32, E>>,
    {
        if let Some(id) = self.get(subject) {
            trace!(subject = %subject, schema_id = %id, "schema id cache hit");
            return Ok(id);
        }

        // no map guard may be held across this await
        let resolved = resolve().await?;

        let id = *self.ids.entry(subject.to_string()).or_insert(resolved);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_resolver_runs_once_per_subject() {
        let cache = SubjectCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let id = cache
                .get_or_resolve("orders-value", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(5)
                })
                .await
                .unwrap();
            assert_eq!(id, 5);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_resolution_is_not_cached() {
        let cache = SubjectCache::new();

        let err = cache
            .get_or_resolve("orders-value", || async { Err::<u32, _>("unavailable") })
            .await;
        assert_eq!(err, Err("unavailable"));
        assert!(cache.is_empty());

        let id = cache
            .get_or_resolve("orders-value", || async { Ok::<_, &str>(11) })
            .await
            .unwrap();
        assert_eq!(id, 11);
        assert_eq!(cache.get("orders-value"), Some(11));
    }

    #[tokio::test]
    async fn test_racing_resolvers_converge_on_one_id() {
        let cache = SubjectCache::new();

        let first = cache.get_or_resolve("orders-value", || async {
            tokio::task::yield_now().await;
            Ok::<_, String>(1)
        });
        let second = cache.get_or_resolve("orders-value", || async {
            tokio::task::yield_now().await;
            Ok::<_, String>(2)
        });

        let (a, b) = tokio::join!(first, second);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a, b);
        assert_eq!(cache.get("orders-value"), Some(a));
        assert_eq!(cache.len(), 1);
    }
}
