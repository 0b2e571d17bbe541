//! Order-preserving bounded map of an async function over a sequence
//! (spec §4.1, §5).
//!
//! Grounded on the wider retrieved pack's use of `futures::StreamExt` over
//! async git/VCS operations (e.g. `other_examples/39f023a4_joliss-jj`);
//! the teacher crate calls `git2` synchronously and has no async
//! concurrency primitive of its own to generalise, so this module adopts
//! `tokio` + `futures` from the pack rather than from the teacher (see
//! DESIGN.md).
//!
//! Results are written back at the *original* index regardless of
//! completion order, and an individual future's error/panic is surfaced to
//! the caller in the same shape it would have had from a direct call — we
//! never collapse a per-item failure into a whole-batch failure.

use futures::stream::{self, StreamExt};

/// Maps `f` over `items` with at most `limit` operations in flight at
/// once. The output vector has the same length and order as `items`.
pub async fn bounded_map<T, F, Fut, R>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = R> + Send,
    R: Send + 'static,
{
    let limit = limit.max(1);
    let indexed = items.into_iter().enumerate();
    let mut results: Vec<(usize, R)> = stream::iter(indexed)
        .map(|(idx, item)| {
            let fut = f(item);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

/// Same as [`bounded_map`], but for operations that can fail; failures are
/// preserved per-index rather than aborting the whole batch.
pub async fn bounded_try_map<T, F, Fut, R, E>(
    items: Vec<T>,
    limit: usize,
    f: F,
) -> Vec<Result<R, E>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<R, E>> + Send,
    R: Send + 'static,
    E: Send + 'static,
{
    bounded_map(items, limit, f).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_order_regardless_of_completion_time() {
        let items: Vec<u32> = (0..20).collect();
        let results = bounded_map(items, 4, |n| async move {
            // Reverse-order sleeps so later items finish first.
            tokio::time::sleep(Duration::from_millis((20 - n) as u64)).await;
            n * 2
        })
        .await;
        let expected: Vec<u32> = (0..20).map(|n| n * 2).collect();
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn never_exceeds_the_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let items: Vec<u32> = (0..30).collect();

        let in_flight_c = in_flight.clone();
        let max_seen_c = max_seen.clone();
        let _ = bounded_map(items, 3, move |n| {
            let in_flight = in_flight_c.clone();
            let max_seen = max_seen_c.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                n
            }
        })
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results: Vec<u32> = bounded_map(Vec::new(), 5, |n: u32| async move { n }).await;
        assert!(results.is_empty());
    }
}
