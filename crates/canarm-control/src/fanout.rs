//! Per-joint fan-out

use std::future::Future;

use canarm_core::{ControlError, ControlResult};
use tokio::task::JoinSet;

/// Run `op` for every item concurrently and wait for all of them
///
/// Returns the first error to complete. Siblings are neither cancelled nor
/// rolled back when one fails.
pub async fn fan_out<T, F, Fut>(items: impl IntoIterator<Item = T>, op: F) -> ControlResult<()>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ControlResult<()>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for item in items {
        tasks.spawn(op(item));
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined
            .map_err(|e| ControlError::Transport(format!("dispatch task failed: {}", e)))
            .and_then(|r| r);
        if let Err(e) = result {
            tracing::debug!(error = %e, "Fan-out task failed");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_all_tasks_run() {
        let count = Arc::new(AtomicUsize::new(0));
        let result = fan_out(0..7, |_| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() {
        let count = Arc::new(AtomicUsize::new(0));
        let result = fan_out(0..5u8, |i| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                if i == 2 {
                    Err(ControlError::Transport("motor 2".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert_eq!(result, Err(ControlError::Transport("motor 2".into())));
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(fan_out(Vec::<u8>::new(), |_| async { Ok(()) }).await.is_ok());
    }
}
