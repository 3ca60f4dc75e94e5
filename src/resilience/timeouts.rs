//! Timeout enforcement.
//!
//! The handler runs as its own task and its join handle races a deadline.
//! When the deadline wins the task is detached, not aborted: it may keep
//! running, and whatever it eventually returns is dropped. Handlers that
//! need to stop early poll the request's `CancellationSignal`.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

/// Result of a supervised invocation.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Handler finished within budget.
    Completed(T),
    /// Budget elapsed first; the handler was left running.
    TimedOut,
    /// Handler panicked. Carries the panic message for logging.
    Panicked(String),
}

/// Run `work` with at most `budget` of wall-clock wait.
pub async fn supervise<F, T>(work: F, budget: Duration) -> Outcome<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::spawn(work);

    match tokio::time::timeout(budget, &mut task).await {
        Ok(Ok(value)) => Outcome::Completed(value),
        Ok(Err(err)) => Outcome::Panicked(join_error_message(err)),
        // Dropping the handle detaches the task.
        Err(_) => Outcome::TimedOut,
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "handler task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_completes_within_budget() {
        let outcome = supervise(async { 7 }, Duration::from_secs(1)).await;
        assert!(matches!(outcome, Outcome::Completed(7)));
    }

    #[tokio::test]
    async fn test_times_out_without_waiting_for_handler() {
        let start = Instant::now();
        let outcome = supervise(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "ok"
            },
            Duration::from_millis(100),
        )
        .await;

        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_abandoned_handler_keeps_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let outcome = supervise(
            async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_millis(20),
        )
        .await;
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let outcome: Outcome<()> = supervise(async { panic!("model weights missing") }, Duration::from_secs(1)).await;
        match outcome {
            Outcome::Panicked(msg) => assert_eq!(msg, "model weights missing"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let outcome: Outcome<()> =
            supervise(async { panic!("shard {} unavailable", 3) }, Duration::from_secs(1)).await;
        assert!(matches!(outcome, Outcome::Panicked(ref msg) if msg == "shard 3 unavailable"));
    }
}
