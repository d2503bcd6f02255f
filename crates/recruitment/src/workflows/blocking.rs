use tokio::task::{self, JoinError};

/// Runs synchronous store and file storage work on tokio's blocking pool so
/// request handlers never hold a runtime worker while SQLite or the disk is busy.
pub async fn run_blocking<T, E, F>(work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    task::spawn_blocking(work).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug)]
    enum WorkError {
        Join(JoinError),
    }

    impl From<JoinError> for WorkError {
        fn from(err: JoinError) -> Self {
            WorkError::Join(err)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn blocking_work_leaves_the_runtime_free() {
        let (release, gate) = mpsc::channel::<u32>();
        let pending = tokio::spawn(run_blocking(move || {
            let value = gate
                .recv_timeout(Duration::from_secs(5))
                .expect("released by the runtime thread");
            Ok::<_, WorkError>(value + 1)
        }));

        // The only runtime thread still schedules this task while the work waits.
        tokio::task::yield_now().await;
        release.send(41).expect("worker is waiting");

        let value = pending
            .await
            .expect("task joins")
            .expect("work succeeds");
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn panicking_work_surfaces_as_an_error() {
        let outcome = run_blocking(|| -> Result<(), WorkError> { panic!("store exploded") }).await;
        match outcome {
            Err(WorkError::Join(err)) => assert!(err.is_panic()),
            other => panic!("expected a join error, got {other:?}"),
        }
    }
}
