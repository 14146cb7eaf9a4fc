//! Fire-and-forget recording of direct URL visits
//!
//! Resolution hands each visited URL to a [`VisitSink`] and returns
//! immediately. [`VisitRecorder`] queues visits on a bounded channel and a
//! background task applies them to the [`VisitFrequencyStore`]. Visits are
//! dropped when the queue is full; nothing is retried and callers get no
//! completion signal.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::Result;

pub const DEFAULT_VISIT_QUEUE_CAPACITY: usize = 256;

/// Counts how often each URL was navigated to directly.
pub trait VisitFrequencyStore: Send + Sync {
    fn increment_occurrence(&self, url: &str) -> Result<()>;
}

/// Non-blocking receiver of visited URLs.
pub trait VisitSink: Send + Sync {
    /// Must return without waiting on storage.
    fn submit(&self, url: String);
}

#[derive(Clone)]
pub struct VisitRecorder {
    tx: mpsc::Sender<String>,
}

impl VisitRecorder {
    /// Start the background worker on `runtime`.
    ///
    /// The worker exits once every clone of the returned recorder has been
    /// dropped and the queue is drained.
    pub fn spawn(
        store: Arc<dyn VisitFrequencyStore>,
        runtime: &Handle,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

        let worker = runtime.spawn(async move {
            while let Some(url) = rx.recv().await {
                let store = Arc::clone(&store);
                let outcome = tokio::task::spawn_blocking(move || {
                    let result = store.increment_occurrence(&url);
                    (url, result)
                })
                .await;

                match outcome {
                    Ok((_, Ok(()))) => {}
                    Ok((url, Err(e))) => {
                        tracing::warn!(url = %url, error = %e, "Failed to record visit");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Visit recording task failed");
                    }
                }
            }

            tracing::debug!("Visit recorder stopped");
        });

        (Self { tx }, worker)
    }
}

impl VisitSink for VisitRecorder {
    fn submit(&self, url: String) {
        match self.tx.try_send(url) {
            Ok(()) => {}
            Err(TrySendError::Full(url)) => {
                tracing::warn!(url = %url, "Visit queue full, dropping visit");
            }
            Err(TrySendError::Closed(url)) => {
                tracing::debug!(url = %url, "Visit recorder stopped, dropping visit");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NavigationError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingStore {
        urls: Mutex<Vec<String>>,
    }

    impl VisitFrequencyStore for CountingStore {
        fn increment_occurrence(&self, url: &str) -> Result<()> {
            self.urls.lock().push(url.to_string());
            Ok(())
        }
    }

    struct FailingStore;

    impl VisitFrequencyStore for FailingStore {
        fn increment_occurrence(&self, url: &str) -> Result<()> {
            Err(NavigationError::MalformedUrl(url.to_string()))
        }
    }

    #[tokio::test]
    async fn test_records_in_background() {
        let store = Arc::new(CountingStore::default());
        let (recorder, worker) =
            VisitRecorder::spawn(store.clone(), &Handle::current(), 8);

        recorder.submit("example.com".to_string());
        recorder.submit("https://rust-lang.org".to_string());
        drop(recorder);
        worker.await.unwrap();

        assert_eq!(
            *store.urls.lock(),
            vec!["example.com".to_string(), "https://rust-lang.org".to_string()]
        );
    }

    #[tokio::test]
    async fn test_drops_when_queue_full() {
        let store = Arc::new(CountingStore::default());
        let (recorder, worker) =
            VisitRecorder::spawn(store.clone(), &Handle::current(), 1);

        // The current-thread runtime does not poll the worker until we
        // yield, so only the first visit fits in the queue.
        recorder.submit("a.com".to_string());
        recorder.submit("b.com".to_string());
        recorder.submit("c.com".to_string());
        drop(recorder);
        worker.await.unwrap();

        assert_eq!(*store.urls.lock(), vec!["a.com".to_string()]);
    }

    #[tokio::test]
    async fn test_store_failures_do_not_stop_worker() {
        let (recorder, worker) =
            VisitRecorder::spawn(Arc::new(FailingStore), &Handle::current(), 4);

        recorder.submit("a.com".to_string());
        recorder.submit("b.com".to_string());
        drop(recorder);
        worker.await.unwrap();
    }

    #[test]
    fn test_submit_after_shutdown_is_silent() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(CountingStore::default());
        let (recorder, worker) = VisitRecorder::spawn(store.clone(), runtime.handle(), 4);

        worker.abort();
        let _ = runtime.block_on(worker);

        recorder.submit("late.com".to_string());
        assert!(store.urls.lock().is_empty());
    }
}
