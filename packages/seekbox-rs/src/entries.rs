use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::detection::{ActorId, DetectionEvent, EventReceiver};

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("unable to update entries: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Account storage that owns the per-actor detection entry count.
#[async_trait]
pub trait EntryCounter: Send + Sync {
    /// Atomically adds one and returns the new count.
    async fn increment(&self, actor: &ActorId) -> Result<u64, CounterError>;
}

/// What the listener did before its channel closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerReport {
    pub increments: usize,
    pub failures: usize,
    pub last_count: Option<u64>,
}

/// Consumes [`DetectionEvent`]s and bumps the entry counter once per event.
///
/// Failed increments are logged and never retried.
pub struct EntryCounterListener {
    counter: Arc<dyn EntryCounter>,
}

impl EntryCounterListener {
    pub fn new(counter: Arc<dyn EntryCounter>) -> Self {
        Self { counter }
    }

    /// Runs until every sender is dropped.
    pub async fn run(self, mut events: EventReceiver) -> ListenerReport {
        let mut report = ListenerReport::default();
        while let Some(event) = events.recv().await {
            match event {
                DetectionEvent::FacesDetected { actor, faces } => {
                    match self.counter.increment(&actor).await {
                        Ok(count) => {
                            info!(%actor, faces, entries = count, "entry count updated");
                            report.increments += 1;
                            report.last_count = Some(count);
                        }
                        Err(e) => {
                            error!(%actor, "failed to update entry count: {}", e);
                            report.failures += 1;
                        }
                    }
                }
            }
        }
        report
    }

    pub fn spawn(self, events: EventReceiver) -> JoinHandle<ListenerReport> {
        tokio::spawn(self.run(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::event_channel;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryCounter {
        counts: Mutex<HashMap<ActorId, u64>>,
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl EntryCounter for MemoryCounter {
        async fn increment(&self, actor: &ActorId) -> Result<u64, CounterError> {
            *self.calls.lock().await += 1;
            if self.fail {
                return Err(CounterError::Rejected("no such user".into()));
            }
            let mut counts = self.counts.lock().await;
            let entry = counts.entry(actor.clone()).or_insert(0);
            *entry += 1;
            Ok(*entry)
        }
    }

    #[tokio::test]
    async fn each_event_increments_once() {
        let counter = Arc::new(MemoryCounter::default());
        let (tx, rx) = event_channel();
        let handle = EntryCounterListener::new(counter.clone()).spawn(rx);

        for _ in 0..3 {
            tx.send(DetectionEvent::FacesDetected {
                actor: ActorId::from("7"),
                faces: 1,
            })
            .unwrap();
        }
        drop(tx);

        let report = handle.await.unwrap();
        assert_eq!(report.increments, 3);
        assert_eq!(report.last_count, Some(3));
        assert_eq!(*counter.calls.lock().await, 3);
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let counter = Arc::new(MemoryCounter {
            fail: true,
            ..Default::default()
        });
        let (tx, rx) = event_channel();
        tx.send(DetectionEvent::FacesDetected {
            actor: ActorId::from("7"),
            faces: 2,
        })
        .unwrap();
        drop(tx);

        let report = EntryCounterListener::new(counter.clone()).run(rx).await;
        assert_eq!(report.failures, 1);
        assert_eq!(report.increments, 0);
        assert_eq!(*counter.calls.lock().await, 1);
    }
}
