//! Messaging side-channel: delivers the per-cycle summary after a fixed
//! delay, off the cycle thread.
//!
//! Delivery failure must never affect the simulation: every error ends in a
//! `warn!` and nothing else. Pending sends are cancelled when the scheduler
//! is torn down, so no background action outlives its session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub trait Notifier: Send + Sync {
    fn send(&self, summary: &str) -> Result<()>;
}

/// Fallback channel: writes the summary to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, summary: &str) -> Result<()> {
        info!(summary = %summary, "Cycle notification");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    sent_at: DateTime<Utc>,
}

/// Posts the summary as JSON to a configured HTTP endpoint.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build notification client")?;
        Ok(Self { url, client })
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, summary: &str) -> Result<()> {
        let payload = WebhookPayload {
            text: summary,
            sent_at: Utc::now(),
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .with_context(|| format!("Failed to reach {}", self.url))?
            .error_for_status()
            .context("Notification endpoint rejected the summary")?;
        Ok(())
    }
}

/// Defers each summary by a fixed delay on the runtime, keeping the
/// handles so teardown can cancel whatever has not fired yet.
pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    delay: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn Notifier>, delay: Duration) -> Self {
        Self {
            notifier,
            delay,
            handles: Vec::new(),
        }
    }

    /// Fire-and-forget: returns immediately, the send happens after the
    /// delay on a background task. The blocking HTTP call runs on the
    /// blocking pool, never on the cycle thread.
    pub fn schedule(&mut self, summary: String) {
        let notifier = Arc::clone(&self.notifier);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::task::spawn_blocking(move || notifier.send(&summary)).await {
                Ok(Ok(())) => debug!("Cycle notification delivered"),
                Ok(Err(e)) => warn!(error = %e, "Notification send failed"),
                Err(e) => warn!(error = %e, "Notification task aborted"),
            }
        });

        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Waits for every pending send. Used on orderly shutdown so the last
    /// cycle's summary still goes out.
    pub async fn drain(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// Cancels everything still pending.
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        sent: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn send(&self, _summary: &str) -> Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, _summary: &str) -> Result<()> {
            anyhow::bail!("channel down")
        }
    }

    #[tokio::test]
    async fn delivers_after_the_delay() {
        let notifier = Arc::new(CountingNotifier {
            sent: AtomicUsize::new(0),
        });
        let mut scheduler =
            NotificationScheduler::new(notifier.clone(), Duration::from_millis(5));

        scheduler.schedule("ciclo 1".to_string());
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 0, "must not block");

        scheduler.drain().await;
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_swallowed_and_later_sends_continue() {
        let mut scheduler = NotificationScheduler::new(
            Arc::new(FailingNotifier),
            Duration::from_millis(1),
        );

        scheduler.schedule("ciclo 1".to_string());
        scheduler.drain().await;

        // The channel being down must not poison the scheduler.
        scheduler.schedule("ciclo 2".to_string());
        scheduler.drain().await;
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_sends() {
        let notifier = Arc::new(CountingNotifier {
            sent: AtomicUsize::new(0),
        });
        let mut scheduler =
            NotificationScheduler::new(notifier.clone(), Duration::from_secs(3600));

        scheduler.schedule("ciclo 1".to_string());
        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
    }
}
