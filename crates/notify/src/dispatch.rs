//! Sequential alert fan-out over configured channels.
//!
//! One alert stream, one channel set: every composed alert goes to
//! every channel. Individual channel failures don't block the rest,
//! and each delivery is reported back as a [`DispatchResult`].

use crate::traits::{DispatchResult, Notification, Notifier};

/// Deliver one alert to every channel in order.
///
/// Returns a result per channel. A failed delivery is logged and
/// recorded; it never short-circuits the remaining channels.
pub async fn dispatch_all(
    channels: &[Box<dyn Notifier>],
    notification: &Notification,
) -> Vec<DispatchResult> {
    let entity_id = notification
        .metadata
        .get("entity_id")
        .cloned()
        .unwrap_or_default();

    if channels.is_empty() {
        tracing::debug!(entity_id, "no alert channels configured");
        return Vec::new();
    }

    let mut results = Vec::with_capacity(channels.len());

    for channel in channels {
        let start = std::time::Instant::now();
        let result = channel.send(notification).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, error) = match result {
            Ok(()) => {
                tracing::info!(
                    entity_id,
                    channel = channel.channel_name(),
                    duration_ms,
                    "alert delivered"
                );
                (true, None)
            }
            Err(e) => {
                tracing::warn!(
                    entity_id,
                    channel = channel.channel_name(),
                    error = %e,
                    duration_ms,
                    "alert delivery failed"
                );
                (false, Some(e.to_string()))
            }
        };

        results.push(DispatchResult {
            channel: channel.channel_name().to_string(),
            entity_id: entity_id.clone(),
            success,
            error,
            duration_ms,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NotifyError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockNotifier {
        name: String,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    fn notification() -> Notification {
        Notification {
            subject: "test".to_string(),
            body: "test body".to_string(),
            metadata: HashMap::from([("entity_id".to_string(), "aa:bb:cc".to_string())]),
        }
    }

    #[tokio::test]
    async fn dispatch_to_all_channels() {
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));

        let channels: Vec<Box<dyn Notifier>> = vec![
            Box::new(MockNotifier {
                name: "a".to_string(),
                send_count: count_a.clone(),
                should_fail: false,
            }),
            Box::new(MockNotifier {
                name: "b".to_string(),
                send_count: count_b.clone(),
                should_fail: false,
            }),
        ];

        let results = dispatch_all(&channels, &notification()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert!(results.iter().all(|r| r.entity_id == "aa:bb:cc"));
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let count = Arc::new(AtomicUsize::new(0));

        let channels: Vec<Box<dyn Notifier>> = vec![
            Box::new(MockNotifier {
                name: "fail".to_string(),
                send_count: Arc::new(AtomicUsize::new(0)),
                should_fail: true,
            }),
            Box::new(MockNotifier {
                name: "ok".to_string(),
                send_count: count.clone(),
                should_fail: false,
            }),
        ];

        let results = dispatch_all(&channels, &notification()).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.is_some());
        assert!(results[1].success);
        assert_eq!(count.load(Ordering::SeqCst), 1); // second channel still sent
    }

    #[tokio::test]
    async fn empty_channel_set_returns_empty() {
        let channels: Vec<Box<dyn Notifier>> = Vec::new();
        let results = dispatch_all(&channels, &notification()).await;
        assert!(results.is_empty());
    }
}
