//! Run-scoped alert budget and dispatch pacing.
//!
//! The budget is the one piece of mutable state shared across entity
//! evaluations in a run. `try_consume` is a single atomic
//! compare-and-increment, so concurrent evaluations cannot overshoot
//! the ceiling. The pacing seam keeps the fixed inter-alert cooldown
//! out of the wall clock in tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Outcome of asking the budget for a dispatch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Granted,
    Suppressed,
}

/// Per-run alert counter with a fixed ceiling.
///
/// Created fresh at the start of each run; a consumed slot is never
/// refunded, even when the dispatch itself fails.
#[derive(Debug)]
pub struct AlertBudget {
    max: u32,
    sent: AtomicU32,
}

impl AlertBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            sent: AtomicU32::new(0),
        }
    }

    /// Claim a dispatch slot. Exactly `max` callers ever get
    /// `Granted`, regardless of interleaving.
    pub fn try_consume(&self) -> Grant {
        let claimed = self
            .sent
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |sent| {
                if sent >= self.max {
                    None
                } else {
                    Some(sent + 1)
                }
            });
        match claimed {
            Ok(_) => Grant::Granted,
            Err(_) => Grant::Suppressed,
        }
    }

    pub fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn exhausted(&self) -> bool {
        self.sent_count() >= self.max
    }
}

/// Pacing seam for the inter-alert cooldown.
#[async_trait::async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Production pacer backed by the tokio timer.
pub struct TokioPacer;

#[async_trait::async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
