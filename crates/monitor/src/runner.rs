//! The per-entity orchestration loop.
//!
//! One call to [`Monitor::run_cycle`] is one poll cycle: for every
//! monitored user, fetch the enrichment group and walk each record
//! through normalize → evaluate → budget → compose → dispatch; then
//! the same for individually watched devices. Failures are isolated
//! per entity: a bad record, a dead fetch, or a bounced email never
//! aborts the rest of the run, and every skip or suppression leaves
//! a log line behind.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use vipwatch_notify::{dispatch_all, Notifier};
use vipwatch_telemetry::TelemetrySource;

use crate::budget::{AlertBudget, Grant, Pacer, TokioPacer};
use crate::composer::Composer;
use crate::evaluator::evaluate;
use crate::peers;
use crate::policy::ThresholdPolicy;
use crate::snapshot::{self, HealthSnapshot, NormalizeError};

/// Terminal state of one entity's pass through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    /// Alert composed and handed to at least one channel.
    Dispatched,
    /// Budget slot consumed, but every delivery failed.
    DispatchFailed,
    /// Violation found, but the per-run budget was exhausted.
    AlertSuppressed,
    /// Every check passed.
    NotAlerting,
    /// Fetch or normalization failed; entity skipped.
    Skipped,
}

/// Per-run counters, reported once per poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub entities: usize,
    pub dispatched: usize,
    pub dispatch_failures: usize,
    pub suppressed: usize,
    pub not_alerting: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: EntityOutcome) {
        match outcome {
            EntityOutcome::Dispatched => self.dispatched += 1,
            EntityOutcome::DispatchFailed => self.dispatch_failures += 1,
            EntityOutcome::AlertSuppressed => self.suppressed += 1,
            EntityOutcome::NotAlerting => self.not_alerting += 1,
            EntityOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Drives poll cycles over the watchlist.
pub struct Monitor {
    source: Arc<dyn TelemetrySource>,
    channels: Vec<Box<dyn Notifier>>,
    composer: Composer,
    policy: ThresholdPolicy,
    pacer: Box<dyn Pacer>,
    dry_run: bool,
}

impl Monitor {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        channels: Vec<Box<dyn Notifier>>,
        composer: Composer,
        policy: ThresholdPolicy,
    ) -> Self {
        Self {
            source,
            channels,
            composer,
            policy,
            pacer: Box::new(TokioPacer),
            dry_run: false,
        }
    }

    /// Replace the pacing implementation (tests inject a recorder).
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Compose alerts but never dispatch them.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run one poll cycle over the watchlist.
    pub async fn run_cycle(&self, users: &[String], devices: &[String]) -> RunSummary {
        let budget = AlertBudget::new(self.policy.max_alerts_per_run);
        let mut summary = RunSummary::default();

        for user_id in users {
            let records = match self.source.fetch_user_enrichment(user_id).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "telemetry fetch failed, skipping user");
                    summary.entities += 1;
                    summary.record(EntityOutcome::Skipped);
                    continue;
                }
            };

            if records.is_empty() {
                debug!(user_id = %user_id, "enrichment group is empty");
            }

            for record in &records {
                summary.entities += 1;
                let outcome = self
                    .process(snapshot::from_user_record(record), &records, &budget)
                    .await;
                summary.record(outcome);
            }
        }

        for mac in devices {
            summary.entities += 1;
            let outcome = match self.source.fetch_device_detail(mac).await {
                Ok(detail) => {
                    self.process(snapshot::from_device_record(&detail), &[], &budget)
                        .await
                }
                Err(e) => {
                    warn!(mac = %mac, error = %e, "telemetry fetch failed, skipping device");
                    EntityOutcome::Skipped
                }
            };
            summary.record(outcome);
        }

        summary
    }

    /// Walk one normalized record through evaluate → budget →
    /// compose → dispatch.
    async fn process(
        &self,
        normalized: Result<HealthSnapshot, NormalizeError>,
        siblings: &[Value],
        budget: &AlertBudget,
    ) -> EntityOutcome {
        let snapshot = match normalized {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "record failed normalization, skipping entity");
                return EntityOutcome::Skipped;
            }
        };

        let evaluation = evaluate(&snapshot, &self.policy);
        if !evaluation.alert {
            debug!(entity_id = %snapshot.entity_id, "no violation");
            return EntityOutcome::NotAlerting;
        }

        info!(
            entity_id = %snapshot.entity_id,
            user_id = %snapshot.user_id,
            reasons = ?evaluation.reasons,
            "threshold violation detected"
        );

        match budget.try_consume() {
            Grant::Suppressed => {
                warn!(
                    entity_id = %snapshot.entity_id,
                    sent = budget.sent_count(),
                    "alert suppressed: per-run budget exhausted"
                );
                EntityOutcome::AlertSuppressed
            }
            Grant::Granted => self.dispatch(&snapshot, &evaluation.reasons, siblings).await,
        }
    }

    async fn dispatch(
        &self,
        snapshot: &HealthSnapshot,
        reasons: &[String],
        siblings: &[Value],
    ) -> EntityOutcome {
        let peer_block = peers::render(&peers::collect(siblings));

        let notification = match self.composer.compose(snapshot, reasons, &peer_block) {
            Ok(notification) => notification,
            Err(e) => {
                // The budget slot stays consumed.
                warn!(entity_id = %snapshot.entity_id, error = %e, "alert composition failed");
                return EntityOutcome::DispatchFailed;
            }
        };

        if self.dry_run {
            info!(
                entity_id = %snapshot.entity_id,
                subject = %notification.subject,
                "dry run: alert composed but not dispatched"
            );
            return EntityOutcome::Dispatched;
        }

        let results = dispatch_all(&self.channels, &notification).await;
        let delivered = results.iter().filter(|r| r.success).count();

        self.pacer.pause(self.policy.inter_alert_delay).await;

        if delivered == 0 && !results.is_empty() {
            EntityOutcome::DispatchFailed
        } else {
            EntityOutcome::Dispatched
        }
    }
}
