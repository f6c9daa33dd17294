//! One fetch, evaluate, notify cycle

use crate::{MonitorConfig, MonitorError};
use alerting::{Decision, DropDetector, DropEvaluation};
use notifier::{DeliveryReport, LinePushNotifier, Notifier};
use sensor_client::{CurrentClient, HistoryClient, PressureSample, ReadingSource};
use storage::{CooldownStore, FileCooldownStore};
use tracing::{info, warn};

/// What a cycle decided and did
#[derive(Debug)]
pub struct CycleOutcome {
    pub current: Option<PressureSample>,
    pub past: Option<PressureSample>,
    pub evaluation: Option<DropEvaluation>,
    pub decision: Decision,
    /// One report per attempted recipient; empty unless the decision was `Notify`
    pub deliveries: Vec<DeliveryReport>,
}

/// Fetch a sample, mapping every failure to absence
pub async fn fetch_or_absent<R: ReadingSource + ?Sized>(source: &R) -> Option<PressureSample> {
    match source.fetch().await {
        Ok(Some(sample)) => {
            info!(
                "{} reading: {:.2} hPa at {}",
                source.name(),
                sample.pressure_hpa,
                sample.timestamp
            );
            Some(sample)
        }
        Ok(None) => {
            warn!("{} reading unavailable: no sample", source.name());
            None
        }
        Err(e) => {
            warn!("{} reading unavailable: {}", source.name(), e);
            None
        }
    }
}

/// Pressure drop monitor
pub struct Monitor<C, H, S, N> {
    current: C,
    history: H,
    detector: DropDetector<S>,
    notifier: N,
    recipients: Vec<String>,
}

impl Monitor<CurrentClient, HistoryClient, FileCooldownStore, LinePushNotifier> {
    /// Build the production wiring from configuration
    pub fn from_config(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let timeout = config.http_timeout();
        let current = CurrentClient::new(&config.bme680_url, timeout)?;
        let history = HistoryClient::new(config.history_config(), timeout)?;
        let store = FileCooldownStore::new(config.last_notify_file.clone());
        let detector = DropDetector::new(config.detector_config(), store);
        let notifier = LinePushNotifier::new(config.line_config())?;
        Ok(Self::new(current, history, detector, notifier, config.recipients()))
    }
}

impl<C, H, S, N> Monitor<C, H, S, N>
where
    C: ReadingSource,
    H: ReadingSource,
    S: CooldownStore,
    N: Notifier,
{
    pub fn new(
        current: C,
        history: H,
        detector: DropDetector<S>,
        notifier: N,
        recipients: Vec<String>,
    ) -> Self {
        if recipients.is_empty() {
            warn!("No notification recipients configured");
        }
        Self {
            current,
            history,
            detector,
            notifier,
            recipients,
        }
    }

    pub fn detector(&self) -> &DropDetector<S> {
        &self.detector
    }

    /// Run one cycle. Never fails: every fetch or delivery problem is logged
    /// and folded into the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let (current, past) = tokio::join!(
            fetch_or_absent(&self.current),
            fetch_or_absent(&self.history)
        );

        let (evaluation, decision) = self.detector.judge(current, past);

        let deliveries = match (&decision, current) {
            (Decision::Notify(message), Some(sample)) => {
                // Record first so a failed or interrupted send cannot cause a resend storm.
                self.detector.record_notification(sample.timestamp);
                let reports = self.notifier.send(message, &self.recipients).await;
                let delivered = reports.iter().filter(|r| r.is_delivered()).count();
                info!("Notification delivered to {}/{} recipients", delivered, reports.len());
                reports
            }
            (Decision::Suppressed(reason), _) => {
                info!("Notification suppressed: {}", reason);
                Vec::new()
            }
            _ => Vec::new(),
        };

        CycleOutcome {
            current,
            past,
            evaluation,
            decision,
            deliveries,
        }
    }
}
