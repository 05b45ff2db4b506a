//! Tier 1: bounded health-polling loop.

use crate::error::OpsError;
use crate::event_log::{Event, EventLog, EventType};
use crate::tools::{self, HealthVerdict};
use std::time::Duration;
use ticket_registry::{IncidentTicket, Trigger};
use tokio::time::sleep;

#[derive(Clone, Debug)]
pub struct WatchdogConfig {
    pub max_iterations: u32,
    pub poll_interval: Duration,
    pub simulate_failure: bool,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            poll_interval: Duration::from_secs(3),
            simulate_failure: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// A CRITICAL verdict escalated the ticket to investigation.
    Escalated,
    /// The polling budget ran out with the system still healthy.
    Exhausted,
}

/// Poll the health check until it turns critical or the iteration
/// budget runs out. On escalation the loop stops immediately, with no
/// trailing delay.
pub async fn run(
    ticket: &mut IncidentTicket,
    config: &WatchdogConfig,
    log: &EventLog,
) -> Result<WatchdogOutcome, OpsError> {
    for tick in 1..=config.max_iterations {
        let check = tools::check_banking_infrastructure(config.simulate_failure);
        log.append(&Event::record(
            ticket.incident_id(),
            EventType::HealthChecked,
            format!("health check tick {tick}: {:?}", check.verdict),
            serde_json::to_value(&check).ok(),
        ))?;

        match check.verdict {
            HealthVerdict::Critical => {
                let details = check
                    .alert_details
                    .unwrap_or_else(|| "critical condition detected".into());
                ticket.record_alert(details.clone())?;
                ticket.apply(Trigger::CriticalDetected)?;
                tracing::warn!(
                    incident_id = ticket.incident_id(),
                    alert = %details,
                    "critical failure detected, escalating to investigation"
                );
                log.append(&Event::record(
                    ticket.incident_id(),
                    EventType::Escalated,
                    "critical detected, watchdog loop terminated".into(),
                    Some(serde_json::json!({ "alert_details": details })),
                ))?;
                return Ok(WatchdogOutcome::Escalated);
            }
            HealthVerdict::Healthy => {
                tracing::info!(tick, "system healthy");
                if tick < config.max_iterations {
                    sleep(config.poll_interval).await;
                }
            }
        }
    }

    tracing::info!(
        max_iterations = config.max_iterations,
        "watchdog budget exhausted without a critical verdict"
    );
    Ok(WatchdogOutcome::Exhausted)
}
