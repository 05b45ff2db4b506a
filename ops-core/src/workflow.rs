//! Sequential composition of the three tiers over one shared ticket:
//! watchdog, then the diagnostic swarm, then the gated remediation.

use crate::approval::ApprovalSender;
use crate::error::OpsError;
use crate::event_log::{Event, EventLog, EventType};
use crate::remediator;
use crate::swarm;
use crate::tools::ToolLatency;
use crate::watchdog::{self, WatchdogConfig, WatchdogOutcome};
use ticket_registry::IncidentTicket;

#[derive(Clone, Debug, Default)]
pub struct WorkflowConfig {
    pub watchdog: WatchdogConfig,
    pub latency: ToolLatency,
}

/// Run one incident session end to end and return the final ticket.
///
/// If the watchdog exhausts its polling budget the later stages never
/// run and the ticket comes back still monitoring.
pub async fn run_incident(
    config: &WorkflowConfig,
    approvals: &ApprovalSender,
    log: &EventLog,
) -> Result<IncidentTicket, OpsError> {
    let mut ticket = IncidentTicket::new();
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::TicketOpened,
        "ticket opened, monitoring".into(),
        None,
    ))?;
    tracing::info!(incident_id = ticket.incident_id(), "session started");

    match watchdog::run(&mut ticket, &config.watchdog, log).await? {
        WatchdogOutcome::Exhausted => return Ok(ticket),
        WatchdogOutcome::Escalated => {}
    }

    swarm::investigate(&mut ticket, &config.latency, log).await?;
    remediator::remediate(&mut ticket, approvals, &config.latency, log).await?;

    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{approval_channel, ApprovalSender};
    use std::time::Duration;
    use ticket_registry::IncidentStatus;

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/opsshield-tests/{name}-{nanos}.db")
    }

    fn answer_with(decision: bool) -> ApprovalSender {
        let (tx, mut rx) = approval_channel(1);
        tokio::spawn(async move {
            if let Some(req) = rx.recv().await {
                let _ = req.reply.send(decision);
            }
        });
        tx
    }

    fn failure_config() -> WorkflowConfig {
        WorkflowConfig {
            watchdog: WatchdogConfig {
                simulate_failure: true,
                ..WatchdogConfig::default()
            },
            latency: ToolLatency::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn approved_session_runs_all_three_tiers() {
        let log = EventLog::open(&db_path("workflow-approved")).expect("open");
        let approvals = answer_with(true);

        let ticket = run_incident(&failure_config(), &approvals, &log)
            .await
            .expect("run");

        assert_eq!(ticket.status(), IncidentStatus::Resolved);
        assert!(ticket.alert_details().is_some());
        assert!(ticket.logs_summary().is_some());
        assert!(ticket.db_health().is_some());
        assert!(ticket.infra_health().is_some());
        assert!(ticket.rca_report().is_some());
        assert_eq!(ticket.resolution_status(), Some("SUCCESS"));
        assert!(log.unresolved_incidents().expect("unresolved").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn declined_session_parks_at_pending_approval() {
        let log = EventLog::open(&db_path("workflow-declined")).expect("open");
        let approvals = answer_with(false);

        let ticket = run_incident(&failure_config(), &approvals, &log)
            .await
            .expect("run");

        assert_eq!(ticket.status(), IncidentStatus::PendingApproval);
        assert!(ticket.resolution_status().is_none());
        assert_eq!(
            log.unresolved_incidents().expect("unresolved"),
            vec![ticket.incident_id().to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_session_never_escalates() {
        let log = EventLog::open(&db_path("workflow-healthy")).expect("open");
        let (approvals, mut approvals_rx) = approval_channel(1);
        let config = WorkflowConfig {
            watchdog: WatchdogConfig {
                max_iterations: 3,
                poll_interval: Duration::from_secs(3),
                simulate_failure: false,
            },
            latency: ToolLatency::default(),
        };

        let ticket = run_incident(&config, &approvals, &log).await.expect("run");

        assert_eq!(ticket.status(), IncidentStatus::Monitoring);
        assert!(ticket.logs_summary().is_none());
        drop(approvals);
        assert!(approvals_rx.recv().await.is_none(), "no approval requested");
    }
}
