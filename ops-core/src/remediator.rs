//! Tier 3: root-cause synthesis and the gated restart.

use crate::approval::{self, ApprovalSender};
use crate::error::OpsError;
use crate::event_log::{Event, EventLog, EventType};
use crate::tools::{self, ToolLatency};
use ticket_registry::{DbHealth, IncidentTicket, InfraHealth, Trigger};

/// The service the recovery action targets. The simulated scenario is
/// always pool exhaustion behind the mobile gateway.
pub const TARGET_SERVICE: &str = "mobile-gateway";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemediationOutcome {
    Resolved,
    /// The operator declined. The restart did not run and the ticket
    /// stays parked at pending approval.
    Declined,
}

pub async fn remediate(
    ticket: &mut IncidentTicket,
    approvals: &ApprovalSender,
    latency: &ToolLatency,
    log: &EventLog,
) -> Result<RemediationOutcome, OpsError> {
    let (logs, db, infra) = match (ticket.logs_summary(), ticket.db_health(), ticket.infra_health())
    {
        (Some(logs), Some(db), Some(infra)) => (logs.to_owned(), db.clone(), infra.clone()),
        _ => {
            return Err(OpsError::Precondition(
                "remediation requires completed diagnostics",
            ))
        }
    };

    let rca = compose_rca(&logs, &db, &infra);
    ticket.record_rca(rca.clone())?;

    let fix = format!("restart {TARGET_SERVICE} to flush the exhausted connection pool");
    ticket.record_proposed_fix(fix.clone())?;
    ticket.apply(Trigger::InvestigationComplete)?;

    log.append(&Event::record(
        ticket.incident_id(),
        EventType::ApprovalRequested,
        format!("proposed fix awaiting approval: {fix}"),
        Some(serde_json::json!({ "rca_report": rca, "service": TARGET_SERVICE })),
    ))?;

    let confirmed = approval::request_approval(approvals, ticket.incident_id(), &fix).await?;
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::ApprovalResponded,
        format!("operator {}", if confirmed { "confirmed" } else { "declined" }),
        Some(serde_json::json!({ "confirmed": confirmed })),
    ))?;

    if !confirmed {
        ticket.apply(Trigger::Declined)?;
        tracing::warn!(
            incident_id = ticket.incident_id(),
            "restart declined, ticket left pending approval"
        );
        return Ok(RemediationOutcome::Declined);
    }

    let message = tools::restart_service(TARGET_SERVICE, latency).await;
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::ActionExecuted,
        message,
        Some(serde_json::json!({ "service": TARGET_SERVICE })),
    ))?;

    ticket.record_resolution("SUCCESS".into())?;
    ticket.apply(Trigger::Confirmed)?;
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::Resolved,
        "incident resolved".into(),
        None,
    ))?;
    tracing::info!(incident_id = ticket.incident_id(), "incident resolved");

    Ok(RemediationOutcome::Resolved)
}

fn compose_rca(logs: &str, db: &DbHealth, infra: &InfraHealth) -> String {
    format!(
        "Root cause: connection pool exhaustion on the core banking database \
         ({active}/{max} active sessions, wait event '{wait}', blocked by {blocker}). \
         Application logs confirm refused connections:\n{logs}\n\
         Infrastructure is ruled out (CPU {cpu}, memory {mem}, disk I/O {disk}).",
        active = db.active_sessions,
        max = db.max_pool_size,
        wait = db.wait_event,
        blocker = db.blocking_session_id,
        logs = logs,
        cpu = infra.cpu_usage,
        mem = infra.memory_usage,
        disk = infra.disk_io,
    )
}
