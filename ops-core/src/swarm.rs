//! Tier 2: parallel diagnostic fan-out.
//!
//! The three checks are independent and joined as a group. Each task is
//! pure with respect to its own result; the ticket fields are written
//! after the join barrier, so no locking is needed.

use crate::error::OpsError;
use crate::event_log::{Event, EventLog, EventType};
use crate::tools::{self, ToolLatency};
use ticket_registry::{IncidentStatus, IncidentTicket};

pub async fn investigate(
    ticket: &mut IncidentTicket,
    latency: &ToolLatency,
    log: &EventLog,
) -> Result<(), OpsError> {
    if ticket.status() != IncidentStatus::Investigating {
        return Err(OpsError::Precondition(
            "investigation requires an escalated ticket",
        ));
    }

    tracing::info!(
        incident_id = ticket.incident_id(),
        "dispatching diagnostic swarm"
    );

    let (logs_summary, db_health, infra_health) = tokio::join!(
        tools::fetch_application_logs(latency),
        tools::check_db_locks(latency),
        tools::check_server_health(latency),
    );

    log.append(&Event::record(
        ticket.incident_id(),
        EventType::DiagnosticRecorded,
        "log analysis complete".into(),
        Some(serde_json::json!({ "logs_summary": logs_summary })),
    ))?;
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::DiagnosticRecorded,
        "database lock inspection complete".into(),
        serde_json::to_value(&db_health).ok(),
    ))?;
    log.append(&Event::record(
        ticket.incident_id(),
        EventType::DiagnosticRecorded,
        "infrastructure probe complete".into(),
        serde_json::to_value(&infra_health).ok(),
    ))?;

    ticket.record_logs(logs_summary)?;
    ticket.record_db_health(db_health)?;
    ticket.record_infra_health(infra_health)?;

    Ok(())
}
