use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of an incident ticket. Transitions are monotonic:
/// a ticket only ever moves toward `Resolved`, never backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Monitoring,
    Investigating,
    PendingApproval,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Monitoring => "MONITORING",
            IncidentStatus::Investigating => "INVESTIGATING",
            IncidentStatus::PendingApproval => "PENDING_APPROVAL",
            IncidentStatus::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named transition triggers between workflow stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    CriticalDetected,
    InvestigationComplete,
    Confirmed,
    Declined,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("invalid transition from {from} on {trigger:?}")]
    InvalidTransition {
        from: IncidentStatus,
        trigger: Trigger,
    },
    #[error("field '{0}' already recorded")]
    AlreadyRecorded(&'static str),
    #[error("resolution recorded before the ticket reached approval")]
    ResolutionBeforeApproval,
}

/// The status state machine, separate from the ticket so the table
/// can be checked exhaustively on its own.
pub fn next_status(from: IncidentStatus, trigger: Trigger) -> Result<IncidentStatus, TicketError> {
    use IncidentStatus::*;
    use Trigger::*;

    match (from, trigger) {
        (Monitoring, CriticalDetected) => Ok(Investigating),
        (Investigating, InvestigationComplete) => Ok(PendingApproval),
        (PendingApproval, Confirmed) => Ok(Resolved),
        // A declined fix leaves the ticket waiting. No retry or rollback
        // is modeled; an operator has to pick it up out of band.
        (PendingApproval, Declined) => Ok(PendingApproval),
        (from, trigger) => Err(TicketError::InvalidTransition { from, trigger }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbHealth {
    pub active_sessions: u32,
    pub max_pool_size: u32,
    pub wait_event: String,
    pub blocking_session_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraHealth {
    pub cpu_usage: String,
    pub memory_usage: String,
    pub disk_io: String,
}

/// The shared incident ticket. Single source of truth across the
/// watchdog, investigation, and remediation stages.
///
/// Fields are private: each stage writes its own outputs through the
/// `record_*` methods, which reject a second write. The ticket is never
/// deleted, only read back at the end of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncidentTicket {
    incident_id: String,
    status: IncidentStatus,
    alert_details: Option<String>,
    logs_summary: Option<String>,
    db_health: Option<DbHealth>,
    infra_health: Option<InfraHealth>,
    rca_report: Option<String>,
    proposed_fix: Option<String>,
    resolution_status: Option<String>,
}

impl IncidentTicket {
    /// Blank ticket for a new session: `Monitoring`, all findings unset.
    pub fn new() -> Self {
        Self {
            incident_id: uuid::Uuid::new_v4().to_string(),
            status: IncidentStatus::Monitoring,
            alert_details: None,
            logs_summary: None,
            db_health: None,
            infra_health: None,
            rca_report: None,
            proposed_fix: None,
            resolution_status: None,
        }
    }

    pub fn incident_id(&self) -> &str {
        &self.incident_id
    }

    pub fn status(&self) -> IncidentStatus {
        self.status
    }

    pub fn alert_details(&self) -> Option<&str> {
        self.alert_details.as_deref()
    }

    pub fn logs_summary(&self) -> Option<&str> {
        self.logs_summary.as_deref()
    }

    pub fn db_health(&self) -> Option<&DbHealth> {
        self.db_health.as_ref()
    }

    pub fn infra_health(&self) -> Option<&InfraHealth> {
        self.infra_health.as_ref()
    }

    pub fn rca_report(&self) -> Option<&str> {
        self.rca_report.as_deref()
    }

    pub fn proposed_fix(&self) -> Option<&str> {
        self.proposed_fix.as_deref()
    }

    pub fn resolution_status(&self) -> Option<&str> {
        self.resolution_status.as_deref()
    }

    /// Advance the status per the transition table.
    pub fn apply(&mut self, trigger: Trigger) -> Result<IncidentStatus, TicketError> {
        self.status = next_status(self.status, trigger)?;
        Ok(self.status)
    }

    pub fn record_alert(&mut self, details: String) -> Result<(), TicketError> {
        set_once(&mut self.alert_details, details, "alert_details")
    }

    pub fn record_logs(&mut self, summary: String) -> Result<(), TicketError> {
        set_once(&mut self.logs_summary, summary, "logs_summary")
    }

    pub fn record_db_health(&mut self, report: DbHealth) -> Result<(), TicketError> {
        set_once(&mut self.db_health, report, "db_health")
    }

    pub fn record_infra_health(&mut self, report: InfraHealth) -> Result<(), TicketError> {
        set_once(&mut self.infra_health, report, "infra_health")
    }

    pub fn record_rca(&mut self, report: String) -> Result<(), TicketError> {
        set_once(&mut self.rca_report, report, "rca_report")
    }

    pub fn record_proposed_fix(&mut self, fix: String) -> Result<(), TicketError> {
        set_once(&mut self.proposed_fix, fix, "proposed_fix")
    }

    /// Outcome of the executed fix. Only valid once the ticket has
    /// reached the approval stage.
    pub fn record_resolution(&mut self, outcome: String) -> Result<(), TicketError> {
        match self.status {
            IncidentStatus::PendingApproval | IncidentStatus::Resolved => {
                set_once(&mut self.resolution_status, outcome, "resolution_status")
            }
            _ => Err(TicketError::ResolutionBeforeApproval),
        }
    }
}

impl Default for IncidentTicket {
    fn default() -> Self {
        Self::new()
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), TicketError> {
    if slot.is_some() {
        return Err(TicketError::AlreadyRecorded(field));
    }
    *slot = Some(value);
    Ok(())
}
