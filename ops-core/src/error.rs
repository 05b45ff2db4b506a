use thiserror::Error;
use ticket_registry::TicketError;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error("event log: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("event log io: {0}")]
    Io(#[from] std::io::Error),
    #[error("event encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("approval channel closed before a decision was received")]
    ApprovalChannelClosed,
    #[error("stage precondition failed: {0}")]
    Precondition(&'static str),
}
