pub mod approval;
pub mod error;
pub mod event_log;
pub mod remediator;
pub mod swarm;
pub mod tools;
pub mod watchdog;
pub mod workflow;

pub use error::OpsError;
