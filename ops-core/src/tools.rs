//! Simulated operational tools. Every tool succeeds deterministically or
//! within fixed random ranges; latencies are sleeps sized by `ToolLatency`.

use crate::event_log::now_string;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use ticket_registry::{DbHealth, InfraHealth};
use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthVerdict {
    Healthy,
    Critical,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub verdict: HealthVerdict,
    pub metrics: BTreeMap<String, String>,
    pub timestamp: String,
    pub alert_details: Option<String>,
}

/// Simulated latency per tool call.
#[derive(Clone, Copy, Debug)]
pub struct ToolLatency {
    pub log_fetch: Duration,
    pub db_query: Duration,
    pub infra_probe: Duration,
    pub restart_phase: Duration,
}

impl Default for ToolLatency {
    fn default() -> Self {
        Self {
            log_fetch: Duration::from_secs(1),
            db_query: Duration::from_secs(2),
            infra_probe: Duration::from_secs(1),
            restart_phase: Duration::from_secs(2),
        }
    }
}

impl ToolLatency {
    pub fn zero() -> Self {
        Self {
            log_fetch: Duration::ZERO,
            db_query: Duration::ZERO,
            infra_probe: Duration::ZERO,
            restart_phase: Duration::ZERO,
        }
    }
}

/// Health check over the critical banking components (mobile API, ATM
/// switch, core DB). Synchronous: always returns a verdict.
///
/// `simulate_failure` forces the connection-pool-exhaustion scenario.
pub fn check_banking_infrastructure(simulate_failure: bool) -> HealthCheck {
    let mut metrics = BTreeMap::new();

    if simulate_failure {
        metrics.insert("mobile_api_latency".into(), "2500ms".into());
        metrics.insert("atm_switch_status".into(), "UP".into());
        metrics.insert("core_db_connections".into(), "98/100".into());
        metrics.insert("error_rate".into(), "15%".into());
        HealthCheck {
            verdict: HealthVerdict::Critical,
            metrics,
            timestamp: now_string(),
            alert_details: Some(
                "CRITICAL ALERT: Mobile Banking API high latency. \
                 DB connection pool at 98% capacity."
                    .into(),
            ),
        }
    } else {
        let mut rng = rand::rng();
        metrics.insert(
            "mobile_api_latency".into(),
            format!("{}ms", rng.random_range(20..=150)),
        );
        metrics.insert("atm_switch_status".into(), "UP".into());
        metrics.insert(
            "core_db_connections".into(),
            format!("{}/100", rng.random_range(10..=40)),
        );
        metrics.insert("error_rate".into(), "0.01%".into());
        HealthCheck {
            verdict: HealthVerdict::Healthy,
            metrics,
            timestamp: now_string(),
            alert_details: None,
        }
    }
}

const RAW_LOGS: [&str; 5] = [
    "[2025-11-28 16:30:01] INFO: Health Check OK",
    "[2025-11-28 16:30:02] INFO: Transaction 9982 processed",
    "[2025-11-28 16:30:05] ERROR: ConnectionRefusedError: Oracle DB 10.0.0.5:1521",
    "[2025-11-28 16:30:05] CRITICAL: Connection Pool Exhausted (Max: 100)",
    "[2025-11-28 16:30:06] INFO: Retrying connection...",
];

/// Noise-reduction filter: keep only ERROR/CRITICAL lines, in order.
pub fn compact_logs<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    lines
        .into_iter()
        .filter(|line| line.contains("ERROR") || line.contains("CRITICAL"))
        .collect()
}

pub async fn fetch_application_logs(latency: &ToolLatency) -> String {
    tracing::debug!("fetching and compacting application logs");
    sleep(latency.log_fetch).await;
    compact_logs(RAW_LOGS).join("\n")
}

pub async fn check_db_locks(latency: &ToolLatency) -> DbHealth {
    tracing::debug!("querying core banking DB performance views");
    sleep(latency.db_query).await;
    DbHealth {
        active_sessions: 102,
        max_pool_size: 100,
        wait_event: "enq: TX - row lock contention".into(),
        blocking_session_id: "SID_998".into(),
    }
}

pub async fn check_server_health(latency: &ToolLatency) -> InfraHealth {
    tracing::debug!("probing gateway server metrics");
    sleep(latency.infra_probe).await;
    InfraHealth {
        cpu_usage: "12%".into(),
        memory_usage: "45%".into(),
        disk_io: "NORMAL".into(),
    }
}

/// Two-phase restart: stop, then start. The confirmation gate is the
/// caller's responsibility; this function only simulates the action.
pub async fn restart_service(service_name: &str, latency: &ToolLatency) -> String {
    tracing::info!(service = service_name, "stopping service");
    sleep(latency.restart_phase).await;
    tracing::info!(service = service_name, "starting service");
    sleep(latency.restart_phase).await;
    tracing::info!(service = service_name, "service back online");
    format!("{service_name} restarted successfully. Connection pool flushed.")
}
