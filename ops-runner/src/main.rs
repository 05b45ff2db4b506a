use ops_core::approval::{self, ApprovalReceiver};
use ops_core::event_log::EventLog;
use ops_core::tools::ToolLatency;
use ops_core::watchdog::WatchdogConfig;
use ops_core::workflow::{self, WorkflowConfig};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_path = std::env::var("OPSSHIELD_DB").unwrap_or_else(|_| "incidents.db".into());
    let log = EventLog::open(&db_path).expect("open event log");
    let config = build_config_from_env();
    tracing::info!(db = %db_path, "event log ready");

    let (approval_tx, approval_rx) = approval::approval_channel(8);
    tokio::spawn(answer_from_stdin(approval_rx));

    println!("OpsShield incident workflow starting.");
    println!("Scenario: a failure will be triggered; approve the fix when asked.");
    println!("{}", "-".repeat(50));

    match workflow::run_incident(&config, &approval_tx, &log).await {
        Ok(ticket) => {
            println!("{}", "-".repeat(50));
            println!("FINAL STATUS: {}", ticket.status());
        }
        Err(err) => {
            eprintln!("workflow failed: {err}");
            std::process::exit(1);
        }
    }
}

/// Answer confirmation requests from an interactive yes/no prompt.
/// Anything other than "yes"/"y" (EOF included) counts as a decline.
async fn answer_from_stdin(mut requests: ApprovalReceiver) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(request) = requests.recv().await {
        println!();
        println!("GUARDRAIL: a critical action needs authorization.");
        println!("  incident: {}", request.incident_id);
        println!("  action:   {}", request.action);
        println!("  authorize? (yes/no)");

        let confirmed = match lines.next_line().await {
            Ok(Some(line)) => matches!(line.trim().to_lowercase().as_str(), "yes" | "y"),
            _ => false,
        };
        let _ = request.reply.send(confirmed);
    }
}

fn build_config_from_env() -> WorkflowConfig {
    WorkflowConfig {
        watchdog: WatchdogConfig {
            max_iterations: env_or("OPSSHIELD_MAX_POLLS", 20),
            poll_interval: Duration::from_secs(env_or("OPSSHIELD_POLL_INTERVAL_SECS", 3)),
            // The demo scenario triggers the failure immediately.
            simulate_failure: env_or("OPSSHIELD_SIMULATE_FAILURE", true),
        },
        latency: ToolLatency::default(),
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
