use crate::error::OpsError;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EventType {
    TicketOpened,
    HealthChecked,
    Escalated,
    DiagnosticRecorded,
    ApprovalRequested,
    ApprovalResponded,
    ActionExecuted,
    Resolved,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<i64>,
    pub incident_id: String,
    pub event_type: EventType,
    pub description: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl Event {
    pub fn record(
        incident_id: &str,
        event_type: EventType,
        description: String,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: None,
            incident_id: incident_id.to_string(),
            event_type,
            description,
            details,
            timestamp: now_string(),
        }
    }
}

/// Append-only audit trail of the incident lifecycle.
#[derive(Clone)]
pub struct EventLog {
    db_path: Arc<PathBuf>,
}

impl EventLog {
    pub fn open(path: &str) -> Result<Self, OpsError> {
        let db_path = PathBuf::from(path);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                incident_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                description TEXT NOT NULL,
                details TEXT,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_incident ON events(incident_id);
            CREATE INDEX IF NOT EXISTS idx_events_ts ON events(timestamp);
            ",
        )?;

        Ok(Self {
            db_path: Arc::new(db_path),
        })
    }

    pub fn append(&self, event: &Event) -> Result<i64, OpsError> {
        let conn = Connection::open(&*self.db_path)?;
        let event_type = serde_json::to_string(&event.event_type)?;
        let details = event
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO events (incident_id, event_type, description, details, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.incident_id,
                event_type,
                event.description,
                details,
                event.timestamp,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn events_for_incident(&self, incident_id: &str) -> Result<Vec<Event>, OpsError> {
        let conn = Connection::open(&*self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, incident_id, event_type, description, details, timestamp
             FROM events
             WHERE incident_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![incident_id], map_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Incidents that never reached a `Resolved` event. Covers both
    /// in-flight tickets and tickets parked after a declined fix.
    pub fn unresolved_incidents(&self) -> Result<Vec<String>, OpsError> {
        let conn = Connection::open(&*self.db_path)?;
        let mut all = BTreeSet::new();
        let mut resolved = BTreeSet::new();

        let mut stmt = conn.prepare("SELECT DISTINCT incident_id FROM events")?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for id in ids {
            all.insert(id?);
        }

        let mut stmt = conn.prepare(
            "SELECT DISTINCT incident_id FROM events
             WHERE event_type = ?1",
        )?;
        let resolved_type = serde_json::to_string(&EventType::Resolved)?;
        let resolved_ids = stmt.query_map(params![resolved_type], |row| row.get::<_, String>(0))?;
        for id in resolved_ids {
            resolved.insert(id?);
        }

        Ok(all.difference(&resolved).cloned().collect())
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let event_type_str: String = row.get(2)?;
    let details_str: Option<String> = row.get(4)?;

    let event_type: EventType = serde_json::from_str(&event_type_str).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
    })?;

    let details = details_str
        .map(|s| {
            serde_json::from_str(&s).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(err),
                )
            })
        })
        .transpose()?;

    Ok(Event {
        id: row.get(0)?,
        incident_id: row.get(1)?,
        event_type,
        description: row.get(3)?,
        details,
        timestamp: row.get(5)?,
    })
}

pub fn now_string() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return "0".into();
    };
    duration.as_secs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/opsshield-tests/{name}-{nanos}.db")
    }

    #[test]
    fn append_and_query_roundtrip() {
        let log = EventLog::open(&db_path("roundtrip")).expect("open");
        let id = log
            .append(&Event::record(
                "inc-a",
                EventType::HealthChecked,
                "tick 1".into(),
                Some(serde_json::json!({"verdict": "Healthy"})),
            ))
            .expect("append");

        assert!(id > 0);

        let events = log.events_for_incident("inc-a").expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].incident_id, "inc-a");
        assert!(matches!(events[0].event_type, EventType::HealthChecked));
        assert_eq!(
            events[0].details,
            Some(serde_json::json!({"verdict": "Healthy"}))
        );
    }

    #[test]
    fn unresolved_excludes_resolved_incidents() {
        let log = EventLog::open(&db_path("unresolved")).expect("open");
        for event in [
            Event::record("inc-1", EventType::Escalated, "escalated".into(), None),
            Event::record("inc-1", EventType::Resolved, "resolved".into(), None),
            Event::record("inc-2", EventType::ApprovalResponded, "declined".into(), None),
        ] {
            log.append(&event).expect("append");
        }

        let unresolved = log.unresolved_incidents().expect("unresolved");
        assert_eq!(unresolved, vec!["inc-2".to_string()]);
    }
}
