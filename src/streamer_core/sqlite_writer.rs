use crate::streamer_core::writer_backend::{AuditError, AuditLog, AuditRecord};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteAuditLog {
    conn: Connection,
}

impl SqliteAuditLog {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, AuditError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AuditError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to create database directory {}: {}", parent.display(), e),
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;

        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp REAL NOT NULL,
                topic TEXT NOT NULL,
                value TEXT NOT NULL,
                sequence TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_topic_timestamp ON audit_log(topic, timestamp DESC)",
            [],
        )?;

        log::info!("✅ SQLite audit log initialized with WAL mode");

        Ok(Self { conn })
    }

    pub fn insert(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.conn.execute(
            "INSERT INTO audit_log (timestamp, topic, value, sequence) VALUES (?1, ?2, ?3, ?4)",
            params![record.timestamp, record.topic, record.value, record.sequence],
        )?;
        Ok(())
    }

    /// Records in append order
    pub fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        let mut stmt = self
            .conn
            .prepare("SELECT timestamp, topic, value, sequence FROM audit_log ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(AuditRecord {
                timestamp: row.get(0)?,
                topic: row.get(1)?,
                value: row.get(2)?,
                sequence: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
    async fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.insert(record)
    }

    async fn flush(&mut self) -> Result<(), AuditError> {
        // Each insert is its own committed statement
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}
