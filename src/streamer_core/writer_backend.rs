use crate::config::BackendType;
use crate::streamer_core::{csv_writer::CsvAuditLog, sqlite_writer::SqliteAuditLog};
use async_trait::async_trait;

/// One append-only audit row: `timestamp, topic, value, sequence`
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    /// Seconds since the unix epoch, fractional
    pub timestamp: f64,
    pub topic: String,
    /// Hex-encoded payload
    pub value: String,
    pub sequence: String,
}

#[derive(Debug)]
pub enum AuditError {
    Io(std::io::Error),
    Database(String),
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Io(err)
    }
}

impl From<rusqlite::Error> for AuditError {
    fn from(err: rusqlite::Error) -> Self {
        AuditError::Database(err.to_string())
    }
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditError::Io(e) => write!(f, "IO error: {}", e),
            AuditError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for AuditError {}

#[async_trait]
pub trait AuditLog: Send {
    /// Append a single record; records are never rewritten
    async fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Flush pending writes to storage
    async fn flush(&mut self) -> Result<(), AuditError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// Open the configured audit backend at `path`
pub fn open_audit_log(backend: &BackendType, path: &str) -> Result<Box<dyn AuditLog>, AuditError> {
    let audit: Box<dyn AuditLog> = match backend {
        BackendType::Csv => Box::new(CsvAuditLog::new(path)?),
        BackendType::Sqlite => Box::new(SqliteAuditLog::new(path)?),
    };
    log::info!("📊 Audit backend: {}", audit.backend_type());
    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_selects_backend() {
        let dir = TempDir::new().unwrap();

        let csv_path = dir.path().join("messages.csv");
        let csv = open_audit_log(&BackendType::Csv, csv_path.to_str().unwrap()).unwrap();
        assert_eq!(csv.backend_type(), "CSV");

        let db_path = dir.path().join("messages.db");
        let sqlite = open_audit_log(&BackendType::Sqlite, db_path.to_str().unwrap()).unwrap();
        assert_eq!(sqlite.backend_type(), "SQLite");
    }
}
