use crate::streamer_core::writer_backend::{AuditError, AuditLog, AuditRecord};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends audit rows as `timestamp,topic,value,sequence` lines.
///
/// Topics, hex values and sequences never contain separators, so no quoting
/// is applied.
pub struct CsvAuditLog {
    file: BufWriter<File>,
    rows_written: u64,
}

impl CsvAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        log::info!("📝 Writing audit log to: {}", path.display());

        Ok(Self {
            file: BufWriter::new(file),
            rows_written: 0,
        })
    }

    pub fn write_record(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        writeln!(
            self.file,
            "{},{},{},{}",
            record.timestamp, record.topic, record.value, record.sequence
        )?;
        self.file.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

#[async_trait]
impl AuditLog for CsvAuditLog {
    async fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.write_record(record)
    }

    async fn flush(&mut self) -> Result<(), AuditError> {
        self.file.flush()?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(topic: &str, value: &str, sequence: &str) -> AuditRecord {
        AuditRecord {
            timestamp: 1_700_000_000.5,
            topic: topic.to_string(),
            value: value.to_string(),
            sequence: sequence.to_string(),
        }
    }

    #[tokio::test]
    async fn test_appends_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("messages.csv");

        let mut log = CsvAuditLog::new(&path).unwrap();
        log.append(&record("hashblock", "00ff", "1")).await.unwrap();
        log.append(&record("rawgovernancevote", "abcd", "Unknown")).await.unwrap();
        assert_eq!(log.rows_written(), 2);
        assert_eq!(log.backend_type(), "CSV");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1700000000.5,hashblock,00ff,1",
                "1700000000.5,rawgovernancevote,abcd,Unknown",
            ]
        );
    }

    #[tokio::test]
    async fn test_reopen_appends_never_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.csv");

        {
            let mut log = CsvAuditLog::new(&path).unwrap();
            log.append(&record("hashblock", "01", "1")).await.unwrap();
        }
        {
            let mut log = CsvAuditLog::new(&path).unwrap();
            log.append(&record("hashblock", "02", "2")).await.unwrap();
            log.flush().await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().ends_with(",hashblock,02,2"));
    }
}
