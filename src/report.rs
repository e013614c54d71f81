//! Result recorder - appends per-account outcomes to a dated CSV file

use crate::error::MinterResult;

use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Terminal status of one account in a batch pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintStatus {
    Success,
    Failed,
    FailedWithReason(String),
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintStatus::Success => write!(f, "success"),
            MintStatus::Failed => write!(f, "failed"),
            MintStatus::FailedWithReason(reason) => write!(f, "failed - {}", reason),
        }
    }
}

/// One output row
#[derive(Debug, Serialize)]
pub struct MintRecord {
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Key")]
    pub key: String,
    pub status: String,
}

impl MintRecord {
    pub fn new(address: impl Into<String>, key: impl Into<String>, status: &MintStatus) -> Self {
        Self {
            address: address.into(),
            key: key.into(),
            status: status.to_string(),
        }
    }
}

/// Appends results to `result_<date>.csv` in the output directory
pub struct CsvRecorder {
    dir: PathBuf,
}

impl CsvRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Re-derived per write so a midnight rollover starts a fresh file
    fn path_for_today(&self) -> PathBuf {
        self.dir
            .join(format!("result_{}.csv", Local::now().format("%Y-%m-%d")))
    }

    /// Append one row, writing the header only when the file is empty
    pub fn record(&self, record: &MintRecord) -> MinterResult<()> {
        let path = self.path_for_today();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            writer.write_record(["Address", "Key", "status"])?;
        }
        writer.serialize(record)?;
        writer.flush()?;

        Ok(())
    }
}
