use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// Append-only text log of a run. Every line is flushed as soon as it is
/// written so an interrupted run keeps everything up to the last record.
#[derive(Debug)]
pub struct StatsLog {
    path: PathBuf,
    file: File,
}

impl StatsLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<StatsLog> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(StatsLog { path: path.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    /// Appends `record` as one line of JSON.
    pub fn append_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.write_line(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        {
            let mut log = StatsLog::open(&path).unwrap();
            log.write_line("first").unwrap();
        }
        let mut log = StatsLog::open(&path).unwrap();
        log.append_record(&serde_json::json!({ "epoch": 1 })).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "first\n{\"epoch\":1}\n");
    }
}
