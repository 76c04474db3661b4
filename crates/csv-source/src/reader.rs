//! Local file line reader

use crate::error::{CsvSourceError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Streams the lines of a local file.
///
/// Lines are split on `\n` as raw bytes. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD rather than failing the read.
pub struct LineSource {
    path: PathBuf,
    reader: BufReader<File>,
    buf: Vec<u8>,
    line_number: u64,
}

impl LineSource {
    /// Open a local file for line-by-line reading.
    ///
    /// Fails right away if the file is missing or unreadable, so callers can
    /// abort before setting up anything else.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|source| CsvSourceError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Opened input file: {}", path.display());

        Ok(Self {
            path,
            reader: BufReader::new(file),
            buf: Vec::new(),
            line_number: 0,
        })
    }

    /// Read the next line, without its terminator. Returns `None` at end of file.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|source| CsvSourceError::Read {
                path: self.path.clone(),
                line: self.line_number + 1,
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let mut bytes = self.buf.as_slice();
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest;
        }
        if let Some(rest) = bytes.strip_suffix(b"\r") {
            bytes = rest;
        }

        let line = match String::from_utf8_lossy(bytes) {
            Cow::Borrowed(line) => line.to_string(),
            Cow::Owned(line) => {
                tracing::warn!(
                    line = self.line_number,
                    "Line is not valid UTF-8, invalid bytes replaced"
                );
                line
            }
        };
        Ok(Some(line))
    }

    /// Discard the first line of the file. Returns whether a line was skipped.
    pub async fn skip_header(&mut self) -> Result<bool> {
        Ok(self.next_line().await?.is_some())
    }

    /// Number of the line most recently returned (1-based, 0 before the first read).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_lines_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("actions.csv");
        std::fs::write(&file_path, "1,login\n2,view\r\n3,logout").unwrap();

        let mut source = LineSource::open(&file_path).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().await.unwrap() {
            lines.push(line);
        }

        assert_eq!(lines, vec!["1,login", "2,view", "3,logout"]);
        assert_eq!(source.line_number(), 3);
    }

    #[tokio::test]
    async fn test_skip_header() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("actions.csv");
        std::fs::write(&file_path, "user_id,action\n1,login\n").unwrap();

        let mut source = LineSource::open(&file_path).await.unwrap();
        assert!(source.skip_header().await.unwrap());

        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("1,login"));
        assert_eq!(source.line_number(), 2);
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_decoded_lossily() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("latin1.csv");
        std::fs::write(&file_path, b"1,login\n2,caf\xe9\r\n3,logout\n").unwrap();

        let mut source = LineSource::open(&file_path).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().await.unwrap() {
            lines.push(line);
        }

        assert_eq!(lines, vec!["1,login", "2,caf\u{FFFD}", "3,logout"]);
        assert_eq!(source.line_number(), 3);
    }

    #[tokio::test]
    async fn test_skip_header_on_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("empty.csv");
        std::fs::write(&file_path, "").unwrap();

        let mut source = LineSource::open(&file_path).await.unwrap();

        assert!(!source.skip_header().await.unwrap());
        assert_eq!(source.line_number(), 0);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let result = LineSource::open("/nonexistent/path/log_action.csv").await;

        match result {
            Err(CsvSourceError::Open { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/log_action.csv"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing file should fail"),
        }
    }
}
