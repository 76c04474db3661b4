//! Turning a raw CSV line into a keyed record.

use crate::error::{CsvSourceError, Result};
use tracing::warn;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b',';

/// How a line is split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Split on every occurrence of the delimiter. Quotes have no meaning, so a
    /// quoted value containing the delimiter shifts the following fields.
    #[default]
    Naive,
    /// Split with RFC 4180 quoting rules, one physical line at a time.
    Quoted,
}

/// One line of input ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// Message key, taken from the key column. `None` when the line has fewer
    /// fields than the key column requires.
    pub key: Option<String>,
    /// Message value: the raw line, unmodified.
    pub value: String,
    /// The fields the line was split into.
    pub fields: Vec<String>,
    /// 1-based line number in the input file.
    pub line_number: u64,
}

impl CsvRecord {
    /// Key for log output.
    pub fn display_key(&self) -> &str {
        self.key.as_deref().unwrap_or("<none>")
    }
}

/// Builds [`CsvRecord`]s from raw lines.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    delimiter: u8,
    key_column: usize,
    mode: SplitMode,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            key_column: 0,
            mode: SplitMode::Naive,
        }
    }
}

impl RecordBuilder {
    pub fn new(delimiter: u8, key_column: usize, mode: SplitMode) -> Self {
        Self {
            delimiter,
            key_column,
            mode,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_key_column(mut self, key_column: usize) -> Self {
        self.key_column = key_column;
        self
    }

    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Split `line` and build the record for it.
    ///
    /// Any trailing `\r` or `\n` is stripped first; the stripped line becomes
    /// the value.
    pub fn build(&self, line: impl Into<String>, line_number: u64) -> Result<CsvRecord> {
        let mut value = line.into();
        let trimmed_len = value.trim_end_matches(['\r', '\n']).len();
        value.truncate(trimmed_len);

        let fields = self.split(&value, line_number)?;
        let key = fields.get(self.key_column).cloned();
        if key.is_none() {
            warn!(
                line = line_number,
                key_column = self.key_column,
                field_count = fields.len(),
                "Line has no key column, publishing without a key"
            );
        }

        Ok(CsvRecord {
            key,
            value,
            fields,
            line_number,
        })
    }

    /// Split a single line into fields.
    ///
    /// An empty line always yields exactly one empty field.
    pub fn split(&self, line: &str, line_number: u64) -> Result<Vec<String>> {
        match self.mode {
            SplitMode::Naive => Ok(line
                .split(char::from(self.delimiter))
                .map(str::to_string)
                .collect()),
            SplitMode::Quoted => {
                let mut reader = csv::ReaderBuilder::new()
                    .has_headers(false)
                    .flexible(true)
                    .delimiter(self.delimiter)
                    .from_reader(line.as_bytes());

                match reader.records().next() {
                    Some(record) => {
                        let record = record.map_err(|source| CsvSourceError::Split {
                            line: line_number,
                            source,
                        })?;
                        Ok(record.iter().map(str::to_string).collect())
                    }
                    // The csv reader skips blank input entirely
                    None => Ok(vec![String::new()]),
                }
            }
        }
    }
}
