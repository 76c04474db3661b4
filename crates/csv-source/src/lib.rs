//! Line-oriented CSV input for csv2kafka
//!
//! This crate reads a local CSV file one physical line at a time and turns each
//! line into a [`CsvRecord`]: the key is taken from one column of the line and
//! the value is the raw line itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use csv2kafka_csv_source::{LineSource, RecordBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), csv2kafka_csv_source::CsvSourceError> {
//!     let mut source = LineSource::open("data/log_action.csv").await?;
//!     let builder = RecordBuilder::default();
//!
//!     while let Some(line) = source.next_line().await? {
//!         let record = builder.build(line, source.line_number())?;
//!         println!("{:?} -> {}", record.key, record.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod reader;
pub mod record;

pub use error::{CsvSourceError, Result};
pub use reader::LineSource;
pub use record::{CsvRecord, RecordBuilder, SplitMode, DEFAULT_DELIMITER};
