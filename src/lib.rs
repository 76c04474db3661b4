//! csv2kafka library
//!
//! Reads a CSV file line by line and publishes each line to a Kafka topic as a
//! keyed record: the key is one column of the line (the first by default) and
//! the value is the whole raw line. Sends are paced, one record per second by
//! default, and every delivery acknowledgement is logged as it arrives.
//!
//! # Crates
//!
//! - `csv2kafka_csv_source` - opening the input file and splitting lines into records
//! - `csv2kafka_kafka_producer` - the Kafka producer, delivery reporting and topic creation
//!
//! # CLI Usage
//!
//! ```bash
//! # Publish ../data/log_action.csv to vdt2024 on localhost:9092,localhost:9094
//! csv2kafka
//!
//! # Another file and topic, twice per second, creating the topic first
//! csv2kafka --input data/actions.csv --topic actions --interval 500ms --create-topic
//!
//! # Skip a header line and key by the third column
//! csv2kafka --skip-header --key-column 2
//! ```

pub mod config;
pub mod error;
pub mod publish;

pub use config::{parse_duration, Cli};
pub use error::PublishError;
pub use publish::{publish_file, run, PublishOptions, PublishSummary, DEFAULT_INTERVAL};

// Re-export the member crates for convenience
pub use csv2kafka_csv_source as csv;
pub use csv2kafka_kafka_producer as kafka;
