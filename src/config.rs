//! Command-line and environment configuration.

mod duration;

pub use duration::parse_duration;

use crate::publish::PublishOptions;
use clap::Parser;
use csv2kafka_csv_source::{RecordBuilder, SplitMode};
use csv2kafka_kafka_producer::ProducerSettings;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Clone, Debug)]
#[command(name = "csv2kafka")]
#[command(about = "Publish each line of a CSV file to a Kafka topic, one record per interval")]
pub struct Cli {
    /// CSV file to read
    #[arg(long, env = "CSV2KAFKA_INPUT", default_value = "../data/log_action.csv")]
    pub input: PathBuf,

    /// Destination topic
    #[arg(long, env = "KAFKA_TOPIC", default_value = "vdt2024")]
    pub topic: String,

    /// Kafka brokers (comma-separated)
    #[arg(
        long,
        env = "KAFKA_BROKERS",
        default_value = "localhost:9092,localhost:9094"
    )]
    pub kafka_brokers: String,

    /// Delay before each send (or each batch), e.g. "1s", "500ms"; "0" disables pacing
    #[arg(long, env = "CSV2KAFKA_INTERVAL", default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Field delimiter (single ASCII character)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Zero-based column used as the message key
    #[arg(long, default_value = "0")]
    pub key_column: usize,

    /// Honour double quotes when splitting a line into fields
    #[arg(long)]
    pub quoted: bool,

    /// Skip the first line of the file
    #[arg(long)]
    pub skip_header: bool,

    /// Send records in batches of this size, flushing after each batch
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Create the topic before publishing if it does not exist
    #[arg(long)]
    pub create_topic: bool,

    /// Partitions for a created topic
    #[arg(long, default_value = "3")]
    pub partitions: i32,

    /// Replication factor for a created topic
    #[arg(long, default_value = "1")]
    pub replication_factor: i32,

    /// Broker acknowledgement level for each record (0, 1 or all)
    #[arg(long, env = "KAFKA_ACKS", value_parser = ["0", "1", "all"])]
    pub acks: Option<String>,

    /// How long the client may spend delivering one record before reporting it failed
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub message_timeout: Duration,

    /// How long to wait for cluster metadata before giving up on the brokers
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub connect_timeout: Duration,

    /// How long to wait for outstanding deliveries on shutdown
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub flush_timeout: Duration,

    /// Extra librdkafka producer property (key=value), may be repeated
    #[arg(long = "producer-config", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub producer_config: Vec<(String, String)>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn record_builder(&self) -> RecordBuilder {
        let mode = if self.quoted {
            SplitMode::Quoted
        } else {
            SplitMode::Naive
        };
        RecordBuilder::new(self.delimiter, self.key_column, mode)
    }

    pub fn producer_settings(&self) -> ProducerSettings {
        let mut settings = ProducerSettings::new(self.kafka_brokers.clone())
            .with_message_timeout(self.message_timeout)
            .with_client_id("csv2kafka");
        if let Some(acks) = &self.acks {
            settings = settings.with_acks(acks.clone());
        }
        for (key, value) in &self.producer_config {
            settings = settings.with_property(key.clone(), value.clone());
        }
        settings
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            interval: self.interval,
            batch_size: self.batch_size as usize,
            skip_header: self.skip_header,
            flush_timeout: self.flush_timeout,
        }
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some('\\'), Some('t')) if s.len() == 2 => Ok(b'\t'),
        _ => Err(format!(
            "delimiter must be a single ASCII character, got '{s}'"
        )),
    }
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
