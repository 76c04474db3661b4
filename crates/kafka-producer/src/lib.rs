//! Kafka producer for csv2kafka
//!
//! This library wraps an rdkafka [`ThreadedProducer`] so that CSV records can be
//! handed off for asynchronous delivery while a [`DeliveryReporter`] logs the
//! outcome of each one from the client's own polling thread.
//!
//! ## Features
//!
//! - **Fire-and-forget sends**: `send` only enqueues, acknowledgements are logged later
//! - **Delivery counters**: acks and failures are counted for the final summary
//! - **Preflight check**: cluster metadata is fetched up front so an unreachable broker fails fast
//! - **Topic management**: optional topic creation through the admin API
//!
//! ## Usage
//!
//! ```rust,no_run
//! use csv2kafka_csv_source::RecordBuilder;
//! use csv2kafka_kafka_producer::{KafkaRecordProducer, ProducerSettings, RecordSink};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ProducerSettings::new("localhost:9092");
//!     let producer = KafkaRecordProducer::new(&settings, "vdt2024")?;
//!     producer.check_connectivity(Duration::from_secs(10)).await?;
//!
//!     let record = RecordBuilder::default().build("1,login", 1)?;
//!     producer.send(&record)?;
//!     producer.flush(Duration::from_secs(30))?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod context;
pub mod error;
pub mod sink;

use csv2kafka_csv_source::CsvRecord;
use rdkafka::producer::{BaseRecord, Producer, ThreadedProducer};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;

pub use admin::create_topic_if_not_exists;
pub use context::{DeliveryReporter, DeliveryStats, DeliveryStatsSnapshot};
pub use error::{KafkaProducerError, Result};
pub use sink::{InMemoryRecordSink, PublishedRecord, RecordSink};

/// Default broker list.
pub const DEFAULT_BROKERS: &str = "localhost:9092,localhost:9094";

/// Default time librdkafka keeps retrying a message before reporting it failed.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Client settings for [`KafkaRecordProducer`].
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    /// Comma-separated bootstrap servers.
    pub brokers: String,
    pub message_timeout: Duration,
    /// Broker acknowledgement level (`0`, `1` or `all`); librdkafka's default when unset.
    pub acks: Option<String>,
    pub client_id: Option<String>,
    /// Raw librdkafka properties applied last, overriding the ones above.
    pub extra: Vec<(String, String)>,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BROKERS)
    }
}

impl ProducerSettings {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            acks: None,
            client_id: None,
            extra: Vec::new(),
        }
    }

    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    pub fn with_acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// librdkafka configuration for these settings.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set(
                "message.timeout.ms",
                self.message_timeout.as_millis().to_string(),
            );
        if let Some(acks) = &self.acks {
            config.set("acks", acks);
        }
        if let Some(client_id) = &self.client_id {
            config.set("client.id", client_id);
        }
        for (key, value) in &self.extra {
            config.set(key, value);
        }
        config
    }
}

/// Kafka producer that publishes CSV records to one topic.
pub struct KafkaRecordProducer {
    producer: Arc<ThreadedProducer<DeliveryReporter>>,
    brokers: String,
    topic: String,
    stats: Arc<DeliveryStats>,
}

impl KafkaRecordProducer {
    /// Create a producer. No connection is made until the first request.
    pub fn new(settings: &ProducerSettings, topic: impl Into<String>) -> Result<Self> {
        let stats = Arc::new(DeliveryStats::new());
        let producer: ThreadedProducer<DeliveryReporter> = settings
            .client_config()
            .create_with_context(DeliveryReporter::new(Arc::clone(&stats)))
            .map_err(KafkaProducerError::Create)?;

        Ok(Self {
            producer: Arc::new(producer),
            brokers: settings.brokers.clone(),
            topic: topic.into(),
            stats,
        })
    }

    /// Fetch cluster metadata to make sure at least one broker answers.
    pub async fn check_connectivity(&self, timeout: Duration) -> Result<()> {
        let producer = Arc::clone(&self.producer);
        let producer_topic = self.topic.clone();
        let (broker_count, topic_known) = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| {
                    let topic_known = metadata
                        .topics()
                        .iter()
                        .any(|t| t.name() == producer_topic);
                    (metadata.brokers().len(), topic_known)
                })
        })
        .await?
        .map_err(|source| KafkaProducerError::BrokerUnreachable {
            brokers: self.brokers.clone(),
            source,
        })?;

        tracing::info!(
            brokers = %self.brokers,
            broker_count,
            topic = %self.topic,
            "Connected to Kafka cluster"
        );
        if !topic_known {
            tracing::warn!(
                topic = %self.topic,
                "Topic not found in cluster metadata, it must be auto-created by the broker"
            );
        }
        Ok(())
    }
}

impl RecordSink for KafkaRecordProducer {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&self, record: &CsvRecord) -> Result<()> {
        let mut base: BaseRecord<'_, str, str> =
            BaseRecord::to(&self.topic).payload(record.value.as_str());
        if let Some(key) = record.key.as_deref() {
            base = base.key(key);
        }

        self.producer.send(base).map_err(|(source, _)| {
            self.stats.record_failure();
            KafkaProducerError::Enqueue {
                key: record.display_key().to_string(),
                source,
            }
        })?;

        tracing::debug!(
            key = record.display_key(),
            line = record.line_number,
            "Queued record"
        );
        Ok(())
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(timeout)
            .map_err(|source| KafkaProducerError::Flush { timeout, source })
    }

    fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }
}
