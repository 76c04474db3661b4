//! Destination abstraction for published records.

use crate::context::{log_delivered, log_failed, DeliveryStats, DeliveryStatsSnapshot};
use crate::error::{KafkaProducerError, Result};
use csv2kafka_csv_source::CsvRecord;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Something records can be handed to for asynchronous delivery.
///
/// `send` only enqueues; the outcome of each record is reported later through
/// the delivery callback and reflected in [`RecordSink::stats`].
pub trait RecordSink {
    /// Topic the sink publishes to.
    fn topic(&self) -> &str;

    /// Enqueue one record. An `Err` means the record was refused before it was
    /// queued; it is already counted as failed.
    fn send(&self, record: &CsvRecord) -> Result<()>;

    /// Block until every queued record has been delivered or `timeout` elapses.
    fn flush(&self, timeout: Duration) -> Result<()>;

    /// Delivery counters so far.
    fn stats(&self) -> DeliveryStatsSnapshot;
}

/// A record captured by [`InMemoryRecordSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub topic: String,
    pub key: Option<String>,
    pub value: String,
    pub offset: i64,
}

/// Sink that keeps records in memory and acknowledges them immediately.
#[derive(Clone)]
pub struct InMemoryRecordSink {
    topic: String,
    records: Arc<Mutex<Vec<PublishedRecord>>>,
    failing_keys: Arc<HashSet<String>>,
    refused_keys: Arc<HashSet<String>>,
    flushes: Arc<Mutex<usize>>,
    stats: Arc<DeliveryStats>,
}

impl InMemoryRecordSink {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            records: Arc::new(Mutex::new(Vec::new())),
            failing_keys: Arc::new(HashSet::new()),
            refused_keys: Arc::new(HashSet::new()),
            flushes: Arc::new(Mutex::new(0)),
            stats: Arc::new(DeliveryStats::new()),
        }
    }

    /// Report a delivery failure for every record with this key.
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        let mut keys = (*self.failing_keys).clone();
        keys.insert(key.into());
        self.failing_keys = Arc::new(keys);
        self
    }

    /// Refuse to enqueue every record with this key, as a full client queue would.
    pub fn with_refused_key(mut self, key: impl Into<String>) -> Self {
        let mut keys = (*self.refused_keys).clone();
        keys.insert(key.into());
        self.refused_keys = Arc::new(keys);
        self
    }

    /// Records delivered so far, in send order.
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of times `flush` was called.
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordSink for InMemoryRecordSink {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&self, record: &CsvRecord) -> Result<()> {
        let key = record.key.as_ref();
        if key.is_some_and(|key| self.refused_keys.contains(key)) {
            self.stats.record_failure();
            return Err(KafkaProducerError::Enqueue {
                key: record.display_key().to_string(),
                source: KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull),
            });
        }
        if key.is_some_and(|key| self.failing_keys.contains(key)) {
            self.stats.record_failure();
            log_failed(record.display_key(), &"simulated delivery failure");
            return Ok(());
        }

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = records.len() as i64;
        records.push(PublishedRecord {
            topic: self.topic.clone(),
            key: record.key.clone(),
            value: record.value.clone(),
            offset,
        });
        self.stats.record_ack();
        log_delivered(record.display_key(), &self.topic, 0, offset);
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }
}
