//! Delivery reporting for the threaded producer.
//!
//! The producer's background thread polls librdkafka and hands every completed
//! delivery to [`DeliveryReporter::delivery`]. The reporter logs one line per
//! record and bumps the shared [`DeliveryStats`] counters; it never blocks and
//! never retries.

use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{DeliveryResult, ProducerContext};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Acknowledgement counters shared between the delivery callback and the
/// publishing loop.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    acknowledged: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStatsSnapshot {
    pub acknowledged: u64,
    pub failed: u64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ack(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Log a successful delivery in the per-record format.
pub(crate) fn log_delivered(key: &str, topic: &str, partition: i32, offset: i64) {
    info!(
        key = %key,
        topic = %topic,
        partition,
        offset,
        "Record id {key} sent successfully - topic: {topic}, partition: {partition}, offset: {offset}"
    );
}

/// Log a failed delivery in the per-record format.
pub(crate) fn log_failed(key: &str, err: &dyn std::fmt::Display) {
    error!(key = %key, error = %err, "Error while sending record {key}: {err}");
}

/// Producer context that reports each delivery.
pub struct DeliveryReporter {
    stats: Arc<DeliveryStats>,
}

impl DeliveryReporter {
    pub fn new(stats: Arc<DeliveryStats>) -> Self {
        Self { stats }
    }
}

fn message_key<M: Message>(message: &M) -> Cow<'_, str> {
    match message.key() {
        Some(key) => String::from_utf8_lossy(key),
        None => Cow::Borrowed("<none>"),
    }
}

impl ClientContext for DeliveryReporter {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => error!(target: "librdkafka", "{fac}: {log_message}"),
            RDKafkaLogLevel::Warning => warn!(target: "librdkafka", "{fac}: {log_message}"),
            RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
                info!(target: "librdkafka", "{fac}: {log_message}")
            }
            RDKafkaLogLevel::Debug => debug!(target: "librdkafka", "{fac}: {log_message}"),
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!(target: "librdkafka", error = %error, "Kafka client error: {reason}");
    }
}

impl ProducerContext for DeliveryReporter {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: Self::DeliveryOpaque) {
        match delivery_result {
            Ok(message) => {
                self.stats.record_ack();
                log_delivered(
                    &message_key(message),
                    message.topic(),
                    message.partition(),
                    message.offset(),
                );
            }
            Err((err, message)) => {
                self.stats.record_failure();
                log_failed(&message_key(message), err);
            }
        }
    }
}
