//! Error types for the Kafka producer.

use rdkafka::error::KafkaError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to Kafka.
#[derive(Error, Debug)]
pub enum KafkaProducerError {
    #[error("Failed to create Kafka producer: {0}")]
    Create(#[source] KafkaError),

    #[error("Cannot reach Kafka brokers {brokers}: {source}")]
    BrokerUnreachable {
        brokers: String,
        #[source]
        source: KafkaError,
    },

    #[error("Failed to enqueue record {key}: {source}")]
    Enqueue {
        key: String,
        #[source]
        source: KafkaError,
    },

    #[error("Pending deliveries not flushed within {timeout:?}: {source}")]
    Flush {
        timeout: Duration,
        #[source]
        source: KafkaError,
    },

    #[error("Topic creation error: {0}")]
    TopicCreation(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, KafkaProducerError>;
