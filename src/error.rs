//! Run-level errors.

use csv2kafka_csv_source::CsvSourceError;
use csv2kafka_kafka_producer::KafkaProducerError;
use thiserror::Error;

/// Errors that abort a publishing run.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The input file is missing or could not be read.
    #[error("Source not found or Can't connect to Kafka Broker")]
    SourceUnavailable(#[source] CsvSourceError),

    /// No broker answered the metadata request.
    #[error("Source not found or Can't connect to Kafka Broker")]
    BrokerUnavailable(#[source] KafkaProducerError),

    /// The producer could not be set up.
    #[error("Kafka producer setup failed")]
    Producer(#[source] KafkaProducerError),

    /// The pacing delay was interrupted.
    #[error("Interrupted while waiting to send the next record ({records_sent} records sent)")]
    Interrupted { records_sent: u64 },
}

impl PublishError {
    /// Whether this is an input or broker connection failure.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            PublishError::SourceUnavailable(_) | PublishError::BrokerUnavailable(_)
        )
    }
}

impl From<CsvSourceError> for PublishError {
    fn from(err: CsvSourceError) -> Self {
        PublishError::SourceUnavailable(err)
    }
}

impl From<KafkaProducerError> for PublishError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::BrokerUnreachable { .. } => PublishError::BrokerUnavailable(err),
            other => PublishError::Producer(other),
        }
    }
}
