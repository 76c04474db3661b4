//! Topic administration.

use crate::error::{KafkaProducerError, Result};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::info;

/// Create a Kafka topic if it doesn't exist.
///
/// An "already exists" answer from the broker is treated as success.
pub async fn create_topic_if_not_exists(
    brokers: &str,
    topic: &str,
    partitions: i32,
    replication_factor: i32,
    timeout: Duration,
) -> Result<()> {
    let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()
        .map_err(KafkaProducerError::Create)?;

    let new_topic = NewTopic::new(
        topic,
        partitions,
        TopicReplication::Fixed(replication_factor),
    );
    let opts = AdminOptions::new().operation_timeout(Some(timeout));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| KafkaProducerError::TopicCreation(format!("Failed to create topic: {e}")))?;

    for result in results {
        match result {
            Ok(topic_name) => {
                info!("Topic '{}' created successfully", topic_name);
            }
            Err((topic_name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!("Topic '{}' already exists", topic_name);
            }
            Err((topic_name, err)) => {
                return Err(KafkaProducerError::TopicCreation(format!(
                    "Failed to create topic {topic_name}: {err}"
                )));
            }
        }
    }

    Ok(())
}
