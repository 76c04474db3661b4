//! CSV to Kafka E2E test
//!
//! Test flow:
//! 1. Write a small CSV file
//! 2. Run the publisher against a fresh topic (created by the publisher)
//! 3. Consume the topic from the beginning
//! 4. Verify keys, values and the reported record count

use clap::Parser;
use csv2kafka::Cli;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Kafka broker address for testing
const KAFKA_BROKER: &str = "kafka:9092";

const CSV_DATA: &str = "\
201,login,2024-05-01 08:00:00
202,view_product,2024-05-01 08:00:05
203,logout,2024-05-01 08:01:10
";

#[tokio::test]
#[ignore = "requires a Kafka broker at kafka:9092"]
async fn test_publish_csv_to_kafka() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber_init();

    let test_id = uuid::Uuid::new_v4().simple().to_string();
    let topic = format!("test-csv2kafka-{test_id}");

    let mut temp_file = NamedTempFile::new()?;
    write!(temp_file, "{CSV_DATA}")?;
    temp_file.flush()?;
    let input = temp_file.path().to_string_lossy().to_string();

    let cli = Cli::try_parse_from([
        "csv2kafka",
        "--input",
        input.as_str(),
        "--topic",
        topic.as_str(),
        "--kafka-brokers",
        KAFKA_BROKER,
        "--interval",
        "0",
        "--create-topic",
        "--partitions",
        "1",
    ])?;

    let summary = csv2kafka::run(&cli, std::future::pending()).await?;
    assert_eq!(summary.records_sent, 3);
    assert_eq!(summary.acknowledged, 3);
    assert_eq!(summary.failed, 0);

    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", KAFKA_BROKER)
        .set("group.id", format!("test-csv2kafka-{test_id}"))
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .create()?;
    consumer.subscribe(&[topic.as_str()])?;

    let mut received: HashMap<String, String> = HashMap::new();
    while received.len() < 3 {
        let message = tokio::time::timeout(Duration::from_secs(30), consumer.recv()).await??;
        let key = String::from_utf8(message.key().unwrap_or_default().to_vec())?;
        let value = String::from_utf8(message.payload().unwrap_or_default().to_vec())?;
        received.insert(key, value);
    }

    for line in CSV_DATA.lines() {
        let key = line.split(',').next().unwrap();
        assert_eq!(received.get(key).map(String::as_str), Some(line));
    }

    Ok(())
}

fn tracing_subscriber_init() {
    // Another test may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter("csv2kafka=debug,csv2kafka_kafka_producer=debug")
        .try_init();
}
