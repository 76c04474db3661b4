//! Publishing a CSV file through the in-memory sink.

use clap::Parser;
use csv2kafka::csv::{LineSource, RecordBuilder};
use csv2kafka::kafka::InMemoryRecordSink;
use csv2kafka::{publish_file, Cli, PublishError, PublishOptions};
use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const LOG_ACTIONS: &str = "\
101,login,2024-05-01 08:00:00,web,vn
102,view_product,2024-05-01 08:00:05,mobile,vn
101,add_to_cart,2024-05-01 08:01:10,web,vn
103,\"search, filtered\",2024-05-01 08:02:00,web,us
104,logout,2024-05-01 08:03:30,mobile,sg
";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{contents}").unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn unpaced() -> PublishOptions {
    PublishOptions {
        interval: Duration::ZERO,
        ..PublishOptions::default()
    }
}

#[tokio::test]
async fn test_key_is_first_field_and_value_is_full_line() {
    let temp_file = write_csv(LOG_ACTIONS);
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");

    publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &unpaced(),
        std::future::pending(),
    )
    .await
    .unwrap();

    let expected_lines: Vec<&str> = LOG_ACTIONS.lines().collect();
    let records = sink.records();
    assert_eq!(records.len(), expected_lines.len());

    for (record, line) in records.iter().zip(&expected_lines) {
        let first_field = line.split(',').next().unwrap();
        assert_eq!(record.key.as_deref(), Some(first_field));
        assert_eq!(record.value, *line);
        assert_eq!(record.topic, "vdt2024");
    }
}

#[tokio::test]
async fn test_record_count_equals_lines_read() {
    let temp_file = write_csv(LOG_ACTIONS);
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");

    let summary = publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &unpaced(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_sent, LOG_ACTIONS.lines().count() as u64);
    assert_eq!(summary.records_sent, source.line_number());
    assert_eq!(summary.acknowledged, summary.records_sent);
}

#[tokio::test]
async fn test_empty_lines_are_published() {
    let temp_file = write_csv("1,login\n\n2,logout\n");
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");

    let summary = publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &unpaced(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_sent, 3);
    let records = sink.records();
    assert_eq!(records[1].key.as_deref(), Some(""));
    assert_eq!(records[1].value, "");
}

#[tokio::test]
async fn test_non_utf8_line_is_published_and_counted() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"1,login\n2,caf\xe9\n3,logout\n").unwrap();
    temp_file.flush().unwrap();
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");

    let summary = publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &unpaced(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_sent, 3);
    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].key.as_deref(), Some("2"));
    assert_eq!(records[1].value, "2,caf\u{FFFD}");
    assert_eq!(records[2].value, "3,logout");
}

#[tokio::test]
async fn test_skip_header_excludes_first_line_from_count() {
    let temp_file = write_csv(&format!("user_id,action,time,device,country\n{LOG_ACTIONS}"));
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");
    let options = PublishOptions {
        skip_header: true,
        ..unpaced()
    };

    let summary = publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &options,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_sent, 5);
    assert_eq!(sink.records()[0].key.as_deref(), Some("101"));
}

#[tokio::test]
async fn test_sends_are_paced() {
    let temp_file = write_csv("1,a\n2,b\n3,c\n");
    let mut source = LineSource::open(temp_file.path()).await.unwrap();
    let sink = InMemoryRecordSink::new("vdt2024");
    let options = PublishOptions {
        interval: Duration::from_millis(50),
        ..PublishOptions::default()
    };

    let started = Instant::now();
    let summary = publish_file(
        &mut source,
        &RecordBuilder::default(),
        &sink,
        &options,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_sent, 3);
    assert!(
        started.elapsed() >= Duration::from_millis(150),
        "three paced sends finished in {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_missing_input_is_a_source_failure() {
    let cli = Cli::try_parse_from([
        "csv2kafka",
        "--input",
        "/nonexistent/data/log_action.csv",
        // Never contacted: the input is opened first
        "--kafka-brokers",
        "127.0.0.1:1",
    ])
    .unwrap();

    let result = csv2kafka::run(&cli, std::future::pending()).await;

    match result {
        Err(e @ PublishError::SourceUnavailable(_)) => {
            assert!(e.is_connection_failure());
            assert_eq!(
                e.to_string(),
                "Source not found or Can't connect to Kafka Broker"
            );
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_broker_is_a_connection_failure() {
    let temp_file = write_csv(LOG_ACTIONS);
    let input = temp_file.path().to_str().unwrap().to_string();
    let cli = Cli::try_parse_from([
        "csv2kafka",
        "--input",
        input.as_str(),
        "--kafka-brokers",
        "127.0.0.1:1",
        "--connect-timeout",
        "2s",
    ])
    .unwrap();

    let result = csv2kafka::run(&cli, std::future::pending()).await;

    assert!(
        matches!(result, Err(PublishError::BrokerUnavailable(_))),
        "expected BrokerUnavailable, got {result:?}"
    );
}
