//! The publishing loop.
//!
//! Each line of the input becomes one record. Before every send (or every batch
//! in batch mode) the loop waits out the pacing interval; the only way to stop
//! it early is the shutdown future, which is treated as a fatal interruption.
//! Delivery outcomes are reported asynchronously by the sink and are only read
//! back for the final summary, after a flush.

use crate::config::Cli;
use crate::error::PublishError;
use csv2kafka_csv_source::{CsvRecord, LineSource, RecordBuilder};
use csv2kafka_kafka_producer::{create_topic_if_not_exists, KafkaRecordProducer, RecordSink};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default delay between two sends.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Knobs for [`publish_file`].
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Delay before each send (or batch). Zero disables pacing.
    pub interval: Duration,
    /// Records per batch; 1 sends records one at a time without intermediate flushes.
    pub batch_size: usize,
    pub skip_header: bool,
    /// Upper bound for each flush.
    pub flush_timeout: Duration,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: 1,
            skip_header: false,
            flush_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    /// Records handed to the producer, one per line read.
    pub records_sent: u64,
    /// Deliveries acknowledged by the broker.
    pub acknowledged: u64,
    /// Records the producer refused or the broker failed to store.
    pub failed: u64,
    pub elapsed: Duration,
}

impl PublishSummary {
    /// Records neither acknowledged nor failed when the run ended.
    pub fn pending(&self) -> u64 {
        self.records_sent
            .saturating_sub(self.acknowledged + self.failed)
    }
}

/// Open the input, connect to Kafka and publish every line.
///
/// The input file is opened before the producer is created, so a missing file
/// aborts the run without touching the network.
pub async fn run<F>(cli: &Cli, shutdown: F) -> Result<PublishSummary, PublishError>
where
    F: Future<Output = ()>,
{
    info!(
        input = %cli.input.display(),
        topic = %cli.topic,
        kafka_brokers = %cli.kafka_brokers,
        interval = ?cli.interval,
        batch_size = cli.batch_size,
        "Starting CSV publisher"
    );

    let mut source = LineSource::open(&cli.input).await?;

    let producer = KafkaRecordProducer::new(&cli.producer_settings(), cli.topic.clone())?;
    producer.check_connectivity(cli.connect_timeout).await?;

    if cli.create_topic {
        create_topic_if_not_exists(
            &cli.kafka_brokers,
            &cli.topic,
            cli.partitions,
            cli.replication_factor,
            cli.connect_timeout,
        )
        .await?;
    }

    publish_file(
        &mut source,
        &cli.record_builder(),
        &producer,
        &cli.publish_options(),
        shutdown,
    )
    .await
}

/// Publish every remaining line of `source` to `sink`, then flush.
///
/// The sink is flushed even when the loop is interrupted, so records already
/// handed over still get their delivery reports.
pub async fn publish_file<S, F>(
    source: &mut LineSource,
    builder: &RecordBuilder,
    sink: &S,
    options: &PublishOptions,
    shutdown: F,
) -> Result<PublishSummary, PublishError>
where
    S: RecordSink + ?Sized,
    F: Future<Output = ()>,
{
    let started = Instant::now();
    let outcome = publish_lines(source, builder, sink, options, shutdown).await;

    // Blocks until the client has drained its queue or the timeout elapses
    if let Err(e) = sink.flush(options.flush_timeout) {
        warn!(error = %e, "Not all records were delivered before shutdown");
    }

    let records_sent = outcome?;
    let stats = sink.stats();
    let summary = PublishSummary {
        records_sent,
        acknowledged: stats.acknowledged,
        failed: stats.failed,
        elapsed: started.elapsed(),
    };

    info!(
        topic = sink.topic(),
        records_sent = summary.records_sent,
        acknowledged = summary.acknowledged,
        failed = summary.failed,
        pending = summary.pending(),
        elapsed = ?summary.elapsed,
        "Publishing complete"
    );
    Ok(summary)
}

async fn publish_lines<S, F>(
    source: &mut LineSource,
    builder: &RecordBuilder,
    sink: &S,
    options: &PublishOptions,
    shutdown: F,
) -> Result<u64, PublishError>
where
    S: RecordSink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if options.skip_header && source.skip_header().await? {
        debug!("Skipped header line of {}", source.path().display());
    }

    let mut records_sent = 0u64;
    let mut batch: Vec<CsvRecord> = Vec::with_capacity(options.batch_size.max(1));

    while let Some(line) = source.next_line().await? {
        let record = builder.build(line, source.line_number())?;

        if options.batch_size <= 1 {
            pace(options.interval, &mut shutdown, records_sent).await?;
            send_record(sink, &record);
            records_sent += 1;
        } else {
            batch.push(record);
            if batch.len() >= options.batch_size {
                pace(options.interval, &mut shutdown, records_sent).await?;
                records_sent += send_batch(sink, &mut batch, options.flush_timeout);
            }
        }
    }

    if !batch.is_empty() {
        pace(options.interval, &mut shutdown, records_sent).await?;
        records_sent += send_batch(sink, &mut batch, options.flush_timeout);
    }

    Ok(records_sent)
}

/// Wait out the pacing interval unless shutdown fires first.
async fn pace<F>(
    interval: Duration,
    shutdown: &mut Pin<&mut F>,
    records_sent: u64,
) -> Result<(), PublishError>
where
    F: Future<Output = ()>,
{
    if interval.is_zero() {
        // Still honour a pending shutdown without sleeping
        tokio::select! {
            biased;
            _ = shutdown.as_mut() => Err(PublishError::Interrupted { records_sent }),
            _ = std::future::ready(()) => Ok(()),
        }
    } else {
        tokio::select! {
            _ = shutdown.as_mut() => Err(PublishError::Interrupted { records_sent }),
            _ = tokio::time::sleep(interval) => Ok(()),
        }
    }
}

fn send_record<S: RecordSink + ?Sized>(sink: &S, record: &CsvRecord) {
    // Refused sends are already counted as failed by the sink; keep going
    if let Err(e) = sink.send(record) {
        error!(
            key = record.display_key(),
            line = record.line_number,
            error = %e,
            "Error while sending record {}: {e}",
            record.display_key()
        );
    }
}

fn send_batch<S: RecordSink + ?Sized>(
    sink: &S,
    batch: &mut Vec<CsvRecord>,
    flush_timeout: Duration,
) -> u64 {
    let count = batch.len() as u64;
    for record in batch.drain(..) {
        send_record(sink, &record);
    }
    if let Err(e) = sink.flush(flush_timeout) {
        warn!(error = %e, batch_size = count, "Batch not fully delivered before flush timeout");
    }
    debug!(batch_size = count, "Batch sent");
    count
}
