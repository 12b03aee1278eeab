//! The concurrent ingestion pipeline.
//!
//! One reader task streams the input log line by line into a bounded
//! `mpsc` channel; N worker tasks drain the channel, parse each record and
//! fold accepted readings into the shared [`AggregateStore`]. The channel
//! capacity is the backpressure bound: a full queue suspends the reader, an
//! empty-but-open queue suspends workers, and the reader dropping its
//! sender is the completion signal — once the queue drains, every worker's
//! `recv()` returns `None` (the sentinel) and the pool winds down. Report
//! building runs strictly after the reader and all workers have joined.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use report_core::error::{ReportError, Result};
use report_data::parser::{ParserOptions, RecordParser};
use report_data::store::AggregateStore;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Default capacity of the record queue between the reader and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// ── Configuration ──────────────────────────────────────────────────────────────

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bounded queue capacity. Exists purely for backpressure — it keeps
    /// the reader from outrunning memory when workers are slow.
    pub queue_capacity: usize,
    /// Worker pool size; `None` applies [`default_worker_count`].
    pub workers: Option<usize>,
    /// Parser strictness, passed through to every worker.
    pub parser: ParserOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: None,
            parser: ParserOptions::default(),
        }
    }
}

/// Reference worker policy: one task per core, minus one core of headroom
/// for the reader and the report builder, never less than one.
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.saturating_sub(1).max(1)
}

// ── Stats ──────────────────────────────────────────────────────────────────────

/// Shared ingestion counters, updated by the reader and the workers.
#[derive(Debug, Default)]
struct Counters {
    lines_read: AtomicU64,
    records_folded: AtomicU64,
    records_rejected: AtomicU64,
}

/// Final ingestion counts for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Lines enqueued by the reader (header excluded).
    pub lines_read: u64,
    /// Records accepted by the parser and folded into the store.
    pub records_folded: u64,
    /// Records silently skipped (too few fields, bad date, before cutoff).
    pub records_rejected: u64,
}

impl Counters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            records_folded: self.records_folded.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
        }
    }
}

// ── IngestPipeline ─────────────────────────────────────────────────────────────

/// The ingestion phase of a run: reader + bounded queue + worker pool.
pub struct IngestPipeline {
    config: PipelineConfig,
}

impl IngestPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run ingestion to completion over `input`.
    ///
    /// Opens the input before spawning anything, so an unreadable file is an
    /// immediate [`ReportError::FileRead`]. On success the returned store is
    /// fully quiesced — every fold happens-before the join that precedes the
    /// return.
    pub async fn run(&self, input: &Path) -> Result<(AggregateStore, PipelineStats)> {
        let file = File::open(input)
            .await
            .map_err(|source| ReportError::FileRead {
                path: input.to_path_buf(),
                source,
            })?;

        let worker_count = self.config.workers.unwrap_or_else(default_worker_count);
        let capacity = self.config.queue_capacity.max(1);
        debug!(
            workers = worker_count,
            queue_capacity = capacity,
            input = %input.display(),
            "starting ingestion"
        );

        let store = Arc::new(AggregateStore::new());
        let counters = Arc::new(Counters::default());

        let (tx, rx) = mpsc::channel::<String>(capacity);
        // Workers steal from one receiver; the lock is held only for the
        // dequeue itself, never while parsing.
        let rx = Arc::new(Mutex::new(rx));

        let reader_counters = Arc::clone(&counters);
        let reader = tokio::spawn(async move { read_lines(file, tx, reader_counters).await });

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = Arc::clone(&rx);
            let store = Arc::clone(&store);
            let counters = Arc::clone(&counters);
            let parser = RecordParser::new(self.config.parser);
            workers.push(tokio::spawn(async move {
                drain_queue(rx, parser, store, counters).await;
            }));
        }

        // Ingestion is complete when the reader has finished AND every
        // worker has observed the sentinel and returned.
        reader.await.map_err(anyhow::Error::from)??;
        for worker in workers {
            worker.await.map_err(anyhow::Error::from)?;
        }

        let stats = counters.snapshot();
        debug!(
            lines_read = stats.lines_read,
            records_folded = stats.records_folded,
            records_rejected = stats.records_rejected,
            "ingestion complete"
        );

        let store = Arc::try_unwrap(store)
            .map_err(|_| anyhow::anyhow!("aggregate store still shared after pipeline join"))?;
        Ok((store, stats))
    }
}

// ── Reader task ────────────────────────────────────────────────────────────────

/// Stream `file` into the queue: discard exactly one header line, then send
/// every remaining line. Dropping `tx` on return signals completion.
async fn read_lines(file: File, tx: mpsc::Sender<String>, counters: Arc<Counters>) -> Result<()> {
    let mut lines = BufReader::new(file).lines();

    if lines.next_line().await?.is_none() {
        warn!("input is empty; nothing to ingest");
        return Ok(());
    }

    while let Some(line) = lines.next_line().await? {
        counters.lines_read.fetch_add(1, Ordering::Relaxed);
        // A send error means every worker is gone; stop reading.
        if tx.send(line).await.is_err() {
            warn!("record queue closed early; stopping reader");
            break;
        }
    }

    Ok(())
}

// ── Worker task ────────────────────────────────────────────────────────────────

/// Drain the queue until the sentinel: dequeue, parse, fold all six sensor
/// values of each accepted reading.
async fn drain_queue(
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    parser: RecordParser,
    store: Arc<AggregateStore>,
    counters: Arc<Counters>,
) {
    loop {
        let line = { rx.lock().await.recv().await };
        // `None` after the sender dropped and the queue drained: no more
        // work will ever arrive.
        let Some(line) = line else { break };

        match parser.parse(&line) {
            Some(reading) => {
                store.fold_reading(&reading);
                counters.records_folded.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                counters.records_rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::models::{AggregateKey, Sensor};
    use report_data::report::sort_rows;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const HEADER: &str = "id|device|contagem|data|temperatura|umidade|luminosidade|ruido|eco2|etvoc|latitude|longitude";

    fn write_input(dir: &TempDir, lines: &[&str]) -> PathBuf {
        let path = dir.path().join("devices.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn record(device: &str, date: &str, temperature: f64) -> String {
        format!("1|{device}|2541|{date}|{temperature}|60.2|433.0|49.9|623.0|89.0|0|0")
    }

    async fn run_with_workers(
        path: &Path,
        workers: usize,
    ) -> (AggregateStore, PipelineStats) {
        let pipeline = IngestPipeline::new(PipelineConfig {
            workers: Some(workers),
            ..Default::default()
        });
        pipeline.run(path).await.expect("pipeline run")
    }

    // ── End-to-end aggregation ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_pipeline_aggregates_two_records() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            &[
                &record("D1", "2024-03-10", 20.0),
                &record("D1", "2024-03-20", 30.0),
            ],
        );

        let (store, stats) = run_with_workers(&path, 2).await;

        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.records_folded, 2);
        assert_eq!(stats.records_rejected, 0);

        let entry = store
            .get(&AggregateKey {
                device: "D1".to_string(),
                year_month: 202403,
                sensor: Sensor::Temperature,
            })
            .expect("entry must exist");
        assert_eq!(entry.min, 20.0);
        assert_eq!(entry.max, 30.0);
        assert_eq!(entry.count, 2);
        assert!((entry.mean() - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_pipeline_drops_pre_cutoff_records() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            &[
                &record("D1", "2024-02-15", 20.0),
                &record("D1", "2024-03-01", 30.0),
            ],
        );

        let (store, stats) = run_with_workers(&path, 2).await;

        assert_eq!(stats.records_folded, 1);
        assert_eq!(stats.records_rejected, 1);
        // Only the post-cutoff month exists.
        assert!(store
            .get(&AggregateKey {
                device: "D1".to_string(),
                year_month: 202402,
                sensor: Sensor::Temperature,
            })
            .is_none());
        assert!(store
            .get(&AggregateKey {
                device: "D1".to_string(),
                year_month: 202403,
                sensor: Sensor::Temperature,
            })
            .is_some());
    }

    #[tokio::test]
    async fn test_pipeline_skips_malformed_without_crashing() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            &[
                "garbage line",
                "1|dev|2541|not-a-date|1|2|3|4|5|6",
                "1|dev|2541",
                &record("D1", "2024-03-10", 20.0),
            ],
        );

        let (store, stats) = run_with_workers(&path, 4).await;

        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.records_folded, 1);
        assert_eq!(stats.records_rejected, 3);
        assert_eq!(store.len(), 6);
    }

    #[tokio::test]
    async fn test_pipeline_header_only_input() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, &[]);

        let (store, stats) = run_with_workers(&path, 2).await;

        assert_eq!(stats.lines_read, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, "").unwrap();

        let (store, stats) = run_with_workers(&path, 2).await;

        assert_eq!(stats.lines_read, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let pipeline = IngestPipeline::new(PipelineConfig::default());

        let err = pipeline
            .run(&dir.path().join("missing.csv"))
            .await
            .expect_err("must fail");
        assert!(matches!(err, ReportError::FileRead { .. }));
    }

    // ── Worker-count independence ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_pipeline_one_vs_eight_workers_identical() {
        let dir = TempDir::new().unwrap();
        let lines: Vec<String> = (0..200)
            .map(|i| {
                record(
                    &format!("D{}", i % 5),
                    &format!("2024-{:02}-15", 3 + (i % 4)),
                    (i % 37) as f64,
                )
            })
            .collect();
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let path = write_input(&dir, &line_refs);

        let (store_one, stats_one) = run_with_workers(&path, 1).await;
        let (store_eight, stats_eight) = run_with_workers(&path, 8).await;

        assert_eq!(stats_one, stats_eight);

        let mut rows_one = store_one.into_rows();
        let mut rows_eight = store_eight.into_rows();
        sort_rows(&mut rows_one);
        sort_rows(&mut rows_eight);
        assert_eq!(rows_one, rows_eight);
    }

    // ── Backpressure ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_pipeline_tiny_queue_still_completes() {
        let dir = TempDir::new().unwrap();
        let lines: Vec<String> = (0..50)
            .map(|i| record("D1", "2024-03-10", i as f64))
            .collect();
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let path = write_input(&dir, &line_refs);

        let pipeline = IngestPipeline::new(PipelineConfig {
            queue_capacity: 1,
            workers: Some(2),
            ..Default::default()
        });
        let (store, stats) = pipeline.run(&path).await.expect("pipeline run");

        assert_eq!(stats.records_folded, 50);
        let entry = store
            .get(&AggregateKey {
                device: "D1".to_string(),
                year_month: 202403,
                sensor: Sensor::Temperature,
            })
            .expect("entry must exist");
        assert_eq!(entry.count, 50);
        assert_eq!(entry.min, 0.0);
        assert_eq!(entry.max, 49.0);
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_worker_count_at_least_one() {
        assert!(default_worker_count() >= 1);
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.workers.is_none());
        assert!(!config.parser.strict_numbers);
    }
}
