mod bootstrap;

use anyhow::Result;
use report_core::error::ReportError;
use report_core::settings::Settings;
use report_data::parser::ParserOptions;
use report_data::report::{render_grouped, sort_rows};
use report_data::summary::{read_summary, write_summary};
use report_runtime::pipeline::{default_worker_count, IngestPipeline, PipelineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("sensor-report v{} starting", env!("CARGO_PKG_VERSION"));

    // Resolve the input: explicit flag first, then the default locations.
    let input = match settings.input.clone().or_else(bootstrap::discover_input_path) {
        Some(path) if path.is_file() => path,
        Some(path) => return Err(ReportError::InputNotFound(path).into()),
        None => {
            return Err(ReportError::InputNotFound(
                "./devices_mqtt_data/devices.csv".into(),
            )
            .into())
        }
    };

    let config = PipelineConfig {
        queue_capacity: settings.queue_capacity as usize,
        workers: settings.workers.map(|w| w as usize),
        parser: ParserOptions {
            strict_numbers: settings.strict_numbers,
        },
    };
    tracing::info!(
        "Ingesting {} with {} workers (queue capacity {})",
        input.display(),
        config.workers.unwrap_or_else(default_worker_count),
        config.queue_capacity
    );

    // Ingestion phase: reader + worker pool, joined inside run().
    let pipeline = IngestPipeline::new(config);
    let (store, stats) = pipeline.run(&input).await?;
    tracing::info!(
        "Processed {} lines: {} folded, {} rejected, {} aggregate entries",
        stats.lines_read,
        stats.records_folded,
        stats.records_rejected,
        store.len()
    );

    // Serialize the quiesced store to the summary artifact.
    let rows = store.into_rows();
    write_summary(&rows, &settings.output)?;
    tracing::info!("Summary written to {}", settings.output.display());

    // The grouped view is re-derived from the artifact, not from memory, so
    // it stays regenerable from the file alone.
    let mut rows = read_summary(&settings.output)?;
    sort_rows(&mut rows);
    print!("{}", render_grouped(&rows));

    Ok(())
}
