use anyhow::Context;
use clap::Parser;
use compress_img::cli::{expand_inputs, Args};
use compress_img::constants::PROGRESS_BAR_TEMPLATE;
use compress_img::logger::{is_quiet, set_verbosity, Verbosity};
use compress_img::report::{BatchReport, CompressionOutcome, JobOutput};
use compress_img::utils::format_bytes;
use compress_img::{error, failure, info, success, verbose, warn};
use compress_img::{BatchAggregator, CompressionRequest, OutputNaming, Quality, ResolvedFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // Validated before any file is touched.
    let quality: Quality = args.quality.parse()?;

    if let Some(format) = args.format.as_deref() {
        if format.parse::<ResolvedFormat>().is_err() {
            warn!("unknown format '{}', writing JPEG", format);
        }
    }

    let naming = OutputNaming {
        suffix: args.suffix.clone(),
        replace: args.replace,
    };
    let requests: Vec<CompressionRequest> = expand_inputs(&args.files)
        .into_iter()
        .map(|path| CompressionRequest::file(path, args.format.clone(), quality, naming.clone()))
        .collect();

    info!("\nCompressing {} image(s)...\n", requests.len());

    let aggregator = BatchAggregator::default()
        .with_concurrency(args.jobs)
        .with_timeout(Duration::from_secs(args.timeout));
    verbose!(
        "quality {}, {} worker(s), {}s timeout per file",
        quality,
        aggregator.concurrency(),
        aggregator.timeout().as_secs()
    );

    let progress = progress_bar(requests.len() as u64).context("invalid progress bar template")?;
    let report = aggregator
        .run_with_progress(requests, |outcome| {
            progress.suspend(|| print_outcome(outcome));
            progress.set_message(outcome.identifier.clone());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    print_summary(&report);
    Ok(())
}

fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    if is_quiet() || len < 2 {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE)?);
    Ok(pb)
}

/// Printed as each file completes.
fn print_outcome(outcome: &CompressionOutcome) {
    if let Some(message) = outcome.error_message() {
        failure!("{}: {}\n", outcome.identifier, message);
        return;
    }

    success!("{}", outcome.identifier);
    info!(
        "  {} → {} (saved {:.1}%)",
        format_bytes(outcome.original_size),
        format_bytes(outcome.compressed_size),
        outcome.savings_percent
    );
    if let Some(format) = outcome.format {
        verbose!("format: {}", format);
    }
    if let Some(JobOutput::Path(path)) = &outcome.output {
        info!("  Output: {}\n", path.display());
    }
}

fn print_summary(report: &BatchReport) {
    if report.success_count == 0 {
        return;
    }
    info!("");
    success!(
        "Successfully compressed {}/{} image(s)",
        report.success_count,
        report.total_count()
    );
    info!(
        "Total: {} → {} (saved {:.1}%)",
        format_bytes(report.total_original),
        format_bytes(report.total_compressed),
        report.total_savings_percent()
    );
}
