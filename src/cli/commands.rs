//! Command implementations for the MER keeper CLI

use crate::cli::args::{Args, BulkArgs, Commands, ImportArgs};
use crate::config::MerConfig;
use crate::error::MerError;
use crate::importer::release_extraction_dir;
use crate::models::ProcessingStats;
use crate::processor::bulk::{BulkExporter, BulkJob};
use crate::processor::export::ExportOptions;
use crate::processor::{ImportSession, ScenarioChoice, SessionEvent};
use crate::scenario::ScenarioConfirmation;

use anyhow::{Context, Result, anyhow};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Run the selected command
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args)?;
    let config = args.config();
    config.validate().map_err(reported)?;

    let result = match &args.command {
        Some(Commands::Import(import)) => run_import(import, config.clone()).await,
        Some(Commands::Bulk(bulk)) => run_bulk(bulk, config.clone()).await,
        None => Err(anyhow!("No command given")),
    };

    if let Err(e) = release_extraction_dir(&config.extraction_dir) {
        warn!("Could not clear extraction directory: {}", e);
    }
    result
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mer_keeper={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Short user-facing message; the full error is already logged
fn reported(error: MerError) -> anyhow::Error {
    anyhow!(error.user_message())
}

fn spinner(config: &MerConfig) -> Option<ProgressBar> {
    if !config.show_progress {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Mirror session events on the spinner until the sessions hang up
fn follow_events(
    mut receiver: UnboundedReceiver<SessionEvent>,
    pb: Option<ProgressBar>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match (&pb, event) {
                (Some(pb), SessionEvent::Busy(text)) => pb.set_message(text),
                (Some(pb), SessionEvent::Failed(text)) => {
                    pb.println(format!("{} {}", "Failed:".bright_red(), text))
                }
                (_, SessionEvent::Finished(kind)) => debug!("{} phase finished", kind),
                (Some(pb), SessionEvent::AllTasksFinished) => pb.set_message("All tasks finished"),
                _ => {}
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    })
}

/// Asks on the terminal whether a missing scenario may be mocked
struct StdinConfirmation {
    pb: Option<ProgressBar>,
}

impl StdinConfirmation {
    fn ask(missing: &[String]) -> bool {
        print!(
            "{} No Tactical Scenario found for {}, continue? [y/N] ",
            "Warning:".bright_yellow().bold(),
            missing.join(", ").bright_white()
        );
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => matches!(input.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

impl ScenarioConfirmation for StdinConfirmation {
    fn confirm_mock(&self, missing: &[String]) -> bool {
        match &self.pb {
            Some(pb) => pb.suspend(|| Self::ask(missing)),
            None => Self::ask(missing),
        }
    }
}

async fn run_import(args: &ImportArgs, config: MerConfig) -> Result<ProcessingStats> {
    println!("{}", "Starting MER import".bright_green().bold());
    println!(
        "  {} {} file(s)",
        "Input:".bright_cyan(),
        args.paths.len().to_string().bright_white()
    );

    let pb = spinner(&config);
    let (sender, receiver) = mpsc::unbounded_channel();
    let follower = follow_events(receiver, pb.clone());

    let choice = match args.on_missing_scenario.policy() {
        Some(policy) => ScenarioChoice::Fixed(policy),
        None => ScenarioChoice::Ask(Arc::new(StdinConfirmation { pb: pb.clone() })),
    };

    let mut session = ImportSession::new(config).map_err(reported)?.with_events(sender);
    let outcome = async {
        session
            .import(args.paths.clone(), choice)
            .await
            .map_err(reported)?;

        match &args.output {
            Some(output) => {
                let options = ExportOptions {
                    preset: args.preset.clone(),
                    identifiers: args.identifiers.clone(),
                };
                let rows = session
                    .export(output.clone(), options)
                    .await
                    .map_err(reported)?;
                debug!("Exported {} rows", rows);
            }
            None if args.preset.is_some() || args.identifiers.is_some() => {
                warn!("--preset and --identifiers only apply with --output");
            }
            None => {}
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    let stats = session.stats().clone();
    let converted = session.data().is_some();
    if converted {
        session.print_summary();
    }
    // Hang up the event channel so the follower finishes
    drop(session);
    follower.await.context("Progress reporter stopped unexpectedly")?;

    outcome.map(|_| stats)
}

async fn run_bulk(args: &BulkArgs, config: MerConfig) -> Result<ProcessingStats> {
    let config = match args.max_sessions {
        Some(max) => config.with_max_concurrent_sessions(max),
        None => config,
    };

    println!("{}", "Starting MER bulk export".bright_green().bold());
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        args.output.display().to_string().bright_white()
    );

    let jobs: Vec<BulkJob> = args
        .sources
        .iter()
        .map(|source| {
            let destination = if args.sources.len() == 1 {
                args.output.clone()
            } else {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "source".to_string());
                args.output.join(name)
            };
            let mut job = BulkJob::new(source, destination)
                .skipping_missing_scenario(args.skip_missing_scenario);
            if let Some(preset) = &args.preset {
                job = job.with_preset(preset.clone());
            }
            job
        })
        .collect();

    let pb = spinner(&config);
    let (sender, receiver) = mpsc::unbounded_channel();
    let follower = follow_events(receiver, pb);

    let exporter = BulkExporter::new(config).map_err(reported)?.with_events(sender);
    let results = exporter.run_all(jobs).await;
    let settled = exporter.registry().all_tasks_finished();
    drop(exporter);
    follower.await.context("Progress reporter stopped unexpectedly")?;

    let mut total = ProcessingStats::default();
    let mut failed = 0;
    println!("\n{}", "Bulk Summary".bright_green().bold());
    for (job, result) in results {
        match result {
            Ok(stats) => {
                println!(
                    "  {} {} -> {} ({} files, {} rows)",
                    "Done:".bright_green(),
                    job.source.display(),
                    job.destination.display(),
                    stats.files_processed,
                    stats.total_rows
                );
                total.files_processed += stats.files_processed;
                total.files_failed += stats.files_failed;
                total.total_rows += stats.total_rows;
                total.categories += stats.categories;
                total.conversion_failures += stats.conversion_failures;
                total.mocked_references.extend(stats.mocked_references);
                total.skipped_references.extend(stats.skipped_references);
                total.processing_time_ms += stats.processing_time_ms;
            }
            Err(e) => {
                failed += 1;
                println!(
                    "  {} {}: {}",
                    "Failed:".bright_red(),
                    job.source.display(),
                    e.user_message()
                );
            }
        }
    }

    println!(
        "  {} {}",
        "All tasks finished:".bright_cyan(),
        if settled { "yes".bright_white() } else { "no".bright_red() }
    );

    if failed > 0 {
        return Err(anyhow!("{} of {} bulk exports failed", failed, args.sources.len()));
    }
    total.output_path = Some(args.output.clone());
    Ok(total)
}
