//! Session orchestration.
//!
//! An [`ImportSession`] chains the import, scenario resolution, conversion
//! and export phases. Each phase runs on the blocking pool and reports
//! progress through [`SessionEvent`]s; the next phase starts only when the
//! previous one finished. Any aborting failure resets the session to idle.

pub mod bulk;
pub mod export;
pub mod tasks;

#[cfg(test)]
pub mod tests;

use self::export::{
    CsvSheetDirectory, ExportOptions, WorkbookWriter, apply_preset, load_preset, select_identifiers,
};
use self::tasks::{TaskKind, TaskRegistry};

use crate::config::MerConfig;
use crate::error::{MerError, Result};
use crate::importer;
use crate::models::{MerData, ProcessingStats, ScenarioPolicy, SessionState};
use crate::pipeline::ConversionPipeline;
use crate::scenario::{
    ScenarioConfirmation, ScenarioOrigins, missing_references, policy_from_confirmation, resolve,
};

use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{self, JoinError};
use tracing::{error, info};

/// Observable outcome of a phase
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Busy(String),
    Failed(String),
    Finished(TaskKind),
    /// The task registry emptied
    AllTasksFinished,
}

/// How a session decides what to do with references lacking a scenario
#[derive(Clone)]
pub enum ScenarioChoice {
    Fixed(ScenarioPolicy),
    /// Ask only when something is missing; yes mocks, no aborts
    Ask(Arc<dyn ScenarioConfirmation>),
}

impl From<ScenarioPolicy> for ScenarioChoice {
    fn from(policy: ScenarioPolicy) -> Self {
        ScenarioChoice::Fixed(policy)
    }
}

/// Cloneable event sender usable from blocking phases
#[derive(Debug, Clone, Default)]
struct EventSink {
    sender: Option<UnboundedSender<SessionEvent>>,
}

impl EventSink {
    fn busy(&self, text: String) {
        info!("{}", text);
        self.send(SessionEvent::Busy(text));
    }

    fn failed(&self, text: String) {
        error!("{}", text);
        self.send(SessionEvent::Failed(text));
    }

    fn finished(&self, kind: TaskKind) {
        self.send(SessionEvent::Finished(kind));
    }

    /// Report an empty registry once the last task is gone
    fn settled(&self, registry: &TaskRegistry) {
        if registry.all_tasks_finished() {
            info!("All tasks finished");
            self.send(SessionEvent::AllTasksFinished);
        }
    }

    fn send(&self, event: SessionEvent) {
        // A dropped receiver only means nobody is listening
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

fn aborted(kind: TaskKind) -> impl FnOnce(JoinError) -> MerError {
    move |e| MerError::TaskAborted {
        task: kind.to_string(),
        reason: e.to_string(),
    }
}

/// One import → convert → export chain
pub struct ImportSession {
    config: MerConfig,
    pipeline: Arc<ConversionPipeline>,
    workbook: Arc<dyn WorkbookWriter>,
    registry: TaskRegistry,
    events: EventSink,
    state: SessionState,
    data: Option<MerData>,
    origins: ScenarioOrigins,
    stats: ProcessingStats,
}

impl ImportSession {
    pub fn new(config: MerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pipeline: Arc::new(ConversionPipeline::new()),
            workbook: Arc::new(CsvSheetDirectory),
            registry: TaskRegistry::new(),
            events: EventSink::default(),
            state: SessionState::Idle,
            data: None,
            origins: ScenarioOrigins::default(),
            stats: ProcessingStats::default(),
        })
    }

    /// Report phase events on `sender`
    pub fn with_events(mut self, sender: UnboundedSender<SessionEvent>) -> Self {
        self.events = EventSink {
            sender: Some(sender),
        };
        self
    }

    /// Track tasks in a registry shared with other sessions
    pub fn with_registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_workbook(mut self, workbook: Arc<dyn WorkbookWriter>) -> Self {
        self.workbook = workbook;
        self
    }

    pub fn with_pipeline(mut self, pipeline: ConversionPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Converted batch, once the session reached `Converted`
    pub fn data(&self) -> Option<&MerData> {
        self.data.as_ref()
    }

    /// Origins the batch was converted against
    pub fn origins(&self) -> &ScenarioOrigins {
        &self.origins
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(MerError::TaskAborted {
                task: "session".to_string(),
                reason: format!("cannot go from {} to {}", self.state, next),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Drop the batch and return to idle
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.data = None;
        self.origins = ScenarioOrigins::default();
    }

    fn fail(&mut self, error: &MerError) {
        let message = error.user_message();
        self.events.failed(message.clone());
        error!("{}", error);
        self.state = SessionState::Failed(message);
        self.reset();
        self.events.settled(&self.registry);
    }

    /// Import and convert a batch of paths.
    ///
    /// On success the session is `Converted` and [`ImportSession::data`]
    /// holds the tables. On failure the session is back to `Idle`.
    pub async fn import(&mut self, paths: Vec<PathBuf>, choice: ScenarioChoice) -> Result<()> {
        if matches!(self.state, SessionState::Converted | SessionState::Done) {
            self.reset();
        }
        self.stats = ProcessingStats::default();

        let start_time = Instant::now();
        let result = self.run_import(paths, choice).await;
        self.stats.processing_time_ms = start_time.elapsed().as_millis();

        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    async fn run_import(&mut self, paths: Vec<PathBuf>, choice: ScenarioChoice) -> Result<()> {
        self.transition(SessionState::Importing)?;
        // Scenario resolution belongs to the import task
        let import_handle = self.registry.register(TaskKind::Import);
        let config = self.config.clone();
        let events = self.events.clone();
        let batch = task::spawn_blocking(move || {
            importer::import_paths(&paths, &config, |text| events.busy(text))
        })
        .await
        .map_err(aborted(TaskKind::Import))??;

        self.stats.files_processed = batch.files_imported;
        self.stats.files_failed = batch.failures.len();

        self.transition(SessionState::PartitionedAwaitingScenario)?;
        let policy = match choice {
            ScenarioChoice::Fixed(policy) => policy,
            ScenarioChoice::Ask(confirmation) => {
                let missing = missing_references(&batch.data, &batch.references)?;
                if missing.is_empty() {
                    ScenarioPolicy::Strict
                } else {
                    task::spawn_blocking(move || {
                        policy_from_confirmation(confirmation.as_ref(), &missing)
                    })
                    .await
                    .map_err(aborted(TaskKind::Import))?
                }
            }
        };
        let resolution = resolve(batch.data, &batch.references, policy)?;
        self.stats.mocked_references = resolution.mocked;
        self.stats.skipped_references = resolution.skipped;
        let origins = ScenarioOrigins::from_data(&resolution.data)?;

        self.transition(SessionState::Converting)?;
        let convert_handle = self.registry.register(TaskKind::Convert);
        drop(import_handle);
        self.events.finished(TaskKind::Import);
        let pipeline = self.pipeline.clone();
        let events = self.events.clone();
        let (data, failures) = task::spawn_blocking(move || {
            pipeline.run(resolution.data, |text| events.busy(text))
        })
        .await
        .map_err(aborted(TaskKind::Convert))??;
        drop(convert_handle);
        self.events.finished(TaskKind::Convert);
        self.events.settled(&self.registry);

        self.stats.conversion_failures = failures.len();
        self.stats.categories = data.len();
        self.stats.total_rows = data.values().map(|table| table.height()).sum();
        self.origins = origins;
        self.data = Some(data);
        self.transition(SessionState::Converted)
    }

    /// Export the converted batch into `destination`.
    ///
    /// Returns the number of rows written. A preset or selection error
    /// aborts the export and resets the session.
    pub async fn export(&mut self, destination: PathBuf, options: ExportOptions) -> Result<usize> {
        let result = self.run_export(destination, options).await;
        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    async fn run_export(&mut self, destination: PathBuf, options: ExportOptions) -> Result<usize> {
        self.transition(SessionState::Exporting)?;
        let Some(data) = self.data.clone() else {
            return Err(MerError::NoValidData);
        };

        let handle = self.registry.register(TaskKind::Export);
        let preset_dir = self.config.preset_dir.clone();
        let workbook = self.workbook.clone();
        let events = self.events.clone();
        let target = destination.clone();
        let rows = task::spawn_blocking(move || {
            let data = match &options.identifiers {
                Some(identifiers) => select_identifiers(&data, identifiers)?,
                None => data,
            };
            let data = match &options.preset {
                Some(preset) => apply_preset(&data, &load_preset(preset, &preset_dir)?)?,
                None => data,
            };
            export::export(&data, &target, workbook.as_ref(), |text| events.busy(text))
        })
        .await
        .map_err(aborted(TaskKind::Export))??;
        drop(handle);
        self.events.finished(TaskKind::Export);
        self.events.settled(&self.registry);

        self.stats.output_path = Some(destination);
        self.transition(SessionState::Done)?;
        Ok(rows)
    }

    /// Print the per-category overview of the converted batch
    pub fn print_summary(&self) {
        println!("\n{}", "Import Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            self.stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            self.stats.files_processed.to_string().bright_white()
        );
        if self.stats.files_failed > 0 {
            println!(
                "  {} {}",
                "Files failed:".bright_red(),
                self.stats.files_failed.to_string().bright_red().bold()
            );
        }
        if self.stats.conversion_failures > 0 {
            println!(
                "  {} {}",
                "Conversion failures:".bright_red(),
                self.stats.conversion_failures.to_string().bright_red().bold()
            );
        }
        if !self.stats.mocked_references.is_empty() {
            println!(
                "  {} {}",
                "Mocked scenarios:".bright_yellow(),
                self.stats.mocked_references.join(", ")
            );
        }
        if !self.stats.skipped_references.is_empty() {
            println!(
                "  {} {}",
                "Skipped references:".bright_yellow(),
                self.stats.skipped_references.join(", ")
            );
        }

        if let Some(data) = &self.data {
            println!("  {}", "Categories:".bright_cyan());
            for (name, table) in data {
                println!(
                    "    {} {} rows x {} columns",
                    name.bright_white(),
                    table.height(),
                    table.width()
                );
            }
        }

        if !self.origins.is_empty() {
            let origins: Vec<String> = self
                .origins
                .iter()
                .map(|(reference, origin)| {
                    format!(
                        "{}: Lat {}, Long {}",
                        reference, origin.latitude, origin.longitude
                    )
                })
                .collect();
            println!(
                "  {} {}",
                "Tactical Scenarios:".bright_cyan(),
                origins.join(", ").bright_white()
            );
        }

        if let Some(path) = &self.stats.output_path {
            println!("  {} {}", "Output:".bright_cyan(), path.display());
        }
    }
}
