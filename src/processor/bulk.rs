//! Bulk export driver.
//!
//! Runs one import → convert → export chain per source directory over
//! every dump found below it. Chains run concurrently up to the configured
//! session limit and share one task registry; each chain stays registered
//! from discovery until its export finished or failed.

use super::export::ExportOptions;
use super::tasks::{TaskKind, TaskRegistry};
use super::{EventSink, ImportSession, ScenarioChoice, SessionEvent};

use crate::config::MerConfig;
use crate::error::{MerError, Result};
use crate::importer::discover_bulk_inputs;
use crate::models::{ProcessingStats, ScenarioPolicy};

use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// One bulk chain
#[derive(Debug, Clone)]
pub struct BulkJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub preset: Option<String>,
    /// Drop references without a scenario instead of mocking them
    pub skip_missing_scenario: bool,
}

impl BulkJob {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            preset: None,
            skip_missing_scenario: false,
        }
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn skipping_missing_scenario(mut self, skip: bool) -> Self {
        self.skip_missing_scenario = skip;
        self
    }

    /// Scenario policy selected by the skip flag
    pub fn policy(&self) -> ScenarioPolicy {
        if self.skip_missing_scenario {
            ScenarioPolicy::Skip
        } else {
            ScenarioPolicy::Mock
        }
    }
}

/// Drives bulk jobs over a shared registry
pub struct BulkExporter {
    config: MerConfig,
    registry: TaskRegistry,
    events: EventSink,
}

impl BulkExporter {
    pub fn new(config: MerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: TaskRegistry::new(),
            events: EventSink::default(),
        })
    }

    pub fn with_events(mut self, sender: UnboundedSender<SessionEvent>) -> Self {
        self.events = EventSink {
            sender: Some(sender),
        };
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run one job to completion
    pub async fn run(&self, job: BulkJob) -> Result<ProcessingStats> {
        let chain = self.registry.register(TaskKind::Chain);
        let result = self.run_chain(job).await;
        drop(chain);
        self.events.settled(&self.registry);
        result
    }

    async fn run_chain(&self, job: BulkJob) -> Result<ProcessingStats> {
        let paths = discover_bulk_inputs(&job.source)?;
        if paths.is_empty() {
            return Err(MerError::NoValidData);
        }
        info!(
            "Bulk export of {} files from {}",
            paths.len(),
            job.source.display()
        );

        let mut session =
            ImportSession::new(self.config.clone())?.with_registry(self.registry.clone());
        if let Some(sender) = &self.events.sender {
            session = session.with_events(sender.clone());
        }

        session
            .import(paths, ScenarioChoice::Fixed(job.policy()))
            .await?;
        let options = ExportOptions {
            preset: job.preset.clone(),
            identifiers: None,
        };
        session.export(job.destination.clone(), options).await?;

        Ok(session.stats().clone())
    }

    /// Run every job, at most `max_concurrent_sessions` at a time.
    ///
    /// Results come back in job order.
    pub async fn run_all(&self, jobs: Vec<BulkJob>) -> Vec<(BulkJob, Result<ProcessingStats>)> {
        let concurrency = self.config.max_concurrent_sessions;
        let mut results: Vec<(usize, BulkJob, Result<ProcessingStats>)> =
            stream::iter(jobs.into_iter().enumerate())
                .map(|(index, job)| async move {
                    let result = self.run(job.clone()).await;
                    (index, job, result)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, job, result)| (job, result))
            .collect()
    }
}
