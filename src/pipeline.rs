//! Conversion pipeline.
//!
//! Runs the converter chain over every category table. Origins are
//! captured once before the first converter so the scenario table itself
//! can be converted for display without affecting lookups.

use crate::constants::TACTICAL_SCENARIO;
use crate::converters::{ConversionContext, Converter, default_chain};
use crate::error::{MerError, Result};
use crate::models::MerData;
use crate::scenario::ScenarioOrigins;
use crate::schema::numeric_columns;
use tracing::{debug, error};

/// A converter that failed on one table; the table kept its previous value
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub converter: String,
    pub table: String,
    pub reason: String,
}

impl From<ConversionFailure> for MerError {
    fn from(failure: ConversionFailure) -> Self {
        MerError::ConversionFailed {
            converter: failure.converter,
            table: failure.table,
            reason: failure.reason,
        }
    }
}

/// Ordered converter chain
pub struct ConversionPipeline {
    converters: Vec<Box<dyn Converter>>,
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionPipeline {
    pub fn new() -> Self {
        Self::with_converters(default_chain())
    }

    pub fn with_converters(converters: Vec<Box<dyn Converter>>) -> Self {
        Self { converters }
    }

    pub fn converter_names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Convert every table.
    ///
    /// Fails only when the batch has no `TACTICAL_SCENARIO` table. A
    /// converter error is logged and reported; the table it failed on is
    /// passed on unchanged.
    pub fn run(
        &self,
        mut data: MerData,
        mut on_busy: impl FnMut(String),
    ) -> Result<(MerData, Vec<ConversionFailure>)> {
        let Some(scenario) = data.get(TACTICAL_SCENARIO) else {
            return Err(MerError::MissingTacticalScenario {
                references: Vec::new(),
            });
        };
        let origins = ScenarioOrigins::from_table(scenario)?;
        let mut failures = Vec::new();

        on_busy("Converting data".to_string());
        for converter in &self.converters {
            debug!("Running {} converter", converter.name());

            for (name, table) in data.iter_mut() {
                let context = ConversionContext {
                    category: name,
                    origins: &origins,
                    numeric_columns: numeric_columns(table.frame()),
                };

                match converter.convert(table.frame(), &context) {
                    Ok(frame) => *table = table.with_frame(frame),
                    Err(e) => {
                        let failure = ConversionFailure {
                            converter: converter.name().to_string(),
                            table: name.clone(),
                            reason: e.to_string(),
                        };
                        error!("{}", MerError::from(failure.clone()));
                        failures.push(failure);
                    }
                }
            }
        }

        Ok((data, failures))
    }
}
