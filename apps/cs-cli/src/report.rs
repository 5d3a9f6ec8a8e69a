//! Serializable summaries of a model after a command has run.

use cs_core::FieldMap;
use cs_process::{ConvergenceReport, IntegrationSummary, Model, ProcessResult};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub model: String,
    pub timestep_s: f64,
    pub elapsed_years: f64,
    pub elapsed_steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceOutcome>,
    pub state: IndexMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub timeave: IndexMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub diagnostics: IndexMap<String, Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct IntegrationReport {
    pub steps: usize,
    pub years: f64,
    pub days: f64,
}

#[derive(Debug, Serialize)]
pub struct ConvergenceOutcome {
    pub years: usize,
    pub delta: f64,
}

fn field_lists(map: &FieldMap) -> IndexMap<String, Vec<f64>> {
    map.iter()
        .map(|(name, f)| (name.to_string(), f.iter().copied().collect()))
        .collect()
}

impl RunReport {
    /// Diagnostics are listed under their qualified `path/name`.
    pub fn from_model(model: &Model) -> ProcessResult<Self> {
        Ok(Self {
            model: model.name().to_string(),
            timestep_s: model.timestep(),
            elapsed_years: model.time().elapsed_years(),
            elapsed_steps: model.time().steps(),
            integration: None,
            convergence: None,
            state: field_lists(model.state()),
            timeave: field_lists(model.timeave()),
            diagnostics: field_lists(&model.qualified_diagnostics()?),
        })
    }

    pub fn with_integration(mut self, summary: IntegrationSummary) -> Self {
        self.integration = Some(IntegrationReport {
            steps: summary.steps,
            years: summary.years,
            days: summary.days,
        });
        self
    }

    pub fn with_convergence(mut self, report: ConvergenceReport) -> Self {
        self.convergence = Some(ConvergenceOutcome {
            years: report.years,
            delta: report.delta,
        });
        self
    }
}
