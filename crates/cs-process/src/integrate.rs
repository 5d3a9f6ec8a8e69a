//! Multi-step integration with running time averages.

use cs_core::constants::DAYS_PER_YEAR;
use cs_core::{Field, FieldMap, ProcessId};
use tracing::{debug, info, warn};

use crate::error::{ProcessError, ProcessResult};
use crate::model::Model;

/// Options for [`Model::integrate_converge`].
#[derive(Clone, Debug)]
pub struct ConvergeOptions {
    /// Stop once the largest year-over-year change is at most this.
    pub crit: f64,
    /// State variable to watch; `None` watches every state variable.
    pub watch: Option<String>,
    /// Give up with [`ProcessError::NonConvergence`] after this many years.
    pub max_years: usize,
}

impl Default for ConvergeOptions {
    fn default() -> Self {
        Self {
            crit: 1e-4,
            watch: None,
            max_years: 1000,
        }
    }
}

/// What one integration call covered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationSummary {
    pub steps: usize,
    pub years: f64,
    pub days: f64,
}

/// Outcome of [`Model::integrate_converge`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergenceReport {
    pub years: usize,
    /// Last year-over-year maximum absolute change.
    pub delta: f64,
}

/// Where a time-averaged variable is read from.
enum Source {
    State(String),
    Diagnostic(ProcessId, String),
}

/// Running sum of state and diagnostic snapshots.
///
/// Diagnostics are keyed by their qualified name (`path/name`), so equally
/// named diagnostics of different processes are averaged separately.
struct TimeAverage {
    sums: FieldMap,
    sources: Vec<Source>,
    samples: usize,
}

impl TimeAverage {
    /// Zeroed accumulator over state ∪ diagnostics (state wins on a name clash).
    fn start(model: &Model) -> ProcessResult<Self> {
        let mut sums = FieldMap::zeros_like(&model.state);
        let mut sources: Vec<Source> = model
            .state
            .names()
            .map(|n| Source::State(n.to_string()))
            .collect();
        for (key, owner, name) in model.diagnostics.qualified(&model.tree)? {
            if sums.contains(&key) {
                continue;
            }
            if let Some(f) = model.diagnostics.get(owner, &name) {
                sums.insert(key, Field::zeros(f.len()));
                sources.push(Source::Diagnostic(owner, name));
            }
        }
        Ok(Self {
            sums,
            sources,
            samples: 0,
        })
    }

    fn lookup<'a>(model: &'a Model, source: &Source) -> Option<&'a Field> {
        match source {
            Source::State(name) => model.state.get(name),
            Source::Diagnostic(owner, name) => model.diagnostics.get(*owner, name),
        }
    }

    fn accumulate(&mut self, model: &Model) -> ProcessResult<()> {
        let mut snapshot = FieldMap::new();
        for (key, source) in self.sums.names().zip(&self.sources) {
            // A process removed mid-run simply stops contributing.
            if let Some(f) = Self::lookup(model, source) {
                snapshot.insert(key, f.clone());
            }
        }
        self.sums
            .add_assign(&snapshot)
            .map_err(|e| ProcessError::in_process(model.name(), e))?;
        self.samples += 1;
        Ok(())
    }

    fn finish(mut self) -> FieldMap {
        if self.samples > 0 {
            self.sums.scale(1.0 / self.samples as f64);
        }
        self.sums
    }
}

impl Model {
    /// Step forward for `years` calendar years and record the time mean of
    /// every state variable and diagnostic over the run. Diagnostics appear
    /// under their qualified names (see [`Model::diagnostic`]).
    ///
    /// The step count is `floor(num_steps_per_year * years)`. A count of
    /// zero takes no steps and leaves an empty time average.
    pub fn integrate_years(&mut self, years: f64) -> ProcessResult<IntegrationSummary> {
        if !years.is_finite() || years < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "integration length must be finite and non-negative",
            });
        }
        let days = years * DAYS_PER_YEAR;
        let numsteps = (self.time().num_steps_per_year() * years).floor() as usize;
        info!(steps = numsteps, days, years, "integrating");

        self.timeave = FieldMap::new();
        if numsteps == 0 {
            warn!(years, "integration shorter than one timestep; nothing done");
            return Ok(IntegrationSummary {
                steps: 0,
                years,
                days,
            });
        }

        // Diagnostics only exist once the first step has computed them.
        self.step_forward()?;
        let mut average = TimeAverage::start(self)?;
        average.accumulate(self)?;
        for _ in 1..numsteps {
            self.step_forward()?;
            average.accumulate(self)?;
        }
        self.timeave = average.finish();

        info!(
            elapsed_years = self.time().elapsed_years(),
            "integration finished"
        );
        Ok(IntegrationSummary {
            steps: numsteps,
            years,
            days,
        })
    }

    /// [`integrate_years`](Self::integrate_years) with the length in days.
    pub fn integrate_days(&mut self, days: f64) -> ProcessResult<IntegrationSummary> {
        self.integrate_years(days / DAYS_PER_YEAR)
    }

    /// Integrate one year at a time until the watched state stops changing.
    ///
    /// At least two years are always run. The year-over-year change is the
    /// largest absolute element-wise difference of the watched variable(s).
    pub fn integrate_converge(
        &mut self,
        options: &ConvergeOptions,
    ) -> ProcessResult<ConvergenceReport> {
        if !options.crit.is_finite() || options.crit < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "convergence criterion must be finite and non-negative",
            });
        }
        if options.max_years < 2 {
            return Err(ProcessError::InvalidArg {
                what: "max_years must allow at least two years",
            });
        }
        let watch: Option<Vec<String>> = match &options.watch {
            Some(name) if !self.state.contains(name) => {
                return Err(ProcessError::UnknownVariable {
                    process: self.name().to_string(),
                    name: name.clone(),
                });
            }
            Some(name) => Some(vec![name.clone()]),
            None => None,
        };

        let mut years = 0;
        loop {
            let previous = self.state.clone();
            self.integrate_years(1.0)?;
            years += 1;
            let delta = self.state.max_abs_diff(&previous, watch.as_deref())?;
            debug!(years, delta, "convergence check");

            if years >= 2 && delta <= options.crit {
                info!(
                    years,
                    delta,
                    elapsed_years = self.time().elapsed_years(),
                    "converged"
                );
                return Ok(ConvergenceReport { years, delta });
            }
            if years >= options.max_years {
                return Err(ProcessError::NonConvergence { years, delta });
            }
        }
    }
}
