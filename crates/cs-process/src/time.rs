//! Per-process time counters.

use cs_core::constants::{DAYS_PER_YEAR, SECONDS_PER_DAY, SECONDS_PER_YEAR};

use crate::error::{ProcessError, ProcessResult};

/// Time counters for one process.
///
/// A value object: the only way counters move is [`TimeRecord::advance`],
/// which returns the record for the next step. Changing the timestep builds
/// a fresh record with all counters at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeRecord {
    timestep: f64,
    num_steps_per_year: f64,
    day_of_year_index: usize,
    steps: u64,
    days_elapsed: f64,
    years_elapsed: u64,
    days_of_year: Vec<f64>,
}

impl Default for TimeRecord {
    fn default() -> Self {
        Self::build(SECONDS_PER_DAY, SECONDS_PER_YEAR / SECONDS_PER_DAY)
    }
}

impl TimeRecord {
    /// Record for a timestep given in seconds.
    pub fn from_timestep(timestep: f64) -> ProcessResult<Self> {
        if !timestep.is_finite() || timestep <= 0.0 {
            return Err(ProcessError::InvalidTimestep {
                what: "timestep must be finite and positive",
                value: timestep,
            });
        }
        Ok(Self::build(timestep, SECONDS_PER_YEAR / timestep))
    }

    /// Record for a whole (or fractional) number of steps per calendar year.
    ///
    /// The step count is kept as given rather than recomputed from the
    /// derived timestep, so year-end detection is exact for it.
    pub fn from_steps_per_year(num_steps_per_year: f64) -> ProcessResult<Self> {
        if !num_steps_per_year.is_finite() || num_steps_per_year <= 0.0 {
            return Err(ProcessError::InvalidTimestep {
                what: "num_steps_per_year must be finite and positive",
                value: num_steps_per_year,
            });
        }
        Ok(Self::build(
            SECONDS_PER_YEAR / num_steps_per_year,
            num_steps_per_year,
        ))
    }

    fn build(timestep: f64, num_steps_per_year: f64) -> Self {
        let timestep_days = timestep / SECONDS_PER_DAY;
        let days_of_year = (0..)
            .map(|k| k as f64 * timestep_days)
            .take_while(|d| *d < DAYS_PER_YEAR)
            .collect();
        Self {
            timestep,
            num_steps_per_year,
            day_of_year_index: 0,
            steps: 0,
            days_elapsed: 0.0,
            years_elapsed: 0,
            days_of_year,
        }
    }

    /// Counters after one more step.
    ///
    /// Year-end uses `>=` so a non-integer steps-per-year rolls over slightly
    /// early instead of drifting.
    #[must_use]
    pub fn advance(&self) -> Self {
        let mut next = self.clone();
        next.steps += 1;
        next.days_elapsed += self.timestep / SECONDS_PER_DAY;
        if self.day_of_year_index as f64 >= self.num_steps_per_year - 1.0 {
            next.day_of_year_index = 0;
            next.years_elapsed += 1;
        } else {
            next.day_of_year_index += 1;
        }
        next
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn num_steps_per_year(&self) -> f64 {
        self.num_steps_per_year
    }

    pub fn day_of_year_index(&self) -> usize {
        self.day_of_year_index
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn days_elapsed(&self) -> f64 {
        self.days_elapsed
    }

    pub fn years_elapsed(&self) -> u64 {
        self.years_elapsed
    }

    /// Day offset of every step within one calendar year.
    pub fn days_of_year(&self) -> &[f64] {
        &self.days_of_year
    }

    /// Calendar day (0-based, fractional) of the current step.
    pub fn day_of_year(&self) -> f64 {
        self.days_of_year
            .get(self.day_of_year_index)
            .copied()
            .unwrap_or(self.day_of_year_index as f64 * self.timestep / SECONDS_PER_DAY)
    }

    /// Total elapsed model time in calendar years.
    pub fn elapsed_years(&self) -> f64 {
        self.days_elapsed / DAYS_PER_YEAR
    }
}
