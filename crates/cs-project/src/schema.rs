//! Model configuration schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub timestep: TimestepDef,
    #[serde(default)]
    pub traversal: TraversalDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converge: Option<ConvergeDef>,
    /// Initial state, in declaration order.
    #[serde(default)]
    pub state: IndexMap<String, Vec<f64>>,
    #[serde(default)]
    pub processes: Vec<ProcessDef>,
}

/// Step length. At most one field may be set; neither means one day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TimestepDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_year: Option<f64>,
}

impl TimestepDef {
    pub fn seconds(seconds: f64) -> Self {
        Self {
            seconds: Some(seconds),
            steps_per_year: None,
        }
    }

    pub fn steps_per_year(n: f64) -> Self {
        Self {
            seconds: None,
            steps_per_year: Some(n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDef {
    #[default]
    TopDown,
    BottomUp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeTypeDef {
    Diagnostic,
    Explicit,
    Implicit,
    Adjustment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergeDef {
    #[serde(default = "default_crit")]
    pub crit: f64,
    #[serde(default = "default_max_years")]
    pub max_years: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<String>,
}

fn default_crit() -> f64 {
    1e-4
}

fn default_max_years() -> usize {
    1000
}

impl Default for ConvergeDef {
    fn default() -> Self {
        Self {
            crit: default_crit(),
            max_years: default_max_years(),
            watch: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDef {
    pub name: String,
    #[serde(rename = "type")]
    pub time_type: TimeTypeDef,
    #[serde(default)]
    pub traversal: TraversalDef,
    /// Own timestep; inherits the parent's when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestep: Option<TimestepDef>,
    pub kind: ProcessKindDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProcessDef>,
}

/// A uniform value or one value per element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProfileDef {
    Uniform(f64),
    Values(Vec<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessKindDef {
    /// Groups children, no tendency of its own.
    Coupler,
    ConstantTendency {
        var: String,
        /// Units per second.
        rate: ProfileDef,
    },
    Relaxation {
        var: String,
        target: ProfileDef,
        tau_days: f64,
    },
    Diffusion {
        var: String,
        /// Diffusivity over squared grid spacing, 1/s.
        k: f64,
    },
    FloorAdjustment {
        var: String,
        floor: f64,
    },
    ConstantDiagnostic {
        diagnostic: String,
        values: Vec<f64>,
    },
    AbsorbedForcing {
        var: String,
        /// Qualified `path/name` of the flux, path below the model root.
        diagnostic: String,
        heat_capacity: f64,
    },
}

impl ProcessKindDef {
    /// State variable this kind acts on, if any.
    pub fn var(&self) -> Option<&str> {
        match self {
            ProcessKindDef::ConstantTendency { var, .. }
            | ProcessKindDef::Relaxation { var, .. }
            | ProcessKindDef::Diffusion { var, .. }
            | ProcessKindDef::FloorAdjustment { var, .. }
            | ProcessKindDef::AbsorbedForcing { var, .. } => Some(var),
            ProcessKindDef::Coupler | ProcessKindDef::ConstantDiagnostic { .. } => None,
        }
    }
}
