//! Configuration validation logic.

use crate::schema::{ModelConfig, ProcessDef, ProcessKindDef, ProfileDef, TimestepDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_config(config: &ModelConfig) -> Result<(), ValidationError> {
    // Older files are upgraded by `migrate_to_latest` before they get here.
    if config.version != crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    if config.name.trim().is_empty() {
        return Err(invalid("name", "", "model name must not be empty"));
    }
    validate_timestep(&config.timestep, "timestep")?;

    for (name, values) in &config.state {
        if values.is_empty() {
            return Err(invalid(format!("state.{name}"), "[]", "must have at least one element"));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(invalid(format!("state.{name}"), v, "must be finite"));
        }
    }

    if let Some(converge) = &config.converge {
        if !converge.crit.is_finite() || converge.crit < 0.0 {
            return Err(invalid("converge.crit", converge.crit, "must be finite and non-negative"));
        }
        if converge.max_years < 2 {
            return Err(invalid("converge.max_years", converge.max_years, "must be at least 2"));
        }
        if let Some(watch) = &converge.watch {
            if !config.state.contains_key(watch) {
                return Err(ValidationError::MissingReference {
                    id: watch.clone(),
                    context: "converge.watch".to_string(),
                });
            }
        }
    }

    validate_siblings(&config.processes, &config.name, config)
}

fn validate_timestep(timestep: &TimestepDef, field: &str) -> Result<(), ValidationError> {
    match (timestep.seconds, timestep.steps_per_year) {
        (Some(_), Some(_)) => Err(invalid(
            field,
            "seconds + steps_per_year",
            "give either seconds or steps_per_year, not both",
        )),
        (Some(v), None) | (None, Some(v)) if !v.is_finite() || v <= 0.0 => {
            Err(invalid(field, v, "must be finite and positive"))
        }
        _ => Ok(()),
    }
}

/// Length of the diagnostic named by a qualified `path/name`, if a process
/// at `path` publishes it.
fn published_length(config: &ModelConfig, qualified: &str) -> Option<usize> {
    let (path, name) = qualified.rsplit_once('/')?;
    let mut siblings = config.processes.as_slice();
    let mut found = None;
    for segment in path.split('/') {
        let process = siblings.iter().find(|p| p.name == segment)?;
        siblings = process.children.as_slice();
        found = Some(process);
    }
    match &found?.kind {
        ProcessKindDef::ConstantDiagnostic { diagnostic, values } if diagnostic == name => {
            Some(values.len())
        }
        _ => None,
    }
}

fn validate_siblings(
    processes: &[ProcessDef],
    parent: &str,
    config: &ModelConfig,
) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for process in processes {
        if process.name.is_empty() || process.name.contains('/') {
            return Err(invalid(
                format!("{parent} process name"),
                &process.name,
                "must be non-empty and must not contain '/'",
            ));
        }
        if !names.insert(process.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: process.name.clone(),
                context: format!("children of '{parent}'"),
            });
        }
        let path = format!("{parent}/{}", process.name);
        if let Some(timestep) = &process.timestep {
            validate_timestep(timestep, &format!("{path}.timestep"))?;
        }
        validate_kind(&process.kind, &path, config)?;
        validate_siblings(&process.children, &path, config)?;
    }
    Ok(())
}

fn validate_kind(
    kind: &ProcessKindDef,
    path: &str,
    config: &ModelConfig,
) -> Result<(), ValidationError> {
    let len = match kind.var() {
        Some(var) => match config.state.get(var) {
            Some(values) => values.len(),
            None => {
                return Err(ValidationError::MissingReference {
                    id: var.to_string(),
                    context: format!("{path} state variable"),
                });
            }
        },
        None => 0,
    };

    match kind {
        ProcessKindDef::Coupler => {}
        ProcessKindDef::ConstantTendency { rate, .. } => {
            validate_profile(rate, len, &format!("{path}.rate"))?;
        }
        ProcessKindDef::Relaxation {
            target, tau_days, ..
        } => {
            validate_profile(target, len, &format!("{path}.target"))?;
            if !tau_days.is_finite() || *tau_days <= 0.0 {
                return Err(invalid(format!("{path}.tau_days"), tau_days, "must be positive"));
            }
        }
        ProcessKindDef::Diffusion { k, .. } => {
            if !k.is_finite() || *k < 0.0 {
                return Err(invalid(format!("{path}.k"), k, "must be non-negative"));
            }
        }
        ProcessKindDef::FloorAdjustment { floor, .. } => {
            if !floor.is_finite() {
                return Err(invalid(format!("{path}.floor"), floor, "must be finite"));
            }
        }
        ProcessKindDef::ConstantDiagnostic { diagnostic, values } => {
            if diagnostic.is_empty() || diagnostic.contains('/') {
                return Err(invalid(
                    format!("{path}.diagnostic"),
                    diagnostic,
                    "must be non-empty and must not contain '/'",
                ));
            }
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(invalid(format!("{path}.values"), v, "must be finite"));
            }
        }
        ProcessKindDef::AbsorbedForcing {
            diagnostic,
            heat_capacity,
            ..
        } => {
            match published_length(config, diagnostic) {
                None => {
                    return Err(ValidationError::MissingReference {
                        id: diagnostic.clone(),
                        context: format!("{path} diagnostic"),
                    });
                }
                Some(n) if n != len => {
                    return Err(invalid(
                        format!("{path}.diagnostic"),
                        diagnostic,
                        "published length differs from the state variable",
                    ));
                }
                Some(_) => {}
            }
            if !heat_capacity.is_finite() || *heat_capacity <= 0.0 {
                return Err(invalid(
                    format!("{path}.heat_capacity"),
                    heat_capacity,
                    "must be positive",
                ));
            }
        }
    }
    Ok(())
}

fn validate_profile(profile: &ProfileDef, len: usize, field: &str) -> Result<(), ValidationError> {
    match profile {
        ProfileDef::Uniform(v) if !v.is_finite() => Err(invalid(field, v, "must be finite")),
        ProfileDef::Uniform(_) => Ok(()),
        ProfileDef::Values(values) if values.len() != len => Err(invalid(
            field,
            values.len(),
            "profile length differs from the state variable",
        )),
        ProfileDef::Values(values) => match values.iter().find(|v| !v.is_finite()) {
            Some(v) => Err(invalid(field, v, "must be finite")),
            None => Ok(()),
        },
    }
}
