//! Turn a validated configuration into a runnable [`Model`].

use cs_core::units::days;
use cs_core::{Field, ProcessId};
use cs_process::{ConvergeOptions, Model, ProcessSpec, TimeType, Traversal};
use cs_processes::{
    AbsorbedForcing, ConstantDiagnostic, ConstantTendency, Diffusion, FloorAdjustment, Profile,
    Relaxation,
};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{
    ConvergeDef, ModelConfig, ProcessDef, ProcessKindDef, ProfileDef, TimeTypeDef, TimestepDef,
    TraversalDef,
};
use crate::validate::validate_config;

/// Validate `config` and build the model it describes, root first and then
/// each sub-process depth-first in file order.
pub fn compile_model(config: &ModelConfig) -> ProjectResult<Model> {
    validate_config(config)?;

    let mut root = with_timestep(ProcessSpec::coupler(config.name.as_str()), &config.timestep)
        .traversal(traversal(config.traversal));
    for (name, values) in &config.state {
        root = root.state(name.as_str(), Field::from_column_slice(values));
    }
    let mut model = Model::new(root)?;

    for def in &config.processes {
        add_process(&mut model, ProcessId::ROOT, def)?;
    }
    debug!(
        model = %config.name,
        processes = model.process_count(),
        "compiled model"
    );
    Ok(model)
}

fn add_process(model: &mut Model, parent: ProcessId, def: &ProcessDef) -> ProjectResult<ProcessId> {
    let mut spec = build_spec(def)?.traversal(traversal(def.traversal));
    if let Some(timestep) = &def.timestep {
        spec = with_timestep(spec, timestep);
    }
    if let Some(var) = def.kind.var() {
        spec = spec.attach(var);
    }
    let id = model.add_subprocess(parent, spec)?;
    for child in &def.children {
        add_process(model, id, child)?;
    }
    Ok(id)
}

fn build_spec(def: &ProcessDef) -> ProjectResult<ProcessSpec> {
    let name = def.name.as_str();
    let time_type = time_type(def.time_type);
    let spec = match &def.kind {
        ProcessKindDef::Coupler => ProcessSpec::coupler(name).time_type(time_type),
        ProcessKindDef::ConstantTendency { var, rate } => ProcessSpec::new(
            name,
            time_type,
            ConstantTendency::new(var.as_str(), profile(rate)?),
        ),
        ProcessKindDef::Relaxation {
            var,
            target,
            tau_days,
        } => ProcessSpec::new(
            name,
            time_type,
            Relaxation::new(var.as_str(), profile(target)?, days(*tau_days))?,
        ),
        ProcessKindDef::Diffusion { var, k } => {
            ProcessSpec::new(name, time_type, Diffusion::new(var.as_str(), *k)?)
        }
        ProcessKindDef::FloorAdjustment { var, floor } => {
            ProcessSpec::new(name, time_type, FloorAdjustment::new(var.as_str(), *floor)?)
        }
        ProcessKindDef::ConstantDiagnostic { diagnostic, values } => ProcessSpec::new(
            name,
            time_type,
            ConstantDiagnostic::new(diagnostic.as_str(), Field::from_column_slice(values))?,
        ),
        ProcessKindDef::AbsorbedForcing {
            var,
            diagnostic,
            heat_capacity,
        } => ProcessSpec::new(
            name,
            time_type,
            AbsorbedForcing::new(var.as_str(), diagnostic.as_str(), *heat_capacity)?,
        ),
    };
    Ok(spec)
}

fn profile(def: &ProfileDef) -> ProjectResult<Profile> {
    Ok(match def {
        ProfileDef::Uniform(v) => Profile::uniform(*v)?,
        ProfileDef::Values(values) => Profile::values(Field::from_column_slice(values))?,
    })
}

fn with_timestep(spec: ProcessSpec, def: &TimestepDef) -> ProcessSpec {
    match (def.seconds, def.steps_per_year) {
        (Some(seconds), _) => spec.timestep(seconds),
        (None, Some(n)) => spec.num_steps_per_year(n),
        (None, None) => spec,
    }
}

fn time_type(def: TimeTypeDef) -> TimeType {
    match def {
        TimeTypeDef::Diagnostic => TimeType::Diagnostic,
        TimeTypeDef::Explicit => TimeType::Explicit,
        TimeTypeDef::Implicit => TimeType::Implicit,
        TimeTypeDef::Adjustment => TimeType::Adjustment,
    }
}

fn traversal(def: TraversalDef) -> Traversal {
    match def {
        TraversalDef::TopDown => Traversal::TopDown,
        TraversalDef::BottomUp => Traversal::BottomUp,
    }
}

impl ConvergeDef {
    pub fn options(&self) -> ConvergeOptions {
        ConvergeOptions {
            crit: self.crit,
            watch: self.watch.clone(),
            max_years: self.max_years,
        }
    }
}
