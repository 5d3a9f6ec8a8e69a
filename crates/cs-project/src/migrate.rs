//! Configuration version upgrades.

use std::collections::HashMap;

use crate::ProjectError;
use crate::schema::{ModelConfig, ProcessDef, ProcessKindDef};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut config: ModelConfig) -> Result<ModelConfig, ProjectError> {
    while config.version < LATEST_VERSION {
        config = migrate_one_version(config)?;
    }
    Ok(config)
}

fn migrate_one_version(config: ModelConfig) -> Result<ModelConfig, ProjectError> {
    match config.version {
        0 => migrate_v0_to_v1(config),
        1 => migrate_v1_to_v2(config),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 is an alias of version 1: files written before the version
/// field was checked, with the same layout.
fn migrate_v0_to_v1(mut config: ModelConfig) -> Result<ModelConfig, ProjectError> {
    config.version = 1;
    Ok(config)
}

/// Version 1 looked diagnostics up by bare name in one model-wide name
/// space. From version 2 each process publishes into its own, so a forcing
/// names its flux as `path/name`. Bare names are rewritten to the path of
/// the single process publishing them.
fn migrate_v1_to_v2(mut config: ModelConfig) -> Result<ModelConfig, ProjectError> {
    let mut publishers = HashMap::new();
    collect_publishers(&config.processes, "", &mut publishers);
    qualify_forcing(&mut config.processes, &publishers)?;
    config.version = 2;
    Ok(config)
}

fn collect_publishers(
    processes: &[ProcessDef],
    parent: &str,
    out: &mut HashMap<String, Vec<String>>,
) {
    for process in processes {
        let path = if parent.is_empty() {
            process.name.clone()
        } else {
            format!("{parent}/{}", process.name)
        };
        if let ProcessKindDef::ConstantDiagnostic { diagnostic, .. } = &process.kind {
            out.entry(diagnostic.clone()).or_default().push(path.clone());
        }
        collect_publishers(&process.children, &path, out);
    }
}

fn qualify_forcing(
    processes: &mut [ProcessDef],
    publishers: &HashMap<String, Vec<String>>,
) -> Result<(), ProjectError> {
    for process in processes.iter_mut() {
        if let ProcessKindDef::AbsorbedForcing { diagnostic, .. } = &mut process.kind {
            if !diagnostic.contains('/') {
                match publishers.get(diagnostic.as_str()).map(Vec::as_slice) {
                    Some([path]) => *diagnostic = format!("{path}/{diagnostic}"),
                    Some(paths) if paths.len() > 1 => {
                        return Err(ProjectError::Migration {
                            what: format!(
                                "diagnostic '{diagnostic}' is published by {} processes ({})",
                                paths.len(),
                                paths.join(", ")
                            ),
                        });
                    }
                    // Unpublished names are reported by validation.
                    _ => {}
                }
            }
        }
        qualify_forcing(&mut process.children, publishers)?;
    }
    Ok(())
}
