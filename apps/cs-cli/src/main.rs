mod error;
mod report;

use clap::{Parser, Subcommand};
use cs_core::ProcessId;
use cs_process::{ConvergeOptions, Model, TimeType};
use cs_project::{ModelConfig, compile_model};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use error::{CliError, CliResult};
use report::RunReport;

#[derive(Parser)]
#[command(name = "climstep")]
#[command(about = "climstep CLI - compose and integrate process-tree climate models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate model file syntax and structure
    Validate {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
    },
    /// Print the process tree with each process's time type
    Tree {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
    },
    /// Integrate a model forward in time
    #[command(subcommand)]
    Run(RunCommands),
    /// Integrate year by year until the state stops changing
    Converge {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
        /// Convergence criterion (overrides the file)
        #[arg(long)]
        crit: Option<f64>,
        /// Give up after this many years (overrides the file)
        #[arg(long)]
        max_years: Option<usize>,
        /// State variable to watch (overrides the file)
        #[arg(long)]
        watch: Option<String>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute diagnostics for the initial state without stepping
    Diagnostics {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
        /// Number of compute passes
        #[arg(long, default_value_t = cs_process::DEFAULT_DIAGNOSTIC_ITERATIONS)]
        iterations: usize,
        /// Only show diagnostics published by the process at this path
        #[arg(long)]
        process: Option<String>,
    },
}

#[derive(Subcommand)]
enum RunCommands {
    /// Integrate for a number of calendar years
    Years {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
        /// Length of the run in years
        years: f64,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Integrate for a number of days
    Days {
        /// Path to the model YAML or JSON file
        config_path: PathBuf,
        /// Length of the run in days
        days: f64,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Tree { config_path } => cmd_tree(&config_path),
        Commands::Run(run_cmd) => match run_cmd {
            RunCommands::Years {
                config_path,
                years,
                output,
            } => cmd_run(&config_path, Length::Years(years), output.as_deref()),
            RunCommands::Days {
                config_path,
                days,
                output,
            } => cmd_run(&config_path, Length::Days(days), output.as_deref()),
        },
        Commands::Converge {
            config_path,
            crit,
            max_years,
            watch,
            output,
        } => cmd_converge(&config_path, crit, max_years, watch, output.as_deref()),
        Commands::Diagnostics {
            config_path,
            iterations,
            process,
        } => cmd_diagnostics(&config_path, iterations, process.as_deref()),
    }
}

enum Length {
    Years(f64),
    Days(f64),
}

fn load_config(config_path: &Path) -> CliResult<ModelConfig> {
    cs_project::load(config_path).map_err(|source| CliError::Load {
        path: config_path.to_path_buf(),
        source,
    })
}

fn load_model(config_path: &Path) -> CliResult<(ModelConfig, Model)> {
    let config = load_config(config_path)?;
    let model = compile_model(&config).map_err(|source| CliError::Load {
        path: config_path.to_path_buf(),
        source,
    })?;
    info!(
        path = %config_path.display(),
        model = model.name(),
        processes = model.process_count(),
        "model loaded"
    );
    Ok((config, model))
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating model: {}", config_path.display());
    let (_config, model) = load_model(config_path)?;
    println!("✓ Model is valid ({} processes)", model.process_count());
    Ok(())
}

fn cmd_tree(config_path: &Path) -> CliResult<()> {
    let (_config, mut model) = load_model(config_path)?;
    println!("{} (timestep {:.1} s)", model.name(), model.timestep());
    print_subtree(&model, ProcessId::ROOT, 1)?;

    let types = model.process_types();
    println!(
        "\n{} processes: {} diagnostic, {} explicit, {} implicit, {} adjustment",
        types.len(),
        types.of(TimeType::Diagnostic).len(),
        types.of(TimeType::Explicit).len(),
        types.of(TimeType::Implicit).len(),
        types.of(TimeType::Adjustment).len(),
    );
    Ok(())
}

fn print_subtree(model: &Model, id: ProcessId, depth: usize) -> CliResult<()> {
    for &child in model.children(id)? {
        let vars = model.process_state(child)?.names().join(", ");
        println!(
            "{}{} [{}] {}",
            "  ".repeat(depth),
            model.process_name(child)?,
            model.time_type(child)?,
            vars
        );
        print_subtree(model, child, depth + 1)?;
    }
    Ok(())
}

fn cmd_run(config_path: &Path, length: Length, output: Option<&Path>) -> CliResult<()> {
    let (_config, mut model) = load_model(config_path)?;
    let start = Instant::now();
    let summary = match length {
        Length::Years(years) => {
            eprintln!("Integrating {} for {} years", model.name(), years);
            model.integrate_years(years)?
        }
        Length::Days(days) => {
            eprintln!("Integrating {} for {} days", model.name(), days);
            model.integrate_days(days)?
        }
    };
    eprintln!(
        "✓ {} steps in {:.3}s",
        summary.steps,
        start.elapsed().as_secs_f64()
    );

    let report = RunReport::from_model(&model)?.with_integration(summary);
    write_report(&report, output)
}

fn cmd_converge(
    config_path: &Path,
    crit: Option<f64>,
    max_years: Option<usize>,
    watch: Option<String>,
    output: Option<&Path>,
) -> CliResult<()> {
    let (config, mut model) = load_model(config_path)?;
    let mut options = config
        .converge
        .as_ref()
        .map(|c| c.options())
        .unwrap_or_default();
    if let Some(crit) = crit {
        options.crit = crit;
    }
    if let Some(max_years) = max_years {
        options.max_years = max_years;
    }
    if watch.is_some() {
        options.watch = watch;
    }
    print_converge_options(&options);

    let start = Instant::now();
    let outcome = model.integrate_converge(&options)?;
    eprintln!(
        "✓ Converged after {} years (delta {:.3e}) in {:.3}s",
        outcome.years,
        outcome.delta,
        start.elapsed().as_secs_f64()
    );

    let report = RunReport::from_model(&model)?.with_convergence(outcome);
    write_report(&report, output)
}

fn print_converge_options(options: &ConvergeOptions) {
    eprintln!(
        "Converging: crit = {:.3e}, max_years = {}, watch = {}",
        options.crit,
        options.max_years,
        options.watch.as_deref().unwrap_or("all state")
    );
}

fn cmd_diagnostics(config_path: &Path, iterations: usize, process: Option<&str>) -> CliResult<()> {
    let (_config, mut model) = load_model(config_path)?;
    model.compute_diagnostics(iterations)?;

    let diagnostics = match process {
        Some(path) => {
            let id = model
                .find(path)
                .ok_or_else(|| CliError::ProcessNotFound(path.to_string()))?;
            model.process_diagnostics(id)?
        }
        None => model.qualified_diagnostics()?,
    };

    if diagnostics.is_empty() {
        println!("No diagnostics published");
    } else {
        for (name, field) in diagnostics.iter() {
            let values: Vec<String> = field.iter().map(|v| format!("{v:.4}")).collect();
            println!("  {name} = [{}]", values.join(", "));
        }
    }
    Ok(())
}

fn write_report(report: &RunReport, output: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(path) = output {
        std::fs::write(path, json).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "report written");
        eprintln!("✓ Report written to {}", path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}
