//! Process-tree time stepping for climstep.
//!
//! Provides:
//! - the [`Process`] contract and the four [`TimeType`]s
//! - an arena-backed process tree owned by a [`Model`], with the canonical state
//! - time-type partitioning that rebuilds itself when the tree changes
//! - tendency composition (diagnostic → explicit → implicit → adjustment)
//! - per-process diagnostic name spaces, read across the tree by path
//! - forward stepping with per-process calendar counters
//! - year/day/convergence integration with running time averages
//!
//! # Example
//!
//! ```
//! use cs_core::{Field, FieldMap, ProcessId};
//! use cs_process::{Model, ProcessSpec, TimeType, process_fn};
//!
//! let mut model = Model::new(
//!     ProcessSpec::coupler("column")
//!         .num_steps_per_year(4.0)
//!         .state("Ts", Field::from_element(1, 280.0)),
//! )
//! .unwrap();
//! model
//!     .add_subprocess(
//!         ProcessId::ROOT,
//!         ProcessSpec::new(
//!             "warming",
//!             TimeType::Explicit,
//!             process_fn(|_ctx| {
//!                 Ok(FieldMap::from_iter([("Ts".to_string(), Field::from_element(1, 1e-7))]))
//!             }),
//!         ),
//!     )
//!     .unwrap();
//! model.integrate_years(1.0).unwrap();
//! assert_eq!(model.time().years_elapsed(), 1);
//! assert!(model.state().get("Ts").unwrap()[0] > 280.0);
//! ```

pub mod classify;
pub mod diagnostics;
pub mod error;
pub mod integrate;
pub mod model;
pub mod process;
pub mod time;

// Internal modules
mod compose;
mod tree;

// Re-exports for public API
pub use classify::ProcessTypeList;
pub use diagnostics::DiagnosticStore;
pub use error::{ProcessError, ProcessResult};
pub use integrate::{ConvergeOptions, ConvergenceReport, IntegrationSummary};
pub use model::{DEFAULT_DIAGNOSTIC_ITERATIONS, Model, ProcessSpec, StageTendencies};
pub use process::{
    Coupler, FnProcess, Process, ProcessContext, StateView, TimeType, Traversal, process_fn,
};
pub use time::TimeRecord;
