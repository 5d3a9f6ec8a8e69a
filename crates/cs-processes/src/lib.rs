//! cs-processes: reference physical processes for climstep models.
//!
//! Provides small, self-contained processes covering every time type:
//! - `ConstantTendency` and `AbsorbedForcing` (explicit forcing)
//! - `Relaxation` (explicit or implicit Newtonian cooling)
//! - `Diffusion` (implicit, backward Euler)
//! - `FloorAdjustment` (adjustment)
//! - `ConstantDiagnostic` (diagnostic)
//!
//! # Example
//!
//! ```
//! use cs_core::{Field, ProcessId, units::days};
//! use cs_process::{Model, ProcessSpec, TimeType};
//! use cs_processes::{Profile, Relaxation};
//!
//! let mut model = Model::new(
//!     ProcessSpec::coupler("column")
//!         .num_steps_per_year(365.0)
//!         .state("Ts", Field::from_element(3, 250.0)),
//! )
//! .unwrap();
//! let relax = Relaxation::new("Ts", Profile::Uniform(288.0), days(30.0)).unwrap();
//! model
//!     .add_subprocess(ProcessId::ROOT, ProcessSpec::new("relax", TimeType::Explicit, relax))
//!     .unwrap();
//! model.integrate_years(1.0).unwrap();
//! assert!(model.state().get("Ts").unwrap().iter().all(|t| *t > 287.0));
//! ```

pub mod common;
pub mod constant;
pub mod diagnostic;
pub mod diffusion;
pub mod error;
pub mod floor;
pub mod relaxation;

// Re-exports
pub use common::Profile;
pub use constant::ConstantTendency;
pub use diagnostic::{AbsorbedForcing, ConstantDiagnostic};
pub use diffusion::Diffusion;
pub use error::{ParamError, ParamResult};
pub use floor::FloorAdjustment;
pub use relaxation::Relaxation;
