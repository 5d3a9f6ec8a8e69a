//! cs-core: stable foundation for climstep.
//!
//! Contains:
//! - field (named state arrays and their element-wise arithmetic)
//! - units (calendar constants + uom time constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for process tree nodes)
//! - error (shared error types)

pub mod error;
pub mod field;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CsError, CsResult};
pub use field::{Field, FieldMap};
pub use ids::*;
pub use numeric::*;
pub use units::*;
