//! One-dimensional diffusion on a uniform grid, solved implicitly.

use cs_core::{Field, FieldMap};
use cs_process::{Process, ProcessContext, ProcessResult};
use nalgebra::DMatrix;

use crate::common::{check_finite, single};
use crate::error::{ParamError, ParamResult};

/// Backward-Euler diffusion with no-flux boundaries.
///
/// `k` is the diffusivity divided by the squared grid spacing, in 1/s. Each
/// call solves `(I - dt k L) x_new = x` against the state it is shown and
/// returns `(x_new - x) / dt`, so it is unconditionally stable for any
/// timestep and conserves the sum of the field.
#[derive(Debug, Clone)]
pub struct Diffusion {
    var: String,
    k: f64,
}

impl Diffusion {
    pub fn new(var: impl Into<String>, k: f64) -> ParamResult<Self> {
        let k = check_finite(k, "diffusivity")?;
        if k < 0.0 {
            return Err(ParamError::NonPhysical {
                what: "diffusivity must be non-negative",
            });
        }
        Ok(Self { var: var.into(), k })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Tridiagonal system matrix for `n` points.
    fn system(&self, n: usize, dt: f64) -> DMatrix<f64> {
        let r = self.k * dt;
        let mut a = DMatrix::identity(n, n);
        for i in 0..n.saturating_sub(1) {
            a[(i, i)] += r;
            a[(i + 1, i + 1)] += r;
            a[(i, i + 1)] -= r;
            a[(i + 1, i)] -= r;
        }
        a
    }
}

impl Process for Diffusion {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let x = ctx.state_field(&self.var)?;
        let n = x.len();
        if n < 2 || self.k == 0.0 {
            return Ok(single(&self.var, Field::zeros(n)));
        }
        let dt = ctx.timestep();
        let x_new = self
            .system(n, dt)
            .lu()
            .solve(x)
            .ok_or_else(|| ctx.fail("diffusion system is singular"))?;
        Ok(single(&self.var, (x_new - x) / dt))
    }
}
