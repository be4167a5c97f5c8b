//! Analytic solver abstraction and implementations.
//!
//! The [`AnalyticSolver`] trait defines the interface shared by the
//! closed-form solutions used to validate FDTD output. Both solutions return
//! fields normalised so that the unobstructed plane wave has unit magnitude,
//! evaluated on a transverse slice `y` at a fixed depth `x`.

pub mod sommerfeld;
pub mod thick;

pub use sommerfeld::{HalfPlaneParams, HalfPlaneSolver};
pub use thick::{GapModeSolver, GapParams};

use ndarray::ArrayView1;
use thiserror::Error;

use crate::reduce::ReduceError;
use crate::types::FieldComponents;

/// Errors that can occur while evaluating an analytic solution.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid solver parameter: {0}")]
    InvalidParameter(String),

    #[error("Observation point (x={x}, y={y}) coincides with the edge")]
    EdgeSingularity { x: f64, y: f64 },

    #[error(transparent)]
    Reduction(#[from] ReduceError),
}

/// A closed-form diffraction solution.
///
/// Implementations are immutable after construction and safe to evaluate
/// concurrently, e.g. one solver per wavelength on a thread pool.
pub trait AnalyticSolver: Send + Sync {
    /// Evaluate all six field components at depth `x` on the transverse slice `y`.
    ///
    /// With `braunbek` set, the geometric-optics incident field is removed so
    /// that only the scattered field remains.
    fn solve_slice(
        &self,
        x: f64,
        y: ArrayView1<'_, f64>,
        braunbek: bool,
    ) -> Result<FieldComponents, SolverError>;

    /// Wavelength (µm) this solver was built for.
    fn wavelength(&self) -> f64;

    /// Human-readable name of the solution.
    fn method_name(&self) -> &str;
}

/// Shared parameter checks for solver constructors.
pub(crate) fn check_wavelength(wavelength: f64) -> Result<(), SolverError> {
    if wavelength.is_finite() && wavelength > 0.0 {
        Ok(())
    } else {
        Err(SolverError::InvalidParameter(format!(
            "wavelength must be positive and finite, got {wavelength}"
        )))
    }
}

pub(crate) fn check_angle(phi0: f64) -> Result<(), SolverError> {
    if phi0.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidParameter(format!(
            "incidence angle must be finite, got {phi0}"
        )))
    }
}
