//! Reduction of raw simulator output into comparable fields.
//!
//! The pipeline is a chain of pure functions:
//!
//! 1. [`index`] picks the observation plane and wavelength slice,
//! 2. [`vacuum`] divides by the unobstructed reference run,
//! 3. [`braunbek`] removes the geometric-optics incident field and averages
//!    a field with its derivative companion.

pub mod braunbek;
pub mod index;
pub mod vacuum;

pub use braunbek::{braunbek_field, subtract_incident, BraunbekPair};
pub use index::{observation_index, WavelengthSet, WAVELENGTH_TOLERANCE};
pub use vacuum::{normalize, normalize_far_field};

use thiserror::Error;

/// Errors raised while selecting or reducing field data.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error(
        "Wavelength {requested} is not recorded: nearest is {nearest} \
         (relative error {relative_error:.3e} exceeds tolerance)"
    )]
    WavelengthMismatch {
        requested: f64,
        nearest: f64,
        relative_error: f64,
    },

    #[error("Wavelength set is empty")]
    EmptyWavelengthSet,

    #[error("Cannot broadcast vacuum of shape {vacuum:?} onto field of shape {field:?}")]
    ShapeMismatch { field: Vec<usize>, vacuum: Vec<usize> },

    #[error("Real part has shape {real:?} but imaginary part has shape {imag:?}")]
    PartsMismatch { real: Vec<usize>, imag: Vec<usize> },

    #[error("Invalid coordinate axis: {0}")]
    InvalidAxis(String),

    #[error("Length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}
