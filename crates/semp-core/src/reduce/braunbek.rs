//! Braunbek equivalent-boundary fields.
//!
//! Subtracting the geometric-optics incident field from the total field at
//! the observation plane leaves the scattered ("Braunbek") field. The
//! equivalent source handed to a diffraction propagator is the mean of the
//! driven component and its derivative companion, which Maxwell's boundary
//! conditions tie together:
//!
//! | Polarisation | Primary | Companion |
//! |--------------|---------|-----------|
//! | s            | `Ez`    | `Hy`      |
//! | p            | `Hz`    | `Ey`      |

use ndarray::{ArrayView1, Axis};
use num_complex::Complex64;

use super::ReduceError;
use crate::types::{ComplexField, FieldComponent, IncidentStep, Polarization};

/// Boundary value of the incident-field step used by the reduction pipeline.
pub const STEP_AT_EDGE: f64 = 0.0;

/// The component pair averaged into the Braunbek field of one polarisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraunbekPair {
    pub polarization: Polarization,
    pub primary: FieldComponent,
    pub companion: FieldComponent,
}

impl BraunbekPair {
    pub fn for_polarization(polarization: Polarization) -> Self {
        Self {
            polarization,
            primary: polarization.primary(),
            companion: polarization.braunbek_companion(),
        }
    }
}

/// Subtract the incident-field indicator along the last axis of `field`.
///
/// `y` holds the transverse coordinates of that axis; every lane along it
/// receives the same subtraction.
pub fn subtract_incident(
    field: &ComplexField,
    y: ArrayView1<'_, f64>,
    step: IncidentStep,
) -> Result<ComplexField, ReduceError> {
    let Some(last) = field.ndim().checked_sub(1) else {
        return Err(ReduceError::LengthMismatch {
            expected: y.len(),
            found: 0,
        });
    };
    if field.len_of(Axis(last)) != y.len() {
        return Err(ReduceError::LengthMismatch {
            expected: y.len(),
            found: field.len_of(Axis(last)),
        });
    }

    let indicator: Vec<f64> = y.iter().map(|&yv| step.indicator(yv, STEP_AT_EDGE)).collect();
    let mut out = field.clone();
    for mut lane in out.lanes_mut(Axis(last)) {
        for (v, &h) in lane.iter_mut().zip(&indicator) {
            *v -= Complex64::new(h, 0.0);
        }
    }
    Ok(out)
}

/// Combine a normalised field with its derivative companion.
///
/// With `step` set, the incident field is first removed from both. The
/// result is the arithmetic mean `(primary + companion) / 2`.
pub fn braunbek_field(
    primary: &ComplexField,
    companion: &ComplexField,
    y: ArrayView1<'_, f64>,
    step: Option<IncidentStep>,
) -> Result<ComplexField, ReduceError> {
    if primary.shape() != companion.shape() {
        return Err(ReduceError::LengthMismatch {
            expected: primary.len(),
            found: companion.len(),
        });
    }

    let (primary, companion) = match step {
        Some(step) => (
            subtract_incident(primary, y, step)?,
            subtract_incident(companion, y, step)?,
        ),
        None => (primary.clone(), companion.clone()),
    };

    Ok((primary + companion).mapv(|v| v * 0.5))
}
