//! Normalisation by the unobstructed ("vacuum") reference run.
//!
//! The vacuum run is often recorded with fewer spatial axes than the wafer
//! run, e.g. collapsed along `y` where the plane wave is uniform. Its array is
//! extended with trailing unit axes until the ranks agree and then broadcast,
//! so a vacuum of shape `(X,)` divides every row of an `(X, Y)` field by the
//! same per-`X` value.

use ndarray::Axis;
use num_complex::Complex64;

use super::ReduceError;
use crate::types::ComplexField;

/// Magnitude below which a far-field vacuum reference counts as empty.
const FAR_FIELD_ZERO: f64 = 1e-12;

/// Divide `field` element-wise by `vacuum`, broadcasting the vacuum over
/// trailing axes it does not have.
pub fn normalize(field: &ComplexField, vacuum: &ComplexField) -> Result<ComplexField, ReduceError> {
    let mismatch = || ReduceError::ShapeMismatch {
        field: field.shape().to_vec(),
        vacuum: vacuum.shape().to_vec(),
    };

    if vacuum.ndim() > field.ndim() {
        return Err(mismatch());
    }

    let mut reference = vacuum.view();
    while reference.ndim() < field.ndim() {
        let last = reference.ndim();
        reference = reference.insert_axis(Axis(last));
    }

    let compatible = reference
        .shape()
        .iter()
        .zip(field.shape())
        .all(|(&v, &f)| v == f || v == 1);
    if !compatible {
        return Err(mismatch());
    }

    let reference = reference.broadcast(field.raw_dim()).ok_or_else(mismatch)?;
    Ok(field / &reference)
}

/// Far-field variant: divide only when the vacuum reference carries signal.
///
/// Far-field monitors of the vacuum run can be identically zero (e.g. a
/// component the plane wave does not have); the field is then returned as-is.
pub fn normalize_far_field(
    field: &ComplexField,
    vacuum: &ComplexField,
) -> Result<ComplexField, ReduceError> {
    let empty = vacuum.iter().all(|v: &Complex64| v.norm() < FAR_FIELD_ZERO);
    if empty {
        log::debug!("Far-field vacuum reference is zero; skipping normalisation");
        return Ok(field.clone());
    }
    normalize(field, vacuum)
}
