//! Observation-plane and wavelength index lookup.

use serde::{Deserialize, Serialize};

use super::ReduceError;
use crate::types::GridAxis;

/// Largest accepted relative distance between a requested and a recorded wavelength.
pub const WAVELENGTH_TOLERANCE: f64 = 0.01;

/// Index of the sample nearest to `location` on a staggered (Yee) grid.
///
/// Field components live half a cell away from the coordinate array, so the
/// axis is shifted by `0.5 / resolution` before the nearest match is taken.
/// Ties resolve to the lower index.
pub fn observation_index(axis: &GridAxis, location: f64, resolution: f64) -> usize {
    let half_cell = 0.5 / resolution;
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &x) in axis.view().iter().enumerate() {
        let dist = (x - half_cell - location).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// The ordered wavelengths recorded by one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthSet {
    waves: Vec<f64>,
}

impl WavelengthSet {
    pub fn new(waves: Vec<f64>) -> Self {
        Self { waves }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Wavelength stored at `index`.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.waves.get(index).copied()
    }

    /// Resolve a requested wavelength to its slice index.
    ///
    /// `None` selects the first wavelength. A request further than
    /// [`WAVELENGTH_TOLERANCE`] (relative) from every recorded wavelength is
    /// an error; the data of a neighbouring wavelength is never substituted.
    pub fn index_of(&self, wave: Option<f64>) -> Result<usize, ReduceError> {
        if self.waves.is_empty() {
            return Err(ReduceError::EmptyWavelengthSet);
        }
        let Some(wave) = wave else {
            return Ok(0);
        };

        let (index, nearest) = self
            .waves
            .iter()
            .copied()
            .enumerate()
            .fold((0, self.waves[0]), |(bi, bw), (i, w)| {
                if (w - wave).abs() < (bw - wave).abs() {
                    (i, w)
                } else {
                    (bi, bw)
                }
            });

        let relative_error = (nearest - wave).abs() / wave.abs();
        if relative_error.is_nan() || relative_error > WAVELENGTH_TOLERANCE {
            log::warn!(
                "Requested wavelength {wave} has no recorded match (nearest {nearest}, rel. err {relative_error:.3e})"
            );
            return Err(ReduceError::WavelengthMismatch {
                requested: wave,
                nearest,
                relative_error,
            });
        }

        Ok(index)
    }
}

impl From<Vec<f64>> for WavelengthSet {
    fn from(waves: Vec<f64>) -> Self {
        Self::new(waves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_index_applies_half_cell() {
        // resolution 10 → half cell 0.05; sample 3 sits at 0.3 - 0.05 = 0.25
        let axis = GridAxis::linspace(0.0, 1.0, 11).unwrap();
        assert_eq!(observation_index(&axis, 0.25, 10.0), 3);
        assert_eq!(observation_index(&axis, 0.26, 10.0), 3);
        // Beyond either end clamps to the boundary samples
        assert_eq!(observation_index(&axis, -5.0, 10.0), 0);
        assert_eq!(observation_index(&axis, 5.0, 10.0), 10);
    }

    #[test]
    fn test_wavelength_default_index() {
        let set = WavelengthSet::new(vec![0.641, 0.725]);
        assert_eq!(set.index_of(None).unwrap(), 0);
        assert_eq!(set.index_of(Some(0.725)).unwrap(), 1);
    }

    #[test]
    fn test_wavelength_tolerance_boundary() {
        let set = WavelengthSet::new(vec![0.641, 0.725]);
        // 0.9% away: accepted
        assert_eq!(set.index_of(Some(0.641 * 1.009)).unwrap(), 0);
        // 1.5% away: rejected
        let err = set.index_of(Some(0.725 * 1.015)).unwrap_err();
        match err {
            ReduceError::WavelengthMismatch { nearest, .. } => assert_eq!(nearest, 0.725),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_wavelength_set() {
        let set = WavelengthSet::new(vec![]);
        assert!(matches!(set.index_of(None), Err(ReduceError::EmptyWavelengthSet)));
    }
}
