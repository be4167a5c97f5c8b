//! Coordinates and wavelengths recorded with a run.

use ndarray::Array1;
use semp_core::reduce::WavelengthSet;
use semp_core::types::GridAxis;

/// Coordinate axes (µm) and wavelengths shared by every dataset of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// Propagation axis.
    pub xx: GridAxis,
    /// Transverse axis.
    pub yy: GridAxis,
    /// Out-of-plane axis; empty for 2-D runs.
    pub zz: Array1<f64>,
    pub waves: WavelengthSet,
}

impl RunMetadata {
    pub fn new(xx: GridAxis, yy: GridAxis, zz: Array1<f64>, waves: WavelengthSet) -> Self {
        Self { xx, yy, zz, waves }
    }

    /// The same metadata with the transverse axis moved by `edge_y`.
    pub fn with_y_offset(mut self, edge_y: f64) -> Self {
        self.yy = self.yy.shifted(edge_y);
        self
    }

    pub fn is_2d(&self) -> bool {
        self.zz.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_y_offset_leaves_other_axes() {
        let meta = RunMetadata::new(
            GridAxis::new(array![0.0, 0.5]).unwrap(),
            GridAxis::new(array![-1.0, 0.0, 1.0]).unwrap(),
            Array1::zeros(0),
            WavelengthSet::new(vec![0.641]),
        );
        assert!(meta.is_2d());

        let shifted = meta.clone().with_y_offset(1.5);
        assert_eq!(shifted.yy.view(), array![0.5, 1.5, 2.5].view());
        assert_eq!(shifted.xx, meta.xx);
        assert_eq!(shifted.waves, meta.waves);
    }
}
