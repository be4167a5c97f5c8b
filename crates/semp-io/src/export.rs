//! Braunbek boundary fields handed to the DIFFRAQ propagator.
//!
//! DIFFRAQ works in SI units, so wavelengths and coordinates are converted
//! from µm to metres here. Datasets per wavelength are keyed by the
//! wavelength in whole nanometres:
//!
//! - `waves`: wavelengths (m)
//! - `{nm}_s.r`, `{nm}_s.i`, `{nm}_p.r`, `{nm}_p.i`: Braunbek fields
//! - `{nm}_x`: transverse coordinates (m)

use std::fs::File;
use std::path::Path;

use ndarray::Array1;
use ndarray_npy::NpzWriter;
use num_complex::Complex64;

use crate::npz::npz_error;
use crate::StoreError;

/// Micrometres to metres.
pub const MICRON_TO_METRE: f64 = 1e-6;

/// Braunbek fields of both polarisations for one wavelength.
#[derive(Debug, Clone)]
pub struct BraunbekExport {
    /// Wavelength (µm).
    pub wavelength: f64,
    pub s: Array1<Complex64>,
    pub p: Array1<Complex64>,
    /// Transverse coordinates (µm), edge at zero.
    pub coords: Array1<f64>,
}

impl BraunbekExport {
    /// Dataset prefix: the wavelength in whole nanometres.
    pub fn key(&self) -> String {
        format!("{:.0}", self.wavelength * 1e3)
    }
}

/// Write the Braunbek fields of several wavelengths into one archive.
pub fn write_diffraq(path: &Path, exports: &[BraunbekExport]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut npz = NpzWriter::new(File::create(path)?);

    let waves: Array1<f64> = exports
        .iter()
        .map(|e| e.wavelength * MICRON_TO_METRE)
        .collect();
    npz.add_array("waves", &waves)
        .map_err(|e| npz_error(path, e))?;

    for export in exports {
        let key = export.key();
        for (pol, field) in [("s", &export.s), ("p", &export.p)] {
            npz.add_array(format!("{key}_{pol}.r"), &field.mapv(|v| v.re))
                .map_err(|e| npz_error(path, e))?;
            npz.add_array(format!("{key}_{pol}.i"), &field.mapv(|v| v.im))
                .map_err(|e| npz_error(path, e))?;
        }
        npz.add_array(format!("{key}_x"), &(&export.coords * MICRON_TO_METRE))
            .map_err(|e| npz_error(path, e))?;
    }

    npz.finish().map_err(|e| npz_error(path, e))?;
    log::info!(
        "Wrote Braunbek fields for {} wavelength(s) to {}",
        exports.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavelength_key() {
        let export = BraunbekExport {
            wavelength: 0.641,
            s: Array1::zeros(0),
            p: Array1::zeros(0),
            coords: Array1::zeros(0),
        };
        assert_eq!(export.key(), "641");
        let export = BraunbekExport {
            wavelength: 0.7251,
            ..export
        };
        assert_eq!(export.key(), "725");
    }
}
