//! Reduction of a stored session into normalised and Braunbek fields.
//!
//! The [`Analyzer`] owns the metadata of both runs and resolves every query
//! (component, wavelength, observation plane) into dataset loads followed by
//! the `semp-core` pipeline:
//!
//! 1. resolve the wavelength index and, optionally, the observation plane,
//! 2. divide by the vacuum reference (x components by the vacuum `z`
//!    component of the same field),
//! 3. for Braunbek fields, subtract the geometry's incident-field step.

use std::f64::consts::PI;

use ndarray::{Array1, Axis, Ix1};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use semp_core::reduce::{
    braunbek_field, normalize, normalize_far_field, observation_index, subtract_incident,
    BraunbekPair, ReduceError,
};
use semp_core::solver::AnalyticSolver;
use semp_core::types::{ComplexField, FieldComponent, Geometry, Polarization};

use crate::export::BraunbekExport;
use crate::metadata::RunMetadata;
use crate::store::{FieldSource, Namespace};
use crate::StoreError;

/// Components compared against an analytic solution.
pub const COMPARED_COMPONENTS: [FieldComponent; 4] = [
    FieldComponent::Ez,
    FieldComponent::Hz,
    FieldComponent::Ey,
    FieldComponent::Hy,
];

/// Agreement tolerance on the mean absolute difference.
pub const DEFAULT_ATOL: f64 = 0.02;

/// Far-field monitor line, centred on the edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FarFieldGrid {
    /// Width of the monitor line (µm).
    pub width: f64,
    /// Number of samples across it.
    pub npts: usize,
}

/// Analysis parameters of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Distance of the observation plane below the wafer (µm).
    pub obs_distance: f64,
    /// Wafer thickness (µm).
    pub wafer_thick: f64,
    /// Grid resolution of the run (points per µm).
    pub resolution: f64,
    pub geometry: Geometry,
    pub far_field: Option<FarFieldGrid>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            obs_distance: 0.0,
            wafer_thick: 1.0,
            resolution: 30.0,
            geometry: Geometry::default(),
            far_field: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |msg: String| Err(StoreError::InvalidConfig(msg));
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return invalid(format!("resolution must be positive, got {}", self.resolution));
        }
        if !(self.wafer_thick.is_finite() && self.wafer_thick >= 0.0) {
            return invalid(format!(
                "wafer_thick must be non-negative, got {}",
                self.wafer_thick
            ));
        }
        if !self.obs_distance.is_finite() {
            return invalid(format!("obs_distance must be finite, got {}", self.obs_distance));
        }
        if let Geometry::Gap { gap_width, .. } = self.geometry {
            if !(gap_width.is_finite() && gap_width > 0.0) {
                return invalid(format!("gap_width must be positive, got {gap_width}"));
            }
        }
        if let Some(grid) = self.far_field {
            if grid.npts == 0 || !(grid.width > 0.0) {
                return invalid("far-field grid needs a positive width and npts".into());
            }
        }
        Ok(())
    }

    /// Observation plane on the propagation axis, measured from the wafer centre.
    pub fn observation_plane(&self) -> f64 {
        self.obs_distance + 0.5 * self.wafer_thick
    }
}

/// Far-field samples with their transverse coordinates.
#[derive(Debug, Clone)]
pub struct FarFieldSlice {
    pub y: Array1<f64>,
    pub field: Array1<Complex64>,
}

/// Mean absolute differences between a stored run and an analytic solution.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub method: String,
    pub wavelength: f64,
    /// Observation plane the solution was evaluated at (µm).
    pub x: f64,
    pub braunbek: bool,
    pub ez: f64,
    pub hz: f64,
    pub ey: f64,
    pub hy: f64,
}

impl ComparisonReport {
    pub fn max_difference(&self) -> f64 {
        self.ez.max(self.hz).max(self.ey).max(self.hy)
    }

    pub fn passes(&self, atol: f64) -> bool {
        self.max_difference() < atol
    }
}

/// Reduces the stored fields of one session.
pub struct Analyzer<S: FieldSource> {
    store: S,
    config: AnalyzerConfig,
    run: RunMetadata,
    vacuum: RunMetadata,
}

impl<S: FieldSource> Analyzer<S> {
    /// Load the metadata of both runs; the run's `yy` is shifted so the edge
    /// sits at `y = 0`.
    pub fn new(store: S, config: AnalyzerConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let run = store
            .load_metadata(Namespace::Run)?
            .with_y_offset(config.geometry.edge_y());
        let vacuum = store.load_metadata(Namespace::Vacuum)?;
        log::info!(
            "Analyzer: {} wavelengths, {} x {} samples, observation plane at x = {} µm",
            run.waves.len(),
            run.xx.len(),
            run.yy.len(),
            config.observation_plane()
        );
        Ok(Self {
            store,
            config,
            run,
            vacuum,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.run
    }

    /// Transverse coordinates with the edge at zero (µm).
    pub fn yy(&self) -> &Array1<f64> {
        self.run.yy.values()
    }

    /// Index of the propagation-axis sample nearest `obs_x`, or the configured
    /// observation plane when `None`.
    pub fn observation_index(&self, obs_x: Option<f64>) -> usize {
        let location = obs_x.unwrap_or_else(|| self.config.observation_plane());
        observation_index(&self.run.xx, location, self.config.resolution)
    }

    fn metadata_for(&self, ns: Namespace) -> &RunMetadata {
        match ns {
            Namespace::Run => &self.run,
            Namespace::Vacuum => &self.vacuum,
        }
    }

    /// Load a raw component, sliced at propagation index `xind` when given.
    pub fn load_field(
        &self,
        component: FieldComponent,
        wave: Option<f64>,
        xind: Option<usize>,
        ns: Namespace,
    ) -> Result<ComplexField, StoreError> {
        let wind = self.metadata_for(ns).waves.index_of(wave)?;
        let field =
            self.store
                .load_component(ns, component.polarization(), component, wind)?;
        match xind {
            None => Ok(field),
            Some(index) => {
                let len = field.shape().first().copied().unwrap_or(0);
                if index >= len {
                    return Err(StoreError::IndexOutOfRange { index, len });
                }
                Ok(field.index_axis(Axis(0), index).to_owned())
            }
        }
    }

    /// Load a component normalised by the vacuum run; with `braunbek`, the
    /// incident step is removed from all but the x components.
    pub fn normalized_field(
        &self,
        component: FieldComponent,
        wave: Option<f64>,
        xind: Option<usize>,
        braunbek: bool,
    ) -> Result<ComplexField, StoreError> {
        let field = self.load_field(component, wave, xind, Namespace::Run)?;
        let vacuum = self.load_field(
            component.vacuum_reference(),
            wave,
            xind,
            Namespace::Vacuum,
        )?;
        let normalized = normalize(&field, &vacuum)?;

        if braunbek && !component.is_longitudinal() {
            let step = self.config.geometry.incident_step();
            Ok(subtract_incident(&normalized, self.run.yy.view(), step)?)
        } else {
            Ok(normalized)
        }
    }

    fn normalized_slice(
        &self,
        component: FieldComponent,
        wave: Option<f64>,
        xind: usize,
        braunbek: bool,
    ) -> Result<Array1<Complex64>, StoreError> {
        let field = self.normalized_field(component, wave, Some(xind), braunbek)?;
        let shape = field.shape().to_vec();
        field.into_dimensionality::<Ix1>().map_err(|_| {
            StoreError::InvalidConfig(format!(
                "{component} at the observation plane has shape {shape:?}; expected a 1-D slice"
            ))
        })
    }

    /// Braunbek fields of both polarisations at the observation plane.
    pub fn collect_braunbek(&self, wave: Option<f64>) -> Result<BraunbekExport, StoreError> {
        let xind = self.observation_index(None);
        let wind = self.run.waves.index_of(wave)?;
        let wavelength = self.run.waves.get(wind).unwrap_or_default();
        let y = self.run.yy.view();

        let reduce = |pol: Polarization| -> Result<Array1<Complex64>, StoreError> {
            let pair = BraunbekPair::for_polarization(pol);
            let primary = self.normalized_field(pair.primary, wave, Some(xind), true)?;
            let companion = self.normalized_field(pair.companion, wave, Some(xind), true)?;
            let avg = braunbek_field(&primary, &companion, y, None)?;
            avg.into_dimensionality::<Ix1>().map_err(|_| {
                StoreError::InvalidConfig(format!(
                    "{pol}-polarisation Braunbek field is not a 1-D slice"
                ))
            })
        };

        let s = reduce(Polarization::S)?;
        let p = reduce(Polarization::P)?;
        log::debug!("Collected Braunbek fields at λ = {wavelength} µm (x index {xind})");
        Ok(BraunbekExport {
            wavelength,
            s,
            p,
            coords: self.run.yy.values().clone(),
        })
    }

    /// [`collect_braunbek`](Self::collect_braunbek) for several wavelengths in
    /// parallel; results are in input order.
    pub fn collect_braunbek_many(&self, waves: &[f64]) -> Result<Vec<BraunbekExport>, StoreError> {
        waves
            .par_iter()
            .map(|&wave| self.collect_braunbek(Some(wave)))
            .collect()
    }

    /// Mean absolute difference of `Ez`, `Hz`, `Ey`, `Hy` between the stored
    /// run and `solver`, at the observation plane and the solver's wavelength.
    pub fn compare_to(
        &self,
        solver: &dyn AnalyticSolver,
        braunbek: bool,
    ) -> Result<ComparisonReport, StoreError> {
        let wave = Some(solver.wavelength());
        let xind = self.observation_index(None);
        let x = self.run.xx.get(xind).ok_or(StoreError::IndexOutOfRange {
            index: xind,
            len: self.run.xx.len(),
        })?;
        let y = self.run.yy.values() - self.config.geometry.solver_origin();
        let analytic = solver.solve_slice(x, y.view(), braunbek)?;

        let mut diffs = [0.0; 4];
        for (diff, component) in diffs.iter_mut().zip(COMPARED_COMPONENTS) {
            let stored = self.normalized_slice(component, wave, xind, braunbek)?;
            *diff = mean_abs_difference(&stored, analytic.get(component))?;
        }
        let [ez, hz, ey, hy] = diffs;

        let report = ComparisonReport {
            method: solver.method_name().to_string(),
            wavelength: solver.wavelength(),
            x,
            braunbek,
            ez,
            hz,
            ey,
            hy,
        };
        log::info!(
            "{} λ={} x={:.3} braunbek={}: Ez {:.2e}, Hz {:.2e}, Ey {:.2e}, Hy {:.2e}",
            report.method,
            report.wavelength,
            x,
            braunbek,
            ez,
            hz,
            ey,
            hy
        );
        Ok(report)
    }

    /// Transverse coordinates of the far-field monitor line.
    pub fn far_field_coords(&self) -> Option<Array1<f64>> {
        self.config.far_field.map(|grid| {
            Array1::linspace(-0.5, 0.5, grid.npts) * grid.width + self.config.geometry.edge_y()
        })
    }

    /// Far-field samples of a component, normalised by the vacuum far field
    /// unless that is identically zero.
    pub fn far_field(
        &self,
        component: FieldComponent,
        wave: Option<f64>,
        braunbek: bool,
    ) -> Result<FarFieldSlice, StoreError> {
        let y = self.far_field_coords().ok_or_else(|| {
            StoreError::InvalidConfig("far-field grid is not configured".into())
        })?;
        let pol = component.polarization();
        let wind = self.run.waves.index_of(wave)?;
        let vac_wind = self.vacuum.waves.index_of(wave)?;

        let field = self
            .store
            .load_far_field(Namespace::Run, pol, component, wind)?
            .into_dyn();
        let vacuum = self
            .store
            .load_far_field(Namespace::Vacuum, pol, component, vac_wind)?
            .into_dyn();
        let mut field = normalize_far_field(&field, &vacuum)?;
        if braunbek {
            field = subtract_incident(&field, y.view(), self.config.geometry.incident_step())?;
        }
        let field = field
            .into_dimensionality::<Ix1>()
            .map_err(|e| StoreError::Npz(format!("far field is not 1-D: {e}")))?;
        Ok(FarFieldSlice { y, field })
    }
}

/// Mean of `|a - b|` over matching samples; the slices must be equally long.
pub fn mean_abs_difference(
    a: &Array1<Complex64>,
    b: &Array1<Complex64>,
) -> Result<f64, ReduceError> {
    if a.len() != b.len() {
        return Err(ReduceError::LengthMismatch {
            expected: b.len(),
            found: a.len(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    Ok(a.iter().zip(b.iter()).map(|(p, q)| (p - q).norm()).sum::<f64>() / a.len() as f64)
}

/// Phase of a unit plane wave travelling along `x`, as recorded by a vacuum run.
pub fn plane_wave_phase(wavelength: f64, x: f64) -> Complex64 {
    Complex64::from_polar(1.0, 2.0 * PI / wavelength * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_plane_offset() {
        let cfg = AnalyzerConfig {
            obs_distance: 3.0,
            wafer_thick: 2.0,
            ..Default::default()
        };
        assert_eq!(cfg.observation_plane(), 4.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        let bad = AnalyzerConfig {
            resolution: 0.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(StoreError::InvalidConfig(_))));
        let bad_gap = AnalyzerConfig {
            geometry: Geometry::Gap {
                edge_y: 0.0,
                gap_width: -1.0,
            },
            ..Default::default()
        };
        assert!(bad_gap.validate().is_err());
    }

    #[test]
    fn test_report_tolerance() {
        let report = ComparisonReport {
            method: "test".into(),
            wavelength: 0.641,
            x: 0.5,
            braunbek: false,
            ez: 0.001,
            hz: 0.019,
            ey: 0.005,
            hy: 0.0,
        };
        assert_eq!(report.max_difference(), 0.019);
        assert!(report.passes(DEFAULT_ATOL));
        assert!(!report.passes(0.01));
    }

    #[test]
    fn test_mean_abs_difference_requires_equal_lengths() {
        let a = Array1::from_elem(4, Complex64::new(1.0, 0.0));
        let b = Array1::from_elem(4, Complex64::new(0.0, 1.0));
        let d = mean_abs_difference(&a, &b).unwrap();
        assert!((d - 2f64.sqrt()).abs() < 1e-15);

        let short = Array1::from_elem(3, Complex64::new(1.0, 0.0));
        assert!(matches!(
            mean_abs_difference(&short, &b),
            Err(ReduceError::LengthMismatch {
                expected: 4,
                found: 3
            })
        ));
    }
}
