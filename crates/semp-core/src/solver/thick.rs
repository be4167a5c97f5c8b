//! Waveguide-mode solution for a plane wave passing through a gap in a thick
//! perfectly conducting screen.
//!
//! Inside a gap of width `W` the field is expanded in parallel-plate modes
//! with transverse wavenumber $k_y = n\pi/W$ and propagation constant
//! $\beta = \sqrt{k^2 - k_y^2}$, imaginary for evanescent modes. The
//! incident wave excites
//!
//! - TE modes (s-polarisation: `Ez`, `Hx`, `Hy`) for odd `n`, with amplitude
//!   $B_n = -\frac{2i}{W\beta} H_0 (\cos n\pi - 1)$;
//! - TM modes (p-polarisation: `Hz`, `Ex`, `Ey`) for even `n`, on top of the
//!   `n = 0` plane wave, with amplitude $A_n = -\frac{H_0}{kW/2}(1 + \cos n\pi)$.
//!
//! Depth is measured from the source-side face of the screen,
//! $z = |x| + T/2$, and $H_0 = e^{ikz}$ is the plane-wave reference every
//! component is divided by. Vacuum units are used throughout
//! ($\omega\mu = \omega\varepsilon = k$).
//!
//! The transverse coordinate is centred on the gap; samples with
//! $|y| > W/2$ lie inside the screen and are returned as zero. TE profiles
//! $\sin(k_y y_s)$ are measured from the first queried sample inside the gap,
//! $y_s = y - y_{\min}$, which coincides with the wall only when a sample
//! falls on it. TM profiles use the centred coordinate.

use std::f64::consts::{FRAC_PI_2, PI};

use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{check_angle, check_wavelength, AnalyticSolver, SolverError};
use crate::special::{complex_sqrt, heaviside};
use crate::types::FieldComponents;

/// `|β| / k` below which a mode is reported as sitting at cutoff.
const CUTOFF_WARNING: f64 = 1e-6;

const I: Complex64 = Complex64::new(0.0, 1.0);

/// Parameters of the thick-screen gap solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GapParams {
    /// Wavelength (µm).
    pub wavelength: f64,
    /// Incidence angle (radians). The mode expansion assumes normal incidence.
    pub phi0: f64,
    /// Screen thickness `T` (µm).
    pub wafer_thick: f64,
    /// Gap width `W` (µm).
    pub gap_width: f64,
    /// Overrides the mode count `ceil(2W/λ)` when set.
    pub mode_limit: Option<usize>,
}

impl Default for GapParams {
    fn default() -> Self {
        Self {
            wavelength: 0.641,
            phi0: FRAC_PI_2,
            wafer_thick: 1.0,
            gap_width: 5.0,
            mode_limit: None,
        }
    }
}

/// One parallel-plate mode of the gap.
#[derive(Debug, Clone, Copy)]
struct Mode {
    n: usize,
    ky: f64,
    beta: Complex64,
}

/// Thick-screen gap diffraction solver.
#[derive(Debug, Clone)]
pub struct GapModeSolver {
    params: GapParams,
    k: f64,
    mode_count: usize,
    modes: Vec<Mode>,
}

impl GapModeSolver {
    pub fn new(params: GapParams) -> Result<Self, SolverError> {
        check_wavelength(params.wavelength)?;
        check_angle(params.phi0)?;
        if !(params.gap_width.is_finite() && params.gap_width > 0.0) {
            return Err(SolverError::InvalidParameter(format!(
                "gap width must be positive, got {}",
                params.gap_width
            )));
        }
        if !(params.wafer_thick.is_finite() && params.wafer_thick >= 0.0) {
            return Err(SolverError::InvalidParameter(format!(
                "wafer thickness must be non-negative, got {}",
                params.wafer_thick
            )));
        }
        if (params.phi0 - FRAC_PI_2).abs() > 1e-12 {
            log::warn!(
                "Gap mode expansion assumes normal incidence; phi0 = {} is ignored",
                params.phi0
            );
        }

        let k = 2.0 * PI / params.wavelength;
        let mode_count = params
            .mode_limit
            .unwrap_or_else(|| (2.0 * params.gap_width / params.wavelength).ceil() as usize);
        let modes = build_modes(k, params.gap_width, mode_count)?;

        log::debug!(
            "Gap solver: W={} µm, T={} µm, λ={} µm, {} modes",
            params.gap_width,
            params.wafer_thick,
            params.wavelength,
            mode_count
        );

        Ok(Self {
            params,
            k,
            mode_count,
            modes,
        })
    }

    /// Rebuild the solver with the mode sum truncated at `limit`.
    pub fn with_mode_limit(self, limit: usize) -> Result<Self, SolverError> {
        Self::new(GapParams {
            mode_limit: Some(limit),
            ..self.params
        })
    }

    /// Exclusive upper bound `N` of the mode index; modes `1..N` are summed.
    pub fn mode_count(&self) -> usize {
        self.mode_count
    }

    pub fn params(&self) -> &GapParams {
        &self.params
    }

    /// Fields at centred position `y`; `ys` is the TE profile coordinate.
    fn evaluate_inside(&self, z: f64, y: f64, ys: f64, braunbek: bool) -> [Complex64; 6] {
        let k = self.k;
        let w = self.params.gap_width;
        let h0 = Complex64::from_polar(1.0, k * z);

        let mut ez = Complex64::new(0.0, 0.0);
        let mut hx = Complex64::new(0.0, 0.0);
        let mut hy = Complex64::new(0.0, 0.0);
        let mut hz = h0;
        let mut ey = h0;
        let mut ex = Complex64::new(0.0, 0.0);

        for mode in &self.modes {
            let Mode { n, ky, beta } = *mode;
            if n % 2 == 1 {
                // cos(nπ) − 1 = −2
                let b = -2.0 * I / (w * beta) * h0 * -2.0;
                let prop = (I * beta * z).exp();
                let (s, c) = (ky * ys).sin_cos();
                ez += I * k / ky * b * s * prop;
                hy += -I * beta / ky * b * s * prop;
                hx += b * c * prop;
            } else {
                // 1 + cos(nπ) = 2
                let a = -h0 / (0.5 * k * w) * 2.0;
                let arg = (n + 1) as f64 * PI / w * y - n as f64 * FRAC_PI_2;
                let (s, c) = arg.sin_cos();
                hz += I * a * k / ky * c;
                ey += I * a * beta / ky * c;
                ex += -I * a * s;
            }
        }

        let mut out = [ex, ey, ez, hx, hy, hz].map(|v| v / h0);
        out[4] *= Complex64::from_polar(1.0, PI);

        if braunbek {
            let step = heaviside(y + 0.5 * w, 1.0) * heaviside(0.5 * w - y, 1.0);
            for idx in [1, 2, 4, 5] {
                out[idx] -= step;
            }
        }
        out
    }
}

fn build_modes(k: f64, width: f64, mode_count: usize) -> Result<Vec<Mode>, SolverError> {
    let mut modes = Vec::with_capacity(mode_count.saturating_sub(1));
    for n in 1..mode_count {
        let ky = n as f64 * PI / width;
        let beta = complex_sqrt(k * k - ky * ky);
        if beta.norm() == 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "mode {n} sits exactly at cutoff (W = {width} µm)"
            )));
        }
        if beta.norm() < CUTOFF_WARNING * k {
            log::warn!("Mode {n} is near cutoff: beta = {beta:.3e}");
        }
        modes.push(Mode { n, ky, beta });
    }
    Ok(modes)
}

impl AnalyticSolver for GapModeSolver {
    fn solve_slice(
        &self,
        x: f64,
        y: ArrayView1<'_, f64>,
        braunbek: bool,
    ) -> Result<FieldComponents, SolverError> {
        if !x.is_finite() {
            return Err(SolverError::InvalidParameter(format!(
                "observation depth must be finite, got {x}"
            )));
        }
        let z = x.abs() + 0.5 * self.params.wafer_thick;
        let half = 0.5 * self.params.gap_width;

        let mut out = FieldComponents::zeros(y.len());
        let Some(y_min) = y
            .iter()
            .copied()
            .filter(|yv| yv.abs() <= half)
            .reduce(f64::min)
        else {
            return Ok(out);
        };

        for (i, &yv) in y.iter().enumerate() {
            if yv.abs() > half {
                continue;
            }
            let [ex, ey, ez, hx, hy, hz] = self.evaluate_inside(z, yv, yv - y_min, braunbek);
            out.ex[i] = ex;
            out.ey[i] = ey;
            out.ez[i] = ez;
            out.hx[i] = hx;
            out.hy[i] = hy;
            out.hz[i] = hz;
        }
        Ok(out)
    }

    fn wavelength(&self) -> f64 {
        self.params.wavelength
    }

    fn method_name(&self) -> &str {
        "Thick-screen gap modes"
    }
}

/// Transverse sample positions spanning the gap, `n` points from wall to wall.
pub fn gap_slice(gap_width: f64, n: usize) -> Array1<f64> {
    Array1::linspace(-0.5 * gap_width, 0.5 * gap_width, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_default_mode_count() {
        let solver = GapModeSolver::new(GapParams::default()).unwrap();
        // ceil(10 / 0.641) = 16
        assert_eq!(solver.mode_count(), 16);
        assert_eq!(solver.modes.len(), 15);
    }

    #[test]
    fn test_mode_limit_overrides_default() {
        let solver = GapModeSolver::new(GapParams::default())
            .unwrap()
            .with_mode_limit(40)
            .unwrap();
        assert_eq!(solver.mode_count(), 40);
        assert_eq!(solver.params().mode_limit, Some(40));
        assert_eq!(solver.params().gap_width, 5.0);
    }

    #[test]
    fn test_outside_gap_is_zero() {
        let solver = GapModeSolver::new(GapParams::default()).unwrap();
        let y = array![-4.0, -2.5001, 0.0, 2.5001, 7.0];
        let f = solver.solve_slice(0.0, y.view(), false).unwrap();
        for i in [0, 1, 3, 4] {
            for c in [f.ex[i], f.ey[i], f.ez[i], f.hx[i], f.hy[i], f.hz[i]] {
                assert_eq!(c, Complex64::new(0.0, 0.0));
            }
        }
        assert!(f.hz[2].norm() > 0.0);
    }

    #[test]
    fn test_empty_mode_sum_is_plane_wave() {
        let params = GapParams {
            gap_width: 0.2,
            ..Default::default()
        };
        let solver = GapModeSolver::new(params).unwrap();
        // ceil(0.4 / 0.641) = 1: no modes
        assert_eq!(solver.mode_count(), 1);

        let y = array![-0.05, 0.0, 0.07];
        let f = solver.solve_slice(0.3, y.view(), false).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(f.hz[i].re, 1.0, epsilon = 1e-14);
            assert_abs_diff_eq!(f.ey[i].re, 1.0, epsilon = 1e-14);
            assert_eq!(f.ez[i], Complex64::new(0.0, 0.0));
            assert_eq!(f.ex[i], Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_braunbek_removes_unit_step_inside_gap() {
        let solver = GapModeSolver::new(GapParams::default()).unwrap();
        let y = array![-1.0, 0.5, 2.0, 3.0];
        let raw = solver.solve_slice(1.0, y.view(), false).unwrap();
        let scat = solver.solve_slice(1.0, y.view(), true).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!((raw.ez[i] - scat.ez[i]).re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!((raw.hy[i] - scat.hy[i]).re, 1.0, epsilon = 1e-12);
            assert_eq!(raw.hx[i], scat.hx[i]);
            assert_eq!(raw.ex[i], scat.ex[i]);
        }
        assert_eq!(scat.ez[3], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        for params in [
            GapParams {
                gap_width: 0.0,
                ..Default::default()
            },
            GapParams {
                wafer_thick: -1.0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                GapModeSolver::new(params),
                Err(SolverError::InvalidParameter(_))
            ));
        }
    }
}
