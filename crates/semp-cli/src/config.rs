//! TOML configuration for analysis jobs.

use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use semp_core::solver::{AnalyticSolver, GapModeSolver, GapParams, HalfPlaneParams, HalfPlaneSolver};
use semp_io::analyzer::DEFAULT_ATOL;
use semp_io::AnalyzerConfig;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Stored session; required by `compare` and `collect`.
    pub run: Option<RunConfig>,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub slice: SliceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Location of a stored session.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding the session's `.npz` archives.
    pub directory: PathBuf,
}

/// Which closed-form solution to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Thin half-plane (knife edge).
    Sommerfeld,
    /// Gap in a thick screen.
    Thick,
}

/// Analytic solver parameters; one solver is built per wavelength.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    #[serde(default = "default_kind")]
    pub kind: SolverKind,
    /// Wavelengths (µm).
    #[serde(default = "default_wavelengths")]
    pub wavelengths: Vec<f64>,
    #[serde(default = "default_phi0")]
    pub phi0: f64,
    #[serde(default = "default_wafer_thick")]
    pub wafer_thick: f64,
    #[serde(default = "default_gap_width")]
    pub gap_width: f64,
    #[serde(default)]
    pub mode_limit: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            wavelengths: default_wavelengths(),
            phi0: default_phi0(),
            wafer_thick: default_wafer_thick(),
            gap_width: default_gap_width(),
            mode_limit: None,
        }
    }
}

fn default_kind() -> SolverKind {
    SolverKind::Sommerfeld
}
fn default_wavelengths() -> Vec<f64> {
    vec![0.641, 0.725]
}
fn default_phi0() -> f64 {
    FRAC_PI_2
}
fn default_wafer_thick() -> f64 {
    1.0
}
fn default_gap_width() -> f64 {
    5.0
}

impl SolverConfig {
    /// Build the configured solver for one wavelength.
    pub fn build(&self, wavelength: f64) -> Result<Box<dyn AnalyticSolver>> {
        let solver: Box<dyn AnalyticSolver> = match self.kind {
            SolverKind::Sommerfeld => Box::new(HalfPlaneSolver::new(HalfPlaneParams {
                wavelength,
                phi0: self.phi0,
            })?),
            SolverKind::Thick => Box::new(GapModeSolver::new(GapParams {
                wavelength,
                phi0: self.phi0,
                wafer_thick: self.wafer_thick,
                gap_width: self.gap_width,
                mode_limit: self.mode_limit,
            })?),
        };
        Ok(solver)
    }
}

/// Transverse slices evaluated by the `analytic` command.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceConfig {
    /// Depths (µm) at which to evaluate.
    #[serde(default = "default_slice_x")]
    pub x: Vec<f64>,
    /// Transverse extent `[y_min, y_max]` (µm).
    #[serde(default = "default_y_range")]
    pub y_range: [f64; 2],
    #[serde(default = "default_points")]
    pub points: usize,
    /// Evaluate the Braunbek (scattered-only) field.
    #[serde(default)]
    pub braunbek: bool,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            x: default_slice_x(),
            y_range: default_y_range(),
            points: default_points(),
            braunbek: false,
        }
    }
}

fn default_slice_x() -> Vec<f64> {
    vec![0.5]
}
fn default_y_range() -> [f64; 2] {
    [-5.0, 5.0]
}
fn default_points() -> usize {
    401
}

/// Output configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Agreement tolerance for `compare` (default: 0.02).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Braunbek settings checked by `compare` (default: both).
    #[serde(default = "default_braunbek_flags")]
    pub braunbek: Vec<bool>,
    /// File name of the DIFFRAQ archive written by `collect`.
    #[serde(default = "default_diffraq_file")]
    pub diffraq_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            tolerance: default_tolerance(),
            braunbek: default_braunbek_flags(),
            diffraq_file: default_diffraq_file(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_tolerance() -> f64 {
    DEFAULT_ATOL
}
fn default_braunbek_flags() -> Vec<bool> {
    vec![false, true]
}
fn default_diffraq_file() -> String {
    "braunbek_fields.npz".into()
}

impl JobConfig {
    /// Check values serde cannot: ranges, positivity, solver construction.
    pub fn validate(&self) -> Result<()> {
        if self.solver.wavelengths.is_empty() {
            bail!("[solver] wavelengths must not be empty");
        }
        for &wave in &self.solver.wavelengths {
            self.solver
                .build(wave)
                .with_context(|| format!("[solver] invalid at wavelength {wave}"))?;
        }
        self.analyzer.validate().context("[analyzer] invalid")?;

        let [y_min, y_max] = self.slice.y_range;
        if !(y_min < y_max) {
            bail!("[slice] y_range must be increasing, got [{y_min}, {y_max}]");
        }
        if self.slice.points == 0 {
            bail!("[slice] points must be at least 1");
        }
        if self.slice.x.is_empty() {
            bail!("[slice] x must list at least one depth");
        }
        if !(self.output.tolerance > 0.0) {
            bail!("[output] tolerance must be positive");
        }
        Ok(())
    }

    /// The session directory, or an error naming the command that needs it.
    pub fn run_directory(&self, command: &str) -> Result<&PathBuf> {
        self.run
            .as_ref()
            .map(|r| &r.directory)
            .with_context(|| format!("`{command}` requires a [run] section with `directory`"))
    }
}

/// Load, parse and validate a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: JobConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semp_core::types::Geometry;

    #[test]
    fn test_minimal_job_uses_defaults() {
        let job: JobConfig = toml::from_str("").unwrap();
        job.validate().unwrap();
        assert_eq!(job.solver.kind, SolverKind::Sommerfeld);
        assert_eq!(job.solver.wavelengths, vec![0.641, 0.725]);
        assert_eq!(job.analyzer.resolution, 30.0);
        assert_eq!(job.output.tolerance, 0.02);
        assert!(job.run.is_none());
        assert!(job.run_directory("compare").is_err());
    }

    #[test]
    fn test_gap_job() {
        let job: JobConfig = toml::from_str(
            r#"
            [run]
            directory = "sessions/thick"

            [analyzer]
            obs_distance = -0.5
            wafer_thick = 2.0
            resolution = 40.0
            geometry = { kind = "gap", gap_width = 8.0 }

            [solver]
            kind = "thick"
            wavelengths = [0.641]
            wafer_thick = 2.0
            gap_width = 8.0
            mode_limit = 40

            [output]
            braunbek = [false]
            "#,
        )
        .unwrap();
        job.validate().unwrap();
        assert_eq!(
            job.analyzer.geometry,
            Geometry::Gap {
                edge_y: 0.0,
                gap_width: 8.0
            }
        );
        assert_eq!(job.solver.kind, SolverKind::Thick);
        assert_eq!(job.solver.mode_limit, Some(40));
        assert_eq!(job.run_directory("collect").unwrap(), &PathBuf::from("sessions/thick"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for text in [
            "[solver]\nwavelenght = [0.641]\n",
            "[analyzer]\nobs_dist = 1.0\n",
            "[slice]\npoints = 10\nstep = 0.1\n",
            "[extra]\n",
        ] {
            assert!(toml::from_str::<JobConfig>(text).is_err(), "accepted: {text}");
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let job: JobConfig = toml::from_str("[solver]\nwavelengths = [-0.5]\n").unwrap();
        assert!(job.validate().is_err());
        let job: JobConfig = toml::from_str("[slice]\ny_range = [1.0, -1.0]\n").unwrap();
        assert!(job.validate().is_err());
    }
}
