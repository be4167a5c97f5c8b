//! Core types shared across SEMP.
//!
//! This module defines the vocabulary of the reduction pipeline: which field
//! components exist, how they group into polarisations, the coordinate axes
//! of a run, and the screen geometries whose incident field is subtracted to
//! form a Braunbek field.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayD, ArrayView1};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::reduce::ReduceError;
use crate::special::heaviside;

/// A dense complex field sampled over one or more spatial axes.
pub type ComplexField = ArrayD<Complex64>;

/// Polarisation of the incident plane wave relative to the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    /// Transverse electric, driven by `Ez`.
    S,
    /// Transverse magnetic, driven by `Hz`.
    P,
}

impl Polarization {
    pub const ALL: [Polarization; 2] = [Polarization::S, Polarization::P];

    /// Phase of the lattice mirror symmetry used by the FDTD run.
    pub fn symmetry_phase(self) -> f64 {
        match self {
            Polarization::S => 1.0,
            Polarization::P => -1.0,
        }
    }

    /// The driven component.
    pub fn primary(self) -> FieldComponent {
        match self {
            Polarization::S => FieldComponent::Ez,
            Polarization::P => FieldComponent::Hz,
        }
    }

    /// The derivative component averaged with [`primary`](Self::primary)
    /// to form the Braunbek field.
    pub fn braunbek_companion(self) -> FieldComponent {
        match self {
            Polarization::S => FieldComponent::Hy,
            Polarization::P => FieldComponent::Ey,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Polarization::S => "s",
            Polarization::P => "p",
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Polarization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" => Ok(Polarization::S),
            "p" => Ok(Polarization::P),
            other => Err(format!("Unknown polarization '{other}'. Valid values: s, p")),
        }
    }
}

/// One of the six Cartesian field components recorded by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
}

impl FieldComponent {
    pub const ALL: [FieldComponent; 6] = [
        FieldComponent::Ex,
        FieldComponent::Ey,
        FieldComponent::Ez,
        FieldComponent::Hx,
        FieldComponent::Hy,
        FieldComponent::Hz,
    ];

    /// Lowercase storage key (`"ez"`, `"hy"`, ...).
    pub fn key(self) -> &'static str {
        match self {
            FieldComponent::Ex => "ex",
            FieldComponent::Ey => "ey",
            FieldComponent::Ez => "ez",
            FieldComponent::Hx => "hx",
            FieldComponent::Hy => "hy",
            FieldComponent::Hz => "hz",
        }
    }

    /// Capitalised key used by far-field datasets (`"Ez"`).
    pub fn label(self) -> &'static str {
        match self {
            FieldComponent::Ex => "Ex",
            FieldComponent::Ey => "Ey",
            FieldComponent::Ez => "Ez",
            FieldComponent::Hx => "Hx",
            FieldComponent::Hy => "Hy",
            FieldComponent::Hz => "Hz",
        }
    }

    /// Polarisation run in which this component is recorded.
    pub fn polarization(self) -> Polarization {
        match self {
            FieldComponent::Ez | FieldComponent::Hx | FieldComponent::Hy => Polarization::S,
            FieldComponent::Hz | FieldComponent::Ex | FieldComponent::Ey => Polarization::P,
        }
    }

    /// Component of the vacuum run used to normalise this one.
    ///
    /// The vacuum run does not record the propagation-axis components, so
    /// `Ex` and `Hx` are normalised by `Ez` and `Hz`.
    pub fn vacuum_reference(self) -> FieldComponent {
        match self {
            FieldComponent::Ex => FieldComponent::Ez,
            FieldComponent::Hx => FieldComponent::Hz,
            other => other,
        }
    }

    /// Whether the component points along the propagation (depth) axis.
    pub fn is_longitudinal(self) -> bool {
        matches!(self, FieldComponent::Ex | FieldComponent::Hx)
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldComponent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldComponent::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("Unknown field component '{s}'. Valid values: ex, ey, ez, hx, hy, hz")
            })
    }
}

/// All six field components evaluated on a transverse slice.
#[derive(Debug, Clone)]
pub struct FieldComponents {
    pub ex: Array1<Complex64>,
    pub ey: Array1<Complex64>,
    pub ez: Array1<Complex64>,
    pub hx: Array1<Complex64>,
    pub hy: Array1<Complex64>,
    pub hz: Array1<Complex64>,
}

impl FieldComponents {
    /// All-zero components for `n` samples.
    pub fn zeros(n: usize) -> Self {
        Self {
            ex: Array1::zeros(n),
            ey: Array1::zeros(n),
            ez: Array1::zeros(n),
            hx: Array1::zeros(n),
            hy: Array1::zeros(n),
            hz: Array1::zeros(n),
        }
    }

    pub fn get(&self, component: FieldComponent) -> &Array1<Complex64> {
        match component {
            FieldComponent::Ex => &self.ex,
            FieldComponent::Ey => &self.ey,
            FieldComponent::Ez => &self.ez,
            FieldComponent::Hx => &self.hx,
            FieldComponent::Hy => &self.hy,
            FieldComponent::Hz => &self.hz,
        }
    }

    /// Number of samples along the slice.
    pub fn len(&self) -> usize {
        self.ez.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ez.is_empty()
    }
}

/// Build a complex field from separately stored real and imaginary parts.
pub fn combine_parts(re: ArrayD<f64>, im: ArrayD<f64>) -> Result<ComplexField, ReduceError> {
    if re.shape() != im.shape() {
        return Err(ReduceError::PartsMismatch {
            real: re.shape().to_vec(),
            imag: im.shape().to_vec(),
        });
    }
    let mut out = ComplexField::zeros(re.raw_dim());
    ndarray::Zip::from(&mut out)
        .and(&re)
        .and(&im)
        .for_each(|o, &r, &i| *o = Complex64::new(r, i));
    Ok(out)
}

/// A non-empty, strictly increasing array of physical coordinates (µm).
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Array1<f64>,
}

impl GridAxis {
    pub fn new(values: impl Into<Array1<f64>>) -> Result<Self, ReduceError> {
        let values = values.into();
        if values.is_empty() {
            return Err(ReduceError::InvalidAxis("coordinate axis is empty".into()));
        }
        if let Some(i) = (1..values.len()).find(|&i| values[i] <= values[i - 1]) {
            return Err(ReduceError::InvalidAxis(format!(
                "coordinates must be strictly increasing (index {i}: {} after {})",
                values[i],
                values[i - 1]
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ReduceError::InvalidAxis("coordinate axis has non-finite values".into()));
        }
        Ok(Self { values })
    }

    /// Evenly spaced axis from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> Result<Self, ReduceError> {
        Self::new(Array1::linspace(start, end, n))
    }

    /// The same axis with every coordinate offset by `offset`.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            values: &self.values + offset,
        }
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A validated axis is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

/// Screen geometry of a run, in the coordinates of the stored `yy` axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum Geometry {
    /// Single wafer edge; `edge_y` moves the edge to `y = 0`.
    Edge {
        #[serde(default)]
        edge_y: f64,
    },
    /// Gap between two wafers, spanning `0 <= y <= gap_width` after the shift.
    Gap {
        #[serde(default)]
        edge_y: f64,
        #[serde(default = "default_gap_width")]
        gap_width: f64,
    },
}

fn default_gap_width() -> f64 {
    5.0
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::Edge { edge_y: 0.0 }
    }
}

impl Geometry {
    /// Offset added to stored `yy` so the (first) edge sits at `y = 0`.
    pub fn edge_y(&self) -> f64 {
        match *self {
            Geometry::Edge { edge_y } | Geometry::Gap { edge_y, .. } => edge_y,
        }
    }

    /// Geometric-optics incident field indicator for this geometry.
    pub fn incident_step(&self) -> IncidentStep {
        match *self {
            Geometry::Edge { .. } => IncidentStep::Edge,
            Geometry::Gap { gap_width, .. } => IncidentStep::Gap {
                lower: 0.0,
                upper: gap_width,
            },
        }
    }

    /// Position, in shifted `yy` coordinates, of the origin the analytic
    /// solution for this geometry is expressed in (edge or gap centre).
    pub fn solver_origin(&self) -> f64 {
        match *self {
            Geometry::Edge { .. } => 0.0,
            Geometry::Gap { gap_width, .. } => 0.5 * gap_width,
        }
    }
}

/// The geometric-optics incident field: 1 where light passes, 0 behind the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IncidentStep {
    /// Lit for `y > 0`.
    Edge,
    /// Lit for `lower < y < upper`.
    Gap { lower: f64, upper: f64 },
}

impl IncidentStep {
    /// Evaluate the indicator at `y`, with `at_zero` on the boundaries.
    pub fn indicator(&self, y: f64, at_zero: f64) -> f64 {
        match *self {
            IncidentStep::Edge => heaviside(y, at_zero),
            IncidentStep::Gap { lower, upper } => {
                heaviside(y - lower, at_zero) * heaviside(upper - y, at_zero)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn test_component_polarization_grouping() {
        for c in [FieldComponent::Ez, FieldComponent::Hx, FieldComponent::Hy] {
            assert_eq!(c.polarization(), Polarization::S);
        }
        for c in [FieldComponent::Hz, FieldComponent::Ex, FieldComponent::Ey] {
            assert_eq!(c.polarization(), Polarization::P);
        }
        assert_eq!(Polarization::S.braunbek_companion(), FieldComponent::Hy);
        assert_eq!(Polarization::P.braunbek_companion(), FieldComponent::Ey);
        assert_eq!(Polarization::P.symmetry_phase(), -1.0);
    }

    #[test]
    fn test_vacuum_reference_for_x_components() {
        assert_eq!(FieldComponent::Ex.vacuum_reference(), FieldComponent::Ez);
        assert_eq!(FieldComponent::Hx.vacuum_reference(), FieldComponent::Hz);
        assert_eq!(FieldComponent::Hy.vacuum_reference(), FieldComponent::Hy);
    }

    #[test]
    fn test_longitudinal_components() {
        let along: Vec<_> = FieldComponent::ALL
            .into_iter()
            .filter(|c| c.is_longitudinal())
            .collect();
        assert_eq!(along, vec![FieldComponent::Ex, FieldComponent::Hx]);
    }

    #[test]
    fn test_parse_component_case_insensitive() {
        assert_eq!("HY".parse::<FieldComponent>().unwrap(), FieldComponent::Hy);
        assert!("bz".parse::<FieldComponent>().is_err());
        assert_eq!("P".parse::<Polarization>().unwrap(), Polarization::P);
    }

    #[test]
    fn test_grid_axis_rejects_non_monotonic() {
        assert!(GridAxis::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(GridAxis::new(Vec::<f64>::new()).is_err());
        let axis = GridAxis::new(vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(axis.shifted(-0.5).get(0), Some(-0.5));
    }

    #[test]
    fn test_combine_parts_shape_check() {
        let re = array![[1.0, 2.0]].into_dyn();
        let im = array![[0.5, -1.0]].into_dyn();
        let z = combine_parts(re, im).unwrap();
        assert_eq!(z[IxDyn(&[0, 1])], Complex64::new(2.0, -1.0));

        let bad = combine_parts(array![1.0].into_dyn(), array![1.0, 2.0].into_dyn());
        assert!(matches!(bad, Err(ReduceError::PartsMismatch { .. })));
    }

    #[test]
    fn test_gap_indicator_bounds() {
        let step = IncidentStep::Gap { lower: 0.0, upper: 4.0 };
        assert_eq!(step.indicator(-0.1, 0.0), 0.0);
        assert_eq!(step.indicator(2.0, 0.0), 1.0);
        assert_eq!(step.indicator(4.0, 0.0), 0.0);
        assert_eq!(step.indicator(4.0, 1.0), 1.0);
        assert_eq!(step.indicator(4.1, 1.0), 0.0);
    }
}
