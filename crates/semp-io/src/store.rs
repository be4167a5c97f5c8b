//! Keyed field storage.
//!
//! Every complex component is stored as two real datasets,
//! `"{component}_{wavelength_index}.r"` and `".i"`, in one file per
//! polarisation. The vacuum reference run uses the same keys under the
//! `vac-` file prefix.

use std::collections::HashMap;
use std::path::PathBuf;

use ndarray::{Array1, Array2, ArrayD, Axis};
use num_complex::Complex64;
use semp_core::types::{combine_parts, ComplexField, FieldComponent, Polarization};

use crate::metadata::RunMetadata;
use crate::StoreError;

/// Which of the two runs of a session a dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The run with the screen in place.
    Run,
    /// The unobstructed reference run.
    Vacuum,
}

impl Namespace {
    /// File-name prefix of this namespace.
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Run => "",
            Namespace::Vacuum => "vac-",
        }
    }
}

/// Real or imaginary half of a stored complex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Real,
    Imag,
}

impl Part {
    pub fn suffix(self) -> &'static str {
        match self {
            Part::Real => "r",
            Part::Imag => "i",
        }
    }
}

/// Dataset key of one part of a near-field component, e.g. `"ez_1.r"`.
pub fn dataset_key(component: FieldComponent, wavelength_index: usize, part: Part) -> String {
    format!("{}_{}.{}", component.key(), wavelength_index, part.suffix())
}

/// Dataset key of one part of a far-field component, e.g. `"Ez.i"`.
pub fn far_field_key(component: FieldComponent, part: Part) -> String {
    format!("{}.{}", component.label(), part.suffix())
}

/// Read access to the arrays of a stored session.
pub trait FieldSource: Send + Sync {
    /// Load a near-field component for one wavelength index.
    fn load_component(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<ComplexField, StoreError>;

    /// Load the coordinate axes and wavelengths of a run.
    fn load_metadata(&self, ns: Namespace) -> Result<RunMetadata, StoreError>;

    /// Load the far-field samples of a component for one wavelength index.
    fn load_far_field(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<Array1<Complex64>, StoreError>;
}

/// In-memory [`FieldSource`] using the on-disk key layout.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    datasets: HashMap<(Namespace, Polarization, String), ArrayD<f64>>,
    far_fields: HashMap<(Namespace, Polarization, String), Array2<f64>>,
    metadata: HashMap<Namespace, RunMetadata>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a near-field component as its real and imaginary datasets.
    pub fn insert_component(
        &mut self,
        ns: Namespace,
        component: FieldComponent,
        wavelength_index: usize,
        field: &ComplexField,
    ) {
        let pol = component.polarization();
        for (part, data) in [
            (Part::Real, field.mapv(|v| v.re)),
            (Part::Imag, field.mapv(|v| v.im)),
        ] {
            self.datasets
                .insert((ns, pol, dataset_key(component, wavelength_index, part)), data);
        }
    }

    /// Store a far-field component with shape `(npts, nwaves)`.
    pub fn insert_far_field(
        &mut self,
        ns: Namespace,
        component: FieldComponent,
        field: &Array2<Complex64>,
    ) {
        let pol = component.polarization();
        self.far_fields.insert(
            (ns, pol, far_field_key(component, Part::Real)),
            field.mapv(|v| v.re),
        );
        self.far_fields.insert(
            (ns, pol, far_field_key(component, Part::Imag)),
            field.mapv(|v| v.im),
        );
    }

    pub fn set_metadata(&mut self, ns: Namespace, metadata: RunMetadata) {
        self.metadata.insert(ns, metadata);
    }

    fn missing(ns: Namespace, what: &str, key: String) -> StoreError {
        StoreError::MissingDataset {
            file: PathBuf::from(format!("<memory:{}{what}>", ns.prefix())),
            key,
        }
    }
}

impl FieldSource for MemoryStore {
    fn load_component(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<ComplexField, StoreError> {
        let fetch = |part| {
            let key = dataset_key(component, wavelength_index, part);
            self.datasets
                .get(&(ns, pol, key.clone()))
                .cloned()
                .ok_or_else(|| Self::missing(ns, &format!("fields_{pol}"), key))
        };
        Ok(combine_parts(fetch(Part::Real)?, fetch(Part::Imag)?)?)
    }

    fn load_metadata(&self, ns: Namespace) -> Result<RunMetadata, StoreError> {
        self.metadata
            .get(&ns)
            .cloned()
            .ok_or_else(|| Self::missing(ns, "coords_waves", "xx".into()))
    }

    fn load_far_field(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<Array1<Complex64>, StoreError> {
        let fetch = |part| {
            let key = far_field_key(component, part);
            self.far_fields
                .get(&(ns, pol, key.clone()))
                .ok_or_else(|| Self::missing(ns, &format!("farfields_{pol}"), key))
        };
        let (re, im) = (fetch(Part::Real)?, fetch(Part::Imag)?);
        far_field_column(re, im, wavelength_index)
    }
}

/// Combine column `wavelength_index` of stored `(npts, nwaves)` far-field parts.
pub(crate) fn far_field_column(
    re: &Array2<f64>,
    im: &Array2<f64>,
    wavelength_index: usize,
) -> Result<Array1<Complex64>, StoreError> {
    let nwaves = re.len_of(Axis(1));
    if wavelength_index >= nwaves {
        return Err(StoreError::IndexOutOfRange {
            index: wavelength_index,
            len: nwaves,
        });
    }
    let column = combine_parts(
        re.index_axis(Axis(1), wavelength_index).to_owned().into_dyn(),
        im.index_axis(Axis(1), wavelength_index).to_owned().into_dyn(),
    )?;
    column
        .into_dimensionality()
        .map_err(|e| StoreError::Npz(format!("far-field column is not 1-D: {e}")))
}
