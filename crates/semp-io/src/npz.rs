//! `.npz` archives laid out per session directory:
//!
//! | File                        | Datasets                                  |
//! |-----------------------------|-------------------------------------------|
//! | `{prefix}coords_waves.npz`  | `xx`, `yy`, `zz`, `waves`                 |
//! | `{prefix}fields_{pol}.npz`  | `{comp}_{wind}.r`, `{comp}_{wind}.i`      |
//! | `{prefix}farfields_{pol}.npz` | `{Comp}.r`, `{Comp}.i`, shape `(npts, nwaves)` |
//!
//! `prefix` is empty for the run and `vac-` for the vacuum reference.

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{Array, Array1, Array2, Dimension, Ix1, Ix2, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use num_complex::Complex64;
use semp_core::reduce::WavelengthSet;
use semp_core::types::{combine_parts, ComplexField, FieldComponent, GridAxis, Polarization};

use crate::metadata::RunMetadata;
use crate::store::{dataset_key, far_field_column, far_field_key, FieldSource, Namespace, Part};
use crate::StoreError;

fn fields_name(ns: Namespace, pol: Polarization) -> String {
    format!("{}fields_{}.npz", ns.prefix(), pol)
}

fn far_fields_name(ns: Namespace, pol: Polarization) -> String {
    format!("{}farfields_{}.npz", ns.prefix(), pol)
}

fn coords_name(ns: Namespace) -> String {
    format!("{}coords_waves.npz", ns.prefix())
}

/// An open archive that reports missing keys by file name.
struct Archive {
    path: PathBuf,
    npz: NpzReader<File>,
    names: Vec<String>,
}

impl Archive {
    fn open(path: PathBuf) -> Result<Self, StoreError> {
        let file = File::open(&path)?;
        let mut npz = NpzReader::new(file)
            .map_err(|e| StoreError::Npz(format!("{}: {e}", path.display())))?;
        let names = npz
            .names()
            .map_err(|e| StoreError::Npz(format!("{}: {e}", path.display())))?;
        Ok(Self { path, npz, names })
    }

    fn read<D: Dimension>(&mut self, key: &str) -> Result<Array<f64, D>, StoreError> {
        let with_ext = format!("{key}.npy");
        let name = if self.names.iter().any(|n| *n == with_ext) {
            with_ext
        } else if self.names.iter().any(|n| n == key) {
            key.to_string()
        } else {
            return Err(StoreError::MissingDataset {
                file: self.path.clone(),
                key: key.to_string(),
            });
        };
        self.npz
            .by_name::<OwnedRepr<f64>, D>(&name)
            .map_err(|e| StoreError::Npz(format!("{} [{key}]: {e}", self.path.display())))
    }
}

/// A session directory of `.npz` archives.
#[derive(Debug, Clone)]
pub struct NpzRunStore {
    dir: PathBuf,
}

impl NpzRunStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FieldSource for NpzRunStore {
    fn load_component(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<ComplexField, StoreError> {
        let mut archive = Archive::open(self.dir.join(fields_name(ns, pol)))?;
        let re = archive.read::<IxDyn>(&dataset_key(component, wavelength_index, Part::Real))?;
        let im = archive.read::<IxDyn>(&dataset_key(component, wavelength_index, Part::Imag))?;
        Ok(combine_parts(re, im)?)
    }

    fn load_metadata(&self, ns: Namespace) -> Result<RunMetadata, StoreError> {
        let mut archive = Archive::open(self.dir.join(coords_name(ns)))?;
        let xx = GridAxis::new(archive.read::<Ix1>("xx")?)?;
        let yy = GridAxis::new(archive.read::<Ix1>("yy")?)?;
        let zz = archive.read::<Ix1>("zz")?;
        let waves = WavelengthSet::new(archive.read::<Ix1>("waves")?.to_vec());
        log::debug!(
            "Loaded {}coords: {} x {} grid, {} wavelengths",
            ns.prefix(),
            xx.len(),
            yy.len(),
            waves.len()
        );
        Ok(RunMetadata::new(xx, yy, zz, waves))
    }

    fn load_far_field(
        &self,
        ns: Namespace,
        pol: Polarization,
        component: FieldComponent,
        wavelength_index: usize,
    ) -> Result<Array1<Complex64>, StoreError> {
        let mut archive = Archive::open(self.dir.join(far_fields_name(ns, pol)))?;
        let re = archive.read::<Ix2>(&far_field_key(component, Part::Real))?;
        let im = archive.read::<Ix2>(&far_field_key(component, Part::Imag))?;
        far_field_column(&re, &im, wavelength_index)
    }
}

/// Writes session archives in the layout read by [`NpzRunStore`].
#[derive(Debug, Clone)]
pub struct NpzRunWriter {
    dir: PathBuf,
}

impl NpzRunWriter {
    /// Create the session directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn store(&self) -> NpzRunStore {
        NpzRunStore::new(self.dir.clone())
    }

    pub fn write_metadata(&self, ns: Namespace, metadata: &RunMetadata) -> Result<(), StoreError> {
        let path = self.dir.join(coords_name(ns));
        let mut npz = NpzWriter::new(File::create(&path)?);
        let waves = Array1::from(metadata.waves.as_slice().to_vec());
        for (key, arr) in [
            ("xx", metadata.xx.values()),
            ("yy", metadata.yy.values()),
            ("zz", &metadata.zz),
            ("waves", &waves),
        ] {
            npz.add_array(key, arr).map_err(|e| npz_error(&path, e))?;
        }
        npz.finish().map_err(|e| npz_error(&path, e))?;
        Ok(())
    }

    /// Write every near-field dataset of one polarisation.
    pub fn write_fields(
        &self,
        ns: Namespace,
        pol: Polarization,
        datasets: &[(FieldComponent, usize, ComplexField)],
    ) -> Result<(), StoreError> {
        let path = self.dir.join(fields_name(ns, pol));
        let mut npz = NpzWriter::new(File::create(&path)?);
        for (component, wind, field) in datasets {
            if component.polarization() != pol {
                log::warn!("Writing {component} into the {pol}-polarisation archive");
            }
            npz.add_array(dataset_key(*component, *wind, Part::Real), &field.mapv(|v| v.re))
                .map_err(|e| npz_error(&path, e))?;
            npz.add_array(dataset_key(*component, *wind, Part::Imag), &field.mapv(|v| v.im))
                .map_err(|e| npz_error(&path, e))?;
        }
        npz.finish().map_err(|e| npz_error(&path, e))?;
        Ok(())
    }

    /// Write far-field datasets of one polarisation, each shaped `(npts, nwaves)`.
    pub fn write_far_fields(
        &self,
        ns: Namespace,
        pol: Polarization,
        datasets: &[(FieldComponent, Array2<Complex64>)],
    ) -> Result<(), StoreError> {
        let path = self.dir.join(far_fields_name(ns, pol));
        let mut npz = NpzWriter::new(File::create(&path)?);
        for (component, field) in datasets {
            npz.add_array(far_field_key(*component, Part::Real), &field.mapv(|v| v.re))
                .map_err(|e| npz_error(&path, e))?;
            npz.add_array(far_field_key(*component, Part::Imag), &field.mapv(|v| v.im))
                .map_err(|e| npz_error(&path, e))?;
        }
        npz.finish().map_err(|e| npz_error(&path, e))?;
        Ok(())
    }
}

pub(crate) fn npz_error(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Npz(format!("{}: {err}", path.display()))
}
