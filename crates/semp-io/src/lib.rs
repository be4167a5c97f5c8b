//! # SEMP I/O
//!
//! Storage boundary and run analysis for SEMP.
//!
//! A simulation run writes complex field components as pairs of real arrays
//! keyed by component and wavelength index, alongside a vacuum (no screen)
//! reference run under the `vac-` prefix. This crate reads those datasets
//! through the [`store::FieldSource`] trait, drives the `semp-core` reduction
//! pipeline over them in [`analyzer::Analyzer`], and writes the Braunbek
//! fields consumed by the DIFFRAQ propagator ([`export`]).

pub mod analyzer;
pub mod export;
pub mod metadata;
pub mod npz;
pub mod store;

pub use analyzer::{Analyzer, AnalyzerConfig, ComparisonReport, FarFieldGrid, FarFieldSlice};
pub use export::{write_diffraq, BraunbekExport};
pub use metadata::RunMetadata;
pub use npz::{NpzRunStore, NpzRunWriter};
pub use store::{dataset_key, FieldSource, MemoryStore, Namespace, Part};

use semp_core::reduce::ReduceError;
use semp_core::solver::SolverError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, reducing or writing run data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("npz archive error: {0}")]
    Npz(String),

    #[error("Dataset '{key}' not found in {}", file.display())]
    MissingDataset { file: PathBuf, key: String },

    #[error("Index {index} out of range for axis of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
