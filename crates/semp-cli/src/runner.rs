//! Job runner: ties together stored sessions, analytic solvers and output files.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array1;
use num_complex::Complex64;
use rayon::prelude::*;

use semp_core::types::{FieldComponent, FieldComponents};
use semp_io::{write_diffraq, Analyzer, ComparisonReport, NpzRunStore};

use crate::config::JobConfig;

/// One analytic slice at a given wavelength and depth.
pub struct AnalyticSlice {
    pub wavelength: f64,
    pub x: f64,
    pub y: Array1<f64>,
    pub fields: FieldComponents,
}

/// Evaluate the configured solver for every (wavelength, depth) pair.
pub fn run_analytic(job: &JobConfig) -> Result<Vec<AnalyticSlice>> {
    let [y_min, y_max] = job.slice.y_range;
    let y = Array1::linspace(y_min, y_max, job.slice.points);

    let tasks: Vec<(f64, f64)> = job
        .solver
        .wavelengths
        .iter()
        .flat_map(|&wave| job.slice.x.iter().map(move |&x| (wave, x)))
        .collect();

    println!(
        "Evaluating {} slice(s) of {} points ({:?} solver)",
        tasks.len(),
        y.len(),
        job.solver.kind
    );

    tasks
        .par_iter()
        .map(|&(wavelength, x)| -> Result<AnalyticSlice> {
            let solver = job.solver.build(wavelength)?;
            let fields = solver
                .solve_slice(x, y.view(), job.slice.braunbek)
                .with_context(|| format!("{} at λ={wavelength} µm, x={x} µm", solver.method_name()))?;
            log::debug!("{}: λ={wavelength} x={x} done", solver.method_name());
            Ok(AnalyticSlice {
                wavelength,
                x,
                y: y.clone(),
                fields,
            })
        })
        .collect()
}

/// Compare a stored session against the analytic solution for every
/// configured wavelength and Braunbek setting.
pub fn run_compare(job: &JobConfig) -> Result<Vec<ComparisonReport>> {
    let analyzer = open_analyzer(job, "compare")?;

    let tasks: Vec<(f64, bool)> = job
        .solver
        .wavelengths
        .iter()
        .flat_map(|&wave| job.output.braunbek.iter().map(move |&b| (wave, b)))
        .collect();

    let reports: Vec<ComparisonReport> = tasks
        .par_iter()
        .map(|&(wavelength, braunbek)| -> Result<ComparisonReport> {
            let solver = job.solver.build(wavelength)?;
            analyzer
                .compare_to(solver.as_ref(), braunbek)
                .with_context(|| format!("comparison at λ={wavelength} µm"))
        })
        .collect::<Result<_>>()?;

    for r in &reports {
        let status = if r.passes(job.output.tolerance) { "ok" } else { "FAIL" };
        println!(
            "  λ={:.3} µm braunbek={:<5} Ez={:.2e} Hz={:.2e} Ey={:.2e} Hy={:.2e} [{}]",
            r.wavelength, r.braunbek, r.ez, r.hz, r.ey, r.hy, status
        );
    }
    Ok(reports)
}

/// Collect Braunbek fields for the configured wavelengths and write the
/// DIFFRAQ archive. Returns the archive path.
pub fn run_collect(job: &JobConfig, out_dir: &Path) -> Result<PathBuf> {
    let analyzer = open_analyzer(job, "collect")?;
    let exports = analyzer
        .collect_braunbek_many(&job.solver.wavelengths)
        .context("collecting Braunbek fields")?;

    let path = out_dir.join(&job.output.diffraq_file);
    write_diffraq(&path, &exports)?;
    println!("Braunbek fields written to: {}", path.display());
    Ok(path)
}

fn open_analyzer(job: &JobConfig, command: &str) -> Result<Analyzer<NpzRunStore>> {
    let dir = job.run_directory(command)?;
    let store = NpzRunStore::new(dir.clone());
    Analyzer::new(store, job.analyzer)
        .with_context(|| format!("opening session in {}", dir.display()))
}

/// Write one analytic slice to CSV with a metadata header.
pub fn write_slice_csv(slice: &AnalyticSlice, path: &Path, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "# SEMP analytic slice")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# solver: {:?}", job.solver.kind)?;
    writeln!(file, "# wavelength_um: {}", slice.wavelength)?;
    writeln!(file, "# x_um: {}", slice.x)?;
    writeln!(file, "# phi0: {}", job.solver.phi0)?;
    writeln!(file, "# braunbek: {}", job.slice.braunbek)?;
    writeln!(file, "#")?;

    let mut header = String::from("y_um");
    for component in FieldComponent::ALL {
        let label = component.label();
        header.push_str(&format!(",{label}_re,{label}_im"));
    }
    writeln!(file, "{header}")?;

    for (i, y) in slice.y.iter().enumerate() {
        write!(file, "{y:.6}")?;
        for component in FieldComponent::ALL {
            let v: Complex64 = slice.fields.get(component)[i];
            write!(file, ",{:.8e},{:.8e}", v.re, v.im)?;
        }
        writeln!(file)?;
    }
    Ok(())
}

/// File name of an analytic slice, e.g. `analytic_641nm_x0.500.csv`.
pub fn slice_file_name(slice: &AnalyticSlice) -> String {
    format!("analytic_{:.0}nm_x{:.3}.csv", slice.wavelength * 1e3, slice.x)
}

/// Write comparison reports to a JSON file.
pub fn write_reports_json(reports: &[ComparisonReport], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;
    println!("Comparison written to: {}", path.display());
    Ok(())
}
