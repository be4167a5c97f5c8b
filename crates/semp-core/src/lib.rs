//! # SEMP Core
//!
//! Numerics for SEMP edge-diffraction analysis. This crate holds
//! the pieces that do not depend on the external FDTD engine: two closed-form
//! electromagnetic solutions used as ground truth, and the reduction pipeline
//! that turns raw near-field samples into vacuum-normalised and Braunbek
//! (scattered-only) fields.
//!
//! ## Architecture
//!
//! Both analytic solutions implement the [`solver::AnalyticSolver`] trait,
//! which evaluates all six field components on a transverse slice at a fixed
//! depth. The reduction functions in [`reduce`] are pure transformations over
//! `ndarray` arrays and never touch storage.
//!
//! ## Modules
//!
//! - [`types`]: Polarisations, field components, grid axes, geometries.
//! - [`special`]: Fresnel integrals and branch-safe angle helpers.
//! - [`solver`]: Sommerfeld half-plane and thick-screen gap solutions.
//! - [`reduce`]: Index resolvers, vacuum normalisation, Braunbek reduction.

pub mod reduce;
pub mod solver;
pub mod special;
pub mod types;
