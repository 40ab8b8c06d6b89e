//! `coreloss-fit` library crate.
//!
//! Fits magnetic core-loss measurements to the Steinmetz power law
//! `loss = k · bac^a · fs^b` by ordinary least squares in log space.
//!
//! The binary (`corefit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting engine (`fit`, `math`, `models`) is usable without the CLI

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
