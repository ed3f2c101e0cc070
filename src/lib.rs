//! Drive an external heat-equation solver and plot what it computes.
//!
//! The pipeline runs the solver as a subprocess, captures its output,
//! parses the temperature grid and renders it as a heatmap PNG.

pub mod build_info;
pub mod cli;
pub mod colormap;
pub mod config;
pub mod display;
pub mod error;
pub mod grid;
pub mod parser;
pub mod pipeline;
pub mod plot;
pub mod runner;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use grid::TemperatureGrid;
pub use pipeline::{Outcome, Pipeline, Stage, Step};
