//! Web front-end for the water pollutant predictor
//!
//! Serves the single-page prediction form plus a JSON endpoint and the
//! health/metrics probes.

pub mod api;
pub mod config;
pub mod page;
