//! Vehicle Cost Engine library crate.
//!
//! This crate exposes the total-cost-of-ownership engine and API
//! components as reusable modules.  External applications may depend
//! on the `vehicle_cost_engine` crate and call `engine::estimate`
//! directly, validating first with `validation::validate`, or embed
//! the API via `api::build_router`.

pub mod api;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod finance;
pub mod models;
pub mod reference;
pub mod validation;

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialise tracing/logging.
///
/// `RUST_LOG` wins over the configured level.  Can only be called
/// once per process.
pub fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}
