//! Entry point for the Vehicle Cost Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the cost
//! estimation API.  Configuration is read from `config/*.toml` and
//! `CARCOST__*` environment variables; see `config.rs` for the keys.
//! Regional reference data is loaded from `reference.data_dir`
//! (default `reference_data/`).

use anyhow::Result;
use vehicle_cost_engine::config::AppConfig;
use vehicle_cost_engine::{api, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.log);
    api::serve(&config).await
}
