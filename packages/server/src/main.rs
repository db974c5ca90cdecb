#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone flood risk API server.

use std::sync::Arc;

use flood_risk_pipeline::{Pipeline, PipelineConfig};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = PipelineConfig::from_env()?;
    let pipeline = Pipeline::from_env(&config).await?;
    let (bind_addr, port) = flood_risk_server::bind_from_env();

    flood_risk_server::run_server(Arc::new(pipeline), &bind_addr, port).await?;

    Ok(())
}
