//! Main entry point for the kvconf server.

use std::sync::Arc;

use kvconf_server::{
    metrics,
    model::{app_state::AppState, config::Configuration},
    startup::{self, HttpServerSettings},
};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;

    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let metrics_handle = metrics::install_prometheus()?;
    metrics::init_metrics();

    let app_state = AppState::from_configuration(&configuration)?.with_metrics_handle(metrics_handle);
    info!(
        backend = app_state.backend.name(),
        request_timeout_ms = app_state.request_timeout.as_millis() as u64,
        "Application state initialized"
    );

    let settings = HttpServerSettings {
        address: configuration.server_address(),
        port: configuration.server_port(),
        workers: configuration.server_workers(),
        shutdown_timeout_secs: configuration.shutdown_timeout().as_secs(),
    };
    info!(
        address = %settings.address,
        port = settings.port,
        workers = settings.workers,
        "Starting HTTP server"
    );

    let server = startup::main_server(Arc::new(app_state), settings)?;
    let shutdown_signal = startup::wait_for_shutdown_signal();
    startup::run_until_shutdown(server, &shutdown_signal).await?;

    Ok(())
}
