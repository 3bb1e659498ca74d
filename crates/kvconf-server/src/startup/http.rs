//! HTTP server setup

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    dev::Server,
    middleware::{NormalizePath, TrailingSlash},
    web,
};

use crate::{api::route::routes, middleware::ObservabilityMiddleware, model::app_state::AppState};

/// Listener and worker settings for [`main_server`]
#[derive(Clone, Debug)]
pub struct HttpServerSettings {
    pub address: String,
    pub port: u16,
    pub workers: usize,
    pub shutdown_timeout_secs: u64,
}

/// Creates and binds the HTTP server.
///
/// Signal handling is left to the caller so shutdown goes through
/// [`super::run_until_shutdown`].
pub fn main_server(
    app_state: Arc<AppState>,
    settings: HttpServerSettings,
) -> Result<Server, std::io::Error> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(ObservabilityMiddleware::new())
            // Outermost, so route patterns are matched on the normalized path
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(web::Data::from(app_state.clone()))
            .configure(routes)
    })
    .workers(settings.workers)
    .shutdown_timeout(settings.shutdown_timeout_secs)
    .disable_signals()
    .bind((settings.address, settings.port))?
    .run())
}
