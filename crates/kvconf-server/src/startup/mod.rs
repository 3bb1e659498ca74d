//! Application startup: logging, HTTP server and shutdown

mod http;
mod logging;
mod shutdown;

pub use http::{HttpServerSettings, main_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{ShutdownSignal, run_until_shutdown, wait_for_shutdown_signal};
