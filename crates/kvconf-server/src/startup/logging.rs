//! File-based logging with per-component log files.
//!
//! | Log File    | Component                  | Target Prefixes |
//! |-------------|----------------------------|-----------------|
//! | kvconf.log  | Root logger (everything)   | (all)           |
//! | store.log   | Key-value backends         | kvconf_store    |
//! | core.log    | Repositories and ledger    | kvconf_core     |
//! | http.log    | Handlers and middleware    | kvconf_server   |
//!
//! Log files are written to `logs/` under the working directory by default.
//! Override with `logging.dir` or the `KVCONF_LOG_DIR` environment variable.

use std::path::PathBuf;

use anyhow::Context;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const ROOT_LOG_FILE: &str = "kvconf.log";
const DEFAULT_LOG_DIR: &str = "logs";

struct ComponentLogDef {
    file_name: &'static str,
    targets: &'static [&'static str],
}

/// Each entry produces a separate rolling file; events are routed by their
/// `tracing` target. The root file captures every event regardless.
const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "store.log",
        targets: &["kvconf_store"],
    },
    ComponentLogDef {
        file_name: "core.log",
        targets: &["kvconf_core"],
    },
    ComponentLogDef {
        file_name: "http.log",
        targets: &["kvconf_server::api", "kvconf_server::middleware"],
    },
];

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    pub console_level: Level,
    pub file_logging: bool,
    pub file_level: Level,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            console_output: true,
            console_level: Level::INFO,
            file_logging: false,
            file_level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Create from application configuration.
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
    ) -> Self {
        let level = level.parse().unwrap_or(Level::INFO);
        Self {
            log_dir: PathBuf::from(log_dir.unwrap_or(DEFAULT_LOG_DIR.to_string())),
            console_output,
            console_level: level,
            file_logging,
            file_level: level,
            rotation: LogRotation::Daily,
        }
    }

    /// Apply `KVCONF_LOG_DIR`, `KVCONF_LOG_CONSOLE`, `KVCONF_LOG_FILE`,
    /// `KVCONF_LOG_LEVEL` and `KVCONF_LOG_FILE_LEVEL` on top of this config.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("KVCONF_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("KVCONF_LOG_CONSOLE") {
            self.console_output = v.to_lowercase() != "false" && v != "0";
        }
        if let Some(v) = lookup("KVCONF_LOG_FILE") {
            self.file_logging = v.to_lowercase() == "true" || v == "1";
        }
        if let Some(level) = lookup("KVCONF_LOG_LEVEL").and_then(|v| v.parse().ok()) {
            self.console_level = level;
            self.file_level = level;
        }
        if let Some(level) = lookup("KVCONF_LOG_FILE_LEVEL").and_then(|v| v.parse().ok()) {
            self.file_level = level;
        }
        self
    }
}

/// Keeps the non-blocking file writers alive; dropping it flushes buffered output.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Initialize the global subscriber: console layer filtered by `RUST_LOG`
/// (falling back to the configured level), plus the root and component
/// rolling files when file logging is on.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory {}", config.log_dir.display())
        })?;
    }

    let mut guards: Vec<WorkerGuard> = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.console_level.to_string()));
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_filter(filter);
        layers.push(Box::new(console_layer));
    }

    if config.file_logging {
        let root_appender =
            RollingFileAppender::new(config.rotation.into(), &config.log_dir, ROOT_LOG_FILE);
        let (root_nb, root_guard) = tracing_appender::non_blocking(root_appender);
        guards.push(root_guard);

        let root_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.file_level.to_string()));
        let root_layer = fmt::layer()
            .with_writer(root_nb)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(root_filter);
        layers.push(Box::new(root_layer));

        for component in COMPONENT_LOGS {
            let appender = RollingFileAppender::new(
                config.rotation.into(),
                &config.log_dir,
                component.file_name,
            );
            let (nb, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);

            let level: LevelFilter = config.file_level.into();
            let targets = component
                .targets
                .iter()
                .fold(Targets::new(), |targets, target| {
                    targets.with_target(*target, level)
                });

            let layer = fmt::layer()
                .with_writer(nb)
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(false)
                .with_filter(targets);
            layers.push(Box::new(layer));
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to initialize logging")?;

    if config.file_logging {
        tracing::info!(
            log_dir = %config.log_dir.display(),
            "File logging initialized: {} (root) + {} component log files",
            ROOT_LOG_FILE,
            COMPONENT_LOGS.len()
        );
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}
