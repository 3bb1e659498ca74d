//! Configuration management for the kvconf server
//!
//! Sources, lowest precedence first: `conf/application.yml` (optional),
//! `KVCONF_`-prefixed environment variables (`KVCONF_SERVER__PORT=9000`),
//! then command line flags.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use config::{Config, Environment};
use kvconf_store::ConsulKvConfig;

use super::constants::*;
use crate::startup::LoggingConfig;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "kvconf-server", version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
    /// Backend type: memory or consul
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,
    #[arg(long = "consul-address")]
    pub consul_address: Option<String>,
}

/// Application configuration loaded from config files, environment and flags
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let mut config_builder = Config::builder()
            .add_source(config::File::with_name(&cli.config).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = cli.port {
            config_builder = config_builder.set_override(SERVER_PORT, i64::from(v))?;
        }
        if let Some(v) = cli.backend {
            config_builder = config_builder.set_override(BACKEND_TYPE, v)?;
        }
        if let Some(v) = cli.consul_address {
            config_builder = config_builder.set_override(BACKEND_CONSUL_ADDRESS, v)?;
        }

        let app_config = config_builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", cli.config))?;

        Ok(Configuration { config: app_config })
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string(SERVER_ADDRESS)
            .unwrap_or(DEFAULT_SERVER_ADDRESS.to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int(SERVER_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn server_workers(&self) -> usize {
        self.config
            .get_int(SERVER_WORKERS)
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.get_u64(SERVER_REQUEST_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64(
            SERVER_SHUTDOWN_TIMEOUT_SECS,
            DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        ))
    }

    // ========================================================================
    // Backend Configuration
    // ========================================================================

    pub fn backend_type(&self) -> String {
        self.config
            .get_string(BACKEND_TYPE)
            .map(|v| v.to_lowercase())
            .unwrap_or(BACKEND_MEMORY.to_string())
    }

    pub fn consul_address(&self) -> String {
        resolve_consul_address(
            self.config.get_string(BACKEND_CONSUL_ADDRESS).ok(),
            std::env::var(ENV_CONSUL_HOST).ok(),
            std::env::var(ENV_CONSUL_PORT).ok(),
        )
    }

    pub fn consul_config(&self) -> ConsulKvConfig {
        let mut consul = ConsulKvConfig::new(self.consul_address()).with_timeout_ms(
            self.get_u64(BACKEND_CONSUL_TIMEOUT_MS, DEFAULT_CONSUL_TIMEOUT_MS),
        );
        if let Ok(token) = self.config.get_string(BACKEND_CONSUL_TOKEN)
            && !token.is_empty()
        {
            consul = consul.with_token(token);
        }
        consul
    }

    // ========================================================================
    // Ledger and Group Configuration
    // ========================================================================

    pub fn ledger_ttl(&self) -> Option<Duration> {
        self.config
            .get_int(LEDGER_TTL_SECS)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
    }

    pub fn ledger_fail_open(&self) -> bool {
        self.config.get_bool(LEDGER_FAIL_OPEN).unwrap_or(true)
    }

    pub fn cas_max_retries(&self) -> u32 {
        self.config
            .get_int(GROUPS_CAS_MAX_RETRIES)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(kvconf_core::group_repo::DEFAULT_CAS_MAX_RETRIES)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGGING_DIR).ok(),
            self.config.get_bool(LOGGING_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGGING_FILE).unwrap_or(false),
            self.config
                .get_string(LOGGING_LEVEL)
                .unwrap_or("info".to_string()),
        )
        .with_env_overrides()
    }

    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }
}

/// An explicit address wins; otherwise the `DB`/`DBPORT` pair; otherwise the local agent
fn resolve_consul_address(
    configured: Option<String>,
    host: Option<String>,
    port: Option<String>,
) -> String {
    if let Some(address) = configured.filter(|a| !a.is_empty()) {
        return address;
    }
    match host.filter(|h| !h.is_empty()) {
        Some(host) => format!(
            "http://{}:{}",
            host,
            port.filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_CONSUL_PORT.to_string())
        ),
        None => DEFAULT_CONSUL_ADDRESS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(config: &str) -> Cli {
        Cli {
            config: config.to_string(),
            port: None,
            backend: None,
            consul_address: None,
        }
    }

    #[test]
    fn test_defaults() {
        let configuration = Configuration::default();
        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), 8000);
        assert!(configuration.server_workers() >= 1);
        assert_eq!(configuration.request_timeout(), Duration::from_secs(10));
        assert_eq!(configuration.shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(configuration.backend_type(), "memory");
        assert_eq!(configuration.ledger_ttl(), None);
        assert!(configuration.ledger_fail_open());
        assert_eq!(configuration.cas_max_retries(), 5);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let configuration = Configuration::from_cli(cli("/nonexistent/application.yml")).unwrap();
        assert_eq!(configuration.server_port(), 8000);
    }

    #[test]
    fn test_file_and_cli_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  port: 9100\n  request_timeout_ms: 250\nbackend:\n  type: consul\n  consul:\n    address: http://consul:8500\n    token: secret\nledger:\n  ttl_secs: 3600\n  fail_open: false\ngroups:\n  cas_max_retries: 9\n"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let configuration = Configuration::from_cli(cli(&path)).unwrap();
        assert_eq!(configuration.server_port(), 9100);
        assert_eq!(configuration.request_timeout(), Duration::from_millis(250));
        assert_eq!(configuration.backend_type(), "consul");
        let consul = configuration.consul_config();
        assert_eq!(consul.address, "http://consul:8500");
        assert_eq!(consul.token.as_deref(), Some("secret"));
        assert_eq!(configuration.ledger_ttl(), Some(Duration::from_secs(3600)));
        assert!(!configuration.ledger_fail_open());
        assert_eq!(configuration.cas_max_retries(), 9);

        let overridden = Configuration::from_cli(Cli {
            port: Some(9200),
            backend: Some("memory".to_string()),
            consul_address: Some("http://other:8500".to_string()),
            ..cli(&path)
        })
        .unwrap();
        assert_eq!(overridden.server_port(), 9200);
        assert_eq!(overridden.backend_type(), "memory");
        assert_eq!(overridden.consul_address(), "http://other:8500");
    }

    #[test]
    fn test_resolve_consul_address() {
        assert_eq!(
            resolve_consul_address(Some("http://a:1".to_string()), Some("db".to_string()), None),
            "http://a:1"
        );
        assert_eq!(
            resolve_consul_address(None, Some("consul".to_string()), Some("8501".to_string())),
            "http://consul:8501"
        );
        assert_eq!(
            resolve_consul_address(None, Some("consul".to_string()), None),
            "http://consul:8500"
        );
        assert_eq!(resolve_consul_address(None, None, None), DEFAULT_CONSUL_ADDRESS);
    }
}
