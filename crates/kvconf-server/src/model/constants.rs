//! Configuration property names and defaults

pub const SERVER_ADDRESS: &str = "server.address";
pub const SERVER_PORT: &str = "server.port";
pub const SERVER_WORKERS: &str = "server.workers";
pub const SERVER_REQUEST_TIMEOUT_MS: &str = "server.request_timeout_ms";
pub const SERVER_SHUTDOWN_TIMEOUT_SECS: &str = "server.shutdown_timeout_secs";

pub const BACKEND_TYPE: &str = "backend.type";
pub const BACKEND_CONSUL_ADDRESS: &str = "backend.consul.address";
pub const BACKEND_CONSUL_TOKEN: &str = "backend.consul.token";
pub const BACKEND_CONSUL_TIMEOUT_MS: &str = "backend.consul.timeout_ms";

pub const LEDGER_TTL_SECS: &str = "ledger.ttl_secs";
pub const LEDGER_FAIL_OPEN: &str = "ledger.fail_open";

pub const GROUPS_CAS_MAX_RETRIES: &str = "groups.cas_max_retries";

pub const LOGGING_DIR: &str = "logging.dir";
pub const LOGGING_CONSOLE: &str = "logging.console";
pub const LOGGING_FILE: &str = "logging.file";
pub const LOGGING_LEVEL: &str = "logging.level";

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONSUL_ADDRESS: &str = "http://127.0.0.1:8500";
pub const DEFAULT_CONSUL_PORT: &str = "8500";
pub const DEFAULT_CONSUL_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

pub const BACKEND_MEMORY: &str = "memory";
pub const BACKEND_CONSUL: &str = "consul";

/// Consul host and port variables used by container deployments
pub const ENV_CONSUL_HOST: &str = "DB";
pub const ENV_CONSUL_PORT: &str = "DBPORT";

pub const ENV_PREFIX: &str = "KVCONF";

pub const UNSUPPORTED_MEDIA_TYPE_MESSAGE: &str = "Expect application/json Content-Type";
