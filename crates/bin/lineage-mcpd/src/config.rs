use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use lineage_core::config::RuntimeConfig;
use lineage_core::engine::SurrealSettings;
use lineage_mcp::server::McpHttpServerConfig;
use thiserror::Error;

const DEFAULT_DB_NAMESPACE: &str = "mstr";
const DEFAULT_DB_DATABASE: &str = "lineage";
const DEFAULT_SCHEMA_SAMPLE_SIZE: u32 = 100;
const DEFAULT_MCP_HTTP_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_MCP_HTTP_PORT: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "lineage-mcpd",
    version,
    about = "MicroStrategy lineage MCP daemon."
)]
struct CliArgs {
    #[arg(long, env = "LINEAGE_DB_URI")]
    db_uri: Option<String>,

    #[arg(long, env = "LINEAGE_DB_USERNAME")]
    db_username: Option<String>,

    #[arg(long, env = "LINEAGE_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    #[arg(long, env = "LINEAGE_DB_NAMESPACE", default_value = DEFAULT_DB_NAMESPACE)]
    db_namespace: String,

    #[arg(long, env = "LINEAGE_DB_DATABASE", default_value = DEFAULT_DB_DATABASE)]
    db_database: String,

    #[arg(
        long,
        env = "LINEAGE_READ_ONLY",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    read_only: bool,

    #[arg(
        long,
        env = "LINEAGE_SCHEMA_SAMPLE_SIZE",
        default_value_t = DEFAULT_SCHEMA_SAMPLE_SIZE
    )]
    schema_sample_size: u32,

    #[arg(long, env = "LINEAGE_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, env = "LINEAGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[arg(
        long = "transport",
        env = "LINEAGE_MCP_TRANSPORT",
        value_enum,
        default_value_t = Transport::Stdio
    )]
    transport: Transport,

    #[arg(long, env = "LINEAGE_MCP_HTTP_HOST", default_value_t = DEFAULT_MCP_HTTP_HOST)]
    mcp_http_host: IpAddr,

    #[arg(long, env = "LINEAGE_MCP_HTTP_PORT", default_value_t = DEFAULT_MCP_HTTP_PORT)]
    mcp_http_port: u16,

    #[arg(long, env = "LINEAGE_MCP_HTTP_ALLOWED_ORIGINS", default_value = "")]
    mcp_http_allowed_origins: String,

    #[arg(
        long,
        env = "LINEAGE_MCP_HTTP_STATEFUL",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_http_stateful: bool,

    #[arg(long, env = "LINEAGE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,
}

/// Validated process configuration.
#[derive(Clone)]
pub struct LineageConfig {
    pub db_uri: String,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub db_namespace: String,
    pub db_database: String,
    pub read_only: bool,
    pub schema_sample_size: u32,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub transport: Transport,
    pub mcp_http_addr: SocketAddr,
    pub allowed_origins: BTreeSet<String>,
    pub mcp_http_stateful: bool,
    pub api_token: Option<String>,
}

impl fmt::Debug for LineageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineageConfig")
            .field("db_uri", &self.db_uri)
            .field("db_username", &self.db_username)
            .field("db_password", &self.db_password.as_ref().map(|_| "<redacted>"))
            .field("db_namespace", &self.db_namespace)
            .field("db_database", &self.db_database)
            .field("read_only", &self.read_only)
            .field("schema_sample_size", &self.schema_sample_size)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("transport", &self.transport)
            .field("mcp_http_addr", &self.mcp_http_addr)
            .field("allowed_origins", &self.allowed_origins)
            .field("mcp_http_stateful", &self.mcp_http_stateful)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Argument parsing failed, or `--help`/`--version` was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid {name} value: {value}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("{name} conflicts with {other}: {reason}")]
    ConflictingSetting {
        name: &'static str,
        other: &'static str,
        reason: &'static str,
    },
}

impl LineageConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::try_parse()?;
        Self::try_from(args)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            read_only: self.read_only,
            api_token: self.api_token.clone(),
            allowed_origins: self.allowed_origins.clone(),
        }
    }

    pub fn surreal_settings(&self) -> SurrealSettings {
        SurrealSettings {
            endpoint: self.db_uri.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }

    pub const fn http_server_config(&self) -> McpHttpServerConfig {
        McpHttpServerConfig::new(self.mcp_http_addr).with_stateful_mode(self.mcp_http_stateful)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_origins(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl TryFrom<CliArgs> for LineageConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let db_uri = non_blank(args.db_uri).ok_or(ConfigError::MissingSetting("LINEAGE_DB_URI"))?;
        let db_username = non_blank(args.db_username);
        let db_password = non_blank(args.db_password);
        let api_token = non_blank(args.api_token);
        let has_credentials = db_username.is_some() || db_password.is_some();

        match (args.transport, api_token.is_some()) {
            (Transport::Stdio, true) => {
                return Err(ConfigError::ConflictingSetting {
                    name: "LINEAGE_API_TOKEN",
                    other: "LINEAGE_MCP_TRANSPORT",
                    reason: "API tokens only apply to the http transport",
                });
            }
            (Transport::Stdio, false) | (Transport::Http, true) => {
                if db_username.is_none() {
                    return Err(ConfigError::MissingSetting("LINEAGE_DB_USERNAME"));
                }
                if db_password.is_none() {
                    return Err(ConfigError::MissingSetting("LINEAGE_DB_PASSWORD"));
                }
            }
            (Transport::Http, false) if has_credentials => {
                return Err(ConfigError::ConflictingSetting {
                    name: "LINEAGE_DB_USERNAME",
                    other: "LINEAGE_MCP_TRANSPORT",
                    reason: "http callers supply their own credentials unless LINEAGE_API_TOKEN is set",
                });
            }
            (Transport::Http, false) => {}
        }

        if args.db_namespace.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "LINEAGE_DB_NAMESPACE",
                value: args.db_namespace,
            });
        }
        if args.db_database.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "LINEAGE_DB_DATABASE",
                value: args.db_database,
            });
        }
        if args.schema_sample_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "LINEAGE_SCHEMA_SAMPLE_SIZE",
                value: args.schema_sample_size.to_string(),
            });
        }

        Ok(Self {
            db_uri,
            db_username,
            db_password,
            db_namespace: args.db_namespace,
            db_database: args.db_database,
            read_only: args.read_only,
            schema_sample_size: args.schema_sample_size,
            log_level: args.log_level,
            log_format: args.log_format,
            transport: args.transport,
            mcp_http_addr: SocketAddr::new(args.mcp_http_host, args.mcp_http_port),
            allowed_origins: parse_origins(&args.mcp_http_allowed_origins),
            mcp_http_stateful: args.mcp_http_stateful,
            api_token,
        })
    }
}
