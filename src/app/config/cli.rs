use super::groups::{FieldBinding, FieldMappings, RetrySettings};
use super::serde_helpers::{
    load_env_enum, load_env_path_opt, load_env_string, load_env_string_opt, load_env_var,
};
use super::{ConfigError, LogFormat, LogLevel, TimestampSource};
use crate::reliability::RetryPolicy;
use crate::sender::{Credentials, MissingApplicationPolicy, TransportConfig};
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "LOGSIGHT_CONFIG";

#[derive(Parser, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Base URL of the logsight service
    #[arg(long, env = "LOGSIGHT_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Account email
    #[arg(long, env = "LOGSIGHT_EMAIL", default_value = "")]
    pub email: String,

    /// Account password
    #[arg(long, env = "LOGSIGHT_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Create applications that do not exist yet
    #[arg(long, env = "LOGSIGHT_AUTO_CREATE", default_value_t = true, action = ArgAction::Set)]
    pub auto_create: bool,

    /// Number of events per publish batch
    #[arg(long, env = "BATCH_SIZE", default_value = "100")]
    pub batch_size: usize,

    /// Retry rounds for events the service asked to resend
    #[arg(long, env = "MAX_RETRIES", default_value = "20")]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[arg(long, env = "TIMEOUT_SECS", default_value = "120")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "30")]
    pub connect_timeout_secs: u64,

    /// Maximum idle HTTP connections kept in the pool
    #[arg(long, env = "MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: usize,

    /// Gzip request bodies
    #[arg(long, env = "COMPRESS_REQUESTS")]
    pub compress_requests: bool,

    /// NDJSON input file (stdin when omitted)
    #[arg(long, env = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Diagnostic output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Constant application name
    #[arg(long, env = "LOGSIGHT_APPLICATION_NAME")]
    pub application_name: Option<String>,

    /// Event key holding the application name
    #[arg(long, env = "LOGSIGHT_APPLICATION_KEY")]
    pub application_key: Option<String>,

    /// Constant tag
    #[arg(long, env = "LOGSIGHT_TAG")]
    pub tag: Option<String>,

    /// Event key holding the message
    #[arg(long, env = "MESSAGE_KEY")]
    pub message_key: Option<String>,

    /// Event key holding the level
    #[arg(long, env = "LEVEL_KEY")]
    pub level_key: Option<String>,

    /// Event key holding the timestamp
    #[arg(long, env = "TIMESTAMP_KEY")]
    pub timestamp_key: Option<String>,

    /// Timestamp used when no timestamp key is bound
    #[arg(long, env = "TIMESTAMP_SOURCE", default_value = "generated")]
    pub timestamp_source: TimestampSource,

    /// Field bindings (configuration file only)
    #[arg(skip)]
    pub fields: FieldMappings,

    /// Retry backoff (configuration file only)
    #[arg(skip)]
    pub retry: RetrySettings,

    #[serde(skip)]
    #[arg(skip)]
    pub timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("password", &"***")
            .field("auto_create", &self.auto_create)
            .field("batch_size", &self.batch_size)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("compress_requests", &self.compress_requests)
            .field("input", &self.input)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("fields", &self.fields)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            email: String::new(),
            password: String::new(),
            auto_create: true,
            batch_size: 100,
            max_retries: 20,
            timeout_secs: 120,
            connect_timeout_secs: 30,
            max_connections: 10,
            compress_requests: false,
            input: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
            application_name: None,
            application_key: None,
            tag: None,
            message_key: None,
            level_key: None,
            timestamp_key: None,
            timestamp_source: TimestampSource::Generated,
            fields: FieldMappings::default(),
            retry: RetrySettings::default(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Takes `base` unless the value was given on the command line or through
/// its environment variable.
fn layer<T>(matches: &ArgMatches, id: &str, cli: &mut T, base: T) {
    let explicit = matches!(
        matches.value_source(id),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    );
    if !explicit {
        *cli = base;
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(toml) = std::env::var(CONFIG_ENV) {
            return Self::from_toml_str(&toml);
        }

        let mut config = Config::default();

        load_env_string("LOGSIGHT_URL", &mut config.url);
        load_env_string("LOGSIGHT_EMAIL", &mut config.email);
        load_env_string("LOGSIGHT_PASSWORD", &mut config.password);
        load_env_var("LOGSIGHT_AUTO_CREATE", &mut config.auto_create)?;
        load_env_var("BATCH_SIZE", &mut config.batch_size)?;
        load_env_var("MAX_RETRIES", &mut config.max_retries)?;
        load_env_var("TIMEOUT_SECS", &mut config.timeout_secs)?;
        load_env_var("CONNECT_TIMEOUT_SECS", &mut config.connect_timeout_secs)?;
        load_env_var("MAX_CONNECTIONS", &mut config.max_connections)?;
        load_env_var("COMPRESS_REQUESTS", &mut config.compress_requests)?;
        load_env_path_opt("INPUT_FILE", &mut config.input);
        load_env_enum("LOG_LEVEL", &mut config.log_level)?;
        load_env_enum("LOG_FORMAT", &mut config.log_format)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);
        load_env_string_opt("LOGSIGHT_APPLICATION_NAME", &mut config.application_name);
        load_env_string_opt("LOGSIGHT_APPLICATION_KEY", &mut config.application_key);
        load_env_string_opt("LOGSIGHT_TAG", &mut config.tag);
        load_env_string_opt("MESSAGE_KEY", &mut config.message_key);
        load_env_string_opt("LEVEL_KEY", &mut config.level_key);
        load_env_string_opt("TIMESTAMP_KEY", &mut config.timestamp_key);
        load_env_enum("TIMESTAMP_SOURCE", &mut config.timestamp_source)?;

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Command line (with env fallbacks) layered over a TOML base taken from
    /// `LOGSIGHT_CONFIG` or `--config-file`. A flag or environment variable
    /// that is actually set wins over the TOML value, even when it equals the
    /// built-in default; TOML wins over defaults.
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command().get_matches_from(args);
        let mut config = Config::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

        let base: Option<Config> = if let Ok(toml) = std::env::var(CONFIG_ENV) {
            Some(toml::from_str(&toml)?)
        } else if let Some(path) = &config.config_file {
            Some(toml::from_str(&std::fs::read_to_string(path)?)?)
        } else {
            None
        };

        if let Some(base) = base {
            config.merge_base(&matches, base);
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_base(&mut self, matches: &ArgMatches, base: Config) {
        layer(matches, "url", &mut self.url, base.url);
        layer(matches, "email", &mut self.email, base.email);
        layer(matches, "password", &mut self.password, base.password);
        layer(matches, "auto_create", &mut self.auto_create, base.auto_create);
        layer(matches, "batch_size", &mut self.batch_size, base.batch_size);
        layer(matches, "max_retries", &mut self.max_retries, base.max_retries);
        layer(matches, "timeout_secs", &mut self.timeout_secs, base.timeout_secs);
        layer(
            matches,
            "connect_timeout_secs",
            &mut self.connect_timeout_secs,
            base.connect_timeout_secs,
        );
        layer(matches, "max_connections", &mut self.max_connections, base.max_connections);
        layer(matches, "compress_requests", &mut self.compress_requests, base.compress_requests);
        layer(matches, "input", &mut self.input, base.input);
        layer(matches, "log_level", &mut self.log_level, base.log_level);
        layer(matches, "log_format", &mut self.log_format, base.log_format);
        layer(matches, "application_name", &mut self.application_name, base.application_name);
        layer(matches, "application_key", &mut self.application_key, base.application_key);
        layer(matches, "tag", &mut self.tag, base.tag);
        layer(matches, "message_key", &mut self.message_key, base.message_key);
        layer(matches, "level_key", &mut self.level_key, base.level_key);
        layer(matches, "timestamp_key", &mut self.timestamp_key, base.timestamp_key);
        layer(matches, "timestamp_source", &mut self.timestamp_source, base.timestamp_source);

        self.fields = base.fields;
        self.retry = base.retry;
    }

    /// Derives durations and folds the single-key overrides into the field
    /// bindings.
    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.timeout = Duration::from_secs(self.timeout_secs);
        self.connect_timeout = Duration::from_secs(self.connect_timeout_secs);

        if let Some(key) = &self.application_key {
            self.fields.application = Some(FieldBinding::key(key.as_str()));
        } else if let Some(name) = &self.application_name {
            self.fields.application = Some(FieldBinding::constant(name.as_str()));
        }
        if let Some(tag) = &self.tag {
            self.fields.tag = Some(FieldBinding::constant(tag.as_str()));
        }
        if let Some(key) = &self.message_key {
            self.fields.message = Some(FieldBinding::key(key.as_str()));
        }
        if let Some(key) = &self.level_key {
            self.fields.level = Some(FieldBinding::key(key.as_str()));
        }
        if let Some(key) = &self.timestamp_key {
            self.fields.timestamp = Some(FieldBinding::key(key.as_str()));
        }

        Ok(())
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.url.clone(),
            timeout: self.timeout,
            connection_timeout: self.connect_timeout,
            max_connections: self.max_connections,
            enable_compression: self.compress_requests,
            ..TransportConfig::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.as_str(), self.password.as_str())
    }

    pub fn missing_application_policy(&self) -> MissingApplicationPolicy {
        MissingApplicationPolicy::from_auto_create(self.auto_create)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy(self.max_retries)
    }
}
