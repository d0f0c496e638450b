use crate::error::ConfigError;
use anyhow::{Context as _, Result};
use serde::Deserialize;
use serde_loader::Json5Path;
use serde_semver::SemverReq;
use std::{env, path::Path, time::Duration};

/// Environment variable naming the config file of the simulator plugin.
pub const CONFIG_ENV: &str = "ROI_BRIDGE_CONFIG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Clone, SemverReq)]
#[version("0.1.0")]
pub struct Version;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Config format version.
    pub version: Version,

    /// IP address of the classification server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the classification server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect timeout. Blocks until the OS gives up when unset. Zero is
    /// rejected.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Read and write timeout. Blocks until a response or a disconnect when
    /// unset. Zero is rejected.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    /// How the response is read.
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Upper bound on response bytes. Must be positive.
    #[serde(default = "default_max_response_len")]
    pub max_response_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// One read of at most `max_response_len` bytes.
    #[default]
    SingleRead,
    /// Keep reading until a newline, EOF or `max_response_len` bytes.
    Line,
}

impl Config {
    /// Loads a JSON5 config file.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let config: Config = Json5Path::open_and_take(path)
            .with_context(|| format!("unable to load config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Checks the values that would make every exchange fail or hang.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == Some(0) {
            return Err(ConfigError::Zero("connect_timeout_ms"));
        }
        if self.read_timeout_ms == Some(0) {
            return Err(ConfigError::Zero("read_timeout_ms"));
        }
        if self.max_response_len == 0 {
            return Err(ConfigError::Zero("max_response_len"));
        }
        Ok(())
    }

    /// Loads the file named by `ROI_BRIDGE_CONFIG`, or the defaults if the
    /// variable is unset.
    pub fn from_env() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: Version,
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: None,
            read_timeout_ms: None,
            response_mode: ResponseMode::default(),
            max_response_len: default_max_response_len(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_response_len() -> usize {
    crate::protocol::MAX_RESPONSE_LEN
}
