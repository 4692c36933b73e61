//! Fuzzing run configuration

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::fuzzer::ParamCategory;

/// One generator slot: `{ "<generator-type>": <options> }`
pub type GeneratorSpec = Map<String, Value>;

/// Parameter name to its ordered generator slots
pub type ParameterList = BTreeMap<String, Vec<GeneratorSpec>>;

/// Target and parameter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Target host name or address
    pub host: String,

    /// Target port (0 selects the scheme default)
    #[serde(default)]
    pub port: u32,

    /// Use https
    #[serde(default)]
    pub tls: bool,

    /// Path template; `{name}` placeholders take path parameter values
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub path_params: ParameterList,

    #[serde(default)]
    pub url_params: ParameterList,

    #[serde(default)]
    pub header_params: ParameterList,

    #[serde(default)]
    pub cookie_params: ParameterList,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Follow redirects
    pub follow_redirects: bool,

    /// Maximum redirect depth
    pub max_redirects: usize,

    /// User agent string
    pub user_agent: String,

    /// Maximum response body size to capture (bytes)
    pub max_response_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            follow_redirects: false,
            max_redirects: 10,
            user_agent: format!("paramsweep/{}", env!("CARGO_PKG_VERSION")),
            max_response_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Config {
    /// Load and validate a configuration document.
    ///
    /// Files ending in `.toml` are read as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let mut config: Config = if is_toml {
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Normalize defaults and reject unusable target settings
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.host.ends_with('/') {
            self.host.pop();
        }
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "host".into(),
                reason: "host can not be empty".into(),
            });
        }

        if self.port == 0 {
            self.port = if self.tls { 443 } else { 80 };
        }
        if self.port > u16::MAX as u32 {
            return Err(ConfigError::ValidationError {
                field: "port".into(),
                reason: format!("port '{}' is invalid", self.port),
            });
        }

        if self.path.is_empty() {
            self.path = "/".to_string();
        } else if !self.path.starts_with('/') {
            self.path.insert(0, '/');
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                field: "http.timeout-secs".into(),
                reason: "timeout must be greater than 0".into(),
            });
        }

        Ok(())
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// Host, with the port only when it differs from the scheme default
    pub fn authority(&self) -> String {
        let default_port = if self.tls { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Parameter lists in registration order
    pub fn parameter_lists(&self) -> [(ParamCategory, &ParameterList); 4] {
        [
            (ParamCategory::Path, &self.path_params),
            (ParamCategory::Url, &self.url_params),
            (ParamCategory::Header, &self.header_params),
            (ParamCategory::Cookie, &self.cookie_params),
        ]
    }

    /// Example document printed by `--generate-config`
    pub fn example() -> Value {
        json!({
            "host": "localhost",
            "port": 8080,
            "tls": false,
            "path": "/users/{id}",
            "path-params": {
                "id": [{ "increment": { "start": 1, "stop": 5, "step": 1 } }]
            },
            "url-params": {
                "page": [{ "increment": { "start": 0, "stop": 100, "step": 10 } }],
                "sort": [{ "value": "asc" }, { "list": ["desc", "", "'"] }]
            },
            "header-params": {
                "X-Api-Version": [{ "value": "1" }]
            },
            "cookie-params": {
                "session": [{ "value": "guest" }]
            },
            "http": HttpConfig::default()
        })
    }

    /// Get data directory path
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        use anyhow::Context;

        let dirs = directories::ProjectDirs::from("io", "paramsweep", "paramsweep")
            .context("Failed to determine data directory")?;

        Ok(dirs.data_dir().to_path_buf())
    }
}
