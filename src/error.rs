//! Custom error types for paramsweep
//!
//! Provides structured error handling with context propagation
//! and user-friendly error messages.

use thiserror::Error;

use crate::fuzzer::ParamCategory;

/// Main error type for a fuzzing run
#[derive(Error, Debug)]
pub enum FuzzError {
    /// Configuration document errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generator rejected its options
    #[error("{category} parameter '{name}': {source}")]
    InvalidConfiguration {
        category: ParamCategory,
        name: String,
        #[source]
        source: GeneratorError,
    },

    #[error("{category} parameter '{name}': generator '{kind}' is not recognized")]
    UnknownGeneratorType {
        category: ParamCategory,
        name: String,
        kind: String,
    },

    #[error("{category} parameter '{name}': generator slot {slot} has {count} entries, expected exactly one")]
    InvalidGeneratorArity {
        category: ParamCategory,
        name: String,
        slot: usize,
        count: usize,
    },

    #[error("There are no parameters to be fuzzed")]
    NoGeneratorsConfigured,

    #[error("Invalid target URL '{url}': {reason}")]
    MalformedTarget { url: String, reason: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid cookie '{name}': {reason}")]
    InvalidCookie { name: String, reason: String },

    /// A dispatched request failed at the transport level
    #[error("Request #{seq} to {url} failed: {source}")]
    Transport {
        seq: u64,
        url: String,
        #[source]
        source: HttpError,
    },

    /// The operator asked the run to stop
    #[error("Fuzzing cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Errors raised while a generator validates its options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("{generator} received invalid type for '{field}'")]
    WrongType {
        generator: &'static str,
        field: &'static str,
    },

    #[error("{generator}: start and stop can not be the same")]
    StartEqualsStop { generator: &'static str },

    #[error("{generator}: step can not be zero")]
    ZeroStep { generator: &'static str },

    #[error("{generator}: step {step} never reaches stop {stop} from start {start}")]
    StepAwayFromStop {
        generator: &'static str,
        start: i64,
        stop: i64,
        step: i64,
    },

    #[error("{generator}: no values configured")]
    Empty { generator: &'static str },

    #[error("{generator}: failed to read '{path}': {reason}")]
    Unreadable {
        generator: &'static str,
        path: String,
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {field} - {reason}")]
    ValidationError { field: String, reason: String },
}

/// HTTP transport errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

impl FuzzError {
    /// Whether this is the operator-requested stop rather than a defect
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FuzzError::Cancelled)
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FuzzError::Config(e) => format!("Configuration problem: {}", e.user_hint()),
            FuzzError::InvalidConfiguration { category, name, source } => {
                format!("Generator for {} parameter '{}' is misconfigured: {}", category, name, source)
            }
            FuzzError::UnknownGeneratorType { .. } => format!(
                "{}. Known generators: {}.",
                self,
                crate::fuzzer::GeneratorKind::all()
                    .iter()
                    .map(|k| format!("{} ({})", k.name(), k.description()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            FuzzError::NoGeneratorsConfigured => {
                "Nothing to fuzz. Add at least one generator under path-params, url-params, header-params or cookie-params.".into()
            }
            FuzzError::Transport { seq, source, .. } => {
                format!("Network issue on request #{}: {}", seq, source.user_hint())
            }
            FuzzError::Cancelled => "Stopped at operator request.".into(),
            _ => self.to_string(),
        }
    }
}

/// Trait for providing user-friendly hints
pub trait UserHint {
    fn user_hint(&self) -> String;
}

impl UserHint for ConfigError {
    fn user_hint(&self) -> String {
        match self {
            ConfigError::ReadError { path, .. } => {
                format!("Could not read '{}'. Check if the file exists and you have read permissions.", path)
            }
            ConfigError::ParseError(reason) => {
                format!("The configuration file has invalid syntax: {}", reason)
            }
            ConfigError::ValidationError { field, reason } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl UserHint for HttpError {
    fn user_hint(&self) -> String {
        match self {
            HttpError::ConnectionError(_) => {
                "Could not connect to the server. Check if it's running and accessible.".into()
            }
            HttpError::Timeout(ms) => {
                format!("Request timed out after {}ms. The server may be slow or unresponsive.", ms)
            }
            _ => self.to_string(),
        }
    }
}
