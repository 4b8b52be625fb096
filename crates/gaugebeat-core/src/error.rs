//! Shared error type across gaugebeat crates.

use thiserror::Error;

/// Stable error codes, used as a log field and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sample was NaN or infinite.
    InvalidValue,
    /// Series outside the registered metric/label universe.
    UnknownSeries,
    /// The pluggable sample source failed.
    GeneratorFailure,
    /// Configuration rejected by parsing or validation.
    BadConfig,
    /// Unsupported config schema version.
    UnsupportedVersion,
    /// Listener could not be bound.
    Bind,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidValue => "INVALID_VALUE",
            ErrorKind::UnknownSeries => "UNKNOWN_SERIES",
            ErrorKind::GeneratorFailure => "GENERATOR_FAILURE",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Bind => "BIND",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GaugebeatError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum GaugebeatError {
    #[error("invalid value for {series}: {value}")]
    InvalidValue { series: String, value: f64 },
    #[error("unknown series: {0}")]
    UnknownSeries(String),
    #[error("sample generator failed for {series}: {reason}")]
    GeneratorFailure { series: String, reason: String },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl GaugebeatError {
    /// Map the error to its stable code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GaugebeatError::InvalidValue { .. } => ErrorKind::InvalidValue,
            GaugebeatError::UnknownSeries(_) => ErrorKind::UnknownSeries,
            GaugebeatError::GeneratorFailure { .. } => ErrorKind::GeneratorFailure,
            GaugebeatError::BadConfig(_) => ErrorKind::BadConfig,
            GaugebeatError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            GaugebeatError::Bind { .. } => ErrorKind::Bind,
            GaugebeatError::Internal(_) => ErrorKind::Internal,
        }
    }
}
