//! Error types for VIGIL operations

use thiserror::Error;

/// Research provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Invalid API key for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Transport error talking to {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} returned an empty report")]
    EmptyReport { provider: String },
}

/// Snapshot store errors. A failed save must never leave the latest
/// pointer partially written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to decode snapshot {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("Failed to encode snapshot: {reason}")]
    EncodeFailed { reason: String },

    #[error("Snapshot {path} failed content-hash verification")]
    HashMismatch { path: String },

    #[error("Record timestamp {current} is not after latest snapshot timestamp {latest}")]
    NonMonotonicTimestamp { current: String, latest: String },

    #[error("Archive file already exists: {path}")]
    ArchiveCollision { path: String },
}

/// Notification delivery errors. Delivery failure never rolls back a
/// persisted snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Failed to build message: {reason}")]
    BuildFailed { reason: String },

    #[error("Delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or VIGIL_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    ParseFailed { reason: String },

    #[error("Missing required environment variable: {var}")]
    MissingEnv { var: &'static str },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Classification policy errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyError {
    #[error("Metric name must not be empty")]
    EmptyMetricName,

    #[error("Topic name must not be empty")]
    EmptyTopicName,

    #[error("Duplicate {what} name: {name}")]
    DuplicateName { what: &'static str, name: String },

    #[error("Invalid threshold for {metric}: {reason}")]
    InvalidThreshold { metric: String, reason: String },

    #[error("Invalid danger bounds for {metric}: below {below} is not under above {above}")]
    InvalidDangerBounds {
        metric: String,
        below: f64,
        above: f64,
    },

    #[error("Invalid trivial_similarity {value}: must be within 0.0..=1.0")]
    InvalidSimilarityBound { value: f64 },
}

/// Master error type for all VIGIL errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VigilError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Result type alias for VIGIL operations.
pub type VigilResult<T> = Result<T, VigilError>;

// =============================================================================
// TESTS
// =============================================================================
