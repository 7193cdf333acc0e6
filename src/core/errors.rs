/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node construction errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum NodeError {
    #[error("Node key must not be empty")]
    #[diagnostic(
        code(node::empty_key),
        help("Provide a permission key such as `build.place` or `group.admin`.")
    )]
    EmptyKey,

    #[error("Node duration must be positive")]
    #[diagnostic(
        code(node::non_positive_duration),
        help("Temporary grants need a duration greater than zero.")
    )]
    NonPositiveDuration,

    #[error("Node expiry is not in the future")]
    #[diagnostic(
        code(node::expiry_in_past),
        help("An explicit expiry must be strictly after the current instant.")
    )]
    ExpiryInPast,

    #[error("Node duration is too large")]
    #[diagnostic(
        code(node::duration_overflow),
        help("The expiry would fall outside the representable time range.")
    )]
    DurationOverflow,
}

/// Holder management errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum HolderError {
    #[error("Group already exists: {0}")]
    #[diagnostic(
        code(holder::group_exists),
        help("Group names are unique and case-insensitive.")
    )]
    GroupExists(String),

    #[error("Group not found: {0}")]
    #[diagnostic(
        code(holder::group_not_found),
        help("The group may have been deleted or not loaded yet.")
    )]
    GroupNotFound(String),

    #[error("Invalid group name: {0}")]
    #[diagnostic(
        code(holder::invalid_group_name),
        help("Group names must be non-empty and contain no whitespace or dots.")
    )]
    InvalidGroupName(String),
}

/// Storage collaborator errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    #[diagnostic(
        code(storage::unavailable),
        help("The backend could not be reached. The in-memory state is kept.")
    )]
    Unavailable(String),

    #[error("Failed to save {target}: {reason}")]
    #[diagnostic(
        code(storage::save_failed),
        help("The change is live in memory but was not persisted.")
    )]
    SaveFailed { target: String, reason: String },

    #[error("Corrupt record for {0}")]
    #[diagnostic(code(storage::corrupt_record))]
    CorruptRecord(String),

    #[error("Persistence queue closed")]
    #[diagnostic(
        code(storage::queue_closed),
        help("The persistence worker has shut down; no further saves are accepted.")
    )]
    QueueClosed,
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Unknown temporary modifier: {0}")]
    #[diagnostic(
        code(config::unknown_modifier),
        help("Use one of: deny, replace, accumulate.")
    )]
    UnknownModifier(String),

    #[error("Invalid value for {key}: {value}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue { key: String, value: String },

    #[error("Failed to read config: {0}")]
    #[diagnostic(
        code(config::read_failed),
        help("Check that PERMS_CONFIG points to a readable JSON file.")
    )]
    Read(String),

    #[error("Failed to parse config: {0}")]
    #[diagnostic(code(config::parse_failed))]
    Parse(String),
}

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Node error: {0}")]
    #[diagnostic(transparent)]
    Node(#[from] NodeError),

    #[error("Holder error: {0}")]
    #[diagnostic(transparent)]
    Holder(#[from] HolderError),

    #[error("Storage error: {0}")]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Read(err.to_string())
    }
}
