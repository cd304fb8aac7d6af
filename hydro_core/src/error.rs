//! Error types for the hydro_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hydro_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session state is inconsistent
    #[error("State error: {0}")]
    State(String),

    /// Malformed numeric or text input during the dialogue
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Command arguments missing or malformed
    #[error("Invalid argument, usage: {usage}")]
    InvalidArgument { usage: &'static str },

    /// A ledger operation was attempted before the profile was completed
    #[error("Profile not set")]
    ProfileNotSet,

    /// The nutrition lookup had nothing usable for this food
    #[error("Food not found: {0}")]
    NotFound(String),

    /// Grams were sent without a preceding food lookup
    #[error("No pending food entry")]
    NoPendingEntry,

    /// Weather or nutrition service failed or timed out
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

/// Why a piece of user input was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),

    #[error("{field} must be {constraint}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
    },

    #[error("text must not be empty")]
    Empty,

    #[error("there is nothing to skip right now")]
    UnexpectedSkip,
}

impl Error {
    /// Whether this error must be surfaced to the user rather than handled internally
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidArgument { .. }
                | Error::ProfileNotSet
                | Error::NotFound(_)
                | Error::NoPendingEntry
        )
    }
}
