//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A schema name is claimed by structurally different definitions and
    /// the active strategy forbids renaming.
    #[from(ignore)]
    #[display("Unresolved conflict for schema '{name}' (defined in: {origins})")]
    UnresolvedConflict {
        /// The contested schema name.
        name: String,
        /// Comma separated titles of the documents that define it.
        origins: String,
    },

    /// A schema node that cannot be resolved to a target type.
    #[from(ignore)]
    #[display("Malformed schema node '{name}': cannot be resolved to a type")]
    MalformedNode {
        /// The owning schema or property path.
        name: String,
    },

    /// A schema composition the generator does not model (oneOf/allOf/anyOf,
    /// map-of-map values).
    #[from(ignore)]
    #[display("Unsupported composition at '{name}'")]
    UnsupportedComposition {
        /// The owning schema or property path.
        name: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Attaches an owning schema/property path to node-level errors that were
    /// raised without one. Errors already carrying a location are untouched.
    pub fn locate(self, path: &str) -> AppError {
        match self {
            AppError::MalformedNode { name } if name.is_empty() => AppError::MalformedNode {
                name: path.to_string(),
            },
            AppError::UnsupportedComposition { name } if name.is_empty() => {
                AppError::UnsupportedComposition {
                    name: path.to_string(),
                }
            }
            other => other,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
