//! Error kinds shared by every Relata crate.
//!
//! All of these are contract violations reported synchronously to the caller.
//! The engine performs no I/O of its own, so nothing here is worth retrying.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelataError {
    /// Unknown agent id, or an ordered pair with no edge in the mesh.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// An agent with this id is already registered.
    #[error("agent {0} already exists")]
    Conflict(String),

    /// Restore input is missing required top-level fields or is malformed.
    #[error("invalid state format: {0}")]
    InvalidFormat(String),

    /// The external content-generation collaborator failed.
    #[error("content generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelataError {
    pub fn unknown_agent(id: &str) -> Self {
        Self::NotFound {
            what: format!("agent {}", id),
        }
    }

    pub fn unknown_pair(source: &str, target: &str) -> Self {
        Self::NotFound {
            what: format!("interaction {} -> {}", source, target),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelataError>;
