//! Error taxonomy for team coordination.
//!
//! Only validation failures are surfaced as `Err`. Degraded outcomes (no
//! solutions, no votes, a failing agent) are returned as typed sentinel
//! payloads and logged, so callers always get an inspectable result.

use thiserror::Error;

use crate::config::ConfigError;
use crate::dialectic::state::TransitionError;

/// Fatal errors from team operations.
#[derive(Debug, Error)]
pub enum TeamError {
    #[error("Role mapping references agent outside the team: {agent}")]
    InvalidRoleMapping { agent: String },

    #[error("Team has no agents")]
    NoAgents,

    #[error("Agent given more than one role: {agent}")]
    DuplicateRole { agent: String },

    #[error("Agent already in team: {0}")]
    DuplicateAgent(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Reasoning state error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TeamError {
    /// Whether the error stems from caller input rather than engine state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRoleMapping { .. }
                | Self::DuplicateRole { .. }
                | Self::NoAgents
                | Self::DuplicateAgent(_)
                | Self::UnknownAgent(_)
        )
    }
}

/// Result type for team operations
pub type TeamResult<T> = Result<T, TeamError>;
