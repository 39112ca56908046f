//! Reasoning state machine: stages, transitions, and session tracking.
//!
//! ```text
//!   ThesisIdentified ──▶ AntithesisGenerated ──▶ SynthesisGenerated ──▶ Evaluated
//! ```
//!
//! A session only moves forward one stage at a time; `Evaluated` is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ReasoningMode;

/// Stage of a dialectical reasoning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStage {
    ThesisIdentified,
    AntithesisGenerated,
    SynthesisGenerated,
    Evaluated,
}

impl ReasoningStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Evaluated)
    }

    /// Valid transitions from this stage.
    pub fn valid_transitions(self) -> &'static [ReasoningStage] {
        match self {
            Self::ThesisIdentified => &[Self::AntithesisGenerated],
            Self::AntithesisGenerated => &[Self::SynthesisGenerated],
            Self::SynthesisGenerated => &[Self::Evaluated],
            Self::Evaluated => &[],
        }
    }
}

impl std::fmt::Display for ReasoningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThesisIdentified => write!(f, "thesis_identified"),
            Self::AntithesisGenerated => write!(f, "antithesis_generated"),
            Self::SynthesisGenerated => write!(f, "synthesis_generated"),
            Self::Evaluated => write!(f, "evaluated"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: ReasoningStage,
    pub to: ReasoningStage,
    pub timestamp: DateTime<Utc>,
}

/// Error for invalid stage transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: ReasoningStage,
    pub to: ReasoningStage,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid transition {} → {}: {}", self.from, self.to, self.reason)
    }
}

impl std::error::Error for TransitionError {}

/// One reasoning run over a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSession {
    pub id: String,
    pub task_id: String,
    pub mode: ReasoningMode,
    pub stage: ReasoningStage,
    pub transitions: Vec<StageTransition>,
    pub started_at: DateTime<Utc>,
}

impl ReasoningSession {
    /// Start a session at `ThesisIdentified`.
    pub fn begin(task_id: &str, mode: ReasoningMode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            mode,
            stage: ReasoningStage::ThesisIdentified,
            transitions: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn advance(&mut self, to: ReasoningStage) -> Result<(), TransitionError> {
        if !self.stage.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.stage,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.stage.valid_transitions()
                ),
            });
        }

        debug!(session = %self.id, from = %self.stage, to = %to, "Reasoning stage advanced");
        self.transitions.push(StageTransition {
            from: self.stage,
            to,
            timestamp: Utc::now(),
        });
        self.stage = to;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.stage.is_terminal()
    }
}
