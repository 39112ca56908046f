//! Agent capability consumed by the team.
//!
//! How an agent produces its output (LLM prompting, rules, a human) is opaque
//! to the engine. The team only calls [`Agent::process`] and reads specific
//! fields of the returned [`AgentOutput`]; it mutates `has_been_primus` and
//! reads `expertise`.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::task::Task;

/// Declared proficiency of an agent in its expertise areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    #[default]
    Novice,
    Intermediate,
    Expert,
}

impl ExpertiseLevel {
    /// All levels from lowest to highest.
    pub fn all() -> &'static [ExpertiseLevel] {
        &[Self::Novice, Self::Intermediate, Self::Expert]
    }
}

impl std::fmt::Display for ExpertiseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Novice => write!(f, "novice"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

/// Failure reported by an agent. Always recovered locally by the team.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent {agent} failed: {reason}")]
    Failed { agent: String, reason: String },

    #[error("Agent {0} has no response for this task")]
    NoResponse(String),
}

/// Output of one `process` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentOutput {
    /// Option id the agent votes for.
    pub vote: Option<String>,
    /// Free-form result text (a proposed solution or a perspective).
    pub result: Option<String>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
    /// Critiques when the agent acts as a critic.
    pub critiques: Vec<String>,
    /// Recommendations when the agent speaks for a discipline.
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AgentOutput {
    /// Output carrying only a vote.
    pub fn vote(option: &str) -> Self {
        Self {
            vote: Some(option.to_string()),
            ..Self::default()
        }
    }

    /// Output carrying only critiques.
    pub fn critiques(items: &[&str]) -> Self {
        Self {
            critiques: items.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_recommendations(mut self, items: &[&str]) -> Self {
        self.recommendations = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_result(mut self, result: &str) -> Self {
        self.result = Some(result.to_string());
        self
    }
}

/// A team member.
pub trait Agent: Send {
    fn name(&self) -> &str;

    fn expertise(&self) -> &[String];

    fn set_expertise(&mut self, expertise: Vec<String>);

    fn expertise_level(&self) -> ExpertiseLevel {
        ExpertiseLevel::Novice
    }

    fn has_been_primus(&self) -> bool;

    fn set_has_been_primus(&mut self, value: bool);

    /// Handle a task. May block on external I/O; the team applies no timeout.
    fn process(&mut self, task: &Task) -> Result<AgentOutput, AgentError>;

    /// Whether any expertise term equals `term` (case-insensitive).
    fn has_expertise(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.expertise().iter().any(|e| e.to_lowercase() == term)
    }
}

/// Deterministic agent that replays queued outputs.
///
/// Once the queue is exhausted it keeps returning the fallback output, or
/// `AgentError::NoResponse` when none is set. Marked failing, it always errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedAgent {
    name: String,
    expertise: Vec<String>,
    #[serde(default)]
    expertise_level: ExpertiseLevel,
    #[serde(default)]
    has_been_primus: bool,
    #[serde(default)]
    responses: VecDeque<AgentOutput>,
    #[serde(default)]
    fallback: Option<AgentOutput>,
    #[serde(default)]
    failing: bool,
}

impl ScriptedAgent {
    pub fn new(name: &str, expertise: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            expertise: expertise.iter().map(|s| s.to_string()).collect(),
            expertise_level: ExpertiseLevel::Novice,
            has_been_primus: false,
            responses: VecDeque::new(),
            fallback: None,
            failing: false,
        }
    }

    pub fn with_level(mut self, level: ExpertiseLevel) -> Self {
        self.expertise_level = level;
        self
    }

    /// Always answer with a vote for `option`.
    pub fn voting(self, option: &str) -> Self {
        self.with_fallback(AgentOutput::vote(option))
    }

    pub fn with_fallback(mut self, output: AgentOutput) -> Self {
        self.fallback = Some(output);
        self
    }

    /// Queue an output to be returned before the fallback.
    pub fn with_response(mut self, output: AgentOutput) -> Self {
        self.responses.push_back(output);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn set_level(&mut self, level: ExpertiseLevel) {
        self.expertise_level = level;
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn expertise(&self) -> &[String] {
        &self.expertise
    }

    fn set_expertise(&mut self, expertise: Vec<String>) {
        self.expertise = expertise;
    }

    fn expertise_level(&self) -> ExpertiseLevel {
        self.expertise_level
    }

    fn has_been_primus(&self) -> bool {
        self.has_been_primus
    }

    fn set_has_been_primus(&mut self, value: bool) {
        self.has_been_primus = value;
    }

    fn process(&mut self, _task: &Task) -> Result<AgentOutput, AgentError> {
        if self.failing {
            return Err(AgentError::Failed {
                agent: self.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        if let Some(next) = self.responses.pop_front() {
            return Ok(next);
        }
        self.fallback
            .clone()
            .ok_or_else(|| AgentError::NoResponse(self.name.clone()))
    }
}
