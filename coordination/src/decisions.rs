//! Decision ledger: what the team decided, how, and whether it shipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    MajorityVote,
    WeightedVote,
    TieBreak,
    ConsensusFallback,
    SingleSolution,
    ConsensusSynthesis,
}

impl std::fmt::Display for DecisionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MajorityVote => write!(f, "majority_vote"),
            Self::WeightedVote => write!(f, "weighted_vote"),
            Self::TieBreak => write!(f, "tie_break"),
            Self::ConsensusFallback => write!(f, "consensus_fallback"),
            Self::SingleSolution => write!(f, "single_solution"),
            Self::ConsensusSynthesis => write!(f, "consensus_synthesis"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDecision {
    pub id: String,
    pub task_id: String,
    pub method: DecisionMethod,
    pub summary: String,
    pub contributors: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub implemented: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implemented_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_details: Option<serde_json::Value>,
}

impl TrackedDecision {
    /// A summary plus implementation details counts as documented.
    pub fn is_documented(&self) -> bool {
        !self.summary.trim().is_empty() && self.implementation_details.is_some()
    }
}

/// Filter for [`DecisionTracker::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionQuery {
    pub task_id: Option<String>,
    pub implemented: Option<bool>,
    pub method: Option<DecisionMethod>,
}

impl DecisionQuery {
    pub fn for_task(task_id: &str) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            ..Self::default()
        }
    }

    pub fn implemented(mut self, implemented: bool) -> Self {
        self.implemented = Some(implemented);
        self
    }

    pub fn with_method(mut self, method: DecisionMethod) -> Self {
        self.method = Some(method);
        self
    }

    fn matches(&self, decision: &TrackedDecision) -> bool {
        self.task_id.as_ref().map_or(true, |t| *t == decision.task_id)
            && self.implemented.map_or(true, |i| i == decision.implemented)
            && self.method.map_or(true, |m| m == decision.method)
    }
}

/// Append-only list of decisions, in the order they were taken.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTracker {
    decisions: Vec<TrackedDecision>,
}

impl DecisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision and return its id.
    pub fn track(
        &mut self,
        task_id: &str,
        method: DecisionMethod,
        summary: &str,
        contributors: Vec<String>,
    ) -> String {
        let short = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("decision-{}-{}", task_id, &short[..8]);
        info!(decision_id = %id, task_id, method = %method, "Tracked decision");
        self.decisions.push(TrackedDecision {
            id: id.clone(),
            task_id: task_id.to_string(),
            method,
            summary: summary.to_string(),
            contributors,
            timestamp: Utc::now(),
            implemented: false,
            implemented_at: None,
            implementation_details: None,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<&TrackedDecision> {
        self.decisions.iter().find(|d| d.id == id)
    }

    /// Returns false when the id is unknown.
    pub fn mark_implemented(&mut self, id: &str) -> bool {
        match self.decisions.iter_mut().find(|d| d.id == id) {
            Some(decision) => {
                decision.implemented = true;
                decision.implemented_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Returns false when the id is unknown.
    pub fn add_implementation_details(&mut self, id: &str, details: serde_json::Value) -> bool {
        match self.decisions.iter_mut().find(|d| d.id == id) {
            Some(decision) => {
                decision.implementation_details = Some(details);
                true
            }
            None => false,
        }
    }

    pub fn query(&self, query: &DecisionQuery) -> Vec<&TrackedDecision> {
        self.decisions.iter().filter(|d| query.matches(d)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedDecision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
