//! Consensus builder: one solution out of N competing proposals.
//!
//! ```text
//! 0 solutions ──▶ empty sentinel (method: consensus)
//! 1 solution  ──▶ pass-through (method: single_solution)
//! N solutions ──▶ analyze ─▶ compare ─▶ synthesize (method: consensus_synthesis)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decisions::DecisionMethod;
use crate::dialectic::multi::{
    analyze_solution, compare_solutions, evaluate_comparative, synthesize_solutions, ComparativeAnalysis,
    ComparativeEvaluation,
};
use crate::task::Task;
use crate::team::Team;

/// How a consensus was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    /// Nothing to build from; the outcome is the empty sentinel.
    Consensus,
    /// Exactly one proposal, adopted unchanged.
    SingleSolution,
    /// Several proposals merged by comparative synthesis.
    ConsensusSynthesis,
}

impl std::fmt::Display for ConsensusMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::SingleSolution => write!(f, "single_solution"),
            Self::ConsensusSynthesis => write!(f, "consensus_synthesis"),
        }
    }
}

/// Result of building a consensus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    /// The agreed content.
    pub consensus: String,
    /// Agents whose proposals fed the consensus.
    pub contributors: Vec<String>,
    pub method: ConsensusMethod,
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_analysis: Option<ComparativeAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<ComparativeEvaluation>,
}

impl ConsensusOutcome {
    /// Sentinel returned when no solutions exist.
    pub fn empty() -> Self {
        Self {
            consensus: String::new(),
            contributors: Vec::new(),
            method: ConsensusMethod::Consensus,
            reasoning: "No solutions available".to_string(),
            strengths: Vec::new(),
            comparative_analysis: None,
            quality: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.method == ConsensusMethod::Consensus && self.contributors.is_empty()
    }
}

impl Team {
    /// Build a consensus from the task's stored solutions and record the
    /// decision when there was anything to decide.
    pub fn build_consensus(&mut self, task: &Task) -> ConsensusOutcome {
        let outcome = self.synthesize_consensus(task);
        let method = match outcome.method {
            ConsensusMethod::Consensus => return outcome,
            ConsensusMethod::SingleSolution => DecisionMethod::SingleSolution,
            ConsensusMethod::ConsensusSynthesis => DecisionMethod::ConsensusSynthesis,
        };
        self.decisions
            .track(&task.task_id(), method, &outcome.reasoning, outcome.contributors.clone());
        outcome
    }

    /// Build a consensus without touching team state.
    pub(crate) fn synthesize_consensus(&self, task: &Task) -> ConsensusOutcome {
        let task_id = task.task_id();
        let solutions = self.solutions(&task_id);

        match solutions {
            [] => {
                warn!(team = %self.name, task_id = %task_id, "No solutions available for consensus");
                ConsensusOutcome::empty()
            }
            [only] => {
                info!(team = %self.name, task_id = %task_id, agent = %only.agent, "Single solution adopted");
                ConsensusOutcome {
                    consensus: only.content.clone(),
                    contributors: vec![only.agent.clone()],
                    method: ConsensusMethod::SingleSolution,
                    reasoning: format!("Only {} proposed a solution; adopted as submitted", only.agent),
                    strengths: Vec::new(),
                    comparative_analysis: None,
                    quality: None,
                }
            }
            many => {
                let comparison = compare_solutions(many.iter().map(|s| analyze_solution(s, task)).collect());
                let synthesis = synthesize_solutions(many, &comparison);
                let quality = evaluate_comparative(&synthesis, &comparison, many.len());

                let mut contributors: Vec<String> = Vec::new();
                for solution in many {
                    if !contributors.contains(&solution.agent) {
                        contributors.push(solution.agent.clone());
                    }
                }

                let mut reasoning = synthesis.reasoning.clone();
                if !task.tied_options.is_empty() {
                    reasoning.push_str(&format!("; resolves tie between {}", task.tied_options.join(", ")));
                }

                info!(
                    team = %self.name,
                    task_id = %task_id,
                    solutions = many.len(),
                    quality = quality.quality_score,
                    "Consensus synthesized"
                );

                ConsensusOutcome {
                    consensus: synthesis.content.clone(),
                    contributors,
                    method: ConsensusMethod::ConsensusSynthesis,
                    reasoning,
                    strengths: synthesis.strengths(),
                    comparative_analysis: Some(comparison),
                    quality: Some(quality),
                }
            }
        }
    }
}
