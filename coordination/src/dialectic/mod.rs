//! Dialectical reasoning over stored solutions.
//!
//! Every mode walks the same state machine and returns one
//! [`DialecticalResult`]:
//!
//! ```text
//! latest solution ──▶ Thesis ──▶ Antithesis ──▶ Synthesis ──▶ Evaluation
//!                                  │
//!          basic:               critic agent, heuristics on failure
//!          enhanced:            five scored categories
//!          knowledge_graph:     categories + knowledge references
//!          multi_disciplinary:  one perspective per discipline specialist
//! ```
//!
//! The multi-solution mode replaces the single thesis with a pairwise
//! comparison of every stored solution.

pub mod antithesis;
pub mod critique;
pub mod disciplines;
pub mod evaluation;
pub mod multi;
pub mod state;
pub mod synthesis;
pub mod thesis;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{TeamError, TeamResult};
use crate::knowledge::{ConceptRelationship, KnowledgeGraph};
use crate::task::Task;
use crate::team::{Solution, Team};

pub use antithesis::{BasicAntithesis, CategoryCritique, CritiqueSource, EnhancedAntithesis};
pub use critique::{CritiqueCategory, CritiqueItem, PrioritizedCritique, Severity};
pub use disciplines::{
    ConflictResolution, DisciplinaryConflict, DisciplinaryEvaluation, DisciplineScore, MultiDisciplinarySynthesis,
    OverallAssessment, Perspective,
};
pub use evaluation::{AlignmentLevel, Evaluation};
pub use multi::{
    ComparativeAnalysis, ComparativeEvaluation, Finding, MultiSynthesis, QualityRating, SolutionAnalysis, TradeOff,
};
pub use state::{ReasoningSession, ReasoningStage, StageTransition, TransitionError};
pub use synthesis::{StandardsCompliance, Synthesis, Transformation};
pub use thesis::Thesis;

/// Which reasoning strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    Basic,
    Enhanced,
    KnowledgeGraph,
    MultiSolution,
    MultiDisciplinary,
}

impl std::fmt::Display for ReasoningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Enhanced => write!(f, "enhanced"),
            Self::KnowledgeGraph => write!(f, "knowledge_graph"),
            Self::MultiSolution => write!(f, "multi_solution"),
            Self::MultiDisciplinary => write!(f, "multi_disciplinary"),
        }
    }
}

/// Mode-specific stages of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DialecticalBody {
    Basic {
        thesis: Thesis,
        antithesis: BasicAntithesis,
        synthesis: Synthesis,
        evaluation: Evaluation,
    },
    Enhanced {
        thesis: Thesis,
        antithesis: EnhancedAntithesis,
        synthesis: Synthesis,
        evaluation: Evaluation,
    },
    KnowledgeGraph {
        thesis: Thesis,
        antithesis: EnhancedAntithesis,
        synthesis: Synthesis,
        knowledge_integrations: Vec<String>,
        relationships: Vec<ConceptRelationship>,
        evaluation: Evaluation,
    },
    MultiSolution {
        theses: Vec<Thesis>,
        comparison: ComparativeAnalysis,
        synthesis: MultiSynthesis,
        evaluation: ComparativeEvaluation,
    },
    MultiDisciplinary {
        thesis: Thesis,
        perspectives: Vec<Perspective>,
        conflicts: Vec<DisciplinaryConflict>,
        synthesis: MultiDisciplinarySynthesis,
        evaluation: DisciplinaryEvaluation,
    },
}

impl DialecticalBody {
    pub fn mode(&self) -> ReasoningMode {
        match self {
            Self::Basic { .. } => ReasoningMode::Basic,
            Self::Enhanced { .. } => ReasoningMode::Enhanced,
            Self::KnowledgeGraph { .. } => ReasoningMode::KnowledgeGraph,
            Self::MultiSolution { .. } => ReasoningMode::MultiSolution,
            Self::MultiDisciplinary { .. } => ReasoningMode::MultiDisciplinary,
        }
    }

    /// Final content of the synthesis, whatever the mode.
    pub fn synthesis_content(&self) -> &str {
        match self {
            Self::Basic { synthesis, .. }
            | Self::Enhanced { synthesis, .. }
            | Self::KnowledgeGraph { synthesis, .. } => &synthesis.content,
            Self::MultiSolution { synthesis, .. } => &synthesis.content,
            Self::MultiDisciplinary { synthesis, .. } => &synthesis.synthesis.content,
        }
    }
}

/// Output of one reasoning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticalResult {
    pub id: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub transitions: Vec<StageTransition>,
    #[serde(flatten)]
    pub body: DialecticalBody,
}

impl DialecticalResult {
    pub fn mode(&self) -> ReasoningMode {
        self.body.mode()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DialecticalOutcome {
    Completed(DialecticalResult),
    NoSolution { task_id: String },
}

impl DialecticalOutcome {
    pub fn result(&self) -> Option<&DialecticalResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::NoSolution { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Categories in first-seen order.
fn unique_categories(items: impl IntoIterator<Item = CritiqueCategory>) -> Vec<CritiqueCategory> {
    let mut out = Vec::new();
    for category in items {
        if !out.contains(&category) {
            out.push(category);
        }
    }
    out
}

/// Critique messages ordered by category score, highest first.
fn ranked_critiques(antithesis: &EnhancedAntithesis) -> Vec<String> {
    let mut categories: Vec<&CategoryCritique> = antithesis.categories.iter().collect();
    categories.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    categories
        .iter()
        .flat_map(|c| c.items.iter().map(|i| i.message.clone()))
        .collect()
}

impl Team {
    fn latest_solution(&self, task_id: &str) -> Option<Solution> {
        self.solutions(task_id).last().cloned()
    }

    fn no_solution(&self, task: &Task, task_id: String, mode: ReasoningMode) -> DialecticalOutcome {
        warn!(task_id = %task_id, mode = %mode, "No solutions available for dialectical reasoning");
        self.run_hooks(task, &[]);
        DialecticalOutcome::NoSolution { task_id }
    }

    fn finish(&self, task: &Task, session: ReasoningSession, body: DialecticalBody) -> DialecticalOutcome {
        let result = DialecticalResult {
            id: session.id,
            task_id: session.task_id,
            timestamp: Utc::now(),
            transitions: session.transitions,
            body,
        };
        info!(
            task_id = %result.task_id,
            mode = %result.mode(),
            result_id = %result.id,
            "Dialectical reasoning complete"
        );
        self.run_hooks(task, std::slice::from_ref(&result));
        DialecticalOutcome::Completed(result)
    }

    /// Critic-driven reasoning over the latest solution.
    ///
    /// The critic must be a team member. When it fails or says nothing, static
    /// heuristics supply the critiques.
    pub fn apply_dialectical_reasoning(&mut self, task: &Task, critic: &str) -> TeamResult<DialecticalOutcome> {
        let task_id = task.task_id();
        let critic_index = self
            .agent_index(critic)
            .ok_or_else(|| TeamError::UnknownAgent(critic.to_string()))?;
        let Some(solution) = self.latest_solution(&task_id) else {
            return Ok(self.no_solution(task, task_id, ReasoningMode::Basic));
        };
        let config = Arc::clone(&self.config);

        let mut session = ReasoningSession::begin(&task_id, ReasoningMode::Basic);
        let thesis = Thesis::identify(&solution, &config.key_point_indicators);

        let antithesis = antithesis::basic_antithesis(self.agents[critic_index].as_mut(), task, &solution, &config);
        session.advance(ReasoningStage::AntithesisGenerated)?;

        let ordered: Vec<String> = antithesis.prioritized.iter().map(|p| p.text.clone()).collect();
        let synthesis = synthesis::synthesize(&thesis, &ordered);
        session.advance(ReasoningStage::SynthesisGenerated)?;

        let critiqued = unique_categories(antithesis.prioritized.iter().filter_map(|p| p.category));
        let evaluation = evaluation::evaluate(task, &synthesis, &critiqued, &config.categories);
        session.advance(ReasoningStage::Evaluated)?;

        Ok(self.finish(
            task,
            session,
            DialecticalBody::Basic {
                thesis,
                antithesis,
                synthesis,
                evaluation,
            },
        ))
    }

    /// Category-scored reasoning over the latest solution, with standards compliance.
    pub fn apply_enhanced_dialectical_reasoning(&mut self, task: &Task) -> TeamResult<DialecticalOutcome> {
        let task_id = task.task_id();
        let Some(solution) = self.latest_solution(&task_id) else {
            return Ok(self.no_solution(task, task_id, ReasoningMode::Enhanced));
        };
        let config = Arc::clone(&self.config);

        let mut session = ReasoningSession::begin(&task_id, ReasoningMode::Enhanced);
        let thesis = Thesis::identify(&solution, &config.key_point_indicators);

        let antithesis = antithesis::enhanced_antithesis(&solution, &config);
        session.advance(ReasoningStage::AntithesisGenerated)?;

        let synthesis = synthesis::synthesize(&thesis, &ranked_critiques(&antithesis));
        session.advance(ReasoningStage::SynthesisGenerated)?;

        let mut evaluation = evaluation::evaluate(
            task,
            &synthesis,
            &antithesis.critiqued_categories(),
            &config.categories,
        );
        if let Some(ratio) = synthesis.standards.pass_ratio() {
            evaluation = evaluation.with_alignment(ratio);
        }
        session.advance(ReasoningStage::Evaluated)?;

        Ok(self.finish(
            task,
            session,
            DialecticalBody::Enhanced {
                thesis,
                antithesis,
                synthesis,
                evaluation,
            },
        ))
    }

    /// Compare every stored solution and synthesize one combined solution.
    pub fn apply_enhanced_dialectical_reasoning_multi(&mut self, task: &Task) -> TeamResult<DialecticalOutcome> {
        let task_id = task.task_id();
        let solutions = self.solutions(&task_id).to_vec();
        if solutions.is_empty() {
            return Ok(self.no_solution(task, task_id, ReasoningMode::MultiSolution));
        }

        let mut session = ReasoningSession::begin(&task_id, ReasoningMode::MultiSolution);
        let theses: Vec<Thesis> = solutions
            .iter()
            .map(|s| Thesis::identify(s, &self.config.key_point_indicators))
            .collect();

        let comparison = multi::compare_solutions(solutions.iter().map(|s| multi::analyze_solution(s, task)).collect());
        session.advance(ReasoningStage::AntithesisGenerated)?;

        let synthesis = multi::synthesize_solutions(&solutions, &comparison);
        session.advance(ReasoningStage::SynthesisGenerated)?;

        let evaluation = multi::evaluate_comparative(&synthesis, &comparison, solutions.len());
        session.advance(ReasoningStage::Evaluated)?;

        Ok(self.finish(
            task,
            session,
            DialecticalBody::MultiSolution {
                theses,
                comparison,
                synthesis,
                evaluation,
            },
        ))
    }

    /// Enhanced reasoning with each category linked to knowledge-graph concepts.
    ///
    /// A store that cannot answer is treated as holding no knowledge.
    pub fn apply_dialectical_reasoning_with_knowledge_graph(
        &mut self,
        task: &Task,
        knowledge: &dyn KnowledgeGraph,
    ) -> TeamResult<DialecticalOutcome> {
        let task_id = task.task_id();
        let Some(solution) = self.latest_solution(&task_id) else {
            return Ok(self.no_solution(task, task_id, ReasoningMode::KnowledgeGraph));
        };
        let config = Arc::clone(&self.config);

        let concepts = knowledge.query_knowledge_for_task(task).unwrap_or_else(|e| {
            warn!(task_id = %task_id, error = %e, "Knowledge query failed; continuing without knowledge");
            Vec::new()
        });

        let mut session = ReasoningSession::begin(&task_id, ReasoningMode::KnowledgeGraph);
        let thesis = Thesis::identify(&solution, &config.key_point_indicators);

        let antithesis = antithesis::knowledge_antithesis(&solution, &config, &concepts);
        session.advance(ReasoningStage::AntithesisGenerated)?;

        let mut synthesis = synthesis::synthesize(&thesis, &ranked_critiques(&antithesis));
        let knowledge_integrations = synthesis::integrate_knowledge(&mut synthesis, &antithesis);
        session.advance(ReasoningStage::SynthesisGenerated)?;

        let mut relationships = Vec::new();
        for pair in knowledge_integrations.windows(2) {
            match knowledge.query_concept_relationships(&pair[0], &pair[1]) {
                Ok(found) => relationships.extend(found),
                Err(e) => warn!(first = %pair[0], second = %pair[1], error = %e, "Relationship query failed"),
            }
        }

        let referenced = antithesis.references().len();
        let evaluation = evaluation::evaluate(
            task,
            &synthesis,
            &antithesis.critiqued_categories(),
            &config.categories,
        )
        .with_alignment(evaluation::knowledge_alignment(referenced, knowledge_integrations.len()));
        session.advance(ReasoningStage::Evaluated)?;

        Ok(self.finish(
            task,
            session,
            DialecticalBody::KnowledgeGraph {
                thesis,
                antithesis,
                synthesis,
                knowledge_integrations,
                relationships,
                evaluation,
            },
        ))
    }

    /// Reasoning from every discipline specialist's perspective, with conflict resolution.
    pub fn apply_multi_disciplinary_dialectical_reasoning(&mut self, task: &Task) -> TeamResult<DialecticalOutcome> {
        let task_id = task.task_id();
        let Some(solution) = self.latest_solution(&task_id) else {
            return Ok(self.no_solution(task, task_id, ReasoningMode::MultiDisciplinary));
        };
        let config = Arc::clone(&self.config);

        let mut session = ReasoningSession::begin(&task_id, ReasoningMode::MultiDisciplinary);
        let thesis = Thesis::identify(&solution, &config.key_point_indicators);

        let perspectives = disciplines::gather_perspectives(&mut self.agents, task, &solution, &config.disciplines);
        let conflicts = disciplines::detect_conflicts(&perspectives, &config.discipline_conflicts);
        session.advance(ReasoningStage::AntithesisGenerated)?;

        let synthesis =
            disciplines::synthesize_multi_disciplinary(&thesis, &perspectives, &conflicts, &config.discipline_conflicts);
        session.advance(ReasoningStage::SynthesisGenerated)?;

        let evaluation = disciplines::evaluate_disciplines(&synthesis);
        session.advance(ReasoningStage::Evaluated)?;

        Ok(self.finish(
            task,
            session,
            DialecticalBody::MultiDisciplinary {
                thesis,
                perspectives,
                conflicts,
                synthesis,
                evaluation,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentOutput, ScriptedAgent};
    use crate::knowledge::{InMemoryKnowledgeGraph, KnowledgeConcept};
    use std::sync::Mutex;

    fn team() -> Team {
        let mut team = Team::new("t");
        team.add_agent(Box::new(ScriptedAgent::new("dev", &["python"]))).unwrap();
        team.add_agent(Box::new(
            ScriptedAgent::new("critic", &["review"])
                .with_fallback(AgentOutput::critiques(&["Hardcoded password is a critical vulnerability"])),
        ))
        .unwrap();
        team
    }

    fn insecure() -> Solution {
        Solution::new("dev", "Login handler. It must check the password.")
            .with_code("password = \"hunter2\"\nlogin(user, password)")
    }

    #[test]
    fn test_basic_reasoning_completes_all_stages() {
        let mut team = team();
        let task = Task::new("login");
        team.add_solution(&task, insecure());

        let outcome = team.apply_dialectical_reasoning(&task, "critic").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.mode(), ReasoningMode::Basic);
        assert_eq!(result.transitions.len(), 3);
        let DialecticalBody::Basic { synthesis, evaluation, .. } = &result.body else {
            panic!("expected basic body");
        };
        assert!(synthesis.applied.contains(&Transformation::CredentialRemoval));
        assert!(evaluation.strengths.contains(&"Addressed security critiques".to_string()));
    }

    #[test]
    fn test_unknown_critic_is_an_error() {
        let mut team = team();
        let task = Task::new("login");
        team.add_solution(&task, insecure());
        let err = team.apply_dialectical_reasoning(&task, "ghost").unwrap_err();
        assert!(matches!(err, TeamError::UnknownAgent(name) if name == "ghost"));
    }

    #[test]
    fn test_no_solution_is_a_sentinel_and_hooks_still_run() {
        let mut team = team();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        team.register_dialectical_hook(Box::new(move |_task: &Task, results: &[DialecticalResult]| {
            seen.lock().unwrap().push(results.len());
        }));

        let outcome = team.apply_enhanced_dialectical_reasoning(&Task::new("empty")).unwrap();
        assert!(matches!(outcome, DialecticalOutcome::NoSolution { ref task_id } if task_id == "empty"));

        let task = Task::new("login");
        team.add_solution(&task, insecure());
        team.apply_enhanced_dialectical_reasoning(&task).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_enhanced_reports_standards_alignment() {
        let mut team = team();
        let task = Task::new("login").with_description("Fix the security of login");
        team.add_solution(&task, insecure());
        let outcome = team.apply_enhanced_dialectical_reasoning(&task).unwrap();
        let DialecticalBody::Enhanced { antithesis, evaluation, synthesis, .. } = &outcome.result().unwrap().body else {
            panic!("expected enhanced body");
        };
        assert!(antithesis.critical_categories().contains(&CritiqueCategory::Security));
        assert!(synthesis.addresses(CritiqueCategory::Security));
        assert!(evaluation.alignment_score.is_some());
        assert!(evaluation
            .strengths
            .contains(&"Aligned with the task's emphasis on security".to_string()));
    }

    #[test]
    fn test_knowledge_reasoning_degrades_without_capability() {
        struct Bare;
        impl KnowledgeGraph for Bare {}

        let mut team = team();
        let task = Task::new("login");
        team.add_solution(&task, insecure());
        let outcome = team.apply_dialectical_reasoning_with_knowledge_graph(&task, &Bare).unwrap();
        let DialecticalBody::KnowledgeGraph { antithesis, evaluation, .. } = &outcome.result().unwrap().body else {
            panic!("expected knowledge body");
        };
        assert!(antithesis.references().is_empty());
        assert_eq!(evaluation.alignment_score, Some(0.0));
        assert_eq!(evaluation.alignment, Some(AlignmentLevel::Low));
    }

    #[test]
    fn test_knowledge_reasoning_integrates_concepts() {
        let graph = InMemoryKnowledgeGraph::new()
            .with_concept(KnowledgeConcept::new("password hashing").with_property("domain", "auth"));
        let mut team = team();
        let task = Task::new("login").with_domain("auth");
        team.add_solution(&task, insecure());
        let outcome = team.apply_dialectical_reasoning_with_knowledge_graph(&task, &graph).unwrap();
        let DialecticalBody::KnowledgeGraph {
            knowledge_integrations,
            evaluation,
            synthesis,
            ..
        } = &outcome.result().unwrap().body
        else {
            panic!("expected knowledge body");
        };
        assert_eq!(knowledge_integrations, &vec!["password hashing".to_string()]);
        assert!(synthesis.content.contains("## Knowledge applied"));
        assert_eq!(evaluation.alignment, Some(AlignmentLevel::High));
    }

    #[test]
    fn test_multi_solution_reasoning() {
        let mut team = team();
        let task = Task::new("login");
        team.add_solution(&task, insecure());
        team.add_solution(&task, Solution::new("critic", "Use a vault. Rotate keys."));
        let outcome = team.apply_enhanced_dialectical_reasoning_multi(&task).unwrap();
        let DialecticalBody::MultiSolution { theses, synthesis, .. } = &outcome.result().unwrap().body else {
            panic!("expected multi body");
        };
        assert_eq!(theses.len(), 2);
        assert!(synthesis.elements.len() >= multi::MIN_ELEMENTS);
    }

    #[test]
    fn test_result_serializes_with_mode_tag() {
        let mut team = team();
        let task = Task::new("login");
        team.add_solution(&task, insecure());
        let outcome = team.apply_enhanced_dialectical_reasoning(&task).unwrap();
        let json = serde_json::to_value(outcome.result().unwrap()).unwrap();
        assert_eq!(json["mode"], "enhanced");
        assert_eq!(json["task_id"], "login");
        assert!(json["synthesis"]["applied"].is_array());
    }
}
