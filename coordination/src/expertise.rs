//! Expertise scoring: how well an agent's declared skills fit a task.
//!
//! ```text
//!   per (key, value) in flattened task, per expertise term:
//!     value == term        +1.0      key == term        +0.5
//!     value ⊃ term         +0.5      key ⊃ term         +0.25
//!   type == "documentation" and agent is a doc specialist   +2.0
//!   phase keyword == expertise  +2.0,  substring either way  +1.0
//! ```
//!
//! An empty expertise list scores [`UNRANKED`]; callers must not rank that
//! as a low score.

use std::collections::BTreeMap;
use tracing::debug;

/// Sentinel for an agent with no declared expertise.
pub const UNRANKED: f64 = -1.0;

const DOC_TYPE_BONUS: f64 = 2.0;
const PHASE_EXACT_BONUS: f64 = 2.0;
const PHASE_PARTIAL_BONUS: f64 = 1.0;

/// Stateless scorer parameterised by the documentation-specialist terms.
#[derive(Debug, Clone)]
pub struct ExpertiseScorer {
    documentation_terms: Vec<String>,
}

impl Default for ExpertiseScorer {
    fn default() -> Self {
        Self::new(&crate::config::EngineConfig::default().documentation_expertise)
    }
}

impl ExpertiseScorer {
    pub fn new(documentation_terms: &[String]) -> Self {
        Self {
            documentation_terms: documentation_terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// Whether the expertise list contains a documentation specialist term.
    pub fn is_documentation_specialist(&self, expertise: &[String]) -> bool {
        expertise
            .iter()
            .any(|e| self.documentation_terms.contains(&e.to_lowercase()))
    }

    /// Score expertise against a flattened task context.
    pub fn score(&self, expertise: &[String], context: &BTreeMap<String, String>) -> f64 {
        if expertise.is_empty() {
            return UNRANKED;
        }

        let terms: Vec<String> = expertise.iter().map(|e| e.to_lowercase()).collect();
        let mut score = 0.0;

        for (key, value) in context {
            let key = key.to_lowercase();
            let value = value.to_lowercase();

            for term in &terms {
                if value == *term {
                    score += 1.0;
                } else if value.contains(term.as_str()) {
                    score += 0.5;
                }

                if key == *term {
                    score += 0.5;
                } else if key.contains(term.as_str()) {
                    score += 0.25;
                }
            }

            if key == "type" && value == "documentation" && self.is_documentation_specialist(expertise) {
                score += DOC_TYPE_BONUS;
            }
        }

        score
    }

    /// [`score`](Self::score) plus a bonus for each phase keyword match.
    ///
    /// Keeps the sentinel for agents without expertise.
    pub fn phase_score(
        &self,
        expertise: &[String],
        context: &BTreeMap<String, String>,
        phase_keywords: &[String],
    ) -> f64 {
        let base = self.score(expertise, context);
        if base == UNRANKED {
            return UNRANKED;
        }

        let mut bonus = 0.0;
        for term in expertise.iter().map(|e| e.to_lowercase()) {
            for keyword in phase_keywords.iter().map(|k| k.to_lowercase()) {
                if term == keyword {
                    bonus += PHASE_EXACT_BONUS;
                } else if term.contains(keyword.as_str()) || keyword.contains(term.as_str()) {
                    bonus += PHASE_PARTIAL_BONUS;
                }
            }
        }

        debug!(base, bonus, "Phase expertise score");
        base + bonus
    }
}

/// Compare two scores where [`UNRANKED`] sorts below every real score.
pub fn rank_cmp(a: f64, b: f64) -> std::cmp::Ordering {
    match (a == UNRANKED, b == UNRANKED) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
    }
}
