//! Multi-solution analysis: per-solution heuristics, pairwise comparison,
//! and synthesis of one combined solution.
//!
//! ```text
//! solutions ──► analyze_solution (each) ──► compare_solutions (N²)
//!                                                 │
//!                          trade-offs, common strengths/weaknesses
//!                                                 │
//!                                                 ▼
//!                      synthesize_solutions ──► evaluate_comparative
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::critique::{has_error_handling, has_hardcoded_credentials, has_sql_concatenation, has_validation};
use crate::readability::{mentions, split_sentences};
use crate::task::Task;
use crate::team::Solution;

/// Synthesis always carries at least this many elements when a solution exists.
pub const MIN_ELEMENTS: usize = 3;

const DETAILED_CONTENT_LEN: usize = 500;
const BRIEF_CONTENT_LEN: usize = 100;

/// A strength or weakness, tagged with the topic it speaks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub topic: String,
    pub text: String,
}

impl Finding {
    fn new(topic: &str, text: &str) -> Self {
        Self {
            topic: topic.to_string(),
            text: text.to_string(),
        }
    }
}

/// Static analysis of one stored solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionAnalysis {
    pub solution_id: String,
    pub agent: String,
    pub strengths: Vec<Finding>,
    pub weaknesses: Vec<Finding>,
    /// `|strengths| - |weaknesses|`
    pub net_score: i64,
}

/// Score one solution with the static strength/weakness heuristics.
pub fn analyze_solution(solution: &Solution, task: &Task) -> SolutionAnalysis {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let code = solution.code_text();
    let full = solution.full_text();
    let lower = full.to_lowercase();

    let content_len = solution.content.chars().count();
    if content_len > DETAILED_CONTENT_LEN {
        strengths.push(Finding::new("explanation", "Detailed explanation of the approach"));
    } else if content_len < BRIEF_CONTENT_LEN {
        weaknesses.push(Finding::new("explanation", "Brief explanation lacking detail"));
    }

    if solution.code.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        strengths.push(Finding::new("code", "Includes implementation code"));
        if has_hardcoded_credentials(code) || has_sql_concatenation(code) {
            weaknesses.push(Finding::new("security", "Contains insecure patterns"));
        } else {
            strengths.push(Finding::new("security", "No insecure patterns detected"));
        }
    } else {
        weaknesses.push(Finding::new("code", "No implementation code"));
    }

    if has_error_handling(code) {
        strengths.push(Finding::new("error handling", "Handles errors explicitly"));
    } else {
        weaknesses.push(Finding::new("error handling", "Lacks error handling"));
    }

    if has_validation(code) {
        strengths.push(Finding::new("validation", "Validates inputs before use"));
    } else {
        weaknesses.push(Finding::new("validation", "No input validation"));
    }

    if lower.contains("test") || lower.contains("assert") {
        strengths.push(Finding::new("tests", "Includes tests"));
    } else {
        weaknesses.push(Finding::new("tests", "No tests"));
    }

    for requirement in &task.requirements {
        if mentions(&full, requirement) {
            strengths.push(Finding::new(requirement, &format!("Addresses requirement: {}", requirement)));
        } else {
            weaknesses.push(Finding::new(requirement, &format!("Misses requirement: {}", requirement)));
        }
    }

    let net_score = strengths.len() as i64 - weaknesses.len() as i64;
    SolutionAnalysis {
        solution_id: solution.id.clone(),
        agent: solution.agent.clone(),
        strengths,
        weaknesses,
        net_score,
    }
}

/// One solution is strong where another is weak, on the same topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOff {
    pub topic: String,
    /// Solution holding the strength
    pub stronger: String,
    /// Agent of the stronger solution
    pub stronger_agent: String,
    /// Solution holding the weakness
    pub weaker: String,
    pub strength: String,
    pub weakness: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub analyses: Vec<SolutionAnalysis>,
    pub trade_offs: Vec<TradeOff>,
    /// Strengths present in every solution
    pub common_strengths: Vec<Finding>,
    /// Weaknesses present in every solution
    pub common_weaknesses: Vec<Finding>,
}

impl ComparativeAnalysis {
    /// Solution with the highest net score, first on a tie.
    pub fn best(&self) -> Option<&SolutionAnalysis> {
        self.analyses
            .iter()
            .reduce(|best, a| if a.net_score > best.net_score { a } else { best })
    }
}

fn common(sets: &[&[Finding]]) -> Vec<Finding> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };
    let mut out: Vec<Finding> = Vec::new();
    for finding in first.iter() {
        if rest.iter().all(|s| s.contains(finding)) && !out.contains(finding) {
            out.push(finding.clone());
        }
    }
    out
}

/// Pairwise comparison of every analysed solution.
pub fn compare_solutions(analyses: Vec<SolutionAnalysis>) -> ComparativeAnalysis {
    let mut trade_offs = Vec::new();
    for (i, a) in analyses.iter().enumerate() {
        for (j, b) in analyses.iter().enumerate() {
            if i == j {
                continue;
            }
            for strength in &a.strengths {
                if let Some(weakness) = b.weaknesses.iter().find(|w| w.topic == strength.topic) {
                    trade_offs.push(TradeOff {
                        topic: strength.topic.clone(),
                        stronger: a.solution_id.clone(),
                        stronger_agent: a.agent.clone(),
                        weaker: b.solution_id.clone(),
                        strength: strength.text.clone(),
                        weakness: weakness.text.clone(),
                    });
                }
            }
        }
    }

    let strengths: Vec<&[Finding]> = analyses.iter().map(|a| a.strengths.as_slice()).collect();
    let weaknesses: Vec<&[Finding]> = analyses.iter().map(|a| a.weaknesses.as_slice()).collect();
    let common_strengths = common(&strengths);
    let common_weaknesses = common(&weaknesses);

    debug!(
        solutions = analyses.len(),
        trade_offs = trade_offs.len(),
        common_strengths = common_strengths.len(),
        common_weaknesses = common_weaknesses.len(),
        "Comparative analysis complete"
    );

    ComparativeAnalysis {
        analyses,
        trade_offs,
        common_strengths,
        common_weaknesses,
    }
}

/// Where a synthesis element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementOrigin {
    TradeOff,
    CommonStrength,
    Padding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisElement {
    pub origin: ElementOrigin,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub solution_ids: Vec<String>,
    pub agents: Vec<String>,
}

/// A combined solution built from several proposals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSynthesis {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub elements: Vec<SynthesisElement>,
    /// Agents credited by at least one element, in first-credit order
    pub contributors: Vec<String>,
    pub contributing_solutions: Vec<String>,
    /// Common weaknesses whose topic an element speaks to
    pub addressed_weaknesses: Vec<Finding>,
    pub reasoning: String,
}

impl MultiSynthesis {
    pub fn strengths(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| e.origin != ElementOrigin::Padding)
            .map(|e| e.text.clone())
            .collect()
    }
}

/// Combine solutions: one element per trade-off topic, then common
/// strengths, then sentences pulled round-robin from each solution until
/// [`MIN_ELEMENTS`] is reached.
pub fn synthesize_solutions(solutions: &[Solution], comparison: &ComparativeAnalysis) -> MultiSynthesis {
    let mut elements: Vec<SynthesisElement> = Vec::new();

    let mut seen_topics: Vec<&str> = Vec::new();
    for trade_off in &comparison.trade_offs {
        if seen_topics.contains(&trade_off.topic.as_str()) {
            continue;
        }
        seen_topics.push(&trade_off.topic);
        elements.push(SynthesisElement {
            origin: ElementOrigin::TradeOff,
            text: format!(
                "Adopt {}'s approach to {}: {}",
                trade_off.stronger_agent, trade_off.topic, trade_off.strength
            ),
            topic: Some(trade_off.topic.clone()),
            solution_ids: vec![trade_off.stronger.clone()],
            agents: vec![trade_off.stronger_agent.clone()],
        });
    }

    for strength in &comparison.common_strengths {
        elements.push(SynthesisElement {
            origin: ElementOrigin::CommonStrength,
            text: format!("Keep the shared strength: {}", strength.text),
            topic: Some(strength.topic.clone()),
            solution_ids: solutions.iter().map(|s| s.id.clone()).collect(),
            agents: solutions.iter().map(|s| s.agent.clone()).collect(),
        });
    }

    if !solutions.is_empty() {
        let sentences: Vec<Vec<&str>> = solutions.iter().map(|s| split_sentences(&s.content)).collect();
        let mut cursor = vec![0usize; solutions.len()];
        let mut turn = 0usize;
        while elements.len() < MIN_ELEMENTS {
            let idx = turn % solutions.len();
            let solution = &solutions[idx];
            let text = match sentences[idx].get(cursor[idx]) {
                Some(sentence) => {
                    cursor[idx] += 1;
                    sentence.to_string()
                }
                None => format!(
                    "Retain the approach proposed by {} (part {})",
                    solution.agent,
                    elements.len() + 1
                ),
            };
            elements.push(SynthesisElement {
                origin: ElementOrigin::Padding,
                text,
                topic: None,
                solution_ids: vec![solution.id.clone()],
                agents: vec![solution.agent.clone()],
            });
            turn += 1;
        }
    }

    let mut contributors: Vec<String> = Vec::new();
    let mut contributing_solutions: Vec<String> = Vec::new();
    for element in &elements {
        for agent in &element.agents {
            if !contributors.contains(agent) {
                contributors.push(agent.clone());
            }
        }
        for id in &element.solution_ids {
            if !contributing_solutions.contains(id) {
                contributing_solutions.push(id.clone());
            }
        }
    }

    let addressed_weaknesses: Vec<Finding> = comparison
        .common_weaknesses
        .iter()
        .filter(|w| {
            let topic = w.topic.to_lowercase();
            elements.iter().any(|e| e.text.to_lowercase().contains(&topic))
        })
        .cloned()
        .collect();

    let code = comparison
        .best()
        .and_then(|best| solutions.iter().find(|s| s.id == best.solution_id))
        .and_then(|s| s.code.clone());

    let mut content = String::from("# Combined solution\n\n");
    for element in &elements {
        content.push_str("- ");
        content.push_str(&element.text);
        content.push('\n');
    }

    let reasoning = format!(
        "Combined {} elements from {} of {} solutions ({} trade-offs, {} common strengths)",
        elements.len(),
        contributing_solutions.len(),
        solutions.len(),
        comparison.trade_offs.len(),
        comparison.common_strengths.len()
    );

    MultiSynthesis {
        content,
        code,
        elements,
        contributors,
        contributing_solutions,
        addressed_weaknesses,
        reasoning,
    }
}

/// Bucket of a comparative quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Superior,
    SignificantlyBetter,
    Better,
    Comparable,
    Inferior,
}

impl QualityRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Superior
        } else if score >= 75.0 {
            Self::SignificantlyBetter
        } else if score >= 60.0 {
            Self::Better
        } else if score >= 40.0 {
            Self::Comparable
        } else {
            Self::Inferior
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Superior => write!(f, "superior"),
            Self::SignificantlyBetter => write!(f, "significantly better"),
            Self::Better => write!(f, "better"),
            Self::Comparable => write!(f, "comparable"),
            Self::Inferior => write!(f, "inferior"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeEvaluation {
    /// 0–100
    pub quality_score: f64,
    pub rating: QualityRating,
    pub breadth_score: f64,
    pub diversity_score: f64,
    pub coverage_score: f64,
    pub explanation: String,
}

/// Score breadth (≤40), contributor diversity (≤30) and coverage of common
/// weaknesses (≤30).
pub fn evaluate_comparative(
    synthesis: &MultiSynthesis,
    comparison: &ComparativeAnalysis,
    solution_count: usize,
) -> ComparativeEvaluation {
    let breadth_score = synthesis.elements.len().min(10) as f64 * 4.0;
    let diversity_score = if solution_count == 0 {
        0.0
    } else {
        30.0 * synthesis.contributing_solutions.len() as f64 / solution_count as f64
    };
    let coverage_score = if comparison.common_weaknesses.is_empty() {
        30.0
    } else {
        30.0 * synthesis.addressed_weaknesses.len() as f64 / comparison.common_weaknesses.len() as f64
    };
    let quality_score = (breadth_score + diversity_score + coverage_score).clamp(0.0, 100.0);
    let rating = QualityRating::from_score(quality_score);

    ComparativeEvaluation {
        quality_score,
        rating,
        breadth_score,
        diversity_score,
        coverage_score,
        explanation: format!(
            "The combined solution is {} to the individual proposals (score {:.1}/100)",
            rating, quality_score
        ),
    }
}
