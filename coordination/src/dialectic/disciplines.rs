//! Multi-disciplinary reasoning: discipline perspectives, conflict
//! detection against the configured conflict table, and per-discipline
//! scoring of the synthesis.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::evaluation::Evaluation;
use super::synthesis::{synthesize, Synthesis};
use super::thesis::Thesis;
use crate::agent::Agent;
use crate::config::{DisciplineConflict, DisciplineProfile};
use crate::readability::mentions;
use crate::task::Task;
use crate::team::Solution;

/// Discipline whose keywords best match `expertise`; first on a tie, `None`
/// when nothing matches.
pub fn discipline_of<'a>(expertise: &[String], profiles: &'a [DisciplineProfile]) -> Option<&'a DisciplineProfile> {
    let expertise: Vec<String> = expertise.iter().map(|e| e.to_lowercase()).collect();
    let mut best: Option<(&DisciplineProfile, usize)> = None;
    for profile in profiles {
        let hits = profile
            .keywords
            .iter()
            .filter(|k| {
                let k = k.to_lowercase();
                expertise.iter().any(|e| e.contains(&k))
            })
            .count();
        if hits > 0 && best.map_or(true, |(_, h)| hits > h) {
            best = Some((profile, hits));
        }
    }
    best.map(|(p, _)| p)
}

fn title(discipline: &str) -> String {
    discipline
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerspectiveSource {
    Agent,
    Keywords,
}

/// One discipline specialist's view of the thesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perspective {
    pub agent: String,
    pub discipline: String,
    pub source: PerspectiveSource,
    pub critiques: Vec<String>,
    pub recommendations: Vec<String>,
}

fn keyword_perspective(agent: &str, profile: &DisciplineProfile, solution: &Solution) -> Perspective {
    let text = solution.full_text().to_lowercase();
    let missing: Vec<&String> = profile
        .keywords
        .iter()
        .filter(|k| !text.contains(&k.to_lowercase()))
        .collect();

    let (critiques, recommendations) = if missing.is_empty() {
        (Vec::new(), vec![format!("Maintain the current {} practices", title(&profile.name))])
    } else {
        (
            missing.iter().map(|kw| format!("Solution does not address {}", kw)).collect(),
            missing.iter().map(|kw| format!("Incorporate {} into the solution", kw)).collect(),
        )
    };

    Perspective {
        agent: agent.to_string(),
        discipline: profile.name.clone(),
        source: PerspectiveSource::Keywords,
        critiques,
        recommendations,
    }
}

/// Ask every discipline specialist for critiques and recommendations.
///
/// A failing agent is skipped. An agent that answers with nothing gets a
/// keyword-derived perspective instead.
pub fn gather_perspectives(
    agents: &mut [Box<dyn Agent>],
    task: &Task,
    solution: &Solution,
    profiles: &[DisciplineProfile],
) -> Vec<Perspective> {
    let mut perspectives = Vec::new();
    for agent in agents.iter_mut() {
        let Some(profile) = discipline_of(agent.expertise(), profiles) else {
            continue;
        };
        match agent.process(task) {
            Ok(output) if !output.critiques.is_empty() || !output.recommendations.is_empty() => {
                perspectives.push(Perspective {
                    agent: agent.name().to_string(),
                    discipline: profile.name.clone(),
                    source: PerspectiveSource::Agent,
                    critiques: output.critiques,
                    recommendations: output.recommendations,
                });
            }
            Ok(_) => {
                debug!(agent = agent.name(), discipline = %profile.name, "Empty perspective; deriving from keywords");
                perspectives.push(keyword_perspective(agent.name(), profile, solution));
            }
            Err(e) => {
                warn!(agent = agent.name(), error = %e, "Discipline agent failed; skipping perspective");
            }
        }
    }
    perspectives
}

/// Opposing recommendations in a known conflict area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplinaryConflict {
    pub first_discipline: String,
    pub second_discipline: String,
    pub first_agent: String,
    pub second_agent: String,
    pub topic: String,
    pub first_recommendations: Vec<String>,
    pub second_recommendations: Vec<String>,
}

fn matching<'a>(recommendations: &'a [String], term: &str) -> Vec<&'a String> {
    let term = term.to_lowercase();
    recommendations
        .iter()
        .filter(|r| r.to_lowercase().contains(&term))
        .collect()
}

/// Scan every pair of perspectives from different disciplines against the
/// conflict table.
pub fn detect_conflicts(perspectives: &[Perspective], table: &[DisciplineConflict]) -> Vec<DisciplinaryConflict> {
    let mut conflicts = Vec::new();
    for (i, a) in perspectives.iter().enumerate() {
        for b in &perspectives[i + 1..] {
            if a.discipline == b.discipline {
                continue;
            }
            for entry in table {
                let (first, second) = if entry.first == a.discipline && entry.second == b.discipline {
                    (a, b)
                } else if entry.first == b.discipline && entry.second == a.discipline {
                    (b, a)
                } else {
                    continue;
                };

                let mut first_recs: Vec<String> = Vec::new();
                let mut second_recs: Vec<String> = Vec::new();
                for (first_term, second_term) in &entry.triggers {
                    let left = matching(&first.recommendations, first_term);
                    let right = matching(&second.recommendations, second_term);
                    if left.is_empty() || right.is_empty() {
                        continue;
                    }
                    for r in left {
                        if !first_recs.contains(r) {
                            first_recs.push(r.clone());
                        }
                    }
                    for r in right {
                        if !second_recs.contains(r) {
                            second_recs.push(r.clone());
                        }
                    }
                }

                if !first_recs.is_empty() {
                    debug!(topic = %entry.topic, first = %first.agent, second = %second.agent, "Discipline conflict detected");
                    conflicts.push(DisciplinaryConflict {
                        first_discipline: entry.first.clone(),
                        second_discipline: entry.second.clone(),
                        first_agent: first.agent.clone(),
                        second_agent: second.agent.clone(),
                        topic: entry.topic.clone(),
                        first_recommendations: first_recs,
                        second_recommendations: second_recs,
                    });
                }
            }
        }
    }
    conflicts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub first: String,
    pub second: String,
    pub topic: String,
    pub resolution: String,
    pub implementation_note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineBlock {
    pub discipline: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiDisciplinarySynthesis {
    #[serde(flatten)]
    pub synthesis: Synthesis,
    pub resolutions: Vec<ConflictResolution>,
    pub blocks: Vec<DisciplineBlock>,
    /// Synthesis text before the recommendation blocks were appended.
    #[serde(skip)]
    base_text: String,
}

/// Transform the thesis with every perspective's critiques, resolve each
/// conflict from the table, then append per-discipline recommendation blocks.
pub fn synthesize_multi_disciplinary(
    thesis: &Thesis,
    perspectives: &[Perspective],
    conflicts: &[DisciplinaryConflict],
    table: &[DisciplineConflict],
) -> MultiDisciplinarySynthesis {
    let critiques: Vec<String> = perspectives
        .iter()
        .flat_map(|p| p.critiques.iter().chain(&p.recommendations).cloned())
        .collect();
    let mut synthesis = synthesize(thesis, &critiques);
    let base_text = synthesis.full_text();

    let resolutions: Vec<ConflictResolution> = conflicts
        .iter()
        .filter_map(|c| {
            table
                .iter()
                .find(|e| e.first == c.first_discipline && e.second == c.second_discipline && e.topic == c.topic)
                .map(|e| ConflictResolution {
                    first: c.first_agent.clone(),
                    second: c.second_agent.clone(),
                    topic: e.topic.clone(),
                    resolution: e.resolution.clone(),
                    implementation_note: e.implementation_note.clone(),
                })
        })
        .collect();

    let mut blocks: Vec<DisciplineBlock> = Vec::new();
    for perspective in perspectives {
        match blocks.iter_mut().find(|b| b.discipline == perspective.discipline) {
            Some(block) => {
                for r in &perspective.recommendations {
                    if !block.recommendations.contains(r) {
                        block.recommendations.push(r.clone());
                    }
                }
            }
            None => blocks.push(DisciplineBlock {
                discipline: perspective.discipline.clone(),
                recommendations: perspective.recommendations.clone(),
            }),
        }
    }

    let mut content = synthesis.content.trim_end().to_string();
    for block in blocks.iter().filter(|b| !b.recommendations.is_empty()) {
        content.push_str(&format!("\n\n## {} recommendations\n\n", title(&block.discipline)));
        content.push_str(
            &block
                .recommendations
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    if !resolutions.is_empty() {
        content.push_str("\n\n## Conflict resolutions\n\n");
        content.push_str(
            &resolutions
                .iter()
                .map(|r| format!("- {}: {}. {}", r.topic, r.resolution, r.implementation_note))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    content.push('\n');
    synthesis.content = content;

    MultiDisciplinarySynthesis {
        synthesis,
        resolutions,
        blocks,
        base_text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallAssessment {
    Excellent,
    Good,
    Adequate,
    Limited,
}

impl OverallAssessment {
    pub fn from_score(mean: f64) -> Self {
        if mean >= 8.0 {
            Self::Excellent
        } else if mean >= 6.0 {
            Self::Good
        } else if mean >= 4.0 {
            Self::Adequate
        } else {
            Self::Limited
        }
    }
}

impl std::fmt::Display for OverallAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Adequate => write!(f, "adequate"),
            Self::Limited => write!(f, "limited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineScore {
    pub discipline: String,
    pub addressed: usize,
    pub total: usize,
    /// 0–10, one decimal
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplinaryEvaluation {
    pub scores: Vec<DisciplineScore>,
    pub mean_score: f64,
    pub assessment: OverallAssessment,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score how well the synthesis covers each discipline's recommendations.
///
/// A recommendation counts as addressed when the pre-block synthesis text or
/// a conflict resolution mentions it.
pub fn evaluate_disciplines(synthesis: &MultiDisciplinarySynthesis) -> DisciplinaryEvaluation {
    let resolution_text: String = synthesis
        .resolutions
        .iter()
        .map(|r| format!("{} {} ", r.resolution, r.implementation_note))
        .collect();

    let scores: Vec<DisciplineScore> = synthesis
        .blocks
        .iter()
        .map(|block| {
            let total = block.recommendations.len();
            let addressed = block
                .recommendations
                .iter()
                .filter(|r| mentions(&synthesis.base_text, r) || mentions(&resolution_text, r))
                .count();
            let score = if total == 0 {
                10.0
            } else {
                round1(10.0 * addressed as f64 / total as f64)
            };
            DisciplineScore {
                discipline: block.discipline.clone(),
                addressed,
                total,
                score,
            }
        })
        .collect();

    let mean_score = if scores.is_empty() {
        0.0
    } else {
        round1(scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64)
    };

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for s in &scores {
        if s.score >= 5.0 {
            strengths.push(format!("Addresses the {} perspective ({:.1}/10)", title(&s.discipline), s.score));
        } else {
            weaknesses.push(format!(
                "Covers few {} recommendations ({:.1}/10)",
                title(&s.discipline),
                s.score
            ));
        }
    }
    for r in &synthesis.resolutions {
        strengths.push(format!("Resolved the {} conflict between {} and {}", r.topic, r.first, r.second));
    }

    DisciplinaryEvaluation {
        scores,
        mean_score,
        assessment: OverallAssessment::from_score(mean_score),
        evaluation: Evaluation::new(strengths, weaknesses),
    }
}
