//! Evaluation of a synthesis against its critiques and the task's emphasis.

use serde::{Deserialize, Serialize};

use super::critique::CritiqueCategory;
use super::synthesis::Synthesis;
use crate::config::CategoryTables;
use crate::task::Task;

/// Bucketed alignment of a synthesis with referenced knowledge or standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentLevel {
    High,
    Medium,
    Low,
}

impl AlignmentLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for AlignmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// `|strengths| - |weaknesses|`.
    pub improvement_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentLevel>,
}

impl Evaluation {
    pub fn new(strengths: Vec<String>, weaknesses: Vec<String>) -> Self {
        let improvement_score = strengths.len() as i64 - weaknesses.len() as i64;
        Self {
            strengths,
            weaknesses,
            improvement_score,
            alignment_score: None,
            alignment: None,
        }
    }

    pub fn with_alignment(mut self, score: f64) -> Self {
        self.alignment_score = Some(score);
        self.alignment = Some(AlignmentLevel::from_score(score));
        self
    }
}

/// Categories the task's description or requirements emphasise.
pub fn task_emphasis(task: &Task, tables: &CategoryTables) -> Vec<CritiqueCategory> {
    let mut text = task.description_text().to_lowercase();
    for requirement in &task.requirements {
        text.push(' ');
        text.push_str(&requirement.to_lowercase());
    }
    if text.trim().is_empty() {
        return Vec::new();
    }
    CritiqueCategory::all()
        .iter()
        .copied()
        .filter(|c| {
            text.contains(&c.to_string())
                || tables
                    .profile(*c)
                    .keywords
                    .iter()
                    .any(|k| text.contains(&k.to_lowercase()))
        })
        .collect()
}

/// Strengths and weaknesses from critique coverage and task alignment.
pub fn evaluate(
    task: &Task,
    synthesis: &Synthesis,
    critiqued: &[CritiqueCategory],
    tables: &CategoryTables,
) -> Evaluation {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    for &category in critiqued {
        if synthesis.addresses(category) {
            strengths.push(format!("Addressed {} critiques", category));
        } else {
            weaknesses.push(format!("Did not address {} critiques", category));
        }
    }

    for category in task_emphasis(task, tables) {
        if synthesis.addresses(category) {
            strengths.push(format!("Aligned with the task's emphasis on {}", category));
        } else {
            weaknesses.push(format!(
                "Task emphasises {} but no {} critique was addressed",
                category, category
            ));
        }
    }

    Evaluation::new(strengths, weaknesses)
}

/// Fraction of referenced concepts that were incorporated; 0.0 with none referenced.
pub fn knowledge_alignment(referenced: usize, incorporated: usize) -> f64 {
    if referenced == 0 {
        0.0
    } else {
        incorporated.min(referenced) as f64 / referenced as f64
    }
}
