//! Critique plumbing: categories, static heuristics, and prioritisation.
//!
//! The heuristics are deliberately textual. They look at the solution's code
//! (or content when there is no code) for literal markers such as credential
//! assignments, `try`/`except` blocks and validation calls.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::{CategoryTables, SeverityKeywords};
use crate::team::Solution;

static CREDENTIAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(password|api_key|secret|token)\s*=\s*["'][^"']+["']"#)
        .expect("CREDENTIAL_PATTERN regex should compile")
});
static SQL_CONCAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"execute\([^)]*(\+|%)").expect("SQL_CONCAT_PATTERN regex should compile")
});

// Whole words only: `retry`, `entry` and `checkout` are not markers.
static ERROR_HANDLING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:try|except|catch|rescue)\b|Result<|\?;")
        .expect("ERROR_HANDLING_PATTERN regex should compile")
});
static VALIDATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:validat|sanitiz|assert|verif)\w*|isinstance|check(?:s|ed|ing|_\w+)?)\b")
        .expect("VALIDATION_PATTERN regex should compile")
});

/// Enhanced critique category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueCategory {
    Security,
    Performance,
    Maintainability,
    Usability,
    Testability,
}

impl CritiqueCategory {
    pub fn all() -> &'static [CritiqueCategory] {
        &[
            Self::Security,
            Self::Performance,
            Self::Maintainability,
            Self::Usability,
            Self::Testability,
        ]
    }

    /// Relevance factor used when prioritising free-text critiques.
    pub fn relevance(self) -> f64 {
        match self {
            Self::Security => 1.0,
            Self::Performance => 0.8,
            Self::Usability => 0.6,
            Self::Maintainability => 0.4,
            Self::Testability => 0.5,
        }
    }
}

impl std::fmt::Display for CritiqueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Security => write!(f, "security"),
            Self::Performance => write!(f, "performance"),
            Self::Maintainability => write!(f, "maintainability"),
            Self::Usability => write!(f, "usability"),
            Self::Testability => write!(f, "testability"),
        }
    }
}

/// A single weighted critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueItem {
    pub category: CritiqueCategory,
    pub message: String,
    /// Severity in `[0, 1]`.
    pub weight: f64,
}

impl CritiqueItem {
    pub fn new(category: CritiqueCategory, message: &str, weight: f64) -> Self {
        Self {
            category,
            message: message.to_string(),
            weight: weight.clamp(0.0, 1.0),
        }
    }
}

/// Severity bucket of a free-text critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Moderate,
    Minor,
}

impl Severity {
    pub fn value(self) -> f64 {
        match self {
            Self::Critical => 3.0,
            Self::Moderate => 2.0,
            Self::Minor => 1.0,
        }
    }

    pub fn classify(text: &str, keywords: &SeverityKeywords) -> Self {
        let lower = text.to_lowercase();
        if keywords.critical.iter().any(|k| lower.contains(k.as_str())) {
            Self::Critical
        } else if keywords.moderate.iter().any(|k| lower.contains(k.as_str())) {
            Self::Moderate
        } else {
            Self::Minor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedCritique {
    pub text: String,
    pub severity: Severity,
    pub category: Option<CritiqueCategory>,
    pub relevance: f64,
    pub priority: f64,
}

const UNCATEGORIZED_RELEVANCE: f64 = 0.5;

/// First category whose keywords appear in `text`, in [`CritiqueCategory::all`] order.
pub fn categorize(text: &str, tables: &CategoryTables) -> Option<CritiqueCategory> {
    let lower = text.to_lowercase();
    CritiqueCategory::all().iter().copied().find(|c| {
        tables
            .profile(*c)
            .keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    })
}

/// Order critiques by severity × relevance, highest first. Stable for equal scores.
pub fn prioritize_critiques(
    critiques: &[String],
    tables: &CategoryTables,
    severity_keywords: &SeverityKeywords,
) -> Vec<PrioritizedCritique> {
    let mut out: Vec<PrioritizedCritique> = critiques
        .iter()
        .map(|text| {
            let severity = Severity::classify(text, severity_keywords);
            let category = categorize(text, tables);
            let relevance = category.map_or(UNCATEGORIZED_RELEVANCE, CritiqueCategory::relevance);
            PrioritizedCritique {
                text: text.clone(),
                severity,
                category,
                relevance,
                priority: severity.value() * relevance,
            }
        })
        .collect();
    out.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
    out
}

pub fn has_hardcoded_credentials(text: &str) -> bool {
    CREDENTIAL_PATTERN.is_match(text)
}

pub fn has_sql_concatenation(text: &str) -> bool {
    SQL_CONCAT_PATTERN.is_match(text)
}

pub fn has_error_handling(text: &str) -> bool {
    ERROR_HANDLING_PATTERN.is_match(text)
}

pub fn has_validation(text: &str) -> bool {
    VALIDATION_PATTERN.is_match(text)
}

pub(crate) fn credential_pattern() -> &'static Regex {
    &CREDENTIAL_PATTERN
}

/// Fallback critiques when no critic is available.
pub fn heuristic_critiques(solution: &Solution) -> Vec<String> {
    let code = solution.code_text();
    let mut critiques = Vec::new();
    if has_hardcoded_credentials(code) {
        critiques.push("Security issue: hardcoded credentials detected".to_string());
    }
    if !has_error_handling(code) {
        critiques.push("Missing error handling: no try/except or equivalent".to_string());
    }
    if !has_validation(code) {
        critiques.push("No input validation before use".to_string());
    }
    critiques
}

/// Static checks for one enhanced category.
pub fn category_critiques(category: CritiqueCategory, solution: &Solution) -> Vec<CritiqueItem> {
    let code = solution.code_text();
    let lower = code.to_lowercase();
    let mut items = Vec::new();
    let mut push = |message: &str, weight: f64| items.push(CritiqueItem::new(category, message, weight));

    match category {
        CritiqueCategory::Security => {
            if has_hardcoded_credentials(code) {
                push("Hardcoded credentials in source", 0.9);
            }
            if has_sql_concatenation(code) {
                push("SQL built by string concatenation allows injection", 0.8);
            }
            if lower.contains("input(") && !has_validation(code) {
                push("User input used without validation", 0.6);
            }
        }
        CritiqueCategory::Performance => {
            if lower.matches("for ").count() >= 2 {
                push("Nested iteration may scale quadratically", 0.5);
            }
            if lower.contains("sleep(") {
                push("Blocking sleep call on the main path", 0.6);
            }
            if (lower.contains("query") || lower.contains("fetch")) && !lower.contains("cache") {
                push("Repeated lookups are not cached", 0.4);
            }
        }
        CritiqueCategory::Maintainability => {
            let has_comments = code.contains('#') || code.contains("//") || code.contains("\"\"\"");
            if !has_comments {
                push("No comments or docstrings explain intent", 0.5);
            }
            if code.lines().any(|l| l.len() > 100) {
                push("Lines longer than 100 characters", 0.3);
            }
            if lower.contains("print(") {
                push("Print statements used instead of logging", 0.3);
            }
            if !has_error_handling(code) {
                push("Missing error handling makes failures opaque", 0.6);
            }
        }
        CritiqueCategory::Usability => {
            if !lower.contains("error") {
                push("Failures give no user-facing error message", 0.4);
            }
            if !solution.content.to_lowercase().contains("example") {
                push("No usage examples", 0.3);
            }
        }
        CritiqueCategory::Testability => {
            if !lower.contains("test") && !lower.contains("assert") {
                push("No tests accompany the solution", 0.6);
            }
            if lower.contains("global ") || lower.contains("static mut") {
                push("Global state hinders isolated testing", 0.5);
            }
        }
    }
    items
}
