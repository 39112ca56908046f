//! Synthesis: keyword-triggered transformations of the thesis, plus a
//! standards-compliance check of the result.
//!
//! Each critique is matched against the trigger words of every
//! [`Transformation`]. A transformation runs at most once per synthesis; a
//! critique counts as integrated when any transformation it triggers ran.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

use super::antithesis::EnhancedAntithesis;
use super::critique::{
    credential_pattern, has_error_handling, has_hardcoded_credentials, has_sql_concatenation,
    has_validation, CritiqueCategory,
};
use super::thesis::Thesis;
use crate::readability::split_sentences;

static SQL_PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"execute\(([^)+%]*?)\s*[+%]\s*([^)]+)\)").expect("SQL_PARAM_PATTERN regex should compile")
});
static INPUT_ASSIGN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s*=\s*input\(([^)]*)\)").expect("INPUT_ASSIGN_PATTERN regex should compile")
});
static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+\s+\w+").expect("HEADING_PATTERN regex should compile"));

const MAX_CLEAR_SENTENCE_WORDS: f64 = 25.0;

/// A concrete rewrite applied during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    CredentialRemoval,
    ErrorHandling,
    InputValidation,
    SecurityPass,
    PerformancePass,
    ReadabilityPass,
    Examples,
    Structure,
}

impl Transformation {
    /// Every transformation in application order.
    pub fn all() -> &'static [Transformation] {
        &[
            Self::CredentialRemoval,
            Self::ErrorHandling,
            Self::InputValidation,
            Self::SecurityPass,
            Self::PerformancePass,
            Self::ReadabilityPass,
            Self::Examples,
            Self::Structure,
        ]
    }

    /// Category credited when this transformation runs.
    pub fn category(self) -> CritiqueCategory {
        match self {
            Self::CredentialRemoval | Self::InputValidation | Self::SecurityPass => CritiqueCategory::Security,
            Self::PerformancePass => CritiqueCategory::Performance,
            Self::ErrorHandling | Self::ReadabilityPass | Self::Structure => CritiqueCategory::Maintainability,
            Self::Examples => CritiqueCategory::Usability,
        }
    }

    fn triggers(self) -> &'static [&'static str] {
        match self {
            Self::CredentialRemoval => &["credential", "password", "secret", "api key", "api_key", "hardcoded"],
            Self::ErrorHandling => &["error handling", "exception", "try/except", "failures"],
            Self::InputValidation => &["validation", "validate", "input"],
            Self::SecurityPass => &["security", "injection", "sql"],
            Self::PerformancePass => &["performance", "efficien", "cache", "quadratic", "sleep", "optimi"],
            Self::ReadabilityPass => &["readab", "comment", "docstring", "print", "logging", "naming", "lines longer"],
            Self::Examples => &["example"],
            Self::Structure => &["structure", "format", "heading", "section"],
        }
    }

    fn is_content(self) -> bool {
        matches!(self, Self::Examples | Self::Structure)
    }

    pub fn matches(self, critique: &str) -> bool {
        let lower = critique.to_lowercase();
        self.triggers().iter().any(|t| lower.contains(t))
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::CredentialRemoval => "Moved hardcoded credentials to environment lookups",
            Self::ErrorHandling => "Wrapped the main path in error handling",
            Self::InputValidation => "Validated external input before use",
            Self::SecurityPass => "Parameterised queries and hardened inputs",
            Self::PerformancePass => "Marked repeated lookups for caching",
            Self::ReadabilityPass => "Replaced print calls with logging",
            Self::Examples => "Added an illustrative example",
            Self::Structure => "Added headings to structure the content",
        }
    }

    fn apply_to_code(self, code: &str) -> String {
        match self {
            Self::CredentialRemoval => remove_credentials(code),
            Self::ErrorHandling => add_error_handling(code),
            Self::InputValidation => add_input_validation(code),
            Self::SecurityPass => {
                let code = remove_credentials(code);
                let code = SQL_PARAM_PATTERN.replace_all(&code, "execute($1, ($2,))").into_owned();
                add_input_validation(&code)
            }
            Self::PerformancePass => {
                format!("# Performance: cache repeated lookups outside hot loops\n{}", code)
            }
            Self::ReadabilityPass => {
                let code = code.replace("print(", "logger.info(");
                if code.contains('#') {
                    code
                } else {
                    format!("# Refactored for readability\n{}", code)
                }
            }
            Self::Examples | Self::Structure => code.to_string(),
        }
    }

    fn apply_to_content(self, content: &str) -> String {
        match self {
            Self::Examples if !content.to_lowercase().contains("example") => format!(
                "{}\n\n## Example\n\nA worked example illustrating the approach.\n",
                content.trim_end()
            ),
            Self::Structure if !content.trim_start().starts_with('#') => format!("# {}", content.trim_start()),
            _ => content.to_string(),
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CredentialRemoval => write!(f, "credential_removal"),
            Self::ErrorHandling => write!(f, "error_handling"),
            Self::InputValidation => write!(f, "input_validation"),
            Self::SecurityPass => write!(f, "security_pass"),
            Self::PerformancePass => write!(f, "performance_pass"),
            Self::ReadabilityPass => write!(f, "readability_pass"),
            Self::Examples => write!(f, "examples"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

fn remove_credentials(code: &str) -> String {
    credential_pattern()
        .replace_all(code, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            format!("{} = os.environ.get(\"{}\")", name, name.to_uppercase())
        })
        .into_owned()
}

fn add_error_handling(code: &str) -> String {
    if has_error_handling(code) {
        return code.to_string();
    }
    let lines: Vec<&str> = code.lines().collect();
    let import_end = lines
        .iter()
        .rposition(|l| l.starts_with("import ") || l.starts_with("from "))
        .map_or(0, |i| i + 1);

    let mut out: Vec<String> = lines[..import_end].iter().map(|l| l.to_string()).collect();
    out.push("try:".to_string());
    out.extend(lines[import_end..].iter().map(|l| format!("    {}", l)));
    out.push("except Exception as e:".to_string());
    out.push("    logger.error(f\"An error occurred: {e}\")".to_string());
    out.push("    raise".to_string());
    out.join("\n")
}

fn add_input_validation(code: &str) -> String {
    if INPUT_ASSIGN_PATTERN.is_match(code) {
        INPUT_ASSIGN_PATTERN
            .replace_all(code, "$1 = validate_input(input($2))")
            .into_owned()
    } else if has_validation(code) {
        code.to_string()
    } else {
        format!("# validate external input before use\n{}", code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStandards {
    pub has_headings: bool,
    pub has_examples: bool,
    pub clear: bool,
    pub avg_sentence_words: f64,
    pub level: ComplianceLevel,
}

impl ContentStandards {
    pub fn check(content: &str) -> Self {
        let has_headings = HEADING_PATTERN.is_match(content);
        let lower = content.to_lowercase();
        let has_examples = lower.contains("example") || lower.contains("for instance");
        let sentences = split_sentences(content);
        let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
        let avg_sentence_words = words as f64 / sentences.len().max(1) as f64;
        let clear = avg_sentence_words < MAX_CLEAR_SENTENCE_WORDS;

        let level = match [has_headings, has_examples, clear].iter().filter(|b| **b).count() {
            3 => ComplianceLevel::High,
            2 => ComplianceLevel::Medium,
            _ => ComplianceLevel::Low,
        };
        Self {
            has_headings,
            has_examples,
            clear,
            avg_sentence_words,
            level,
        }
    }

    fn passed(&self) -> usize {
        [self.has_headings, self.has_examples, self.clear].iter().filter(|b| **b).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeStandards {
    pub hardcoded_credentials: bool,
    pub sql_concatenation: bool,
    pub unguarded_input: bool,
    pub issues: Vec<String>,
    pub level: ComplianceLevel,
}

impl CodeStandards {
    pub fn check(code: &str) -> Self {
        let hardcoded_credentials = has_hardcoded_credentials(code);
        let sql_concatenation = has_sql_concatenation(code);
        let unguarded_input = code.contains("input(") && !has_error_handling(code);

        let mut issues = Vec::new();
        if hardcoded_credentials {
            issues.push("Hardcoded credentials detected".to_string());
        }
        if sql_concatenation {
            issues.push("Potential SQL injection".to_string());
        }
        if unguarded_input {
            issues.push("Input used outside error handling".to_string());
        }
        let level = match issues.len() {
            0 => ComplianceLevel::High,
            1 => ComplianceLevel::Medium,
            _ => ComplianceLevel::Low,
        };
        Self {
            hardcoded_credentials,
            sql_concatenation,
            unguarded_input,
            issues,
            level,
        }
    }

    fn passed(&self) -> usize {
        3 - self.issues.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardsCompliance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentStandards>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeStandards>,
}

impl StandardsCompliance {
    pub fn check(content: &str, code: Option<&str>) -> Self {
        Self {
            content: (!content.trim().is_empty()).then(|| ContentStandards::check(content)),
            code: code.filter(|c| !c.trim().is_empty()).map(CodeStandards::check),
        }
    }

    /// Fraction of checks passed; `None` when nothing was checked.
    pub fn pass_ratio(&self) -> Option<f64> {
        let mut passed = 0;
        let mut total = 0;
        if let Some(content) = &self.content {
            passed += content.passed();
            total += 3;
        }
        if let Some(code) = &self.code {
            passed += code.passed();
            total += 3;
        }
        (total > 0).then(|| passed as f64 / total as f64)
    }
}

/// Result of the synthesis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesis {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub applied: Vec<Transformation>,
    /// Category → descriptions of the transformations credited to it.
    pub addressed_critiques: BTreeMap<CritiqueCategory, Vec<String>>,
    pub integrated_critiques: Vec<String>,
    pub rejected_critiques: Vec<String>,
    pub standards: StandardsCompliance,
    pub reasoning: String,
}

impl Synthesis {
    pub fn addresses(&self, category: CritiqueCategory) -> bool {
        self.addressed_critiques.contains_key(&category)
    }

    /// Content and code joined, for keyword checks.
    pub fn full_text(&self) -> String {
        match &self.code {
            Some(code) => format!("{}\n{}", self.content, code),
            None => self.content.clone(),
        }
    }
}

/// Apply every transformation the critiques trigger, in critique order.
pub fn synthesize(thesis: &Thesis, critiques: &[String]) -> Synthesis {
    let mut content = thesis.content.clone();
    let mut code = thesis.code.clone();
    let mut applied: Vec<Transformation> = Vec::new();
    let mut addressed: BTreeMap<CritiqueCategory, Vec<String>> = BTreeMap::new();
    let mut integrated = Vec::new();
    let mut rejected = Vec::new();

    for critique in critiques {
        let mut used = false;
        for &t in Transformation::all().iter().filter(|t| t.matches(critique)) {
            if applied.contains(&t) {
                used = true;
                continue;
            }
            let ran = if t.is_content() {
                if content.trim().is_empty() {
                    false
                } else {
                    content = t.apply_to_content(&content);
                    true
                }
            } else if let Some(current) = code.as_mut() {
                *current = t.apply_to_code(current);
                true
            } else {
                false
            };
            if ran {
                debug!(transformation = %t, critique = %critique, "Transformation applied");
                applied.push(t);
                addressed.entry(t.category()).or_default().push(t.describe().to_string());
                used = true;
            }
        }
        if used {
            integrated.push(critique.clone());
        } else {
            rejected.push(critique.clone());
        }
    }

    let standards = StandardsCompliance::check(&content, code.as_deref());
    let reasoning = if applied.is_empty() {
        format!("No transformation matched any of {} critiques", critiques.len())
    } else {
        format!(
            "Applied {} ({}) integrating {} of {} critiques",
            applied.len(),
            applied.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", "),
            integrated.len(),
            critiques.len()
        )
    };

    Synthesis {
        content,
        code,
        applied,
        addressed_critiques: addressed,
        integrated_critiques: integrated,
        rejected_critiques: rejected,
        standards,
        reasoning,
    }
}

/// Record every referenced concept whose category the synthesis addressed,
/// appending a "Knowledge applied" section to the content. Returns the
/// integrated concept names.
pub fn integrate_knowledge(synthesis: &mut Synthesis, antithesis: &EnhancedAntithesis) -> Vec<String> {
    let mut integrated: Vec<String> = Vec::new();
    let mut lines = Vec::new();
    for entry in &antithesis.categories {
        if !synthesis.addresses(entry.category) {
            continue;
        }
        for concept in &entry.knowledge_references {
            if integrated.contains(&concept.concept) {
                continue;
            }
            lines.push(format!("- {}: applied to {} changes", concept.concept, entry.category));
            integrated.push(concept.concept.clone());
        }
    }
    if !lines.is_empty() {
        synthesis.content = format!(
            "{}\n\n## Knowledge applied\n\n{}\n",
            synthesis.content.trim_end(),
            lines.join("\n")
        );
        debug!(count = integrated.len(), "Knowledge concepts integrated");
    }
    integrated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::Solution;

    fn thesis(content: &str, code: Option<&str>) -> Thesis {
        let mut solution = Solution::new("a", content);
        if let Some(code) = code {
            solution = solution.with_code(code);
        }
        Thesis::identify(&solution, &[])
    }

    #[test]
    fn test_credential_removal() {
        let out = remove_credentials("password = \"hunter2\"\napi_key='k'");
        assert_eq!(
            out,
            "password = os.environ.get(\"PASSWORD\")\napi_key = os.environ.get(\"API_KEY\")"
        );
        assert!(!has_hardcoded_credentials(&out));
    }

    #[test]
    fn test_error_handling_wraps_after_imports() {
        let out = add_error_handling("import os\nrun()");
        assert_eq!(
            out,
            "import os\ntry:\n    run()\nexcept Exception as e:\n    logger.error(f\"An error occurred: {e}\")\n    raise"
        );
        assert_eq!(add_error_handling("try:\n    x()"), "try:\n    x()");
    }

    #[test]
    fn test_sql_parameterised() {
        let out = Transformation::SecurityPass.apply_to_code("cursor.execute(\"SELECT * WHERE id=\" + uid)");
        assert!(out.contains("execute(\"SELECT * WHERE id=\", (uid,))"));
        assert!(!has_sql_concatenation(&out));
    }

    #[test]
    fn test_synthesis_records_addressed_categories() {
        let t = thesis("Short note.", Some("password = \"x\"\nname = input()"));
        let critiques = vec![
            "Hardcoded credentials detected".to_string(),
            "Missing error handling".to_string(),
            "Lovely colours".to_string(),
        ];
        let s = synthesize(&t, &critiques);
        assert_eq!(s.applied, vec![Transformation::CredentialRemoval, Transformation::ErrorHandling]);
        assert!(s.addresses(CritiqueCategory::Security));
        assert!(s.addresses(CritiqueCategory::Maintainability));
        assert!(!s.addresses(CritiqueCategory::Performance));
        assert_eq!(s.rejected_critiques, vec!["Lovely colours"]);

        let code = s.code.as_deref().unwrap();
        assert!(!has_hardcoded_credentials(code));
        assert!(code.starts_with("try:"));
        assert_eq!(s.standards.code.as_ref().unwrap().level, ComplianceLevel::High);
    }

    #[test]
    fn test_transformation_runs_once() {
        let t = thesis("", Some("print(1)"));
        let critiques = vec!["Use logging not print".to_string(), "Improve readability".to_string()];
        let s = synthesize(&t, &critiques);
        assert_eq!(s.applied, vec![Transformation::ReadabilityPass]);
        assert_eq!(s.integrated_critiques.len(), 2);
        assert_eq!(s.addressed_critiques[&CritiqueCategory::Maintainability].len(), 1);
    }

    #[test]
    fn test_content_transformations() {
        let t = thesis("Plain prose about caching.", None);
        let s = synthesize(&t, &["Needs an example".to_string(), "Poor structure".to_string()]);
        assert!(s.content.starts_with("# Plain prose"));
        assert!(s.content.contains("## Example"));
        let standards = s.standards.content.as_ref().unwrap();
        assert_eq!(standards.level, ComplianceLevel::High);
        assert_eq!(s.standards.pass_ratio(), Some(1.0));
    }

    #[test]
    fn test_code_transformation_without_code_is_rejected() {
        let t = thesis("Prose only.", None);
        let s = synthesize(&t, &["Hardcoded password".to_string()]);
        assert!(s.applied.is_empty());
        assert_eq!(s.rejected_critiques.len(), 1);
    }

    #[test]
    fn test_integrate_knowledge_only_for_addressed_categories() {
        use crate::config::EngineConfig;
        use crate::dialectic::antithesis::knowledge_antithesis;
        use crate::knowledge::KnowledgeConcept;

        let solution = Solution::new("a", "Login.").with_code("password = \"x\"");
        let concepts = vec![KnowledgeConcept::new("password hashing"), KnowledgeConcept::new("response cache")];
        let antithesis = knowledge_antithesis(&solution, &EngineConfig::default(), &concepts);
        let mut s = synthesize(
            &Thesis::identify(&solution, &[]),
            &["Hardcoded credentials".to_string()],
        );
        let integrated = integrate_knowledge(&mut s, &antithesis);
        assert_eq!(integrated, vec!["password hashing"]);
        assert!(s.content.contains("## Knowledge applied"));
        assert!(s.content.contains("- password hashing: applied to security changes"));
    }
}
