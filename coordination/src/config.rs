//! Engine configuration: the keyword tables that drive scoring and heuristics.
//!
//! Every table has a built-in default. A deployment can override any subset
//! of them from a YAML or TOML file:
//!
//! ```yaml
//! role_keywords:
//!   supervisor: [supervise, review, management]
//! vote_weights:
//!   expert: 4.0
//! ```
//!
//! Missing keys fall back to the defaults field-by-field (`#[serde(default)]`).
//! The process-wide table is loaded once through [`global`]; teams may also
//! carry an explicitly injected `Arc<EngineConfig>`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::agent::ExpertiseLevel;
use crate::dialectic::critique::CritiqueCategory;
use crate::roles::{Phase, Role};

/// Environment variable naming a config file to load at startup.
pub const CONFIG_PATH_ENV: &str = "WSDE_CONFIG_PATH";

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Keyword sets used to match agents to non-Primus roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleKeywords {
    pub supervisor: Vec<String>,
    pub designer: Vec<String>,
    pub evaluator: Vec<String>,
}

impl Default for RoleKeywords {
    fn default() -> Self {
        Self {
            supervisor: words(&["supervise", "review", "management"]),
            designer: words(&["design", "architecture", "plan"]),
            evaluator: words(&["test", "qa", "evaluate"]),
        }
    }
}

impl RoleKeywords {
    /// Keywords for a role. Primus and Worker have none.
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Supervisor => &self.supervisor,
            Role::Designer => &self.designer,
            Role::Evaluator => &self.evaluator,
            Role::Primus | Role::Worker => &[],
        }
    }
}

/// Expertise keywords and role priority order for one EDRR phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseProfile {
    pub keywords: Vec<String>,
    /// Non-Primus roles in the order they are filled.
    pub role_priority: Vec<Role>,
}

/// Per-phase tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTables {
    pub expand: PhaseProfile,
    pub differentiate: PhaseProfile,
    pub refine: PhaseProfile,
    pub retrospect: PhaseProfile,
}

impl Default for PhaseTables {
    fn default() -> Self {
        Self {
            expand: PhaseProfile {
                keywords: words(&[
                    "exploration",
                    "brainstorming",
                    "divergent thinking",
                    "idea generation",
                    "research",
                    "information gathering",
                    "discovery",
                    "creativity",
                    "innovation",
                    "possibilities",
                    "alternatives",
                ]),
                role_priority: vec![Role::Designer, Role::Worker, Role::Supervisor, Role::Evaluator],
            },
            differentiate: PhaseProfile {
                keywords: words(&[
                    "analysis",
                    "comparison",
                    "categorization",
                    "classification",
                    "distinction",
                    "differentiation",
                    "evaluation",
                    "assessment",
                    "critical thinking",
                    "judgment",
                ]),
                role_priority: vec![Role::Evaluator, Role::Supervisor, Role::Worker, Role::Designer],
            },
            refine: PhaseProfile {
                keywords: words(&[
                    "refinement",
                    "improvement",
                    "enhancement",
                    "optimization",
                    "polishing",
                    "editing",
                    "revision",
                    "iteration",
                    "detail-oriented",
                    "precision",
                    "quality control",
                ]),
                role_priority: vec![Role::Worker, Role::Supervisor, Role::Designer, Role::Evaluator],
            },
            retrospect: PhaseProfile {
                keywords: words(&[
                    "reflection",
                    "retrospective",
                    "review",
                    "evaluation",
                    "assessment",
                    "learning",
                    "insight",
                    "metacognition",
                    "introspection",
                ]),
                role_priority: vec![Role::Evaluator, Role::Supervisor, Role::Designer, Role::Worker],
            },
        }
    }
}

impl PhaseTables {
    pub fn profile(&self, phase: Phase) -> &PhaseProfile {
        match phase {
            Phase::Expand => &self.expand,
            Phase::Differentiate => &self.differentiate,
            Phase::Refine => &self.refine,
            Phase::Retrospect => &self.retrospect,
        }
    }
}

/// Vote weights by declared expertise level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteWeights {
    pub expert: f64,
    pub intermediate: f64,
    pub novice: f64,
    /// Weight of any agent whose expertise does not cover the task domain.
    pub outside_domain: f64,
}

impl Default for VoteWeights {
    fn default() -> Self {
        Self {
            expert: 3.0,
            intermediate: 2.0,
            novice: 1.0,
            outside_domain: 0.5,
        }
    }
}

impl VoteWeights {
    pub fn for_level(&self, level: ExpertiseLevel) -> f64 {
        match level {
            ExpertiseLevel::Expert => self.expert,
            ExpertiseLevel::Intermediate => self.intermediate,
            ExpertiseLevel::Novice => self.novice,
        }
    }
}

/// Keywords and fixed weight of one critique category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub keywords: Vec<String>,
    pub weight: f64,
}

/// Tables for the five enhanced critique categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTables {
    pub security: CategoryProfile,
    pub performance: CategoryProfile,
    pub maintainability: CategoryProfile,
    pub usability: CategoryProfile,
    pub testability: CategoryProfile,
}

impl Default for CategoryTables {
    fn default() -> Self {
        Self {
            security: CategoryProfile {
                keywords: words(&[
                    "security",
                    "vulnerability",
                    "authentication",
                    "authorization",
                    "encryption",
                    "credential",
                    "injection",
                    "password",
                ]),
                weight: 1.0,
            },
            performance: CategoryProfile {
                keywords: words(&[
                    "performance",
                    "efficiency",
                    "speed",
                    "latency",
                    "optimization",
                    "memory",
                    "cache",
                ]),
                weight: 0.8,
            },
            maintainability: CategoryProfile {
                keywords: words(&[
                    "maintainability",
                    "readability",
                    "modular",
                    "complexity",
                    "documentation",
                    "naming",
                    "structure",
                ]),
                weight: 0.7,
            },
            usability: CategoryProfile {
                keywords: words(&[
                    "usability",
                    "user experience",
                    "interface",
                    "accessibility",
                    "error message",
                    "feedback",
                ]),
                weight: 0.6,
            },
            testability: CategoryProfile {
                keywords: words(&["testability", "test", "mock", "coverage", "assert", "isolation"]),
                weight: 0.6,
            },
        }
    }
}

impl CategoryTables {
    pub fn profile(&self, category: CritiqueCategory) -> &CategoryProfile {
        match category {
            CritiqueCategory::Security => &self.security,
            CritiqueCategory::Performance => &self.performance,
            CritiqueCategory::Maintainability => &self.maintainability,
            CritiqueCategory::Usability => &self.usability,
            CritiqueCategory::Testability => &self.testability,
        }
    }
}

/// Keyword set identifying a discipline from an agent's expertise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineProfile {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Known conflict-prone topic area between two disciplines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineConflict {
    pub first: String,
    pub second: String,
    pub topic: String,
    /// `(first-side term, second-side term)` pairs; a conflict is detected when
    /// one recommendation from each side contains its term.
    pub triggers: Vec<(String, String)>,
    pub resolution: String,
    pub implementation_note: String,
}

impl DisciplineConflict {
    fn new(
        first: &str,
        second: &str,
        topic: &str,
        triggers: &[(&str, &str)],
        resolution: &str,
        implementation_note: &str,
    ) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            topic: topic.to_string(),
            triggers: triggers
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            resolution: resolution.to_string(),
            implementation_note: implementation_note.to_string(),
        }
    }
}

fn default_disciplines() -> Vec<DisciplineProfile> {
    let table: [(&str, &[&str]); 9] = [
        (
            "software_engineering",
            &["software engineering", "programming", "coding", "development", "software design"],
        ),
        (
            "security",
            &["security", "cybersecurity", "information security", "secure coding", "vulnerability"],
        ),
        ("ux_design", &["user experience", "ux", "ui", "interface design", "usability"]),
        ("performance", &["performance", "optimization", "profiling", "latency"]),
        (
            "data_science",
            &["data science", "machine learning", "statistics", "data analysis", "analytics"],
        ),
        ("devops", &["devops", "deployment", "infrastructure", "ci/cd", "operations"]),
        (
            "architecture",
            &["architecture", "system design", "distributed systems", "scalability"],
        ),
        (
            "quality_assurance",
            &["quality assurance", "testing", "qa", "quality control", "verification"],
        ),
        (
            "product_management",
            &["product management", "requirements", "user stories", "roadmap"],
        ),
    ];
    table
        .iter()
        .map(|(name, kws)| DisciplineProfile {
            name: name.to_string(),
            keywords: words(kws),
        })
        .collect()
}

fn default_conflicts() -> Vec<DisciplineConflict> {
    vec![
        DisciplineConflict::new(
            "security",
            "performance",
            "protection overhead",
            &[("encryption", "optimization"), ("authentication", "latency")],
            "Prioritize security for critical operations while optimizing non-critical paths",
            "Encrypt sensitive data only and cache frequently accessed non-sensitive data",
        ),
        DisciplineConflict::new(
            "security",
            "ux_design",
            "authentication friction",
            &[("authentication", "simplify"), ("validation", "user experience")],
            "Apply progressive security that scales with the sensitivity of each operation",
            "Use secure defaults with clear override options and security feedback for users",
        ),
        DisciplineConflict::new(
            "performance",
            "quality_assurance",
            "optimization versus verification",
            &[("optimization", "test coverage"), ("efficiency", "validation")],
            "Optimize measured bottlenecks only and keep comprehensive tests on critical paths",
            "Add performance tests to the regular test suite",
        ),
        DisciplineConflict::new(
            "software_engineering",
            "ux_design",
            "internal structure versus user flow",
            &[("architecture", "user flow"), ("pattern", "interface")],
            "Keep the internal architecture modular behind an interface shaped by user flows",
            "Introduce an adapter layer between domain code and presentation",
        ),
        DisciplineConflict::new(
            "architecture",
            "devops",
            "deployment topology",
            &[("monolithic", "containerization"), ("coupling", "deployment")],
            "Define deployable module boundaries before splitting the system into containers",
            "Start with a modular monolith packaged as a single container image",
        ),
    ]
}

/// Severity keyword sets for critique prioritisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityKeywords {
    pub critical: Vec<String>,
    pub moderate: Vec<String>,
}

impl Default for SeverityKeywords {
    fn default() -> Self {
        Self {
            critical: words(&["critical", "severe", "major", "important", "significant", "vulnerability"]),
            moderate: words(&["moderate", "should", "consider", "improve", "missing"]),
        }
    }
}

/// Complete keyword configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub role_keywords: RoleKeywords,
    /// Expertise terms that mark a documentation specialist.
    pub documentation_expertise: Vec<String>,
    pub phases: PhaseTables,
    pub vote_weights: VoteWeights,
    pub categories: CategoryTables,
    /// A category whose score exceeds this is flagged critical.
    pub critical_category_threshold: f64,
    pub disciplines: Vec<DisciplineProfile>,
    pub discipline_conflicts: Vec<DisciplineConflict>,
    pub key_point_indicators: Vec<String>,
    pub severity_keywords: SeverityKeywords,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            role_keywords: RoleKeywords::default(),
            documentation_expertise: words(&["documentation", "markdown", "doc_generation"]),
            phases: PhaseTables::default(),
            vote_weights: VoteWeights::default(),
            categories: CategoryTables::default(),
            critical_category_threshold: 0.5,
            disciplines: default_disciplines(),
            discipline_conflicts: default_conflicts(),
            key_point_indicators: words(&[
                "should",
                "must",
                "recommend",
                "suggest",
                "important",
                "critical",
                "key",
                "essential",
            ]),
            severity_keywords: SeverityKeywords::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::parse(None, &format!("YAML parse error: {}", e)))
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::parse(None, &format!("TOML parse error: {}", e)))
    }

    /// Load a config file, choosing the format from its extension.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let source = Some(path.display().to_string());
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError {
            source_path: source.clone(),
            kind: ConfigErrorKind::IoError,
            detail: format!("Failed to read file: {}", e),
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parsed = match ext {
            "yml" | "yaml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => {
                return Err(ConfigError {
                    source_path: source,
                    kind: ConfigErrorKind::UnsupportedFormat,
                    detail: format!("Unsupported config extension: {:?}", other),
                })
            }
        };
        parsed.map_err(|e| e.with_source(path))
    }

    /// Build from `WSDE_CONFIG_PATH`, falling back to defaults on any error.
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => match Self::load_file(Path::new(&path)) {
                Ok(config) => {
                    info!(path = %path, "Loaded engine config");
                    config
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Falling back to default engine config");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Serialize to YAML (useful for dumping the effective defaults).
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError {
            source_path: None,
            kind: ConfigErrorKind::SerializeError,
            detail: format!("YAML serialize error: {}", e),
        })
    }

    /// Wrap in an `Arc` for sharing across teams.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

static GLOBAL: OnceLock<Arc<EngineConfig>> = OnceLock::new();

/// Process-wide config, initialised once from the environment.
pub fn global() -> Arc<EngineConfig> {
    GLOBAL.get_or_init(|| Arc::new(EngineConfig::from_env())).clone()
}

/// Error loading or parsing a config.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Path that caused the error (if file-based).
    pub source_path: Option<String>,
    pub kind: ConfigErrorKind,
    pub detail: String,
}

impl ConfigError {
    pub fn parse(source_path: Option<String>, detail: &str) -> Self {
        Self {
            source_path,
            kind: ConfigErrorKind::ParseError,
            detail: detail.to_string(),
        }
    }

    fn with_source(mut self, path: &Path) -> Self {
        self.source_path = Some(path.display().to_string());
        self
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_path {
            Some(path) => write!(f, "[{}] {}: {}", path, self.kind, self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Kind of config error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigErrorKind {
    IoError,
    ParseError,
    SerializeError,
    UnsupportedFormat,
}

impl std::fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError => write!(f, "io_error"),
            Self::ParseError => write!(f, "parse_error"),
            Self::SerializeError => write!(f, "serialize_error"),
            Self::UnsupportedFormat => write!(f, "unsupported_format"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_tables() {
        let config = EngineConfig::default();
        assert_eq!(
            config.role_keywords.for_role(Role::Supervisor),
            &["supervise", "review", "management"]
        );
        assert!(config.role_keywords.for_role(Role::Worker).is_empty());
        assert_eq!(config.vote_weights.for_level(ExpertiseLevel::Expert), 3.0);
        assert_eq!(config.vote_weights.outside_domain, 0.5);
        assert_eq!(
            config.phases.profile(Phase::Expand).role_priority,
            vec![Role::Designer, Role::Worker, Role::Supervisor, Role::Evaluator]
        );
        assert_eq!(
            config.phases.profile(Phase::Refine).role_priority,
            vec![Role::Worker, Role::Supervisor, Role::Designer, Role::Evaluator]
        );
        assert_eq!(config.critical_category_threshold, 0.5);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
vote_weights:
  expert: 4.0
role_keywords:
  designer: [blueprint]
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.vote_weights.expert, 4.0);
        assert_eq!(config.vote_weights.novice, 1.0);
        assert_eq!(config.role_keywords.designer, vec!["blueprint"]);
        assert_eq!(config.role_keywords.evaluator, vec!["test", "qa", "evaluate"]);
        assert_eq!(config.disciplines.len(), 9);
    }

    #[test]
    fn test_toml_config() {
        let text = r#"
critical_category_threshold = 0.7
documentation_expertise = ["docs"]
"#;
        let config = EngineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.critical_category_threshold, 0.7);
        assert_eq!(config.documentation_expertise, vec!["docs"]);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = EngineConfig::from_yaml_str("vote_weights: [1, 2").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::ParseError);
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "critical_category_threshold: 0.9").unwrap();

        let config = EngineConfig::load_file(&path).unwrap();
        assert_eq!(config.critical_category_threshold, 0.9);

        let bad = dir.path().join("engine.ini");
        std::fs::write(&bad, "x=1").unwrap();
        let err = EngineConfig::load_file(&bad).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::UnsupportedFormat);

        let missing = dir.path().join("missing.yaml");
        let err = EngineConfig::load_file(&missing).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::IoError);
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = EngineConfig::default().to_yaml().unwrap();
        let back = EngineConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back.discipline_conflicts.len(), 5);
        assert_eq!(back.categories.security.weight, 1.0);
    }
}
