//! Task payloads: a small set of well-known fields plus an open extension map.
//!
//! Identity is the explicit `id` when present; otherwise a SHA-256 over the
//! canonical flattened content, so the same payload gets the same id in every
//! process.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Kind of work a task represents (serialized as the `type` key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecisionKind {
    CriticalDecision,
    Documentation,
    Code,
    Design,
    /// Any other caller-defined type, kept verbatim.
    Other(String),
}

impl DecisionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CriticalDecision => "critical_decision",
            Self::Documentation => "documentation",
            Self::Code => "code",
            Self::Design => "design",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DecisionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "critical_decision" => Self::CriticalDecision,
            "documentation" => Self::Documentation,
            "code" => Self::Code,
            "design" => Self::Design,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DecisionKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DecisionKind> for String {
    fn from(kind: DecisionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One selectable option of a decision task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOption {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskOption {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A unit of work handed to the team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DecisionKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<TaskOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    /// Set on the copy handed to consensus when a vote ties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tied_options: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// A critical decision over the given option ids.
    pub fn critical_decision(id: &str, options: &[&str]) -> Self {
        Self {
            id: Some(id.to_string()),
            kind: Some(DecisionKind::CriticalDecision),
            is_critical: true,
            options: options.iter().map(|o| TaskOption::new(o)).collect(),
            ..Self::default()
        }
    }

    /// Parse an arbitrary JSON object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn with_kind(mut self, kind: impl Into<DecisionKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_requirements(mut self, requirements: &[&str]) -> Self {
        self.requirements = requirements.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_kind(&self, kind: &DecisionKind) -> bool {
        self.kind.as_ref() == Some(kind)
    }

    pub fn option_ids(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Flattened `dotted.key -> scalar` view of the whole task.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        flatten_value(&self.to_value())
    }

    /// Explicit non-empty id, or a stable content hash.
    pub fn task_id(&self) -> String {
        match self.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => stable_id(&self.flatten()),
        }
    }
}

/// Flatten nested objects/arrays into dotted keys.
///
/// Uses an explicit work stack, so arbitrarily deep payloads cannot exhaust
/// the call stack. Array elements are keyed by index; nulls are dropped.
pub fn flatten_value(value: &serde_json::Value) -> BTreeMap<String, String> {
    use serde_json::Value;

    let mut out = BTreeMap::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), value)];

    while let Some((prefix, current)) = stack.pop() {
        let join = |key: &str| {
            if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", prefix, key)
            }
        };
        match current {
            Value::Object(map) => {
                for (k, v) in map {
                    stack.push((join(k), v));
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    stack.push((join(&i.to_string()), v));
                }
            }
            Value::Null => {}
            Value::String(s) => {
                out.insert(prefix, s.clone());
            }
            Value::Bool(b) => {
                out.insert(prefix, b.to_string());
            }
            Value::Number(n) => {
                out.insert(prefix, n.to_string());
            }
        }
    }

    out
}

/// `task-` + 16 hex chars of SHA-256 over sorted `key=value` lines.
pub fn stable_id(flattened: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in flattened {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    format!("task-{}", &digest[..16])
}
