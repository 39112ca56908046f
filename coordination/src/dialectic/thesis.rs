//! Thesis identification: the latest stored solution, reduced to key points.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::readability::extract_key_points;
use crate::team::Solution;

static SIGNATURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*((?:pub\s+)?(?:async\s+)?(?:fn|def|function|class)\s+\w+[^\n{]*)")
        .expect("SIGNATURE_PATTERN regex should compile")
});
static CONTROL_FLOW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(if|for|while|match|loop|try|except|catch|return)\b[^\n]*")
        .expect("CONTROL_FLOW_PATTERN regex should compile")
});

/// The solution under examination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    pub solution_id: String,
    pub agent: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub key_points: Vec<String>,
}

impl Thesis {
    pub fn identify(solution: &Solution, indicators: &[String]) -> Self {
        let mut key_points = extract_key_points(&solution.content, indicators);
        if let Some(code) = &solution.code {
            key_points.extend(code_markers(code));
        }
        Self {
            solution_id: solution.id.clone(),
            agent: solution.agent.clone(),
            content: solution.content.clone(),
            code: solution.code.clone(),
            key_points,
        }
    }
}

/// Function signatures and control-flow lines, in source order.
pub fn code_markers(code: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = SIGNATURE_PATTERN
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| (m.start(), m.as_str().trim().trim_end_matches(':').trim_end().to_string()))
        .collect();
    found.extend(
        CONTROL_FLOW_PATTERN
            .find_iter(code)
            .map(|m| (m.start(), m.as_str().trim().to_string())),
    );
    found.sort_by_key(|(pos, _)| *pos);
    found.dedup_by(|a, b| a.1 == b.1);
    found.into_iter().map(|(_, text)| text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_markers() {
        let code = "def login(user):\n    if not user:\n        return None\n    for x in y:\n        pass";
        assert_eq!(
            code_markers(code),
            vec!["def login(user)", "if not user:", "return None", "for x in y:"]
        );
    }

    #[test]
    fn test_rust_signature() {
        let code = "pub async fn fetch(id: u32) -> Result<(), E> {\n    match id {}\n}";
        let markers = code_markers(code);
        assert_eq!(markers[0], "pub async fn fetch(id: u32) -> Result<(), E>");
        assert_eq!(markers[1], "match id {}");
    }

    #[test]
    fn test_identify_combines_text_and_code() {
        let indicators = vec!["must".to_string()];
        let solution = Solution::new("alice", "Intro. Passwords must be hashed.")
            .with_code("def hash_pw(pw):\n    return bcrypt(pw)");
        let thesis = Thesis::identify(&solution, &indicators);
        assert_eq!(thesis.agent, "alice");
        assert_eq!(
            thesis.key_points,
            vec!["Passwords must be hashed", "def hash_pw(pw)", "return bcrypt(pw)"]
        );
    }
}
