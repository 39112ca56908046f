//! Antithesis strategies: critic-driven, category-scored, and
//! knowledge-referenced.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::critique::{
    category_critiques, heuristic_critiques, prioritize_critiques, CritiqueCategory, CritiqueItem,
    PrioritizedCritique,
};
use crate::agent::Agent;
use crate::config::EngineConfig;
use crate::knowledge::KnowledgeConcept;
use crate::task::Task;
use crate::team::Solution;

/// Where basic critiques came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueSource {
    Critic,
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAntithesis {
    pub critic: String,
    pub source: CritiqueSource,
    pub critiques: Vec<String>,
    pub recommendations: Vec<String>,
    pub prioritized: Vec<PrioritizedCritique>,
}

/// Ask the critic; fall back to static heuristics if it fails or says nothing.
pub fn basic_antithesis(
    critic: &mut dyn Agent,
    task: &Task,
    solution: &Solution,
    config: &EngineConfig,
) -> BasicAntithesis {
    let (source, critiques, recommendations) = match critic.process(task) {
        Ok(output) if !output.critiques.is_empty() => {
            debug!(critic = critic.name(), count = output.critiques.len(), "Critic responded");
            (CritiqueSource::Critic, output.critiques, output.recommendations)
        }
        Ok(_) => {
            warn!(critic = critic.name(), "Critic returned no critiques; using heuristics");
            (CritiqueSource::Heuristic, heuristic_critiques(solution), Vec::new())
        }
        Err(e) => {
            warn!(critic = critic.name(), error = %e, "Critic failed; using heuristics");
            (CritiqueSource::Heuristic, heuristic_critiques(solution), Vec::new())
        }
    };

    let prioritized = prioritize_critiques(&critiques, &config.categories, &config.severity_keywords);
    BasicAntithesis {
        critic: critic.name().to_string(),
        source,
        critiques,
        recommendations,
        prioritized,
    }
}

/// Scored critiques for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCritique {
    pub category: CritiqueCategory,
    pub items: Vec<CritiqueItem>,
    pub category_weight: f64,
    /// Mean item weight × category weight; 0.0 with no items.
    pub score: f64,
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_references: Vec<KnowledgeConcept>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedAntithesis {
    pub categories: Vec<CategoryCritique>,
}

impl EnhancedAntithesis {
    /// All critique messages, category by category.
    pub fn critiques(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(|i| i.message.clone()))
            .collect()
    }

    pub fn category(&self, category: CritiqueCategory) -> Option<&CategoryCritique> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Categories with at least one item.
    pub fn critiqued_categories(&self) -> Vec<CritiqueCategory> {
        self.categories
            .iter()
            .filter(|c| !c.items.is_empty())
            .map(|c| c.category)
            .collect()
    }

    pub fn critical_categories(&self) -> Vec<CritiqueCategory> {
        self.categories.iter().filter(|c| c.critical).map(|c| c.category).collect()
    }

    /// Every knowledge reference, deduplicated by concept name.
    pub fn references(&self) -> Vec<&KnowledgeConcept> {
        let mut out: Vec<&KnowledgeConcept> = Vec::new();
        for concept in self.categories.iter().flat_map(|c| &c.knowledge_references) {
            if !out.iter().any(|c| c.concept == concept.concept) {
                out.push(concept);
            }
        }
        out
    }
}

/// Run every category's heuristics and score them.
pub fn enhanced_antithesis(solution: &Solution, config: &EngineConfig) -> EnhancedAntithesis {
    let categories = CritiqueCategory::all()
        .iter()
        .map(|&category| {
            let items = category_critiques(category, solution);
            let category_weight = config.categories.profile(category).weight;
            let score = if items.is_empty() {
                0.0
            } else {
                let mean = items.iter().map(|i| i.weight).sum::<f64>() / items.len() as f64;
                mean * category_weight
            };
            CategoryCritique {
                category,
                items,
                category_weight,
                score,
                critical: score > config.critical_category_threshold,
                knowledge_references: Vec::new(),
            }
        })
        .collect();
    EnhancedAntithesis { categories }
}

/// [`enhanced_antithesis`] plus the concepts matching each category's keywords.
pub fn knowledge_antithesis(
    solution: &Solution,
    config: &EngineConfig,
    concepts: &[KnowledgeConcept],
) -> EnhancedAntithesis {
    let mut antithesis = enhanced_antithesis(solution, config);
    for entry in &mut antithesis.categories {
        let keywords = &config.categories.profile(entry.category).keywords;
        entry.knowledge_references = concepts
            .iter()
            .filter(|c| {
                let text = c.search_text();
                keywords.iter().any(|k| text.contains(&k.to_lowercase()))
            })
            .cloned()
            .collect();
    }
    antithesis
}
