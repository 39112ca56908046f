//! Knowledge-graph collaborator used by knowledge-enhanced reasoning.
//!
//! The engine only reads from the graph. A store that cannot answer a query
//! reports [`KnowledgeError::CapabilityMissing`]; reasoning treats that as
//! "no knowledge available" and carries on with empty reference lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::task::Task;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge store does not support {0}")]
    CapabilityMissing(&'static str),

    #[error("Knowledge query failed: {0}")]
    QueryFailed(String),
}

/// A concept returned for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConcept {
    pub concept: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl KnowledgeConcept {
    pub fn new(concept: &str) -> Self {
        Self {
            concept: concept.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Concept name and property values, lowercased, for keyword matching.
    pub fn search_text(&self) -> String {
        let mut text = self.concept.to_lowercase();
        for value in self.properties.values() {
            text.push(' ');
            text.push_str(&value.to_lowercase());
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRelationship {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Read-only knowledge store.
///
/// Both queries default to `CapabilityMissing` so a partial store only
/// implements what it supports.
pub trait KnowledgeGraph {
    fn query_knowledge_for_task(&self, _task: &Task) -> Result<Vec<KnowledgeConcept>, KnowledgeError> {
        Err(KnowledgeError::CapabilityMissing("query_knowledge_for_task"))
    }

    fn query_concept_relationships(
        &self,
        _first: &str,
        _second: &str,
    ) -> Result<Vec<ConceptRelationship>, KnowledgeError> {
        Err(KnowledgeError::CapabilityMissing("query_concept_relationships"))
    }
}

/// Knowledge store held in memory.
///
/// A concept is relevant to a task when its name, or its `domain` property,
/// appears in the task's flattened values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryKnowledgeGraph {
    concepts: Vec<KnowledgeConcept>,
    relationships: Vec<ConceptRelationship>,
}

impl InMemoryKnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concept(mut self, concept: KnowledgeConcept) -> Self {
        self.concepts.push(concept);
        self
    }

    pub fn with_relationship(mut self, source: &str, target: &str, relation: &str) -> Self {
        self.relationships.push(ConceptRelationship {
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

impl KnowledgeGraph for InMemoryKnowledgeGraph {
    fn query_knowledge_for_task(&self, task: &Task) -> Result<Vec<KnowledgeConcept>, KnowledgeError> {
        let haystack = task
            .flatten()
            .values()
            .map(|v| v.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(self
            .concepts
            .iter()
            .filter(|c| {
                haystack.contains(&c.concept.to_lowercase())
                    || c.properties
                        .get("domain")
                        .is_some_and(|d| haystack.contains(&d.to_lowercase()))
            })
            .cloned()
            .collect())
    }

    fn query_concept_relationships(
        &self,
        first: &str,
        second: &str,
    ) -> Result<Vec<ConceptRelationship>, KnowledgeError> {
        Ok(self
            .relationships
            .iter()
            .filter(|r| {
                (r.source == first && r.target == second) || (r.source == second && r.target == first)
            })
            .cloned()
            .collect())
    }
}
