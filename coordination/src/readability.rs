//! Plain-language helpers: key-point extraction, Flesch readability and
//! stakeholder-facing summaries of consensus outcomes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::consensus::{ConsensusMethod, ConsensusOutcome};
use crate::task::Task;

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("SENTENCE_SPLIT regex should compile"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("WORD regex should compile"));

/// Non-empty, trimmed sentences of `text`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences containing any indicator word; all sentences if none do.
pub fn extract_key_points(text: &str, indicators: &[String]) -> Vec<String> {
    let sentences = split_sentences(text);
    let key: Vec<String> = sentences
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            indicators.iter().any(|i| lower.contains(&i.to_lowercase()))
        })
        .map(|s| s.to_string())
        .collect();

    if key.is_empty() {
        sentences.into_iter().map(String::from).collect()
    } else {
        key
    }
}

/// Words of at least this length count as significant in [`mentions`].
const SIGNIFICANT_WORD_LEN: usize = 5;

/// Whether `text` covers `phrase`: it contains the phrase outright, or at
/// least half of the phrase's significant words.
pub fn mentions(text: &str, phrase: &str) -> bool {
    let text = text.to_lowercase();
    let phrase = phrase.to_lowercase();
    if phrase.trim().is_empty() {
        return false;
    }
    if text.contains(phrase.trim()) {
        return true;
    }
    let significant: Vec<&str> = WORD
        .find_iter(&phrase)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= SIGNIFICANT_WORD_LEN)
        .collect();
    if significant.is_empty() {
        return false;
    }
    let found = significant.iter().filter(|w| text.contains(**w)).count();
    found * 2 >= significant.len()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub syllables_per_word: f64,
    pub words_per_sentence: f64,
}

fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let word = word.strip_suffix('e').unwrap_or(&word);

    let mut count = 0;
    let mut in_vowel_group = false;
    for c in word.chars() {
        if "aeiouy".contains(c) {
            if !in_vowel_group {
                count += 1;
                in_vowel_group = true;
            }
        } else {
            in_vowel_group = false;
        }
    }
    count.max(1)
}

/// Flesch reading ease and Flesch-Kincaid grade. Empty text gives all zeros.
pub fn readability(text: &str) -> ReadabilityMetrics {
    let sentences = split_sentences(text).len();
    let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
    if sentences == 0 || words.is_empty() {
        return ReadabilityMetrics::default();
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;

    ReadabilityMetrics {
        flesch_reading_ease: 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word,
        flesch_kincaid_grade: 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59,
        syllables_per_word,
        words_per_sentence,
    }
}

/// Summarise a consensus outcome for people outside the team.
pub fn stakeholder_explanation(task: &Task, outcome: &ConsensusOutcome) -> String {
    let title = task
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(|| task.task_id());

    let mut out = format!("Decision summary for '{}': ", title);
    match outcome.method {
        ConsensusMethod::Consensus => {
            out.push_str("No proposals were available, so no decision was made. ");
        }
        ConsensusMethod::SingleSolution => {
            out.push_str(&format!(
                "A single proposal from {} was adopted as submitted. ",
                outcome.contributors.join(", ")
            ));
        }
        ConsensusMethod::ConsensusSynthesis => {
            out.push_str(&format!(
                "After comparing {} proposals, the team combined their strongest elements. ",
                outcome.contributors.len()
            ));
            if !outcome.strengths.is_empty() {
                out.push_str(&format!("Key strengths: {}. ", outcome.strengths.join("; ")));
            }
        }
    }

    if !outcome.consensus.is_empty() {
        let metrics = readability(&outcome.consensus);
        out.push_str(&format!(
            "The decision text reads at approximately grade {:.1}. ",
            metrics.flesch_kincaid_grade
        ));
    }

    out.push_str("Next steps: implement the decision and monitor outcomes.");
    out
}
