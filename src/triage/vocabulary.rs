use super::normalizer::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Normalized disease names split into life-limiting and general terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseVocabulary {
    grave: Vec<String>,
    common: Vec<String>,
}

/// Vocabulary entries found in one normalized text, in vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseMatches {
    pub grave: Vec<String>,
    pub common: Vec<String>,
}

impl DiseaseMatches {
    pub fn has_grave_disease(&self) -> bool {
        !self.grave.is_empty()
    }
}

impl DiseaseVocabulary {
    pub fn new<G, C, S>(grave: G, common: C) -> Self
    where
        G: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            grave: normalized_terms(grave),
            common: normalized_terms(common),
        }
    }

    pub fn grave_terms(&self) -> &[String] {
        &self.grave
    }

    pub fn common_terms(&self) -> &[String] {
        &self.common
    }

    /// `text` must already be normalized.
    pub fn match_text(&self, text: &str) -> DiseaseMatches {
        DiseaseMatches {
            grave: match_terms(&self.grave, text),
            common: match_terms(&self.common, text),
        }
    }

    /// `text` must already be normalized.
    pub fn mentions_grave_disease(&self, text: &str) -> bool {
        self.grave.iter().any(|term| text.contains(term.as_str()))
    }
}

/// Plain substring containment: no tokenization and no word boundaries, so a
/// short name inside a longer unrelated word still matches.
pub fn match_terms(terms: &[String], text: &str) -> Vec<String> {
    terms
        .iter()
        .filter(|term| text.contains(term.as_str()))
        .cloned()
        .collect()
}

fn normalized_terms<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| normalize_text(name.as_ref()))
        .filter(|term| !term.is_empty())
        .filter(|term| seen.insert(term.clone()))
        .collect()
}
