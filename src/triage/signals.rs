//! Rule-based extraction of clinical signals from normalized anamnesis text.
//!
//! Every categorical signal is decided by an ordered rule table evaluated
//! first-match-wins. Phrases overlap across tables (`sem apetite` drives both
//! the appetite category and the terminal-symptom flag), so the tables are
//! kept separate and their order is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalizer::DECIMAL_MARK;

pub const DEFAULT_AGE_YEARS: f64 = 5.0;
pub const DEFAULT_WEIGHT_KG: f64 = 10.0;
pub const DEFAULT_TEMPERATURE_C: f64 = 38.5;

// Decimals arrive as `39_5` (see `normalize_anamnesis`).
static AGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:_\d+)?)\s*anos?").expect("valid age pattern"));

static WEIGHT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:_\d+)?)\s*kg").expect("valid weight pattern"));

static TEMPERATURE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}(?:_\d+)?)\s*(?:graus|celsius|c)").expect("valid temperature pattern")
});

/// One row of an ordered rule table: any phrase present selects `outcome`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
    pub phrases: &'static [&'static str],
    pub outcome: T,
}

impl<T: Copy> KeywordRule<T> {
    pub fn matches(&self, text: &str) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase))
    }
}

/// Evaluates `rules` in order and returns the first matching outcome.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| rule.outcome)
}

/// Coarse triage urgency derived from the color flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageSeverity {
    Urgent,
    Standard,
}

impl TriageSeverity {
    pub const fn score(self) -> u8 {
        match self {
            Self::Urgent => 10,
            Self::Standard => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PainLevel {
    Severe,
    Moderate,
    Absent,
    Unspecified,
}

impl PainLevel {
    pub const fn score(self) -> u8 {
        match self {
            Self::Severe => 10,
            Self::Moderate => 5,
            Self::Absent => 0,
            Self::Unspecified => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppetiteCategory {
    None,
    Low,
    Normal,
}

impl AppetiteCategory {
    /// Label used by the case records and the appetite encoder.
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "nenhum",
            Self::Low => "baixo",
            Self::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilityCategory {
    CannotWalk,
    Limited,
    Normal,
}

impl MobilityCategory {
    /// Label used by the case records and the mobility encoder.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CannotWalk => "sem andar",
            Self::Limited => "limitada",
            Self::Normal => "normal",
        }
    }
}

pub const SEVERITY_RULES: &[KeywordRule<TriageSeverity>] = &[KeywordRule {
    phrases: &["vermelho", "vermelha"],
    outcome: TriageSeverity::Urgent,
}];

pub const PAIN_RULES: &[KeywordRule<PainLevel>] = &[
    KeywordRule {
        phrases: &["dor intensa", "dor severa", "dor forte"],
        outcome: PainLevel::Severe,
    },
    KeywordRule {
        phrases: &["dor moderada"],
        outcome: PainLevel::Moderate,
    },
    KeywordRule {
        phrases: &["sem dor", "ausencia de dor"],
        outcome: PainLevel::Absent,
    },
];

pub const APPETITE_RULES: &[KeywordRule<AppetiteCategory>] = &[
    KeywordRule {
        phrases: &["sem apetite", "nao come", "perda de apetite"],
        outcome: AppetiteCategory::None,
    },
    KeywordRule {
        phrases: &["baixo apetite", "apetite baixo"],
        outcome: AppetiteCategory::Low,
    },
];

pub const MOBILITY_RULES: &[KeywordRule<MobilityCategory>] = &[
    KeywordRule {
        phrases: &["nao anda", "sem andar", "incapaz de andar"],
        outcome: MobilityCategory::CannotWalk,
    },
    KeywordRule {
        phrases: &["mobilidade limitada", "dificuldade locomotora"],
        outcome: MobilityCategory::Limited,
    },
];

/// Severe-prognosis phrases; any one of them raises the terminal flag.
pub const TERMINAL_SYMPTOM_PHRASES: &[&str] = &[
    "prostracao extrema",
    "sem apetite",
    "sem mobilidade",
    "estado mental alterado",
    "nao responsivo",
    "irresponsivo",
    "vomitos frequentes",
    "febre alta",
    "sem resposta",
    "sem reacao",
];

/// Signals pulled from a single anamnesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSignals {
    pub age_years: f64,
    pub weight_kg: f64,
    pub temperature_c: f64,
    pub severity: TriageSeverity,
    pub pain: PainLevel,
    pub appetite: AppetiteCategory,
    pub mobility: MobilityCategory,
    pub terminal_symptoms: bool,
}

/// `text` must come from [`normalize_anamnesis`](super::normalizer::normalize_anamnesis).
pub fn extract_signals(text: &str) -> ClinicalSignals {
    ClinicalSignals {
        age_years: extract_number(&AGE_PATTERN, text).unwrap_or(DEFAULT_AGE_YEARS),
        weight_kg: extract_number(&WEIGHT_PATTERN, text).unwrap_or(DEFAULT_WEIGHT_KG),
        temperature_c: extract_number(&TEMPERATURE_PATTERN, text)
            .unwrap_or(DEFAULT_TEMPERATURE_C),
        severity: first_match(SEVERITY_RULES, text).unwrap_or(TriageSeverity::Standard),
        pain: first_match(PAIN_RULES, text).unwrap_or(PainLevel::Unspecified),
        appetite: first_match(APPETITE_RULES, text).unwrap_or(AppetiteCategory::Normal),
        mobility: first_match(MOBILITY_RULES, text).unwrap_or(MobilityCategory::Normal),
        terminal_symptoms: has_terminal_symptoms(text),
    }
}

pub fn has_terminal_symptoms(text: &str) -> bool {
    TERMINAL_SYMPTOM_PHRASES
        .iter()
        .any(|phrase| text.contains(phrase))
}

fn extract_number(pattern: &Regex, text: &str) -> Option<f64> {
    let captures = pattern.captures(text)?;
    captures
        .get(1)?
        .as_str()
        .replace(DECIMAL_MARK, ".")
        .parse()
        .ok()
}
