//! Clinical policy layered over the raw euthanasia probability.
//!
//! Rule order: grave-disease bonus, terminal-symptom bonus, clamp, admission,
//! discharge, length of stay. Every threshold below is clinical policy and is
//! only referenced through these constants.

use super::vocabulary::DiseaseMatches;
use serde::{Deserialize, Serialize};

pub const GRAVE_DISEASE_BONUS: f64 = 0.35;
pub const TERMINAL_SYMPTOM_BONUS: f64 = 0.3;
/// Admission when the adjusted probability is strictly above this value.
pub const ADMISSION_THRESHOLD: f64 = 0.4;
/// Discharge only while the adjusted probability is at or below this value.
pub const DISCHARGE_CEILING: f64 = 0.5;
pub const STAY_SEVERITY_MULTIPLIER: f64 = 4.0;
pub const MIN_STAY_DAYS: u32 = 2;

pub const NO_DISEASE_IDENTIFIED: &str = "Nenhuma identificada";
pub const NO_GRAVE_DISEASE: &str = "Nenhuma grave";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendInputs {
    pub base_probability: f64,
    pub grave_disease: bool,
    pub terminal_symptoms: bool,
}

/// Final disposition after the clinical rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disposition {
    pub base_probability: f64,
    pub euthanasia_probability: f64,
    pub admit: bool,
    pub discharge: bool,
    pub length_of_stay_days: u32,
}

/// Applies the bonuses once each and clamps to `[0, 1]`.
pub fn adjusted_probability(inputs: &BlendInputs) -> f64 {
    let mut probability = inputs.base_probability;
    if inputs.grave_disease {
        probability += GRAVE_DISEASE_BONUS;
    }
    if inputs.terminal_symptoms {
        probability += TERMINAL_SYMPTOM_BONUS;
    }
    probability.clamp(0.0, 1.0)
}

/// `expected_stay` is only invoked for admitted patients.
pub fn blend<F>(inputs: BlendInputs, expected_stay: F) -> Disposition
where
    F: FnOnce() -> f64,
{
    let probability = adjusted_probability(&inputs);
    let admit = probability > ADMISSION_THRESHOLD || inputs.terminal_symptoms;
    let discharge = !admit && probability <= DISCHARGE_CEILING;

    let length_of_stay_days = if admit {
        let extended =
            (expected_stay() + probability * STAY_SEVERITY_MULTIPLIER).round_ties_even();
        extended.max(f64::from(MIN_STAY_DAYS)) as u32
    } else {
        0
    };

    Disposition {
        base_probability: inputs.base_probability,
        euthanasia_probability: probability,
        admit,
        discharge,
        length_of_stay_days,
    }
}

/// User-facing result record with fixed keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub discharge: bool,
    pub admit: bool,
    pub length_of_stay_days: u32,
    /// Percentage rounded to one decimal place.
    pub euthanasia_probability_pct: f64,
    pub detected_diseases: Vec<String>,
    pub detected_grave_diseases: Vec<String>,
}

impl PredictionResult {
    pub fn new(disposition: &Disposition, matches: &DiseaseMatches) -> Self {
        Self {
            discharge: disposition.discharge,
            admit: disposition.admit,
            length_of_stay_days: disposition.length_of_stay_days,
            euthanasia_probability_pct: as_percentage(disposition.euthanasia_probability),
            detected_diseases: or_sentinel(&matches.common, NO_DISEASE_IDENTIFIED),
            detected_grave_diseases: or_sentinel(&matches.grave, NO_GRAVE_DISEASE),
        }
    }
}

fn as_percentage(probability: f64) -> f64 {
    (probability * 1000.0).round_ties_even() / 10.0
}

fn or_sentinel(terms: &[String], sentinel: &str) -> Vec<String> {
    if terms.is_empty() {
        vec![sentinel.to_string()]
    } else {
        terms.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(base_probability: f64, grave_disease: bool, terminal_symptoms: bool) -> BlendInputs {
        BlendInputs {
            base_probability,
            grave_disease,
            terminal_symptoms,
        }
    }

    #[test]
    fn bonuses_stack_and_clamp_to_one() {
        assert!((adjusted_probability(&inputs(0.1, true, false)) - 0.45).abs() < 1e-9);
        assert!((adjusted_probability(&inputs(0.1, false, true)) - 0.4).abs() < 1e-9);
        assert_eq!(adjusted_probability(&inputs(0.9, true, true)), 1.0);
        assert_eq!(adjusted_probability(&inputs(-0.2, false, false)), 0.0);
    }

    #[test]
    fn low_risk_patient_is_discharged_without_stay() {
        let disposition = blend(inputs(0.1, false, false), || panic!("stay not needed"));

        assert!(!disposition.admit);
        assert!(disposition.discharge);
        assert_eq!(disposition.length_of_stay_days, 0);
    }

    #[test]
    fn admission_threshold_is_strict() {
        let at_threshold = blend(inputs(ADMISSION_THRESHOLD, false, false), || 3.0);
        assert!(!at_threshold.admit);
        assert!(at_threshold.discharge);

        let above = blend(inputs(0.41, false, false), || 3.0);
        assert!(above.admit);
        assert!(!above.discharge);
    }

    #[test]
    fn terminal_symptoms_force_admission_even_at_low_risk() {
        // 1.5 + 0.3 * 4 = 2.7
        let disposition = blend(inputs(0.0, false, true), || 1.5);

        assert!(disposition.admit);
        assert!(!disposition.discharge);
        assert!((disposition.euthanasia_probability - TERMINAL_SYMPTOM_BONUS).abs() < 1e-9);
        assert_eq!(disposition.length_of_stay_days, MIN_STAY_DAYS + 1);
    }

    #[test]
    fn stay_is_extended_by_severity_and_floored() {
        let extended = blend(inputs(0.5, false, false), || 4.4);
        // 4.4 + 0.5 * 4 = 6.4
        assert_eq!(extended.length_of_stay_days, 6);

        let floored = blend(inputs(0.45, false, false), || -3.0);
        assert_eq!(floored.length_of_stay_days, MIN_STAY_DAYS);
    }

    #[test]
    fn half_day_stays_round_to_even() {
        assert_eq!(blend(inputs(0.75, false, false), || 1.5).length_of_stay_days, 4);
        assert_eq!(blend(inputs(0.75, false, false), || 0.5).length_of_stay_days, 4);
        assert_eq!(blend(inputs(0.75, false, false), || 2.5).length_of_stay_days, 6);
    }

    #[test]
    fn admit_and_discharge_are_never_both_true() {
        for step in 0..=20 {
            let base = f64::from(step) / 20.0;
            for grave in [false, true] {
                for terminal in [false, true] {
                    let disposition = blend(inputs(base, grave, terminal), || 1.0);
                    assert!(!(disposition.admit && disposition.discharge));
                    if disposition.admit {
                        assert!(disposition.length_of_stay_days >= MIN_STAY_DAYS);
                    } else {
                        assert_eq!(disposition.length_of_stay_days, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn prediction_uses_sentinels_for_empty_matches() {
        let disposition = blend(inputs(0.123, false, false), || 0.0);
        let result = PredictionResult::new(&disposition, &DiseaseMatches::default());

        assert_eq!(result.detected_diseases, vec![NO_DISEASE_IDENTIFIED]);
        assert_eq!(result.detected_grave_diseases, vec![NO_GRAVE_DISEASE]);
        assert_eq!(result.euthanasia_probability_pct, 12.3);
    }

    #[test]
    fn prediction_keeps_match_order() {
        let disposition = blend(inputs(0.0, true, false), || 2.0);
        let matches = DiseaseMatches {
            grave: vec!["linfoma".to_string()],
            common: vec!["otite".to_string(), "gastrite".to_string()],
        };

        let result = PredictionResult::new(&disposition, &matches);
        assert_eq!(result.detected_grave_diseases, vec!["linfoma"]);
        assert_eq!(result.detected_diseases, vec!["otite", "gastrite"]);
        assert_eq!(result.euthanasia_probability_pct, 35.0);
        assert!(!result.admit);
    }

    #[test]
    fn serializes_with_fixed_keys() {
        let disposition = blend(inputs(0.0, false, false), || 0.0);
        let value = serde_json::to_value(PredictionResult::new(
            &disposition,
            &DiseaseMatches::default(),
        ))
        .expect("serialize");

        for key in [
            "discharge",
            "admit",
            "length_of_stay_days",
            "euthanasia_probability_pct",
            "detected_diseases",
            "detected_grave_diseases",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
