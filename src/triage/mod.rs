//! Decision pipeline turning a free-text anamnesis into a triage recommendation.
//!
//! Training produces a [`TriageArtifacts`] bundle once per session: category
//! encoders, the disease vocabulary and the fitted ensemble. The bundle is
//! immutable afterwards and every assessment borrows it, so it can be shared
//! behind an `Arc` by concurrent callers without locking.

pub mod blender;
pub mod dataset;
pub mod encoding;
pub mod ensemble;
pub mod forest;
pub mod normalizer;
pub mod router;
pub mod signals;
pub mod vocabulary;

#[cfg(test)]
mod tests;

pub use blender::{Disposition, PredictionResult};
pub use dataset::{CaseRecord, DatasetError, TrainingData};
pub use encoding::{CategoryEncoder, EncodedCategory};
pub use ensemble::{EnsembleReadout, FeatureVector, TriageEnsemble};
pub use forest::{ForestError, ForestParams};
pub use router::triage_router;
pub use signals::ClinicalSignals;
pub use vocabulary::{DiseaseMatches, DiseaseVocabulary};

use blender::BlendInputs;
use ensemble::TrainingSample;
use normalizer::{normalize_anamnesis, normalize_optional, normalize_text};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("no case records to train on")]
    NoCaseRecords,
    #[error("grave disease vocabulary is empty")]
    EmptyGraveVocabulary,
    #[error("{model} model cannot be trained: {source}")]
    Model {
        model: &'static str,
        source: ForestError,
    },
    #[error("no admitted cases with a recorded length of stay")]
    NoAdmittedCases,
}

/// Immutable inference artifacts derived from the training tables.
#[derive(Debug, Clone)]
pub struct TriageArtifacts {
    mobility: CategoryEncoder,
    appetite: CategoryEncoder,
    vocabulary: DiseaseVocabulary,
    ensemble: TriageEnsemble,
}

/// Category codes chosen for one assessment, fallbacks included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryCodes {
    pub mobility: EncodedCategory,
    pub appetite: EncodedCategory,
}

/// Full audit trail of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageAssessment {
    pub normalized_text: String,
    pub signals: ClinicalSignals,
    pub codes: CategoryCodes,
    pub features: FeatureVector,
    pub readout: EnsembleReadout,
    pub diseases: DiseaseMatches,
    pub disposition: Disposition,
}

impl TriageAssessment {
    pub fn prediction(&self) -> PredictionResult {
        PredictionResult::new(&self.disposition, &self.diseases)
    }
}

impl TriageArtifacts {
    pub fn train(data: &TrainingData, params: &ForestParams) -> Result<Self, TrainingError> {
        if data.cases.is_empty() {
            return Err(TrainingError::NoCaseRecords);
        }

        let vocabulary = DiseaseVocabulary::new(&data.grave_diseases, &data.common_diseases);
        if vocabulary.grave_terms().is_empty() {
            return Err(TrainingError::EmptyGraveVocabulary);
        }

        let mobility =
            CategoryEncoder::fit(data.cases.iter().map(|case| normalize_text(&case.mobility)));
        let appetite =
            CategoryEncoder::fit(data.cases.iter().map(|case| normalize_text(&case.appetite)));

        let samples: Vec<TrainingSample> = data
            .cases
            .iter()
            .map(|case| TrainingSample {
                features: FeatureVector {
                    age_years: case.age_years,
                    weight_kg: case.weight_kg,
                    severity: case.severity,
                    pain: case.pain,
                    mobility_code: mobility.encode(&normalize_text(&case.mobility)).code,
                    appetite_code: appetite.encode(&normalize_text(&case.appetite)).code,
                    temperature_c: case.temperature_c,
                    grave_disease: vocabulary
                        .mentions_grave_disease(&normalize_optional(case.disease.as_deref())),
                },
                euthanasia: case.euthanasia,
                discharged: case.discharged,
                admitted: case.admitted,
                stay_days: case.stay_days,
            })
            .collect();

        let ensemble = TriageEnsemble::fit(&samples, params)?;

        Ok(Self {
            mobility,
            appetite,
            vocabulary,
            ensemble,
        })
    }

    pub fn vocabulary(&self) -> &DiseaseVocabulary {
        &self.vocabulary
    }

    pub fn mobility_encoder(&self) -> &CategoryEncoder {
        &self.mobility
    }

    pub fn appetite_encoder(&self) -> &CategoryEncoder {
        &self.appetite
    }

    /// Callers reject blank text before reaching here; blank input still
    /// produces a default-signal assessment.
    pub fn assess(&self, anamnesis: &str) -> TriageAssessment {
        let normalized_text = normalize_anamnesis(anamnesis);
        let signals = signals::extract_signals(&normalized_text);
        let diseases = self.vocabulary.match_text(&normalized_text);

        let codes = CategoryCodes {
            mobility: encode_category("mobility", &self.mobility, signals.mobility.label()),
            appetite: encode_category("appetite", &self.appetite, signals.appetite.label()),
        };

        let features = FeatureVector {
            age_years: signals.age_years,
            weight_kg: signals.weight_kg,
            severity: signals.severity.score(),
            pain: signals.pain.score(),
            mobility_code: codes.mobility.code,
            appetite_code: codes.appetite.code,
            temperature_c: signals.temperature_c,
            grave_disease: diseases.has_grave_disease(),
        };

        let readout = self.ensemble.readout(&features);
        let disposition = blender::blend(
            BlendInputs {
                base_probability: readout.euthanasia_probability,
                grave_disease: features.grave_disease,
                terminal_symptoms: signals.terminal_symptoms,
            },
            || self.ensemble.expected_stay(&features),
        );

        debug!(
            base_probability = disposition.base_probability,
            probability = disposition.euthanasia_probability,
            admit = disposition.admit,
            discharge = disposition.discharge,
            stay_days = disposition.length_of_stay_days,
            grave_matches = diseases.grave.len(),
            "anamnesis assessed"
        );

        TriageAssessment {
            normalized_text,
            signals,
            codes,
            features,
            readout,
            diseases,
            disposition,
        }
    }
}

fn encode_category(field: &'static str, encoder: &CategoryEncoder, label: &str) -> EncodedCategory {
    let encoded = encoder.encode(label);
    if encoded.fallback {
        warn!(field, label, "category unseen in training data, using fallback code");
    }
    encoded
}
