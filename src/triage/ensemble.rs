use super::forest::{
    ClassWeight, ForestParams, RandomForestClassifier, RandomForestRegressor,
};
use super::TrainingError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Column order every model is fitted and queried with.
pub const FEATURE_COLUMNS: [&str; 8] = [
    "Idade",
    "Peso",
    "Gravidade",
    "Dor",
    "Mobilidade",
    "Apetite",
    "Temperatura",
    "tem_doenca_letal",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age_years: f64,
    pub weight_kg: f64,
    pub severity: u8,
    pub pain: u8,
    pub mobility_code: u32,
    pub appetite_code: u32,
    pub temperature_c: f64,
    pub grave_disease: bool,
}

impl FeatureVector {
    pub fn to_row(&self) -> [f64; 8] {
        [
            self.age_years,
            self.weight_kg,
            f64::from(self.severity),
            f64::from(self.pain),
            f64::from(self.mobility_code),
            f64::from(self.appetite_code),
            self.temperature_c,
            f64::from(u8::from(self.grave_disease)),
        ]
    }
}

/// A feature vector with the outcomes recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub euthanasia: bool,
    pub discharged: bool,
    pub admitted: bool,
    pub stay_days: Option<f64>,
}

/// Raw model outputs for one feature vector, before any clinical rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReadout {
    pub euthanasia_probability: f64,
    /// Advisory only; disposition is decided from the euthanasia probability.
    pub discharge_probability: f64,
    /// Advisory only; disposition is decided from the euthanasia probability.
    pub admission_probability: f64,
}

/// The four estimators fitted once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageEnsemble {
    euthanasia: RandomForestClassifier,
    discharge: RandomForestClassifier,
    admission: RandomForestClassifier,
    length_of_stay: RandomForestRegressor,
}

impl TriageEnsemble {
    pub fn fit(samples: &[TrainingSample], params: &ForestParams) -> Result<Self, TrainingError> {
        if samples.is_empty() {
            return Err(TrainingError::NoCaseRecords);
        }

        let rows: Vec<Vec<f64>> = samples
            .iter()
            .map(|sample| sample.features.to_row().to_vec())
            .collect();
        let labels = |outcome: fn(&TrainingSample) -> bool| -> Vec<bool> {
            samples.iter().map(outcome).collect()
        };

        let euthanasia = RandomForestClassifier::fit(
            &rows,
            &labels(|sample| sample.euthanasia),
            ClassWeight::Balanced,
            params,
        )
        .map_err(|source| TrainingError::Model {
            model: "euthanasia",
            source,
        })?;

        let discharge = RandomForestClassifier::fit(
            &rows,
            &labels(|sample| sample.discharged),
            ClassWeight::Uniform,
            params,
        )
        .map_err(|source| TrainingError::Model {
            model: "discharge",
            source,
        })?;

        let admission = RandomForestClassifier::fit(
            &rows,
            &labels(|sample| sample.admitted),
            ClassWeight::Balanced,
            params,
        )
        .map_err(|source| TrainingError::Model {
            model: "admission",
            source,
        })?;

        let mut stay_rows = Vec::new();
        let mut stay_targets = Vec::new();
        for (sample, row) in samples.iter().zip(&rows) {
            if !sample.admitted {
                continue;
            }
            match sample.stay_days {
                Some(days) => {
                    stay_rows.push(row.clone());
                    stay_targets.push(days);
                }
                None => warn!("admitted case without length of stay skipped"),
            }
        }
        if stay_rows.is_empty() {
            return Err(TrainingError::NoAdmittedCases);
        }

        let length_of_stay = RandomForestRegressor::fit(&stay_rows, &stay_targets, params)
            .map_err(|source| TrainingError::Model {
                model: "length of stay",
                source,
            })?;

        info!(
            samples = samples.len(),
            features = %FEATURE_COLUMNS.join(","),
            admitted = stay_rows.len(),
            trees = params.n_trees,
            "triage ensemble fitted"
        );

        Ok(Self {
            euthanasia,
            discharge,
            admission,
            length_of_stay,
        })
    }

    pub fn readout(&self, features: &FeatureVector) -> EnsembleReadout {
        let row = features.to_row();
        EnsembleReadout {
            euthanasia_probability: self.euthanasia.predict_proba(&row),
            discharge_probability: self.discharge.predict_proba(&row),
            admission_probability: self.admission.predict_proba(&row),
        }
    }

    /// Expected stay in days, unrounded.
    pub fn expected_stay(&self, features: &FeatureVector) -> f64 {
        self.length_of_stay.predict(&features.to_row())
    }
}
