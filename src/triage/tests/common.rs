use std::io::Cursor;
use std::sync::OnceLock;

use crate::triage::{ForestParams, TrainingData, TriageArtifacts};

pub(super) const CASES_CSV: &str = include_str!("../../../data/casos_clinicos.csv");
pub(super) const GRAVE_DISEASES_CSV: &str = include_str!("../../../data/doencas_graves.csv");
pub(super) const COMMON_DISEASES_CSV: &str = include_str!("../../../data/doencas_comuns.csv");

pub(super) fn forest_params() -> ForestParams {
    ForestParams {
        n_trees: 40,
        ..ForestParams::default()
    }
}

pub(super) fn training_data() -> TrainingData {
    TrainingData::from_readers(
        Cursor::new(CASES_CSV),
        Cursor::new(GRAVE_DISEASES_CSV),
        Some(Cursor::new(COMMON_DISEASES_CSV)),
    )
    .expect("fixture tables load")
}

pub(super) fn artifacts() -> &'static TriageArtifacts {
    static ARTIFACTS: OnceLock<TriageArtifacts> = OnceLock::new();
    ARTIFACTS.get_or_init(|| {
        TriageArtifacts::train(&training_data(), &forest_params()).expect("fixture trains")
    })
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
