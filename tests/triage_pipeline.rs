use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use vet_triage::triage::{
    triage_router, DatasetError, ForestParams, TrainingData, TriageArtifacts,
};

fn data_path(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
}

fn load_tables() -> TrainingData {
    TrainingData::from_paths(
        data_path("casos_clinicos.csv"),
        data_path("doencas_graves.csv"),
        Some(data_path("doencas_comuns.csv")),
    )
    .expect("bundled tables load")
}

fn params(seed: u64) -> ForestParams {
    ForestParams {
        n_trees: 30,
        seed,
        ..ForestParams::default()
    }
}

#[test]
fn bundled_tables_load_with_expected_shape() {
    let data = load_tables();

    assert!(data.cases.len() >= 40);
    assert!(data.cases.iter().any(|case| case.euthanasia));
    assert!(data
        .cases
        .iter()
        .any(|case| case.admitted && case.stay_days.is_some()));
    assert!(data.grave_diseases.iter().any(|name| name == "Linfoma"));
    assert!(!data.common_diseases.is_empty());
}

#[test]
fn training_with_a_fixed_seed_is_reproducible() {
    let data = load_tables();
    let first = TriageArtifacts::train(&data, &params(7)).expect("first training");
    let second = TriageArtifacts::train(&data, &params(7)).expect("second training");

    let text = "cadela de 11 anos, 23 kg, 39,8 graus, dor moderada, apetite baixo";
    let left = first.assess(text);
    let right = second.assess(text);

    assert_eq!(
        left.readout.euthanasia_probability,
        right.readout.euthanasia_probability
    );
    assert_eq!(left.prediction(), right.prediction());
}

#[test]
fn missing_case_table_is_reported_with_its_name() {
    let error = TrainingData::from_paths(
        data_path("nao_existe.csv"),
        data_path("doencas_graves.csv"),
        None,
    )
    .expect_err("missing file");

    match error {
        DatasetError::Io { table, .. } => assert_eq!(table, "cases"),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn common_disease_table_is_optional() {
    let data = TrainingData::from_paths(
        data_path("casos_clinicos.csv"),
        data_path("doencas_graves.csv"),
        None,
    )
    .expect("tables load without common diseases");
    assert!(data.common_diseases.is_empty());

    let artifacts = TriageArtifacts::train(&data, &params(42)).expect("training");
    let prediction = artifacts.assess("cão com otite e linfoma").prediction();

    assert_eq!(prediction.detected_diseases, vec!["Nenhuma identificada"]);
    assert_eq!(prediction.detected_grave_diseases, vec!["linfoma"]);
}

#[tokio::test]
async fn assessment_endpoint_serves_trained_artifacts() {
    let artifacts = TriageArtifacts::train(&load_tables(), &params(42)).expect("training");
    let app = triage_router(Arc::new(artifacts));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/triage/assessments")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"anamnesis":"gato de 4 anos com hemangiossarcoma, prostração extrema"}"#,
        ))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");

    assert_eq!(payload["admit"], true);
    assert_eq!(payload["discharge"], false);
    assert_eq!(payload["detected_grave_diseases"][0], "hemangiossarcoma");
    assert!(payload["length_of_stay_days"].as_u64().expect("stay") >= 2);
}
