use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::triage::blender::{NO_DISEASE_IDENTIFIED, NO_GRAVE_DISEASE};
use crate::triage::triage_router;

fn router() -> axum::Router {
    triage_router(Arc::new(artifacts().clone()))
}

fn assessment_request(payload: Value) -> Request<Body> {
    Request::post("/api/v1/triage/assessments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).expect("payload")))
        .expect("request")
}

#[tokio::test]
async fn assessment_route_returns_prediction_record() {
    let response = router()
        .oneshot(assessment_request(json!({
            "anamnesis": "gato de 2 anos, apetite normal, mobilidade normal, sem dor"
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["admit"], json!(false));
    assert_eq!(body["discharge"], json!(true));
    assert_eq!(body["length_of_stay_days"], json!(0));
    assert!(body["euthanasia_probability_pct"].as_f64().is_some());
    assert_eq!(body["detected_diseases"], json!([NO_DISEASE_IDENTIFIED]));
    assert_eq!(body["detected_grave_diseases"], json!([NO_GRAVE_DISEASE]));
    assert!(body.get("signals").is_none());
}

#[tokio::test]
async fn assessment_route_can_echo_signals() {
    let response = router()
        .oneshot(assessment_request(json!({
            "anamnesis": "cão de 8 anos, 12 kg, 39 graus, dor intensa, não anda, sem apetite",
            "include_signals": true
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["admit"], json!(true));
    assert_eq!(body["signals"]["pain"], json!("severe"));
    assert_eq!(body["signals"]["mobility"], json!("cannot_walk"));
    assert_eq!(body["signals"]["weight_kg"], json!(12.0));
}

#[tokio::test]
async fn blank_anamnesis_is_rejected() {
    let response = router()
        .oneshot(assessment_request(json!({ "anamnesis": "   \n " })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("must not be empty"));
}
