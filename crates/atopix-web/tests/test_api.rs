//! End-to-end tests against the assembled router.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use atopix_config::AppConfig;
use atopix_ingestion::{Clock, PreprocessCache};
use atopix_web::{router::build_router, state::AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;

const BOUNDARY: &str = "atopix-test-boundary";
const COHORT: &str = "id,g1,g2\np1,1.0,2.0\np2,3.0,4.0\n";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str),
}

fn multipart(parts: &[Part<'_>]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match part {
            Part::Text(name, value) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    name, value
                ));
            }
            Part::File(filename, content) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                     Content-Type: text/csv\r\n\r\n{}\r\n",
                    filename, content
                ));
            }
        }
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn form_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart(parts)))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, text) = send_raw(app, request).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

fn app() -> Router {
    build_router(AppState::new(AppConfig::default()))
}

async fn preprocess(app: &Router, csv: &str) -> String {
    let (status, body) = send(
        app,
        form_request("/api/preprocess", &[Part::File("cohort.csv", csv)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["cache_key"].as_str().unwrap().to_string()
}

fn assert_error(body: &Value, error_type: &str) {
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error_type"], json!(error_type));
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_health_and_models() {
    let app = app();

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = send(&app, get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "models": ["svm", "neural_network", "random_forest", "logistic_regression"] })
    );
}

#[tokio::test]
async fn test_preprocess_response() {
    let app = app();
    let (status, body) = send(
        &app,
        form_request("/api/preprocess", &[Part::File("cohort.csv", COHORT)]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["patient_count"], json!(2));
    assert_eq!(body["total_genes"], json!(2));
    assert_eq!(body["gene_columns"], json!(["g1", "g2"]));
    assert_eq!(body["preview_data"][1]["patient_id"], json!("p2"));
    assert_eq!(body["preview_data"][1]["values"], json!([3.0, 4.0]));
    assert!(!body["cache_key"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_direct_predict_every_model() {
    let app = app();
    for model in ["svm", "neural_network", "random_forest", "logistic_regression"] {
        let (status, body) = send(
            &app,
            form_request(
                "/api/predict",
                &[Part::Text("model_type", model), Part::File("cohort.csv", COHORT)],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{}: {}", model, body);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["model_type"], json!(model));
        assert_eq!(body["patient_count"], json!(2));
        assert_eq!(body["gene_columns"], json!(["g1", "g2"]));

        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        for (record, id) in predictions.iter().zip(["p1", "p2"]) {
            assert_eq!(record["patient_id"], json!(id));
            let confidence = record["confidence"].as_f64().unwrap();
            assert!((0.5..=1.0).contains(&confidence));
            let prediction = record["prediction"].as_str().unwrap();
            assert!(prediction == "yes" || prediction == "no");
            if prediction == "no" {
                assert_eq!(record["endotype"], json!("negative"));
            }
            assert!(record["gene_expression"]["g1"].is_number());
        }
    }
}

#[tokio::test]
async fn test_preprocess_then_predict_every_model() {
    let app = app();
    let key = preprocess(&app, COHORT).await;

    for model in ["svm", "neural_network", "random_forest", "logistic_regression"] {
        let (status, body) = send(
            &app,
            json_request("/api/predict", json!({ "model_type": model, "cache_key": key })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{}: {}", model, body);
        assert_eq!(body["model_type"], json!(model));
        assert_eq!(body["patient_count"], json!(2));
        assert_eq!(body["gene_columns"], json!(["g1", "g2"]));
        assert_eq!(body["top_variant_genes"], json!(["g1", "g2"]));

        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        let ids: Vec<&str> = predictions
            .iter()
            .map(|r| r["patient_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        for record in predictions {
            let confidence = record["confidence"].as_f64().unwrap();
            assert!((0.5..=1.0).contains(&confidence), "{}: {}", model, confidence);
        }
    }
}

#[tokio::test]
async fn test_preview_keeps_huge_values() {
    let app = app();
    let (status, body) = send(
        &app,
        form_request(
            "/api/preprocess",
            &[Part::File("cohort.csv", "id,g1,g2\np1,1e305,2.0\np2,3.0,4.0\n")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preview_data"][0]["values"], json!([1e305, 2.0]));
}

#[tokio::test]
async fn test_expression_echo_keeps_column_order() {
    let app = app();
    let (status, text) = send_raw(
        &app,
        form_request(
            "/api/predict",
            &[
                Part::Text("model_type", "svm"),
                Part::File("cohort.csv", "id,IL13,FLG\np1,1.5,2.0\n"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains(r#""gene_expression":{"IL13":1.5,"FLG":2.0}"#), "{}", text);
}

#[tokio::test]
async fn test_cached_predict_is_repeatable() {
    let app = app();
    let key = preprocess(&app, COHORT).await;

    let (first_status, first) = send(
        &app,
        json_request("/api/predict", json!({ "model_type": "random_forest", "cache_key": key })),
    )
    .await;
    let (_, second) = send(
        &app,
        form_request(
            "/api/predict",
            &[Part::Text("model_type", "random_forest"), Part::Text("cache_key", &key)],
        ),
    )
    .await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first["predictions"], second["predictions"]);
}

#[tokio::test]
async fn test_cached_predict_with_patient_filter() {
    let app = app();
    let key = preprocess(&app, "id,g1,g2\np1,1,2\np2,3,4\np3,5,6\n").await;

    let (status, body) = send(
        &app,
        json_request(
            "/api/predict",
            json!({ "model_type": "svm", "cache_key": key, "patient_ids": ["p3", "p1"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["predictions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["patient_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p3"]);

    let (status, body) = send(
        &app,
        form_request(
            "/api/predict",
            &[
                Part::Text("model_type", "svm"),
                Part::Text("cache_key", &key),
                Part::Text("patient_ids", "nobody"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation_error");
}

#[tokio::test]
async fn test_predict_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        form_request(
            "/api/predict",
            &[Part::Text("model_type", "xgboost"), Part::File("cohort.csv", COHORT)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation_error");
    assert!(body["error"].as_str().unwrap().contains("xgboost"));

    let (status, body) =
        send(&app, form_request("/api/predict", &[Part::Text("model_type", "svm")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file provided"));

    let (status, body) =
        send(&app, form_request("/api/predict", &[Part::File("cohort.csv", COHORT)])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No model type specified"));

    let (status, body) = send(
        &app,
        form_request(
            "/api/predict",
            &[Part::Text("model_type", "svm"), Part::File("cohort.txt", COHORT)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation_error");

    let (status, body) = send(
        &app,
        form_request(
            "/api/predict",
            &[Part::Text("model_type", "svm"), Part::File("cohort.csv", "id,g1\np1,high\n")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("g1"));
}

#[tokio::test]
async fn test_preprocess_without_file() {
    let app = app();
    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/preprocess")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file provided"));
}

#[tokio::test]
async fn test_unknown_cache_key() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request("/api/predict", json!({ "model_type": "svm", "cache_key": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "cache_error");

    let (status, body) = send(&app, get("/api/statistics/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "cache_error");
}

struct ManualClock(Mutex<DateTime<Utc>>);

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[tokio::test]
async fn test_cache_entry_expires() {
    let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
    let config = AppConfig::default();
    let cache = PreprocessCache::with_clock(config.cache.ttl_secs, clock.clone());
    let app = build_router(AppState::with_cache(config, cache));
    let key = preprocess(&app, COHORT).await;

    *clock.0.lock().unwrap() += TimeDelta::seconds(3600);
    let (status, _) = send(&app, get(&format!("/api/statistics/{}", key))).await;
    assert_eq!(status, StatusCode::OK);

    *clock.0.lock().unwrap() += TimeDelta::seconds(1);
    let (status, body) = send(&app, get(&format!("/api/statistics/{}", key))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "cache_error");
}

#[tokio::test]
async fn test_statistics() {
    let app = app();
    let key = preprocess(&app, COHORT).await;
    let (status, body) = send(&app, get(&format!("/api/statistics/{}", key))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_count"], json!(2));
    let stats = body["statistics"].as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["gene"], json!("g1"));
    assert_eq!(stats[0]["mean"], json!(2.0));
    assert_eq!(stats[0]["min"], json!(1.0));
    assert_eq!(stats[0]["max"], json!(3.0));
}

fn baseline_app(csv: &str, tag: &str) -> (Router, PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "atopix-baseline-{}-{}.csv",
        tag,
        std::process::id()
    ));
    std::fs::write(&path, csv).unwrap();
    let mut config = AppConfig::default();
    config.data.baseline_path = path.clone();
    (build_router(AppState::new(config)), path)
}

#[tokio::test]
async fn test_baseline() {
    let (app, path) = baseline_app("id,IL13,FLG\nb1,1.5,2.0\nb2,2.5,3.0\n", "named");
    let (status, text) = send_raw(&app, get("/api/baseline")).await;
    std::fs::remove_file(&path).ok();

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["patient_count"], json!(2));
    assert_eq!(body["patient_ids"], json!(["b1", "b2"]));
    assert_eq!(body["gene_columns"], json!(["IL13", "FLG"]));
    assert!(text.contains(r#""data":{"IL13":[1.5,2.5],"FLG":[2.0,3.0]}"#), "{}", text);
}

#[tokio::test]
async fn test_baseline_numeric_subject_ids() {
    let (app, path) = baseline_app("subject,IL13,FLG\n1001,1.5,2.0\n1002,2.5,3.0\n", "numeric");
    let (status, body) = send(&app, get("/api/baseline")).await;
    std::fs::remove_file(&path).ok();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_ids"], json!(["1001", "1002"]));
    assert_eq!(body["gene_columns"], json!(["IL13", "FLG"]));
    assert!(body["data"].get("subject").is_none());
}

#[tokio::test]
async fn test_missing_baseline_hides_detail() {
    let mut config = AppConfig::default();
    config.data.baseline_path = PathBuf::from("/nonexistent/atopix/baseline.csv");
    let app = build_router(AppState::new(config));

    let (status, body) = send(&app, get("/api/baseline")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, "server_error");
    assert!(!body["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_oversized_upload() {
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = 256;
    let app = build_router(AppState::new(config));

    let big = format!("id,g1\n{}", "p,1.0\n".repeat(200));
    let (status, body) = send(
        &app,
        form_request("/api/preprocess", &[Part::File("cohort.csv", &big)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_error(&body, "validation_error");
}
