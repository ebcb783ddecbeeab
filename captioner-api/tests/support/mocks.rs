#![allow(dead_code)]

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a successful media upload endpoint for the bucket.
pub async fn mock_storage_upload(server: &MockServer, bucket: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/upload/storage/v1/b/{bucket}/o")))
        .and(query_param("uploadType", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "storage#object",
            "bucket": bucket,
        })))
        .mount(server)
        .await;
}

/// Mounts a failing media upload endpoint for the bucket.
pub async fn mock_storage_upload_failure(
    server: &MockServer,
    bucket: &str,
    status: u16,
    body: &str,
) {
    Mock::given(method("POST"))
        .and(path(format!("/upload/storage/v1/b/{bucket}/o")))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a vision annotate endpoint returning the given ranked labels.
pub async fn mock_vision_labels(server: &MockServer, labels: &[&str]) {
    let annotations: Vec<_> = labels
        .iter()
        .map(|label| json!({ "description": label, "score": 0.9 }))
        .collect();

    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "labelAnnotations": annotations }],
        })))
        .mount(server)
        .await;
}

/// Mounts a vision annotate endpoint reporting a per-image error.
pub async fn mock_vision_error(server: &MockServer, message: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "error": { "code": 7, "message": message } }],
        })))
        .mount(server)
        .await;
}
