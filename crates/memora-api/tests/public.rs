mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{TestApp, patient_body, session_items};
use memora_storage::store::ObjectStore;
use serde_json::json;

const BOUNDARY: &str = "memora-boundary";

fn multipart_request(field: &str, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/public/upload-audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn public_patient_lookup_by_sequential_id() {
    let app = TestApp::new();
    app.call(Method::POST, "/patients", Some(patient_body())).await;

    let (status, found) = app
        .call_as(None, Method::GET, "/public/patients/000001", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["firstName"], "太郎");

    let (status, missing) = app
        .call_as(None, Method::GET, "/public/patients/777777", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(missing.is_null());
}

#[tokio::test]
async fn public_submission_needs_no_session() {
    let app = TestApp::new();
    let (status, saved) = app
        .call_as(
            None,
            Method::POST,
            "/public/test-results",
            Some(json!({
                "patientId": "000003",
                "result": session_items(),
                "duration": "00:12:00",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["approved"], false);
    assert_eq!(saved["score"], 1.0);
    assert_eq!(saved["duration"], "00:12:00");

    let (_, listed) = app
        .call(Method::GET, "/test-results?patientId=000003", None)
        .await;
    assert_eq!(listed["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn submitted_success_key_cannot_override_the_response() {
    let app = TestApp::new();
    let (status, saved) = app
        .call_as(
            None,
            Method::POST,
            "/public/test-results",
            Some(json!({
                "patientId": "000004",
                "result": session_items(),
                "success": false,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["success"], true);

    let uid = saved["uid"].as_str().unwrap();
    let (_, detail) = app
        .call(Method::GET, &format!("/test-results/{uid}"), None)
        .await;
    assert!(detail["testResult"].get("success").is_none());
}

#[tokio::test]
async fn audio_upload_is_stored_under_audios() {
    let app = TestApp::new();
    let (status, uploaded) = app
        .send(multipart_request("file", "../../voice.m4a", Some("audio/mp4"), b"RIFFDATA"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["success"], true);

    let path = uploaded["path"].as_str().unwrap();
    assert!(path.starts_with("audios/"));
    assert!(path.ends_with("_voice.m4a"));
    assert!(!path.contains(".."));
    assert!(uploaded["url"].as_str().unwrap().contains(path));

    let stored = app.store.get(path).await.unwrap();
    assert_eq!(stored.body, b"RIFFDATA");
    assert_eq!(stored.content_type.as_deref(), Some("audio/mp4"));
}

#[tokio::test]
async fn audio_content_type_defaults_to_m4a() {
    let app = TestApp::new();
    let (_, uploaded) = app
        .send(multipart_request("file", "clip.m4a", None, b"abc"))
        .await;
    let stored = app
        .store
        .get(uploaded["path"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("audio/m4a"));
}

#[tokio::test]
async fn upload_without_a_file_field_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .send(multipart_request("attachment", "clip.m4a", None, b"abc"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let app = TestApp::new();
    let big = vec![0u8; 2 * 1024 * 1024];
    let (status, _) = app
        .send(multipart_request("file", "big.m4a", None, &big))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.store.is_empty());
}
