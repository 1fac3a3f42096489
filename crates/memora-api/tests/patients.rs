mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{TestApp, patient_body, token};
use memora_core::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn management_routes_require_a_token() {
    let app = TestApp::new();
    let (status, body) = app.call_as(None, Method::GET, "/patients", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let req = Request::builder()
        .uri("/patients")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn id_token_cookie_is_accepted() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/patients")
        .header(header::COOKIE, format!("theme=dark; id_token={}", token("cookie-sub")))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 0);
}

#[tokio::test]
async fn empty_id_token_cookie_is_rejected() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/patients")
        .header(header::COOKIE, "id_token=; theme=dark")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_without_admin_role_are_forbidden() {
    let app = TestApp::new();
    app.seed_staff("plain-user", Role::User).await;
    app.seed_staff("boss", Role::Admin).await;

    let (status, _) = app
        .call_as(Some("plain-user"), Method::GET, "/patients", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call_as(Some("boss"), Method::GET, "/patients", None).await;
    assert_eq!(status, StatusCode::OK);

    // Non-admins can still see who they are.
    let (status, body) = app
        .call_as(Some("plain-user"), Method::GET, "/auth/me", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["id"], "000099");
}

#[tokio::test]
async fn me_falls_back_to_token_claims() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["uid"], common::ADMIN);
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["name"], "Test Staff");
    assert_eq!(body["user"]["id"], "");
}

#[tokio::test]
async fn created_patients_get_sequential_ids() {
    let app = TestApp::new();

    let (status, first) = app.call(Method::POST, "/patients", Some(patient_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["id"], "000001");

    let (_, second) = app.call(Method::POST, "/patients", Some(patient_body())).await;
    assert_eq!(second["id"], "000002");

    let mut manual = patient_body();
    manual["id"] = json!("  CUSTOM-7 ");
    let (_, third) = app.call(Method::POST, "/patients", Some(manual)).await;
    assert_eq!(third["id"], "CUSTOM-7");

    // The counter is untouched by manual ids.
    let (_, fourth) = app.call(Method::POST, "/patients", Some(patient_body())).await;
    assert_eq!(fourth["id"], "000003");
}

#[tokio::test]
async fn invalid_patients_are_rejected_without_consuming_an_id() {
    let app = TestApp::new();

    let mut missing = patient_body();
    missing["city"] = json!("  ");
    let (status, body) = app.call(Method::POST, "/patients", Some(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("city"));

    let mut too_long = patient_body();
    too_long["id"] = json!("X".repeat(17));
    let (status, _) = app.call(Method::POST, "/patients", Some(too_long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = app.call(Method::POST, "/patients", Some(patient_body())).await;
    assert_eq!(created["id"], "000001");
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let app = TestApp::new();
    for _ in 0..3 {
        app.call(Method::POST, "/patients", Some(patient_body())).await;
    }
    let mut other = patient_body();
    other["lastName"] = json!("Suzuki");
    other["lastNameKana"] = json!("スズキ");
    app.call(Method::POST, "/patients", Some(other)).await;

    let (_, page) = app.call(Method::GET, "/patients?page=2&limit=3", None).await;
    assert_eq!(page["totalCount"], 4);
    assert_eq!(page["page"], 2);
    assert_eq!(page["patients"].as_array().unwrap().len(), 1);

    let (_, found) = app.call(Method::GET, "/patients?searchName=suzu", None).await;
    assert_eq!(found["totalCount"], 1);
    assert_eq!(found["patients"][0]["id"], "000004");

    let (_, by_id) = app.call(Method::GET, "/patients?id=000002", None).await;
    assert_eq!(by_id["totalCount"], 1);
    assert_eq!(by_id["patients"][0]["id"], "000002");
}

#[tokio::test]
async fn patch_keeps_identifiers_and_delete_removes() {
    let app = TestApp::new();
    let (_, created) = app.call(Method::POST, "/patients", Some(patient_body())).await;
    let uid = created["uid"].as_str().unwrap().to_string();
    let path = format!("/patients/{uid}");

    let (status, patched) = app
        .call(
            Method::PATCH,
            &path,
            Some(json!({ "city": "港区", "id": "999999", "education": "university" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["success"], true);
    assert_eq!(patched["city"], "港区");
    assert_eq!(patched["education"], "university");
    assert_eq!(patched["id"], "000001");
    assert_eq!(patched["uid"], uid.as_str());

    let (_, fetched) = app.call(Method::GET, &path, None).await;
    assert_eq!(fetched["city"], "港区");

    let (status, _) = app.call(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::GET, &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_open() {
    let app = TestApp::new();
    let (status, body) = app.call_as(None, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}
