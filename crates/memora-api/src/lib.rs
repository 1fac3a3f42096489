//! memora-api
//!
//! HTTP API for the Memora console and the test-taking app.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_mw;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Build the full route table.
///
/// Management routes need a verified token and an admin (or not yet
/// registered) caller; `/auth/me` only needs the token; `/health` and
/// `/public/*` are open.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/patients",
            get(routes::patients::list_patients).post(routes::patients::create_patient),
        )
        .route(
            "/patients/{uid}",
            get(routes::patients::get_patient)
                .patch(routes::patients::update_patient)
                .delete(routes::patients::delete_patient),
        )
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/{uid}",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/test-results",
            get(routes::test_results::list_test_results)
                .post(routes::test_results::create_test_result),
        )
        .route(
            "/test-results/{id}",
            get(routes::test_results::get_test_result)
                .patch(routes::test_results::patch_test_result),
        )
        .route(
            "/test-results/{id}/items",
            put(routes::test_results::edit_item),
        )
        .route(
            "/test-results/{id}/judgment",
            post(routes::test_results::judge_item),
        )
        .route(
            "/test-results/{id}/approve",
            post(routes::test_results::approve_test_result),
        )
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    let signed_in = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .merge(admin)
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/public/patients/{id}", get(routes::public::get_patient))
        .route(
            "/public/test-results",
            post(routes::public::submit_test_result),
        )
        .route(
            "/public/upload-audio",
            post(routes::public::upload_audio)
                .layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(signed_in)
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}
