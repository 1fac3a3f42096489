#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use memora_api::state::AppState;
use memora_auth::error::AuthError;
use memora_auth::jwt::{Claims, TokenVerifier};
use memora_auth::users::{BoxFuture, IdentityProvider, NewAccount};
use memora_core::keys;
use memora_core::models::test_result::TestResult;
use memora_core::models::user::{Role, StaffUser};
use memora_storage::memory::MemoryObjectStore;
use memora_storage::records;
use memora_storage::store::ObjectStore;
use memora_storage::test_results;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &[u8] = b"memora-test-secret";
pub const ADMIN: &str = "admin-sub";

/// Hands out `sub-1`, `sub-2`, ... and refuses a known duplicate email.
#[derive(Default)]
pub struct FakeDirectory {
    next: AtomicU64,
}

impl IdentityProvider for FakeDirectory {
    fn create_account<'a>(
        &'a self,
        account: &'a NewAccount,
    ) -> BoxFuture<'a, Result<String, AuthError>> {
        let result = if account.email == "taken@example.com" {
            Err(AuthError::AccountExists(account.email.clone()))
        } else {
            Ok(format!("sub-{}", self.next.fetch_add(1, Ordering::Relaxed) + 1))
        };
        Box::pin(async move { result })
    }
}

pub struct TestApp {
    pub store: Arc<MemoryObjectStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_approved_lock() -> Self {
        Self::build(true)
    }

    fn build(lock_approved: bool) -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        let state = AppState {
            store: store.clone() as Arc<dyn ObjectStore>,
            verifier: Arc::new(TokenVerifier::hs256(SECRET, None)),
            identity: Arc::new(FakeDirectory::default()),
            lock_approved,
            max_upload_bytes: 1024 * 1024,
        };
        Self {
            store,
            router: memora_api::router(state),
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// JSON request as the admin caller.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call_as(Some(ADMIN), method, uri, body).await
    }

    pub async fn call_as(
        &self,
        sub: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(sub) = sub {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token(sub)));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn seed_staff(&self, uid: &str, role: Role) {
        let now = jiff::Timestamp::now();
        let user = StaffUser {
            uid: uid.to_string(),
            id: "000099".to_string(),
            last_name: "Sato".to_string(),
            first_name: "Hana".to_string(),
            email: format!("{uid}@example.com"),
            role,
            hospital_name: None,
            created_at: now,
            updated_at: now,
        };
        records::create(self.store.as_ref(), &keys::user(uid), &user)
            .await
            .unwrap();
    }

    pub async fn seed_result(&self, patient_id: &str, approved: bool) -> Uuid {
        let id = Uuid::new_v4();
        let result: TestResult = serde_json::from_value(json!({
            "uid": id,
            "patientId": patient_id,
            "result": session_items(),
            "score": 1,
            "approved": approved,
            "duration": "00:01:45",
            "created_at": "2026-03-02T08:00:00Z",
            "updated_at": "2026-03-02T08:00:00Z",
        }))
        .unwrap();
        test_results::create(self.store.as_ref(), &result).await.unwrap();
        id
    }
}

pub fn token(sub: &str) -> String {
    let now = jiff::Timestamp::now().as_second() as u64;
    let claims = Claims {
        sub: sub.to_string(),
        iss: None,
        token_use: "id".to_string(),
        exp: now + 3600,
        iat: Some(now),
        email: Some(format!("{sub}@example.com")),
        name: Some("Test Staff".to_string()),
        username: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

/// Item `a` correct for one point in 30s, item `b` incorrect in 1m15s.
pub fn session_items() -> Value {
    json!([
        { "taskKey": "a", "questionKey": "1", "isCorrect": true, "score": 1, "durationStr": "00:30" },
        { "taskKey": "b", "questionKey": "1", "isCorrect": false, "score": 0, "durationStr": "01:15" },
    ])
}

pub fn patient_body() -> Value {
    json!({
        "lastName": "山田",
        "firstName": "太郎",
        "lastNameKana": "ヤマダ",
        "firstNameKana": "タロウ",
        "gender": "male",
        "birthYear": "1948",
        "birthMonth": "4",
        "birthDay": "12",
        "zip": "100-0001",
        "prefecture": "東京都",
        "city": "千代田区",
        "address1": "1-1",
    })
}
