use std::sync::Arc;

use memora_auth::jwt::TokenVerifier;
use memora_auth::users::IdentityProvider;
use memora_storage::store::ObjectStore;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub verifier: Arc<TokenVerifier>,
    pub identity: Arc<dyn IdentityProvider>,
    pub lock_approved: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }
}
