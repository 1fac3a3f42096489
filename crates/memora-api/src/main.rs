use std::sync::Arc;

use memora_api::config::{ApiConfig, StoreBackend};
use memora_api::state::AppState;
use memora_auth::users::CognitoDirectory;
use memora_storage::memory::MemoryObjectStore;
use memora_storage::store::{ObjectStore, S3ObjectStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ApiConfig::from_env()?;
    let verifier = config.token_verifier()?;

    let store: Arc<dyn ObjectStore> = match config.store {
        StoreBackend::S3 => {
            let s3 = memora_storage::client::build_client_with_region(&config.region).await;
            Arc::new(S3ObjectStore::new(s3, config.bucket.clone()))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; records are lost on exit");
            Arc::new(MemoryObjectStore::new())
        }
    };

    let cognito = memora_auth::client::build_client_with_region(&config.region).await;
    let identity = Arc::new(CognitoDirectory::new(
        cognito,
        config.cognito_user_pool_id.clone(),
    ));

    let state = AppState {
        store,
        verifier: Arc::new(verifier),
        identity,
        lock_approved: config.lock_approved,
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = memora_api::router(state);

    match &config.listen_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(addr = %addr, "serving over TCP");
            axum::serve(listener, app).await?;
            Ok(())
        }
        None => lambda_http::run(app).await.map_err(|e| eyre::eyre!(e)),
    }
}
