use std::env;

use eyre::{WrapErr, bail};
use memora_auth::jwt::{TokenVerifier, cognito_issuer};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    S3,
    Memory,
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bucket: String,
    pub store: StoreBackend,
    pub region: String,
    pub cognito_user_pool_id: String,
    pub jwt_public_key: Option<String>,
    pub jwt_secret: Option<String>,
    /// Reject item edits and judgments on approved results.
    pub lock_approved: bool,
    /// Serve over TCP on this address instead of running as a Lambda.
    pub listen_addr: Option<String>,
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let store = match var("MEMORA_STORE").as_deref() {
            None | Some("s3") => StoreBackend::S3,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("MEMORA_STORE must be `s3` or `memory`, got `{other}`"),
        };

        let lock_approved = match var("MEMORA_LOCK_APPROVED") {
            Some(v) => v
                .parse::<bool>()
                .wrap_err("MEMORA_LOCK_APPROVED must be `true` or `false`")?,
            None => false,
        };

        let max_upload_bytes = match var("MEMORA_MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .wrap_err("MEMORA_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let config = Self {
            bucket: var("MEMORA_BUCKET").unwrap_or_else(|| "memora".to_string()),
            store,
            region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            cognito_user_pool_id: var("COGNITO_USER_POOL_ID")
                .unwrap_or_else(|| "us-east-1_placeholder".to_string()),
            jwt_public_key: var("MEMORA_JWT_PUBLIC_KEY"),
            jwt_secret: var("MEMORA_JWT_SECRET"),
            lock_approved,
            listen_addr: var("MEMORA_LISTEN_ADDR"),
            max_upload_bytes,
        };

        if config.jwt_public_key.is_none() && config.jwt_secret.is_none() {
            bail!("set MEMORA_JWT_PUBLIC_KEY or MEMORA_JWT_SECRET to verify sign-in tokens");
        }

        Ok(config)
    }

    /// The pool public key wins over the development secret.
    pub fn token_verifier(&self) -> eyre::Result<TokenVerifier> {
        if let Some(pem) = &self.jwt_public_key {
            let issuer = cognito_issuer(&self.region, &self.cognito_user_pool_id);
            return TokenVerifier::rs256_pem(pem.as_bytes(), Some(&issuer))
                .wrap_err("MEMORA_JWT_PUBLIC_KEY is not a usable RSA public key");
        }
        match &self.jwt_secret {
            Some(secret) => {
                tracing::warn!("verifying tokens with a shared secret; use only for development");
                Ok(TokenVerifier::hs256(secret.as_bytes(), None))
            }
            None => bail!("no token verification key configured"),
        }
    }
}
