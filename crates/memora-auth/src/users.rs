use std::future::Future;
use std::pin::Pin;

use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, DeliveryMediumType};
use tracing::info;

use crate::error::AuthError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A sign-in account to create for a new staff member.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    /// Temporary password; the pool generates and mails one when absent.
    pub password: Option<String>,
}

/// Where staff sign-in accounts live.
pub trait IdentityProvider: Send + Sync {
    /// Create the account and return its subject.
    fn create_account<'a>(
        &'a self,
        account: &'a NewAccount,
    ) -> BoxFuture<'a, Result<String, AuthError>>;
}

/// Cognito user pool directory.
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
}

impl CognitoDirectory {
    pub fn new(client: Client, user_pool_id: impl Into<String>) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
        }
    }

    async fn admin_create(&self, account: &NewAccount) -> Result<String, AuthError> {
        info!(email = %account.email, "creating staff account");

        let attributes = [
            ("email", account.email.as_str()),
            ("email_verified", "true"),
            ("name", account.display_name.as_str()),
        ]
        .into_iter()
        .map(|(name, value)| {
            AttributeType::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| AuthError::Cognito(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

        let resp = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(&account.email)
            .set_user_attributes(Some(attributes))
            .set_temporary_password(account.password.clone())
            .desired_delivery_mediums(DeliveryMediumType::Email)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_username_exists_exception() {
                    AuthError::AccountExists(account.email.clone())
                } else {
                    AuthError::Cognito(err.to_string())
                }
            })?;

        resp.user()
            .and_then(|user| {
                user.attributes()
                    .iter()
                    .find(|attr| attr.name() == "sub")
                    .and_then(|attr| attr.value())
            })
            .map(str::to_string)
            .ok_or_else(|| AuthError::Cognito("created user has no sub attribute".to_string()))
    }
}

impl IdentityProvider for CognitoDirectory {
    fn create_account<'a>(
        &'a self,
        account: &'a NewAccount,
    ) -> BoxFuture<'a, Result<String, AuthError>> {
        Box::pin(self.admin_create(account))
    }
}
