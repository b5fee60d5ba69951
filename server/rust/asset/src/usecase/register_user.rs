use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::repository::{IdentityProvider, IdentityProviderError};

#[derive(Debug)]
pub struct RegisterUserInput {
    pub username: String,
    pub password: SecretString,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterUserError {
    #[error("validation error: {0}")]
    Validation(String),

    /// プロバイダのメッセージ（パスワードポリシー違反など）をそのまま返す。
    #[error("{0}")]
    Rejected(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct RegisterUserUseCase {
    identity: Arc<dyn IdentityProvider>,
}

impl RegisterUserUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, input: &RegisterUserInput) -> Result<(), RegisterUserError> {
        if input.username.is_empty() {
            return Err(RegisterUserError::Validation("username is required".to_string()));
        }
        if input.password.expose_secret().is_empty() {
            return Err(RegisterUserError::Validation("password is required".to_string()));
        }
        if input.email.is_empty() {
            return Err(RegisterUserError::Validation("email is required".to_string()));
        }

        self.identity
            .sign_up(&input.username, &input.password, &input.email)
            .await
            .map_err(|e| match e {
                IdentityProviderError::Rejected { message, .. } => {
                    RegisterUserError::Rejected(message)
                }
                IdentityProviderError::Unavailable(msg) => RegisterUserError::Internal(msg),
            })?;

        tracing::info!(username = %input.username, "user registered");
        Ok(())
    }
}
