use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::entity::{AuthOutcome, AuthenticationResult};
use crate::domain::repository::{IdentityProvider, IdentityProviderError};

#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error("additional challenge required: {0}")]
    ChallengeRequired(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn rejection_message(code: &str) -> &'static str {
    match code {
        "UserNotConfirmedException" => {
            "User account is not confirmed. Please confirm your account before logging in."
        }
        "NotAuthorizedException" => "Incorrect username or password.",
        "PasswordResetRequiredException" => "Password reset is required.",
        "UserNotFoundException" => "User does not exist.",
        _ => "Authentication failed. Please try again.",
    }
}

pub struct LoginUseCase {
    identity: Arc<dyn IdentityProvider>,
}

impl LoginUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, input: &LoginInput) -> Result<AuthenticationResult, LoginError> {
        if input.username.is_empty() || input.password.expose_secret().is_empty() {
            return Err(LoginError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let outcome = self
            .identity
            .authenticate(&input.username, &input.password)
            .await
            .map_err(|e| match e {
                IdentityProviderError::Rejected { code, .. } => {
                    tracing::info!(username = %input.username, code = %code, "login rejected");
                    LoginError::Rejected(rejection_message(&code).to_string())
                }
                IdentityProviderError::Unavailable(msg) => LoginError::Internal(msg),
            })?;

        match outcome {
            AuthOutcome::Authenticated(result) => Ok(result),
            AuthOutcome::ChallengeRequired(name) => Err(LoginError::ChallengeRequired(name)),
        }
    }
}
