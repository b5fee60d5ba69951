use std::sync::Arc;

use crate::domain::repository::{IdentityProvider, IdentityProviderError};

#[derive(Debug, Clone)]
pub struct ConfirmRegistrationInput {
    pub username: String,
    pub confirmation_code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmRegistrationError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn rejection_message(code: &str) -> &'static str {
    match code {
        "CodeMismatchException" => "Invalid confirmation code.",
        "ExpiredCodeException" => "The confirmation code has expired.",
        "NotAuthorizedException" => "User already confirmed.",
        "UserNotFoundException" => "User does not exist.",
        _ => "Confirmation failed. Please try again.",
    }
}

pub struct ConfirmRegistrationUseCase {
    identity: Arc<dyn IdentityProvider>,
}

impl ConfirmRegistrationUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub async fn execute(
        &self,
        input: &ConfirmRegistrationInput,
    ) -> Result<(), ConfirmRegistrationError> {
        if input.username.is_empty() || input.confirmation_code.is_empty() {
            return Err(ConfirmRegistrationError::Validation(
                "username and confirmation_code are required".to_string(),
            ));
        }

        self.identity
            .confirm_sign_up(&input.username, &input.confirmation_code)
            .await
            .map_err(|e| match e {
                IdentityProviderError::Rejected { code, .. } => {
                    ConfirmRegistrationError::Rejected(rejection_message(&code).to_string())
                }
                IdentityProviderError::Unavailable(msg) => ConfirmRegistrationError::Internal(msg),
            })
    }
}
