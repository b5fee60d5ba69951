use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::entity::AuthOutcome;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityProviderError {
    /// プロバイダが要求を拒否した。`code` は `UserNotFoundException` などの例外名。
    #[error("identity provider rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        email: &str,
    ) -> Result<(), IdentityProviderError>;

    async fn confirm_sign_up(
        &self,
        username: &str,
        confirmation_code: &str,
    ) -> Result<(), IdentityProviderError>;

    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthOutcome, IdentityProviderError>;
}
