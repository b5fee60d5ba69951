use async_trait::async_trait;
use docvault_auth::{CallerIdentity, JwksVerifier, VerificationError};

/// TokenVerifier は Bearer トークン検証を抽象化するトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerificationError>;
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerificationError> {
        JwksVerifier::verify(self, token).await
    }
}
