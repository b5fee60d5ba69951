use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::entity::{AuthOutcome, AuthenticationResult};
use crate::domain::repository::{IdentityProvider, IdentityProviderError};
use crate::infrastructure::aws_error::{classify, AwsFailure};

/// Cognito ユーザープールのクライアント側 API。
pub struct CognitoIdentityProvider {
    client: aws_sdk_cognitoidentityprovider::Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoIdentityProvider {
    pub fn new(
        sdk_config: &aws_config::SdkConfig,
        user_pool_id: String,
        client_id: String,
    ) -> Self {
        Self {
            client: aws_sdk_cognitoidentityprovider::Client::new(sdk_config),
            user_pool_id,
            client_id,
        }
    }
}

impl From<AwsFailure> for IdentityProviderError {
    fn from(failure: AwsFailure) -> Self {
        match failure {
            AwsFailure::Service { code, message } => {
                IdentityProviderError::Rejected { code, message }
            }
            AwsFailure::Transport(msg) => IdentityProviderError::Unavailable(msg),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        email: &str,
    ) -> Result<(), IdentityProviderError> {
        let email_attr = AttributeType::builder()
            .name("email")
            .value(email)
            .build()
            .map_err(|e| IdentityProviderError::Unavailable(e.to_string()))?;

        self.client
            .sign_up()
            .client_id(&self.client_id)
            .username(username)
            .password(password.expose_secret())
            .user_attributes(email_attr)
            .send()
            .await
            .map_err(|e| IdentityProviderError::from(classify(e)))?;
        Ok(())
    }

    async fn confirm_sign_up(
        &self,
        username: &str,
        confirmation_code: &str,
    ) -> Result<(), IdentityProviderError> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(confirmation_code)
            .send()
            .await
            .map_err(|e| IdentityProviderError::from(classify(e)))?;
        Ok(())
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        let resp = self
            .client
            .admin_initiate_auth()
            .user_pool_id(&self.user_pool_id)
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::AdminNoSrpAuth)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password.expose_secret())
            .send()
            .await
            .map_err(|e| IdentityProviderError::from(classify(e)))?;

        if let Some(result) = resp.authentication_result() {
            return Ok(AuthOutcome::Authenticated(AuthenticationResult {
                access_token: result.access_token().map(str::to_string),
                id_token: result.id_token().map(str::to_string),
                refresh_token: result.refresh_token().map(str::to_string),
                expires_in: result.expires_in(),
                token_type: result.token_type().map(str::to_string),
            }));
        }

        let challenge = resp
            .challenge_name()
            .map_or_else(|| "UNKNOWN".to_string(), |c| c.as_str().to_string());
        Ok(AuthOutcome::ChallengeRequired(challenge))
    }
}
