use docvault_server_common::ServiceError;
use secrecy::SecretString;
use serde::Deserialize;

use super::{internal_error, parse_body, HandlerContext};
use crate::usecase::confirm_registration::{ConfirmRegistrationError, ConfirmRegistrationInput};
use crate::usecase::login::{LoginError, LoginInput};
use crate::usecase::register_user::{RegisterUserError, RegisterUserInput};

const SERVICE: &str = "ACCOUNT";

/// パスワードは SecretString で受け取り、Debug 出力でも伏せる。
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRegistrationRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

/// POST register
pub async fn register(
    ctx: &HandlerContext,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: RegisterRequest = parse_body(SERVICE, body)?;
    let input = RegisterUserInput {
        username: req.username.unwrap_or_default(),
        password: req.password.unwrap_or_else(empty_secret),
        email: req.email.unwrap_or_default(),
    };

    match ctx.register_user_uc.execute(&input).await {
        Ok(()) => Ok(serde_json::json!({ "message": "User registration successful!" })),
        Err(RegisterUserError::Validation(msg)) | Err(RegisterUserError::Rejected(msg)) => {
            Err(ServiceError::bad_request(SERVICE, msg))
        }
        Err(e @ RegisterUserError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST confirm_registration
pub async fn confirm_registration(
    ctx: &HandlerContext,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: ConfirmRegistrationRequest = parse_body(SERVICE, body)?;
    let input = ConfirmRegistrationInput {
        username: req.username.unwrap_or_default(),
        confirmation_code: req.confirmation_code.unwrap_or_default(),
    };

    match ctx.confirm_registration_uc.execute(&input).await {
        Ok(()) => Ok(serde_json::json!({
            "message": "User confirmed successfully"
        })),
        Err(ConfirmRegistrationError::Validation(msg))
        | Err(ConfirmRegistrationError::Rejected(msg)) => {
            Err(ServiceError::bad_request(SERVICE, msg))
        }
        Err(e @ ConfirmRegistrationError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST login
pub async fn login(
    ctx: &HandlerContext,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: LoginRequest = parse_body(SERVICE, body)?;
    let input = LoginInput {
        username: req.username.unwrap_or_default(),
        password: req.password.unwrap_or_else(empty_secret),
    };

    match ctx.login_uc.execute(&input).await {
        Ok(result) => serde_json::to_value(result).map_err(|e| internal_error(SERVICE, e)),
        Err(LoginError::Validation(msg)) | Err(LoginError::Rejected(msg)) => {
            Err(ServiceError::bad_request(SERVICE, msg))
        }
        Err(LoginError::ChallengeRequired(challenge)) => {
            tracing::warn!(
                username = %input.username,
                %challenge,
                "login requires a challenge"
            );
            Err(ServiceError::bad_request(
                SERVICE,
                format!("Additional authentication challenge required: {challenge}"),
            ))
        }
        Err(e @ LoginError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}
