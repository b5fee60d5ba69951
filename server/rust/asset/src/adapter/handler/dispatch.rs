//! イベントの入口。メソッド判定、ルーティング、認証、ボディ解析の順に処理する。

use docvault_auth::{extract_bearer_token, CallerIdentity, VerificationError};
use docvault_server_common::{ErrorCode, ServiceError};
use tracing::Instrument;

use super::event::{respond, respond_message, ApiEvent, ApiResponse};
use super::{account_handler, asset_handler, upload_handler, HandlerContext, Operation};

const AUTH_SERVICE: &str = "AUTH";
const ROUTING_SERVICE: &str = "ROUTING";

/// 1 イベントを処理してレスポンスを返す。エラーもすべてレスポンスに変換する。
pub async fn handle_event(ctx: &HandlerContext, event: ApiEvent) -> ApiResponse {
    let method = event.method().unwrap_or_default();
    let path = event.route_path().unwrap_or_default().to_string();
    let span = tracing::info_span!(
        "handle_event",
        method = %method,
        path = %path,
        operation = tracing::field::Empty
    );

    async move {
        let response = match route(ctx, &method, &event).await {
            Ok(resp) => resp,
            Err(err) => error_response(&err, &ctx.cors_allow_origin),
        };

        if response.status_code >= 500 {
            tracing::error!(status = response.status_code, "request failed");
        } else if response.status_code >= 400 {
            tracing::warn!(status = response.status_code, "request rejected");
        } else {
            tracing::info!(status = response.status_code, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}

async fn route(
    ctx: &HandlerContext,
    method: &str,
    event: &ApiEvent,
) -> Result<ApiResponse, ServiceError> {
    let origin = ctx.cors_allow_origin.as_str();

    // プリフライトは認証もルーティングもせずに返す
    if method == "OPTIONS" {
        return Ok(respond_message(200, "CORS preflight", origin));
    }
    if method != "POST" {
        let shown = if method.is_empty() { "UNKNOWN" } else { method };
        return Err(ServiceError::method_not_allowed(
            ROUTING_SERVICE,
            format!("Method {shown} not allowed"),
        ));
    }

    let operation = ctx
        .pinned_operation
        .or_else(|| event.route_path().and_then(Operation::from_path))
        .ok_or_else(|| ServiceError::not_found(ROUTING_SERVICE, "Route not found"))?;
    tracing::Span::current().record("operation", operation.name());

    let caller = if operation.requires_auth() {
        Some(authenticate(ctx, event).await?)
    } else {
        None
    };

    let body = event.json_body().map_err(|e| {
        tracing::debug!(error = %e, "request body rejected");
        ServiceError::bad_request(ROUTING_SERVICE, "Invalid JSON format")
    })?;

    let payload = match (operation, caller.as_ref()) {
        (Operation::Register, _) => account_handler::register(ctx, body).await?,
        (Operation::ConfirmRegistration, _) => {
            account_handler::confirm_registration(ctx, body).await?
        }
        (Operation::Login, _) => account_handler::login(ctx, body).await?,
        (op, Some(caller)) => dispatch_authenticated(ctx, op, caller, event, body).await?,
        (op, None) => {
            return Err(ServiceError::internal(
                ROUTING_SERVICE,
                format!("operation {op} reached without a caller"),
            ))
        }
    };

    Ok(respond(200, &payload, origin))
}

async fn dispatch_authenticated(
    ctx: &HandlerContext,
    operation: Operation,
    caller: &CallerIdentity,
    event: &ApiEvent,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    tracing::debug!(subject = %caller.subject, operation = %operation, "caller authenticated");
    match operation {
        Operation::UploadAsset => asset_handler::upload_asset(ctx, caller, body).await,
        Operation::UpdateAsset => asset_handler::update_asset(ctx, caller, body).await,
        Operation::DeleteAsset => asset_handler::delete_asset(ctx, caller, body).await,
        Operation::ListAssets => asset_handler::list_assets(ctx, caller).await,
        Operation::ViewAsset => asset_handler::view_asset(ctx, caller, event, body).await,
        Operation::StartUpload => upload_handler::start_upload(ctx, caller, body).await,
        Operation::PresignParts => upload_handler::presign_parts(ctx, caller, body).await,
        Operation::CompleteUpload => upload_handler::complete_upload(ctx, caller, body).await,
        Operation::Register | Operation::ConfirmRegistration | Operation::Login => Err(
            ServiceError::internal(ROUTING_SERVICE, "account operation routed as authenticated"),
        ),
    }
}

async fn authenticate(
    ctx: &HandlerContext,
    event: &ApiEvent,
) -> Result<CallerIdentity, ServiceError> {
    let token = extract_bearer_token(event.header("authorization"))
        .map_err(|e| ServiceError::unauthorized(AUTH_SERVICE, e.to_string()))?;

    ctx.verifier.verify(token).await.map_err(|e| {
        if e.is_server_fault() {
            tracing::error!(error = %e, "signing key set unavailable");
            return ServiceError::internal(AUTH_SERVICE, "Internal server error");
        }

        tracing::warn!(error = %e, "token verification failed");
        let code = match e {
            VerificationError::Expired => "SYS_AUTH_TOKEN_EXPIRED",
            _ => "SYS_AUTH_INVALID_TOKEN",
        };
        ServiceError::Unauthorized {
            code: ErrorCode::new(code),
            message: "Invalid token".to_string(),
        }
    })
}

fn error_response(err: &ServiceError, origin: &str) -> ApiResponse {
    if let ServiceError::Internal { .. } = err {
        tracing::error!(code = %err.code(), error = %err, "internal error");
        let mut body = err.to_error_response();
        body.error.message = "Internal server error".to_string();
        return respond(err.status_code(), &body, origin);
    }
    respond(err.status_code(), &err.to_error_response(), origin)
}
