//! マルチパートアップロードの 3 ステップ。セッション状態は呼び出し元が持ち回る。

use docvault_auth::CallerIdentity;
use docvault_server_common::{ErrorDetail, ServiceError};
use serde::Deserialize;

use super::{internal_error, parse_body, HandlerContext};
use crate::domain::entity::CompletedPart;
use crate::usecase::complete_upload::{CompleteUploadError, CompleteUploadInput};
use crate::usecase::presign_parts::{PresignPartsError, PresignPartsInput};
use crate::usecase::start_upload::{StartUploadError, StartUploadInput};

const SERVICE: &str = "UPLOAD";

#[derive(Debug, Deserialize)]
pub struct StartUploadRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignPartsRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// 数値でも数値文字列でも受け付ける
    #[serde(default)]
    pub parts: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<CompletedPart>>,
}

fn parse_part_count(value: &serde_json::Value) -> Result<u32, ServiceError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ServiceError::bad_request_with_details(
                SERVICE,
                "parts must be a non-negative integer",
                vec![ErrorDetail::new("parts", "invalid", value.to_string())],
            )
        })
}

/// POST multipart_start_upload
pub async fn start_upload(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: StartUploadRequest = parse_body(SERVICE, body)?;
    let filename = req
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ServiceError::bad_request(SERVICE, "Filename is required"))?;
    let input = StartUploadInput {
        owner: caller.subject.clone(),
        filename,
    };

    match ctx.start_upload_uc.execute(&input).await {
        Ok(session) => Ok(serde_json::json!({ "uploadId": session.upload_id })),
        Err(StartUploadError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(e @ StartUploadError::BackingStoreUnavailable(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST multipart_generate_presigned_urls
pub async fn presign_parts(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: PresignPartsRequest = parse_body(SERVICE, body)?;
    let (upload_id, filename, parts) = match (req.upload_id, req.filename, req.parts) {
        (Some(u), Some(f), Some(p)) if !u.is_empty() && !f.is_empty() && !p.is_null() => (u, f, p),
        _ => {
            return Err(ServiceError::bad_request(
                SERVICE,
                "uploadId, filename, and parts are required",
            ))
        }
    };
    let input = PresignPartsInput {
        owner: caller.subject.clone(),
        filename,
        upload_id,
        part_count: parse_part_count(&parts)?,
    };

    match ctx.presign_parts_uc.execute(&input).await {
        Ok(urls) => Ok(serde_json::json!({ "partUrls": urls })),
        Err(PresignPartsError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(e @ PresignPartsError::BackingStoreUnavailable(_)) => {
            Err(internal_error(SERVICE, e))
        }
    }
}

/// POST multipart_complete_upload
pub async fn complete_upload(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: CompleteUploadRequest = parse_body(SERVICE, body)?;

    let mut missing = Vec::new();
    if req.upload_id.as_deref().map_or(true, str::is_empty) {
        missing.push(ErrorDetail::new("uploadId", "required", "uploadId is required"));
    }
    if req.filename.as_deref().map_or(true, str::is_empty) {
        missing.push(ErrorDetail::new("filename", "required", "filename is required"));
    }
    if req.parts.is_none() {
        missing.push(ErrorDetail::new("parts", "required", "parts is required"));
    }
    if !missing.is_empty() {
        return Err(ServiceError::bad_request_with_details(
            SERVICE,
            "uploadId, filename, and parts are required",
            missing,
        ));
    }

    let input = CompleteUploadInput {
        owner: caller.subject.clone(),
        filename: req.filename.unwrap_or_default(),
        upload_id: req.upload_id.unwrap_or_default(),
        parts: req.parts.unwrap_or_default(),
    };

    match ctx.complete_upload_uc.execute(&input).await {
        Ok(()) => Ok(serde_json::json!({
            "message": "Multipart upload completed successfully"
        })),
        Err(CompleteUploadError::Validation(msg))
        | Err(CompleteUploadError::UploadIncomplete(msg)) => {
            Err(ServiceError::bad_request(SERVICE, msg))
        }
        Err(e @ CompleteUploadError::BackingStoreUnavailable(_)) => {
            Err(internal_error(SERVICE, e))
        }
    }
}
