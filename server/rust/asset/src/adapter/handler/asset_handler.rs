use docvault_auth::CallerIdentity;
use docvault_server_common::ServiceError;
use serde::Deserialize;

use super::event::ApiEvent;
use super::{internal_error, parse_body, HandlerContext};
use crate::usecase::delete_asset::{DeleteAssetError, DeleteAssetInput};
use crate::usecase::list_assets::ListAssetsError;
use crate::usecase::update_asset::{UpdateAssetError, UpdateAssetInput};
use crate::usecase::upload_asset::{UploadAssetError, UploadAssetInput};
use crate::usecase::view_asset::{ViewAssetError, ViewAssetInput};

const SERVICE: &str = "ASSET";

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentNameRequest {
    #[serde(default)]
    pub document_name: Option<String>,
}

fn required_document(req: DocumentRequest) -> Result<(String, String), ServiceError> {
    match (req.document_name, req.document) {
        (Some(name), Some(doc)) if !name.is_empty() && !doc.is_empty() => Ok((name, doc)),
        _ => Err(ServiceError::bad_request(
            SERVICE,
            "document_name and document are required",
        )),
    }
}

/// POST upload_asset
pub async fn upload_asset(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let (document_name, document) = required_document(parse_body(SERVICE, body)?)?;
    let input = UploadAssetInput {
        owner: caller.subject.clone(),
        document_name,
        document,
    };

    match ctx.upload_asset_uc.execute(&input).await {
        Ok(record) => {
            tracing::info!(
                subject = %record.user_id,
                document_name = %record.document_name,
                "document uploaded"
            );
            Ok(serde_json::json!({
                "message": "Document uploaded and metadata stored successfully!"
            }))
        }
        Err(UploadAssetError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(e @ UploadAssetError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST update_asset
pub async fn update_asset(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let (document_name, document) = required_document(parse_body(SERVICE, body)?)?;
    let input = UpdateAssetInput {
        owner: caller.subject.clone(),
        document_name,
        document,
    };

    match ctx.update_asset_uc.execute(&input).await {
        Ok(_) => Ok(serde_json::json!({ "message": "Document updated successfully!" })),
        Err(UpdateAssetError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(e @ UpdateAssetError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST delete_asset
pub async fn delete_asset(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let req: DocumentNameRequest = parse_body(SERVICE, body)?;
    let document_name = req
        .document_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::bad_request(SERVICE, "document_name is required"))?;
    let input = DeleteAssetInput {
        owner: caller.subject.clone(),
        document_name,
    };

    match ctx.delete_asset_uc.execute(&input).await {
        Ok(()) => Ok(serde_json::json!({
            "message": format!("Document {} deleted successfully.", input.document_name)
        })),
        Err(DeleteAssetError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(e @ DeleteAssetError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST list_assets
pub async fn list_assets(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
) -> Result<serde_json::Value, ServiceError> {
    match ctx.list_assets_uc.execute(&caller.subject).await {
        Ok(records) => serde_json::to_value(records).map_err(|e| internal_error(SERVICE, e)),
        Err(e @ ListAssetsError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}

/// POST view_asset
///
/// 名前はクエリ文字列の `documentName` を優先し、無ければボディの `document_name` を使う。
pub async fn view_asset(
    ctx: &HandlerContext,
    caller: &CallerIdentity,
    event: &ApiEvent,
    body: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let document_name = match event.query_param("documentName") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => parse_body::<DocumentNameRequest>(SERVICE, body)?
            .document_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::bad_request(SERVICE, "documentName is required"))?,
    };
    let input = ViewAssetInput {
        owner: caller.subject.clone(),
        document_name,
    };

    match ctx.view_asset_uc.execute(&input).await {
        Ok(output) => serde_json::to_value(output).map_err(|e| internal_error(SERVICE, e)),
        Err(ViewAssetError::Validation(msg)) => Err(ServiceError::bad_request(SERVICE, msg)),
        Err(ViewAssetError::NotFound(_)) => {
            Err(ServiceError::not_found(SERVICE, "Document not found"))
        }
        Err(e @ ViewAssetError::Internal(_)) => Err(internal_error(SERVICE, e)),
    }
}
