use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::repository::{ObjectStore, ObjectStoreError};

#[derive(Debug, Clone)]
pub struct ViewAssetInput {
    pub owner: String,
    pub document_name: String,
}

/// 本文が UTF-8 として読めればそのまま、読めなければ base64 で返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewAssetOutput {
    pub document_name: String,
    pub content: String,
    pub encoding: ContentEncoding,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewAssetError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ViewAssetUseCase {
    store: Arc<dyn ObjectStore>,
}

impl ViewAssetUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, input: &ViewAssetInput) -> Result<ViewAssetOutput, ViewAssetError> {
        validate_object_name("documentName", &input.document_name)
            .map_err(ViewAssetError::Validation)?;

        let key = generate_storage_key(&input.owner, &input.document_name);
        let bytes = self.store.get_object(&key).await.map_err(|e| match e {
            ObjectStoreError::NotFound(_) => ViewAssetError::NotFound(input.document_name.clone()),
            other => ViewAssetError::Internal(other.to_string()),
        })?;

        let (content, encoding) = match String::from_utf8(bytes) {
            Ok(text) => (text, ContentEncoding::Utf8),
            Err(e) => (STANDARD.encode(e.into_bytes()), ContentEncoding::Base64),
        };

        Ok(ViewAssetOutput {
            document_name: input.document_name.clone(),
            content,
            encoding,
        })
    }
}
