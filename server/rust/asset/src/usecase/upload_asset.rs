use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::entity::AssetRecord;
use crate::domain::repository::{AssetTable, ObjectStore};

#[derive(Debug, Clone)]
pub struct UploadAssetInput {
    pub owner: String,
    pub document_name: String,
    /// base64 エンコードされた本文
    pub document: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadAssetError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct UploadAssetUseCase {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn AssetTable>,
}

impl UploadAssetUseCase {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn AssetTable>) -> Self {
        Self { store, table }
    }

    pub async fn execute(&self, input: &UploadAssetInput) -> Result<AssetRecord, UploadAssetError> {
        validate_object_name("document_name", &input.document_name)
            .map_err(UploadAssetError::Validation)?;
        let body = decode_document(&input.document).map_err(UploadAssetError::Validation)?;

        let key = generate_storage_key(&input.owner, &input.document_name);
        self.store
            .put_object(&key, body)
            .await
            .map_err(|e| UploadAssetError::Internal(e.to_string()))?;

        let record = AssetRecord::new(&input.owner, &input.document_name, Utc::now());
        self.table
            .put(&record)
            .await
            .map_err(|e| UploadAssetError::Internal(e.to_string()))?;

        Ok(record)
    }
}

/// base64 本文をデコードする。改行や空白は読み飛ばす。
pub(crate) fn decode_document(document: &str) -> Result<Vec<u8>, String> {
    let compact: String = document.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| format!("document is not valid base64: {e}"))
}
