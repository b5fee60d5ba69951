use std::sync::Arc;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::repository::{AssetTable, ObjectStore, ObjectStoreError};

#[derive(Debug, Clone)]
pub struct DeleteAssetInput {
    pub owner: String,
    pub document_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteAssetError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct DeleteAssetUseCase {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn AssetTable>,
}

impl DeleteAssetUseCase {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn AssetTable>) -> Self {
        Self { store, table }
    }

    pub async fn execute(&self, input: &DeleteAssetInput) -> Result<(), DeleteAssetError> {
        validate_object_name("document_name", &input.document_name)
            .map_err(DeleteAssetError::Validation)?;

        let key = generate_storage_key(&input.owner, &input.document_name);
        match self.store.delete_object(&key).await {
            // 削除は冪等
            Ok(()) | Err(ObjectStoreError::NotFound(_)) => {}
            Err(e) => return Err(DeleteAssetError::Internal(e.to_string())),
        }

        self.table
            .delete(&input.owner, &input.document_name)
            .await
            .map_err(|e| DeleteAssetError::Internal(e.to_string()))
    }
}
