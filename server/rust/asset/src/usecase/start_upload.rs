use std::sync::Arc;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::entity::UploadSession;
use crate::domain::repository::ObjectStore;

#[derive(Debug, Clone)]
pub struct StartUploadInput {
    pub owner: String,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StartUploadError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("backing store unavailable: {0}")]
    BackingStoreUnavailable(String),
}

pub struct StartUploadUseCase {
    store: Arc<dyn ObjectStore>,
}

impl StartUploadUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        input: &StartUploadInput,
    ) -> Result<UploadSession, StartUploadError> {
        validate_object_name("filename", &input.filename).map_err(StartUploadError::Validation)?;

        let object_key = generate_storage_key(&input.owner, &input.filename);
        let upload_id = self
            .store
            .create_multipart_upload(&object_key)
            .await
            .map_err(|e| StartUploadError::BackingStoreUnavailable(e.to_string()))?;

        tracing::info!(%object_key, %upload_id, "multipart upload started");

        Ok(UploadSession {
            upload_id,
            object_key,
        })
    }
}
