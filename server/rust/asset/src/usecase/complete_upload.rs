use std::sync::Arc;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::entity::CompletedPart;
use crate::domain::repository::{ObjectStore, ObjectStoreError};

/// ストアがパート一覧を理由に拒否したときのエラーコード。呼び出し側で修正可能。
const CALLER_CORRECTABLE_CODES: &[&str] = &[
    "InvalidPart",
    "InvalidPartOrder",
    "NoSuchUpload",
    "EntityTooSmall",
    "MalformedXML",
];

#[derive(Debug, Clone)]
pub struct CompleteUploadInput {
    pub owner: String,
    pub filename: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPart>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompleteUploadError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("upload incomplete: {0}")]
    UploadIncomplete(String),

    #[error("backing store unavailable: {0}")]
    BackingStoreUnavailable(String),
}

pub struct CompleteUploadUseCase {
    store: Arc<dyn ObjectStore>,
}

impl CompleteUploadUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// パート一覧はそのままストアに渡す。連番や件数の検証はストアに任せる。
    pub async fn execute(&self, input: &CompleteUploadInput) -> Result<(), CompleteUploadError> {
        validate_object_name("filename", &input.filename)
            .map_err(CompleteUploadError::Validation)?;
        if input.upload_id.is_empty() {
            return Err(CompleteUploadError::Validation(
                "uploadId is required".to_string(),
            ));
        }

        let key = generate_storage_key(&input.owner, &input.filename);
        self.store
            .complete_multipart_upload(&key, &input.upload_id, &input.parts)
            .await
            .map_err(|e| match e {
                ObjectStoreError::Rejected { code, message }
                    if CALLER_CORRECTABLE_CODES.contains(&code.as_str()) =>
                {
                    CompleteUploadError::UploadIncomplete(format!("{code}: {message}"))
                }
                other => CompleteUploadError::BackingStoreUnavailable(other.to_string()),
            })?;

        tracing::info!(
            object_key = %key,
            upload_id = %input.upload_id,
            part_count = input.parts.len(),
            "multipart upload completed"
        );
        Ok(())
    }
}
