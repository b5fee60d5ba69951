use std::sync::Arc;

use futures::future::try_join_all;

use crate::domain::entity::asset::{generate_storage_key, validate_object_name};
use crate::domain::entity::upload::{MAX_PARTS, PRESIGN_EXPIRY};
use crate::domain::repository::ObjectStore;

#[derive(Debug, Clone)]
pub struct PresignPartsInput {
    pub owner: String,
    pub filename: String,
    pub upload_id: String,
    pub part_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum PresignPartsError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("backing store unavailable: {0}")]
    BackingStoreUnavailable(String),
}

pub struct PresignPartsUseCase {
    store: Arc<dyn ObjectStore>,
}

impl PresignPartsUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// パート番号 1..=part_count の署名付き URL を昇順で返す。
    /// 一つでも失敗すれば全体を失敗とし、部分的な結果は返さない。
    pub async fn execute(
        &self,
        input: &PresignPartsInput,
    ) -> Result<Vec<String>, PresignPartsError> {
        validate_object_name("filename", &input.filename).map_err(PresignPartsError::Validation)?;
        if input.upload_id.is_empty() {
            return Err(PresignPartsError::Validation(
                "uploadId is required".to_string(),
            ));
        }
        if input.part_count > MAX_PARTS {
            return Err(PresignPartsError::Validation(format!(
                "parts must not exceed {MAX_PARTS}"
            )));
        }

        let key = generate_storage_key(&input.owner, &input.filename);
        let key = key.as_str();
        let upload_id = input.upload_id.as_str();

        // MAX_PARTS 以下なので i32 に収まる
        let requests = (1..=input.part_count).map(|n| {
            let part_number = i32::try_from(n).unwrap_or(i32::MAX);
            self.store
                .presign_upload_part(key, upload_id, part_number, PRESIGN_EXPIRY)
        });

        try_join_all(requests)
            .await
            .map_err(|e| PresignPartsError::BackingStoreUnavailable(e.to_string()))
    }
}
