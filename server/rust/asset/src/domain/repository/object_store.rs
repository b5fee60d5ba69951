use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entity::CompletedPart;

/// ObjectStoreError はオブジェクトストア呼び出しの失敗。
/// `Rejected` は呼び出し元の入力に起因する拒否で、`code` にストアのエラーコードを持つ。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object store rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// マルチパートアップロードを開始し、upload id を返す。
    async fn create_multipart_upload(&self, key: &str) -> Result<String, ObjectStoreError>;

    /// `(upload_id, key, part_number)` に限定した署名付き PUT URL を生成する。
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError>;

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), ObjectStoreError>;
}
