use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::asset::{format_upload_date, generate_storage_key, validate_object_name};
use crate::domain::repository::{AssetTable, ObjectStore};
use crate::usecase::upload_asset::decode_document;

#[derive(Debug, Clone)]
pub struct UpdateAssetInput {
    pub owner: String,
    pub document_name: String,
    pub document: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateAssetError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct UpdateAssetUseCase {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn AssetTable>,
}

impl UpdateAssetUseCase {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn AssetTable>) -> Self {
        Self { store, table }
    }

    /// 本文を置き換え、`upload_date` を更新する。更新後の日時を返す。
    pub async fn execute(&self, input: &UpdateAssetInput) -> Result<String, UpdateAssetError> {
        validate_object_name("document_name", &input.document_name)
            .map_err(UpdateAssetError::Validation)?;
        let body = decode_document(&input.document).map_err(UpdateAssetError::Validation)?;

        let key = generate_storage_key(&input.owner, &input.document_name);
        self.store
            .put_object(&key, body)
            .await
            .map_err(|e| UpdateAssetError::Internal(e.to_string()))?;

        let upload_date = format_upload_date(Utc::now());
        self.table
            .update_upload_date(&input.owner, &input.document_name, &upload_date)
            .await
            .map_err(|e| UpdateAssetError::Internal(e.to_string()))?;

        Ok(upload_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::asset_table::MockAssetTable;
    use crate::domain::repository::object_store::MockObjectStore;

    fn valid_input() -> UpdateAssetInput {
        UpdateAssetInput {
            owner: "u1".to_string(),
            document_name: "notes.md".to_string(),
            document: "IyB2Mg==".to_string(),
        }
    }

    #[tokio::test]
    async fn success() {
        let mut store = MockObjectStore::new();
        let mut table = MockAssetTable::new();

        store
            .expect_put_object()
            .withf(|key, body| key == "u1/notes.md" && body == b"# v2")
            .returning(|_, _| Ok(()));
        table
            .expect_update_upload_date()
            .withf(|user, name, _| user == "u1" && name == "notes.md")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let uc = UpdateAssetUseCase::new(Arc::new(store), Arc::new(table));
        let date = uc.execute(&valid_input()).await.unwrap();
        assert!(date.ends_with('Z'));
    }

    #[tokio::test]
    async fn table_failure() {
        let mut store = MockObjectStore::new();
        let mut table = MockAssetTable::new();

        store.expect_put_object().returning(|_, _| Ok(()));
        table
            .expect_update_upload_date()
            .returning(|_, _, _| Err(anyhow::anyhow!("throughput exceeded")));

        let uc = UpdateAssetUseCase::new(Arc::new(store), Arc::new(table));
        match uc.execute(&valid_input()).await.unwrap_err() {
            UpdateAssetError::Internal(msg) => assert!(msg.contains("throughput")),
            e => unreachable!("unexpected error in test: {:?}", e),
        }
    }

    #[tokio::test]
    async fn empty_name() {
        let uc = UpdateAssetUseCase::new(
            Arc::new(MockObjectStore::new()),
            Arc::new(MockAssetTable::new()),
        );
        let mut input = valid_input();
        input.document_name = String::new();

        let result = uc.execute(&input).await;
        assert!(matches!(result, Err(UpdateAssetError::Validation(_))));
    }
}
