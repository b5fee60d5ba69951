use std::sync::Arc;

use crate::domain::entity::AssetRecord;
use crate::domain::repository::AssetTable;

#[derive(Debug, thiserror::Error)]
pub enum ListAssetsError {
    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ListAssetsUseCase {
    table: Arc<dyn AssetTable>,
}

impl ListAssetsUseCase {
    pub fn new(table: Arc<dyn AssetTable>) -> Self {
        Self { table }
    }

    pub async fn execute(&self, owner: &str) -> Result<Vec<AssetRecord>, ListAssetsError> {
        self.table
            .find_by_user(owner)
            .await
            .map_err(|e| ListAssetsError::Internal(e.to_string()))
    }
}
