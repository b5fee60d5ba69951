use async_trait::async_trait;

use crate::domain::entity::AssetRecord;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetTable: Send + Sync {
    /// 同一キーの行があれば上書きする。
    async fn put(&self, record: &AssetRecord) -> anyhow::Result<()>;

    /// `upload_date` のみ更新する。行が無ければ作成される。
    async fn update_upload_date(
        &self,
        user_id: &str,
        document_name: &str,
        upload_date: &str,
    ) -> anyhow::Result<()>;

    async fn delete(&self, user_id: &str, document_name: &str) -> anyhow::Result<()>;

    /// ユーザーの全行を返す。ページングは実装側で辿る。
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<AssetRecord>>;
}
