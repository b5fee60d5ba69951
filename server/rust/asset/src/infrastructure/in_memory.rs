//! ローカル開発用のインメモリ実装（STORAGE_BACKEND=memory）。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::{AssetRecord, CompletedPart};
use crate::domain::repository::{AssetTable, ObjectStore, ObjectStoreError};

struct PendingUpload {
    key: String,
    parts: HashMap<i32, (String, Vec<u8>)>,
}

/// ローカルサーバーがパートの PUT を受け付けるパス。
pub const LOCAL_PART_PATH: &str = "/_local/parts";

/// オブジェクトとマルチパートセッションをメモリ上に保持する。
/// 完了時の検証はオブジェクトストアと同じエラーコードを返す。
///
/// `part_endpoint` を設定すると、パート用 URL はローカルサーバーの
/// `PUT {part_endpoint}/_local/parts/{upload_id}/{part_number}` を指す。
/// 未設定の場合は `memory://` URL を返し、パートは [`Self::upload_part`] で直接投入する。
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    uploads: RwLock<HashMap<String, PendingUpload>>,
    next_upload: AtomicU64,
    part_endpoint: Option<String>,
}

fn rejected(code: &str, message: &str) -> ObjectStoreError {
    ObjectStoreError::Rejected {
        code: code.to_string(),
        message: message.to_string(),
    }
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// パート用 URL の送り先となるローカルサーバーのベース URL を設定する。
    pub fn with_part_endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.part_endpoint = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// 署名付き URL への PUT に相当する。返り値は ETag。
    pub async fn upload_part(
        &self,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<String, ObjectStoreError> {
        let mut uploads = self.uploads.write().await;
        let pending = uploads
            .get_mut(upload_id)
            .ok_or_else(|| rejected("NoSuchUpload", "upload does not exist"))?;
        let etag = format!("\"{part_number}-{}\"", body.len());
        pending.parts.insert(part_number, (etag.clone(), body));
        Ok(etag)
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<String, ObjectStoreError> {
        let upload_id = format!("mem-upload-{}", self.next_upload.fetch_add(1, Ordering::SeqCst));
        self.uploads.write().await.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let expires = expires_in.as_secs();
        Ok(match &self.part_endpoint {
            Some(base) => {
                format!("{base}{LOCAL_PART_PATH}/{upload_id}/{part_number}?expires={expires}")
            }
            None => format!(
                "memory://{key}?uploadId={upload_id}&partNumber={part_number}&expires={expires}"
            ),
        })
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), ObjectStoreError> {
        let mut uploads = self.uploads.write().await;
        let pending = match uploads.get(upload_id) {
            Some(p) if p.key == key => p,
            _ => return Err(rejected("NoSuchUpload", "upload does not exist")),
        };
        if parts.is_empty() {
            return Err(rejected("MalformedXML", "at least one part is required"));
        }
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(rejected("InvalidPartOrder", "parts must be in ascending order"));
        }

        let mut body = Vec::new();
        for part in parts {
            match pending.parts.get(&part.part_number) {
                Some((etag, data)) if *etag == part.etag => body.extend_from_slice(data),
                _ => return Err(rejected("InvalidPart", "part or etag not found")),
            }
        }

        uploads.remove(upload_id);
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAssetTable {
    rows: RwLock<BTreeMap<(String, String), AssetRecord>>,
}

impl InMemoryAssetTable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetTable for InMemoryAssetTable {
    async fn put(&self, record: &AssetRecord) -> anyhow::Result<()> {
        self.rows.write().await.insert(
            (record.user_id.clone(), record.document_name.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn update_upload_date(
        &self,
        user_id: &str,
        document_name: &str,
        upload_date: &str,
    ) -> anyhow::Result<()> {
        let mut rows = self.rows.write().await;
        rows.entry((user_id.to_string(), document_name.to_string()))
            .and_modify(|r| r.upload_date = upload_date.to_string())
            .or_insert_with(|| AssetRecord {
                user_id: user_id.to_string(),
                document_name: document_name.to_string(),
                upload_date: upload_date.to_string(),
            });
        Ok(())
    }

    async fn delete(&self, user_id: &str, document_name: &str) -> anyhow::Result<()> {
        self.rows
            .write()
            .await
            .remove(&(user_id.to_string(), document_name.to_string()));
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<AssetRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
