use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 署名付きパート URL の有効期間。
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// オブジェクトストアが許容するパート数の上限。
pub const MAX_PARTS: u32 = 10_000;

/// UploadSession はマルチパートアップロードの識別子。
/// サーバー側では保持せず、呼び出し元がステップ間で持ち回る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    pub object_key: String,
}

/// 完了済みパート。クライアントが受け取った ETag をそのまま返送する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}
