use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// AssetRecord はテーブル上のドキュメント行。`(user_id, document_name)` がキー。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub user_id: String,
    pub document_name: String,
    pub upload_date: String,
}

impl AssetRecord {
    pub fn new(user_id: &str, document_name: &str, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            document_name: document_name.to_string(),
            upload_date: format_upload_date(uploaded_at),
        }
    }

    pub fn storage_key(&self) -> String {
        generate_storage_key(&self.user_id, &self.document_name)
    }
}

pub fn format_upload_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// オブジェクトキーは常に検証済み subject でスコープする。
pub fn generate_storage_key(subject: &str, name: &str) -> String {
    format!("{subject}/{name}")
}

/// ドキュメント名・ファイル名の検証。
/// 空文字、先頭の `/`、`..` セグメントは他ユーザーのプレフィックスに届きうるため拒否する。
pub fn validate_object_name(field: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if name.starts_with('/') {
        return Err(format!("{field} must not start with '/'"));
    }
    if name.split('/').any(|segment| segment == "..") {
        return Err(format!("{field} must not contain '..' segments"));
    }
    Ok(())
}
