//! 環境変数から読み込む実行時設定。起動時に一度だけ構築する。

use docvault_auth::{cognito_issuer, jwks_url_for};
use docvault_server_common::TelemetryConfig;

pub const ENV_BUCKET_NAME: &str = "DIGITAL_ASSETS_BUCKET_NAME";
pub const ENV_TABLE_NAME: &str = "DYNAMODB_TABLE_NAME";
pub const ENV_USER_POOL_ID: &str = "COGNITO_USER_POOL_ID";
pub const ENV_USER_POOL_CLIENT_ID: &str = "COGNITO_USER_POOL_CLIENT_ID";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_LOGGING_LEVEL: &str = "LOGGING_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_CORS_ALLOW_ORIGIN: &str = "CORS_ALLOW_ORIGIN";
pub const ENV_HANDLER_OPERATION: &str = "HANDLER_OPERATION";
pub const ENV_STORAGE_BACKEND: &str = "STORAGE_BACKEND";
pub const ENV_LOCAL_PORT: &str = "LOCAL_PORT";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

/// ストレージの実装切り替え。`memory` はローカル開発用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Aws,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bucket_name: String,
    pub table_name: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    pub region: String,
    pub log_level: String,
    /// `text` 以外は JSON で出力する
    pub log_format: String,
    pub cors_allow_origin: String,
    /// 1 関数 1 操作でデプロイする場合の固定操作名
    pub handler_operation: Option<String>,
    pub storage_backend: StorageBackend,
    pub local_port: u16,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// 設定の読み込み前、または読み込みに失敗したときのログ設定。
pub fn default_telemetry_config(service_name: &str) -> TelemetryConfig {
    TelemetryConfig {
        service_name: service_name.to_string(),
        log_level: default_log_level(),
        log_format: default_log_format(),
    }
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

fn default_local_port() -> u16 {
    8080
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を構築する。
    /// 必須値の欠落はまとめて一つのエラーで報告する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut require = |name: &str| {
            get(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                String::new()
            })
        };

        let bucket_name = require(ENV_BUCKET_NAME);
        let table_name = require(ENV_TABLE_NAME);
        let user_pool_id = require(ENV_USER_POOL_ID);
        let user_pool_client_id = require(ENV_USER_POOL_CLIENT_ID);
        let region = require(ENV_REGION);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let storage_backend = match get(ENV_STORAGE_BACKEND).as_deref() {
            None | Some("aws") => StorageBackend::Aws,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: ENV_STORAGE_BACKEND.to_string(),
                    value: other.to_string(),
                })
            }
        };

        let local_port = match get(ENV_LOCAL_PORT) {
            None => default_local_port(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: ENV_LOCAL_PORT.to_string(),
                value: raw.clone(),
            })?,
        };

        Ok(Self {
            bucket_name,
            table_name,
            user_pool_id,
            user_pool_client_id,
            region,
            log_level: get(ENV_LOGGING_LEVEL).unwrap_or_else(default_log_level),
            log_format: get(ENV_LOG_FORMAT).unwrap_or_else(default_log_format),
            cors_allow_origin: get(ENV_CORS_ALLOW_ORIGIN)
                .unwrap_or_else(default_cors_allow_origin),
            handler_operation: get(ENV_HANDLER_OPERATION),
            storage_backend,
            local_port,
        })
    }

    pub fn issuer(&self) -> String {
        cognito_issuer(&self.region, &self.user_pool_id)
    }

    pub fn jwks_url(&self) -> String {
        jwks_url_for(&self.issuer())
    }

    pub fn telemetry_config(&self, service_name: &str) -> TelemetryConfig {
        TelemetryConfig {
            service_name: service_name.to_string(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
        }
    }
}
