//! JWKS 鍵セットの取得とキャッシュ。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::verifier::VerificationError;

/// JWKS 取得の HTTP タイムアウト。
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS レスポンスの構造体。
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<RawJwk>,
}

/// 個々の JWK 鍵（未対応の kty を含む可能性がある）。
#[derive(Debug, Deserialize)]
struct RawJwk {
    #[serde(default)]
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

impl RawJwk {
    fn into_key(self) -> Option<JwkKey> {
        let kid = self.kid?;
        let material = match self.kty.as_str() {
            "RSA" => KeyMaterial::Rsa {
                n: self.n?,
                e: self.e?,
            },
            "EC" => KeyMaterial::Ec {
                x: self.x?,
                y: self.y?,
            },
            "OKP" => KeyMaterial::Okp { x: self.x? },
            _ => return None,
        };
        Some(JwkKey { kid, material })
    }
}

/// 公開鍵の成分（base64url エンコード）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Rsa { n: String, e: String },
    Ec { x: String, y: String },
    Okp { x: String },
}

/// JwkKey は取得した JWK 鍵の公開情報。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwkKey {
    pub kid: String,
    pub material: KeyMaterial,
}

impl JwkKey {
    /// RSA 公開鍵から JwkKey を生成する。
    pub fn rsa(kid: impl Into<String>, n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            material: KeyMaterial::Rsa {
                n: n.into(),
                e: e.into(),
            },
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match &self.material {
            KeyMaterial::Rsa { n, e } => DecodingKey::from_rsa_components(n, e),
            KeyMaterial::Ec { x, y } => DecodingKey::from_ec_components(x, y),
            KeyMaterial::Okp { x } => DecodingKey::from_ed_components(x),
        }
    }
}

/// JwksFetcher は JWKS エンドポイントからの鍵取得を抽象化するトレイト。
#[async_trait::async_trait]
pub trait JwksFetcher: Send + Sync {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, VerificationError>;
}

/// HttpJwksFetcher は HTTPS 経由で JWKS を取得するデフォルト実装。
#[derive(Debug, Clone, Default)]
pub struct HttpJwksFetcher {
    client: reqwest::Client,
}

impl HttpJwksFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, VerificationError> {
        let doc: JwksDocument = self
            .client
            .get(jwks_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| VerificationError::KeySetFetchFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerificationError::KeySetFetchFailed(e.to_string()))?;

        let total = doc.keys.len();
        let keys: Vec<JwkKey> = doc.keys.into_iter().filter_map(RawJwk::into_key).collect();
        if keys.len() < total {
            tracing::debug!(
                jwks_url,
                skipped = total - keys.len(),
                "ignored JWKS entries without kid or with unsupported key type"
            );
        }
        Ok(keys)
    }
}

/// 固定の鍵セットを返すフェッチャー。ネットワークに出ない構成で使う。
#[derive(Debug, Clone)]
pub struct StaticJwksFetcher {
    keys: Vec<JwkKey>,
}

impl StaticJwksFetcher {
    pub fn new(keys: Vec<JwkKey>) -> Self {
        Self { keys }
    }
}

#[async_trait::async_trait]
impl JwksFetcher for StaticJwksFetcher {
    async fn fetch_keys(&self, _jwks_url: &str) -> Result<Vec<JwkKey>, VerificationError> {
        Ok(self.keys.clone())
    }
}

/// SigningKeyCache は kid から復号鍵への対応をプロセス寿命の間保持する。
/// 鍵は追加されるのみで、能動的な無効化は行わない。
#[derive(Default)]
pub struct SigningKeyCache {
    keys: RwLock<HashMap<String, Arc<DecodingKey>>>,
    /// 鍵セット取得の直列化専用。マップのロックとは独立させ、取得中も読み取りを止めない。
    fetch_guard: Mutex<()>,
}

impl SigningKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 鍵セットを投入済みのキャッシュを生成する。
    pub fn from_keys(keys: &[JwkKey]) -> Result<Self, VerificationError> {
        let map = build_key_map(keys)?;
        Ok(Self {
            keys: RwLock::new(map),
            fetch_guard: Mutex::new(()),
        })
    }

    pub async fn get(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    /// キャッシュにない kid を要求されたとき、鍵セットを取得して投入する。
    /// 取得は fetch_guard で一本化し、同時に発生したミスは一回の取得にまとまる。
    /// 取得中もマップは読み取りロックで参照でき、キャッシュ済みの kid は待たされない。
    pub(crate) async fn get_or_fetch(
        &self,
        kid: &str,
        fetcher: &dyn JwksFetcher,
        jwks_url: &str,
    ) -> Result<Arc<DecodingKey>, VerificationError> {
        if let Some(key) = self.get(kid).await {
            return Ok(key);
        }

        let _fetching = self.fetch_guard.lock().await;

        // 待機中に別のタスクが投入した可能性がある
        if let Some(key) = self.get(kid).await {
            return Ok(key);
        }

        let fetched = fetcher.fetch_keys(jwks_url).await?;
        let fresh = build_key_map(&fetched)?;
        tracing::info!(jwks_url, key_count = fresh.len(), "signing key set fetched");

        let mut keys = self.keys.write().await;
        keys.extend(fresh);

        keys.get(kid)
            .cloned()
            .ok_or_else(|| VerificationError::KeyNotFound {
                kid: kid.to_string(),
            })
    }
}

fn build_key_map(keys: &[JwkKey]) -> Result<HashMap<String, Arc<DecodingKey>>, VerificationError> {
    keys.iter()
        .map(|k| {
            k.decoding_key()
                .map(|dk| (k.kid.clone(), Arc::new(dk)))
                .map_err(|e| {
                    VerificationError::KeySetFetchFailed(format!("invalid key {}: {e}", k.kid))
                })
        })
        .collect()
}
