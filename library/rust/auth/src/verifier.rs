//! JWKS 検証器: 公開鍵をキャッシュから引き当て、JWT トークンを検証する。

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use crate::claims::{CallerIdentity, Claims};
use crate::key_set::{HttpJwksFetcher, JwkKey, JwksFetcher, SigningKeyCache, StaticJwksFetcher};

/// VerificationError はトークン検証の失敗理由。
/// `KeySetFetchFailed` のみサーバー側の障害で、それ以外は認証失敗として扱う。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signing key not found: {kid}")]
    KeyNotFound { kid: String },

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("issuer mismatch")]
    IssuerMismatch,

    #[error("signing key set fetch failed: {0}")]
    KeySetFetchFailed(String),
}

impl VerificationError {
    pub fn is_server_fault(&self) -> bool {
        matches!(self, VerificationError::KeySetFetchFailed(_))
    }
}

/// 非対称署名アルゴリズムのみ受け付ける。HS* はここで弾く。
fn is_allowed(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
            | Algorithm::ES256
            | Algorithm::ES384
            | Algorithm::EdDSA
    )
}

/// JwksVerifier は発行者の JWKS から公開鍵を取得し、JWT トークンを検証する。
pub struct JwksVerifier {
    issuer: String,
    jwks_url: String,
    cache: SigningKeyCache,
    fetcher: Arc<dyn JwksFetcher>,
}

impl JwksVerifier {
    /// 新しい JwksVerifier を生成する。
    pub fn new(issuer: &str, jwks_url: &str) -> Self {
        Self::with_fetcher(issuer, jwks_url, Arc::new(HttpJwksFetcher::default()))
    }

    /// Cognito ユーザープールの発行者 URL と JWKS URL から生成する。
    pub fn for_cognito(region: &str, user_pool_id: &str) -> Self {
        let issuer = cognito_issuer(region, user_pool_id);
        let jwks_url = jwks_url_for(&issuer);
        Self::new(&issuer, &jwks_url)
    }

    /// カスタムフェッチャーを使う JwksVerifier を生成する。
    pub fn with_fetcher(issuer: &str, jwks_url: &str, fetcher: Arc<dyn JwksFetcher>) -> Self {
        Self::with_cache(issuer, jwks_url, fetcher, SigningKeyCache::new())
    }

    pub fn with_cache(
        issuer: &str,
        jwks_url: &str,
        fetcher: Arc<dyn JwksFetcher>,
        cache: SigningKeyCache,
    ) -> Self {
        Self {
            issuer: issuer.to_string(),
            jwks_url: jwks_url.to_string(),
            cache,
            fetcher,
        }
    }

    /// 固定の鍵セットで検証する JwksVerifier を生成する（テスト・オフライン用）。
    pub fn with_key_set(issuer: &str, keys: Vec<JwkKey>) -> Result<Self, VerificationError> {
        let cache = SigningKeyCache::from_keys(&keys)?;
        Ok(Self::with_cache(
            issuer,
            &jwks_url_for(issuer),
            Arc::new(StaticJwksFetcher::new(keys)),
            cache,
        ))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn cache(&self) -> &SigningKeyCache {
        &self.cache
    }

    /// JWT トークン文字列を検証し、呼び出し元の識別情報を返す。
    pub async fn verify(&self, token: &str) -> Result<CallerIdentity, VerificationError> {
        self.verify_claims(token).await.map(CallerIdentity::from)
    }

    /// JWT トークン文字列を検証し、Claims を返す。
    ///
    /// オーディエンスは検証しない。ID トークンとアクセストークンで
    /// aud / client_id の持ち方が異なるため。
    pub async fn verify_claims(&self, token: &str) -> Result<Claims, VerificationError> {
        if token.is_empty() || token.split('.').count() != 3 {
            return Err(VerificationError::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        }

        let header =
            decode_header(token).map_err(|e| VerificationError::MalformedToken(e.to_string()))?;

        if !is_allowed(header.alg) {
            return Err(VerificationError::UnsupportedAlgorithm(format!(
                "{:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| VerificationError::MalformedToken("missing kid in header".into()))?;

        let key = self
            .cache
            .get_or_fetch(&kid, self.fetcher.as_ref(), &self.jwks_url)
            .await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| map_jwt_error(&e))?;

        // jsonwebtoken は exp == now を有効とみなすため、期限ちょうども失効扱いにする
        if data.claims.exp <= unix_now() {
            return Err(VerificationError::Expired);
        }

        Ok(data.claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn map_jwt_error(err: &jsonwebtoken::errors::Error) -> VerificationError {
    match err.kind() {
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::InvalidIssuer => VerificationError::IssuerMismatch,
        ErrorKind::MissingRequiredClaim(claim) => {
            VerificationError::MalformedToken(format!("missing claim: {claim}"))
        }
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => VerificationError::MalformedToken(err.to_string()),
        _ => VerificationError::SignatureInvalid,
    }
}

/// Cognito ユーザープールの発行者 URL を返す。
pub fn cognito_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

/// 発行者 URL から JWKS の公開場所を返す。
pub fn jwks_url_for(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}
