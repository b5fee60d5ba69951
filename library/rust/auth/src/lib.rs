//! docvault-auth: Bearer トークン検証ライブラリ
//!
//! ID プロバイダが公開する JWKS から署名鍵を取得してキャッシュし、
//! 非対称鍵で署名された JWT を検証して呼び出し元の subject を返す。
//!
//! # 使い方
//!
//! ```ignore
//! use docvault_auth::JwksVerifier;
//!
//! let verifier = JwksVerifier::for_cognito("eu-west-1", "eu-west-1_AbCdEf");
//! let caller = verifier.verify("eyJ...").await?;
//! println!("{}", caller.subject);
//! ```

pub mod bearer;
pub mod claims;
pub mod key_set;
pub mod verifier;

pub use bearer::{extract_bearer_token, BearerError};
pub use claims::{CallerIdentity, Claims};
pub use key_set::{
    HttpJwksFetcher, JwkKey, JwksFetcher, KeyMaterial, SigningKeyCache, StaticJwksFetcher,
};
pub use verifier::{cognito_issuer, jwks_url_for, JwksVerifier, VerificationError};
