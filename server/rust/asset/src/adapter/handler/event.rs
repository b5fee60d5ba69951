//! API Gateway のイベントとレスポンスの形。
//!
//! REST (v1) と HTTP API (v2) のどちらのペイロードも受け付ける。

use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const ALLOW_HEADERS: &str = concat!(
    "Content-Type, Authorization, Content-Security-Policy, ETag, ",
    "X-Amz-Date, X-Api-Key, x-amz-security-token"
);
pub const ALLOW_METHODS: &str = "GET, PUT, POST, OPTIONS";
pub const EXPOSE_HEADERS: &str = "ETag, Content-Security-Policy, x-amz-security-token";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpDescription {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpDescription>,
}

/// ApiEvent はハンドラが受け取る 1 リクエスト分のイベント。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body is not valid base64")]
    Base64,

    #[error("request body is not valid JSON: {0}")]
    Json(String),
}

impl ApiEvent {
    /// HTTP メソッドを大文字で返す。`routeKey` の先頭トークン、`httpMethod`、
    /// `requestContext.http.method` の順に探す。
    pub fn method(&self) -> Option<String> {
        let from_route_key = self
            .route_key
            .as_deref()
            .and_then(|rk| rk.split_whitespace().next())
            .filter(|m| *m != "$default");

        from_route_key
            .or(self.http_method.as_deref())
            .or_else(|| {
                self.request_context
                    .as_ref()
                    .and_then(|c| c.http.as_ref())
                    .and_then(|h| h.method.as_deref())
            })
            .map(str::to_ascii_uppercase)
    }

    pub fn route_path(&self) -> Option<&str> {
        let from_route_key = self
            .route_key
            .as_deref()
            .and_then(|rk| rk.split_once(' '))
            .map(|(_, path)| path.trim());

        self.raw_path
            .as_deref()
            .or(self.path.as_deref())
            .or_else(|| {
                self.request_context
                    .as_ref()
                    .and_then(|c| c.http.as_ref())
                    .and_then(|h| h.path.as_deref())
            })
            .or(from_route_key)
    }

    /// ヘッダ名は大文字小文字を区別しない。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|q| q.get(name))
            .map(String::as_str)
    }

    /// ボディを JSON として読む。ボディが無ければ空オブジェクトとして扱う。
    pub fn json_body(&self) -> Result<serde_json::Value, BodyError> {
        let raw = match self.body.as_deref() {
            None => return Ok(serde_json::Value::Object(serde_json::Map::new())),
            Some(b) if b.trim().is_empty() => {
                return Ok(serde_json::Value::Object(serde_json::Map::new()))
            }
            Some(b) => b,
        };

        let text = if self.is_base64_encoded {
            let bytes = STANDARD.decode(raw.trim()).map_err(|_| BodyError::Base64)?;
            String::from_utf8(bytes).map_err(|_| BodyError::Base64)?
        } else {
            raw.to_string()
        };

        serde_json::from_str(&text).map_err(|e| BodyError::Json(e.to_string()))
    }
}

/// ApiResponse は API Gateway に返すレスポンス。`body` は JSON 文字列。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub fn cors_headers(allow_origin: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), allow_origin.to_string()),
        ("Access-Control-Allow-Headers".to_string(), ALLOW_HEADERS.to_string()),
        ("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string()),
        ("Access-Control-Expose-Headers".to_string(), EXPOSE_HEADERS.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

pub fn respond<T: Serialize>(status_code: u16, body: &T, allow_origin: &str) -> ApiResponse {
    let body = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"message":"Internal server error"}"#.to_string());
    ApiResponse {
        status_code,
        headers: cors_headers(allow_origin),
        body,
    }
}

pub fn respond_message(status_code: u16, message: &str, allow_origin: &str) -> ApiResponse {
    respond(
        status_code,
        &serde_json::json!({ "message": message }),
        allow_origin,
    )
}
