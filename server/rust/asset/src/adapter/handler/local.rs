//! ローカル開発用の HTTP サーバー。
//!
//! 受け取った HTTP リクエストを Lambda と同じ [`ApiEvent`] に変換して
//! [`handle_event`] に渡すので、デプロイ時と同じ経路を通る。
//! インメモリストア使用時は、署名付き URL の代わりとなるパートの PUT も受け付ける。

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::event::{ApiEvent, ApiResponse};
use super::{handle_event, HandlerContext};
use crate::domain::repository::ObjectStoreError;
use crate::infrastructure::InMemoryObjectStore;

/// Build the local development router.
pub fn router(ctx: HandlerContext) -> Router {
    app(ctx, Router::new())
}

/// Build the local router with part uploads served from `store`.
pub fn router_with_part_uploads(ctx: HandlerContext, store: Arc<InMemoryObjectStore>) -> Router {
    // ブラウザが完了リクエストに使う ETag を読めるよう公開する
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::PUT])
        .allow_headers(Any)
        .expose_headers([header::ETAG]);
    let parts: Router = Router::new()
        .route("/_local/parts/{upload_id}/{part_number}", put(receive_part))
        .layer(cors)
        .with_state(store);
    app(ctx, parts)
}

fn app(ctx: HandlerContext, extra: Router) -> Router {
    let handlers: Router = Router::new()
        .route("/healthz", get(healthz))
        .fallback(forward)
        .with_state(ctx);
    handlers.merge(extra).layer(TraceLayer::new_for_http())
}

async fn receive_part(
    State(store): State<Arc<InMemoryObjectStore>>,
    Path((upload_id, part_number)): Path<(String, i32)>,
    body: Bytes,
) -> Response {
    match store.upload_part(&upload_id, part_number, body.to_vec()).await {
        Ok(etag) => (StatusCode::OK, [(header::ETAG, etag)]).into_response(),
        Err(ObjectStoreError::Rejected { code, message }) => {
            tracing::warn!(%upload_id, part_number, %code, "part upload rejected");
            (StatusCode::NOT_FOUND, format!("{code}: {message}")).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "part upload failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn forward(
    State(ctx): State<HandlerContext>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let event = to_event(&method, &uri, &headers, query, &body);
    into_http_response(handle_event(&ctx, event).await)
}

pub fn to_event(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: &[u8],
) -> ApiEvent {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    // UTF-8 でない本文は API Gateway と同じく base64 で運ぶ
    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => (Some(text.to_string()), false),
            Err(_) => (Some(STANDARD.encode(body)), true),
        }
    };

    ApiEvent {
        http_method: Some(method.as_str().to_string()),
        raw_path: Some(uri.path().to_string()),
        headers: Some(headers),
        query_string_parameters: if query.is_empty() { None } else { Some(query) },
        body,
        is_base64_encoded,
        ..ApiEvent::default()
    }
}

pub fn into_http_response(resp: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::new(Body::from(resp.body));
    *response.status_mut() = status;

    let out = response.headers_mut();
    for (name, value) in resp.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            out.insert(name, value);
        }
    }
    response
}
