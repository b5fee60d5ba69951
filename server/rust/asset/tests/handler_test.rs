use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tower::ServiceExt;

use docvault_asset_server::adapter::handler::{
    handle_event, local, ApiEvent, ApiResponse, HandlerContext, Operation,
};
use docvault_asset_server::domain::entity::{AssetRecord, AuthOutcome, AuthenticationResult};
use docvault_asset_server::domain::repository::{
    AssetTable, IdentityProvider, IdentityProviderError, ObjectStore,
};
use docvault_asset_server::infrastructure::{InMemoryAssetTable, InMemoryObjectStore, TokenVerifier};
use docvault_auth::{CallerIdentity, VerificationError};

// --- Test doubles ---

/// トークン文字列で結果を切り替える検証器。
struct TestTokenVerifier;

#[async_trait::async_trait]
impl TokenVerifier for TestTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerificationError> {
        match token {
            "valid-u1" => Ok(CallerIdentity {
                subject: "u1".to_string(),
                username: Some("alice".to_string()),
            }),
            "valid-u2" => Ok(CallerIdentity {
                subject: "u2".to_string(),
                username: Some("bob".to_string()),
            }),
            "expired" => Err(VerificationError::Expired),
            "jwks-down" => Err(VerificationError::KeySetFetchFailed(
                "connection refused".to_string(),
            )),
            _ => Err(VerificationError::SignatureInvalid),
        }
    }
}

/// find_by_user の呼び出し回数を数えるテーブル。
struct CountingAssetTable {
    inner: InMemoryAssetTable,
    queries: AtomicUsize,
}

impl CountingAssetTable {
    fn new() -> Self {
        Self {
            inner: InMemoryAssetTable::new(),
            queries: AtomicUsize::new(0),
        }
    }

    fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AssetTable for CountingAssetTable {
    async fn put(&self, record: &AssetRecord) -> anyhow::Result<()> {
        self.inner.put(record).await
    }

    async fn update_upload_date(
        &self,
        user_id: &str,
        document_name: &str,
        upload_date: &str,
    ) -> anyhow::Result<()> {
        self.inner
            .update_upload_date(user_id, document_name, upload_date)
            .await
    }

    async fn delete(&self, user_id: &str, document_name: &str) -> anyhow::Result<()> {
        self.inner.delete(user_id, document_name).await
    }

    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<AssetRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_user(user_id).await
    }
}

struct TestIdentityProvider;

fn rejected(code: &str, message: &str) -> IdentityProviderError {
    IdentityProviderError::Rejected {
        code: code.to_string(),
        message: message.to_string(),
    }
}

#[async_trait::async_trait]
impl IdentityProvider for TestIdentityProvider {
    async fn sign_up(
        &self,
        username: &str,
        _password: &SecretString,
        _email: &str,
    ) -> Result<(), IdentityProviderError> {
        match username {
            "taken" => Err(rejected("UsernameExistsException", "User already exists")),
            "offline" => Err(IdentityProviderError::Unavailable("dns failure".to_string())),
            _ => Ok(()),
        }
    }

    async fn confirm_sign_up(
        &self,
        _username: &str,
        confirmation_code: &str,
    ) -> Result<(), IdentityProviderError> {
        if confirmation_code == "123456" {
            Ok(())
        } else {
            Err(rejected("CodeMismatchException", "Invalid code provided"))
        }
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        if username == "newbie" {
            return Ok(AuthOutcome::ChallengeRequired(
                "NEW_PASSWORD_REQUIRED".to_string(),
            ));
        }
        if password.expose_secret() != "correct-horse" {
            return Err(rejected("NotAuthorizedException", "Incorrect username or password."));
        }
        Ok(AuthOutcome::Authenticated(AuthenticationResult {
            access_token: Some("access".to_string()),
            id_token: Some("id".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
        }))
    }
}

// --- Harness ---

struct Harness {
    store: Arc<InMemoryObjectStore>,
    table: Arc<CountingAssetTable>,
    ctx: HandlerContext,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryObjectStore::new());
    let table = Arc::new(CountingAssetTable::new());
    let ctx = HandlerContext::new(
        store.clone(),
        table.clone(),
        Arc::new(TestIdentityProvider),
        Arc::new(TestTokenVerifier),
    );
    Harness { store, table, ctx }
}

fn event(
    method: &str,
    route: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> ApiEvent {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    if let Some(t) = token {
        headers.insert("Authorization".to_string(), format!("Bearer {t}"));
    }
    serde_json::from_value(serde_json::json!({
        "routeKey": format!("{method} /{route}"),
        "rawPath": format!("/{route}"),
        "headers": headers,
        "body": body.map(|b| b.to_string()),
    }))
    .unwrap()
}

fn post(route: &str, token: Option<&str>, body: serde_json::Value) -> ApiEvent {
    event("POST", route, token, Some(body))
}

fn json(resp: &ApiResponse) -> serde_json::Value {
    resp.json_body().expect("response body should be JSON")
}

fn error_message(resp: &ApiResponse) -> String {
    json(resp)["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

// --- Asset operations ---

#[tokio::test]
async fn test_upload_stores_object_and_record() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "upload_asset",
            Some("valid-u1"),
            serde_json::json!({ "document_name": "report.txt", "document": "aGVsbG8=" }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(
        json(&resp)["message"],
        "Document uploaded and metadata stored successfully!"
    );
    assert_eq!(h.store.get_object("u1/report.txt").await.unwrap(), b"hello");

    let records = h.table.find_by_user("u1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].document_name, "report.txt");
    assert!(!records[0].upload_date.is_empty());
}

#[tokio::test]
async fn test_upload_rejects_invalid_base64() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "upload_asset",
            Some("valid-u1"),
            serde_json::json!({ "document_name": "report.txt", "document": "!!not base64!!" }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(h.store.object_count().await, 0);
}

#[tokio::test]
async fn test_upload_requires_fields() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("upload_asset", Some("valid-u1"), serde_json::json!({ "document": "aGk=" })),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(error_message(&resp), "document_name and document are required");
}

#[tokio::test]
async fn test_list_returns_only_callers_records() {
    let h = harness();
    for (token, name) in [("valid-u1", "a.txt"), ("valid-u2", "b.txt"), ("valid-u1", "c.txt")] {
        let resp = handle_event(
            &h.ctx,
            post(
                "upload_asset",
                Some(token),
                serde_json::json!({ "document_name": name, "document": "aGk=" }),
            ),
        )
        .await;
        assert_eq!(resp.status_code, 200);
    }

    let resp = handle_event(
        &h.ctx,
        post("list_assets", Some("valid-u1"), serde_json::json!({})),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    let names: Vec<String> = json(&resp)
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["document_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "c.txt"]);
}

#[tokio::test]
async fn test_view_prefers_query_string_name() {
    let h = harness();
    h.store
        .put_object("u1/notes.txt", b"plain text".to_vec())
        .await
        .unwrap();

    let mut ev = post(
        "view_asset",
        Some("valid-u1"),
        serde_json::json!({ "document_name": "other.txt" }),
    );
    ev.query_string_parameters = Some(HashMap::from([(
        "documentName".to_string(),
        "notes.txt".to_string(),
    )]));

    let resp = handle_event(&h.ctx, ev).await;

    assert_eq!(resp.status_code, 200);
    let body = json(&resp);
    assert_eq!(body["document_name"], "notes.txt");
    assert_eq!(body["content"], "plain text");
    assert_eq!(body["encoding"], "utf-8");
}

#[tokio::test]
async fn test_view_binary_content_is_base64() {
    let h = harness();
    h.store.put_object("u1/img.bin", vec![0xff, 0x00]).await.unwrap();

    let resp = handle_event(
        &h.ctx,
        post("view_asset", Some("valid-u1"), serde_json::json!({ "document_name": "img.bin" })),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["encoding"], "base64");
    assert_eq!(json(&resp)["content"], "/wA=");
}

#[tokio::test]
async fn test_view_missing_document_is_404() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("view_asset", Some("valid-u1"), serde_json::json!({ "document_name": "nope.txt" })),
    )
    .await;

    assert_eq!(resp.status_code, 404);
    assert_eq!(error_message(&resp), "Document not found");
}

#[tokio::test]
async fn test_other_callers_document_is_not_visible() {
    let h = harness();
    h.store.put_object("u1/secret.txt", b"mine".to_vec()).await.unwrap();

    let resp = handle_event(
        &h.ctx,
        post("view_asset", Some("valid-u2"), serde_json::json!({ "document_name": "secret.txt" })),
    )
    .await;

    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn test_update_then_delete() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "update_asset",
            Some("valid-u1"),
            serde_json::json!({ "document_name": "r.txt", "document": "djI=" }),
        ),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["message"], "Document updated successfully!");
    assert_eq!(h.store.get_object("u1/r.txt").await.unwrap(), b"v2");
    assert_eq!(h.table.find_by_user("u1").await.unwrap().len(), 1);

    let resp = handle_event(
        &h.ctx,
        post("delete_assets", Some("valid-u1"), serde_json::json!({ "document_name": "r.txt" })),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["message"], "Document r.txt deleted successfully.");
    assert_eq!(h.store.object_count().await, 0);
    assert!(h.table.find_by_user("u1").await.unwrap().is_empty());
}

// --- Envelope ---

#[tokio::test]
async fn test_preflight_needs_no_auth() {
    let h = harness();
    let resp = handle_event(&h.ctx, event("OPTIONS", "list_assets", None, None)).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["message"], "CORS preflight");
    assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(resp.headers["Access-Control-Allow-Methods"], "GET, PUT, POST, OPTIONS");
    assert_eq!(h.table.query_count(), 0);
}

#[tokio::test]
async fn test_preflight_on_unknown_route() {
    let h = harness();
    let resp = handle_event(&h.ctx, event("OPTIONS", "does_not_exist", None, None)).await;
    assert_eq!(resp.status_code, 200);
}

#[tokio::test]
async fn test_non_post_is_405() {
    let h = harness();
    let resp = handle_event(&h.ctx, event("GET", "list_assets", Some("valid-u1"), None)).await;

    assert_eq!(resp.status_code, 405);
    assert_eq!(error_message(&resp), "Method GET not allowed");
    assert_eq!(h.table.query_count(), 0);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("rename_asset", Some("valid-u1"), serde_json::json!({})),
    )
    .await;
    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn test_stage_prefixed_path_is_routed() {
    let h = harness();
    let mut ev = post("list_assets", Some("valid-u1"), serde_json::json!({}));
    ev.route_key = None;
    ev.http_method = Some("POST".to_string());
    ev.raw_path = Some("/prod/list_assets".to_string());

    let resp = handle_event(&h.ctx, ev).await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(h.table.query_count(), 1);
}

#[tokio::test]
async fn test_pinned_operation_ignores_path() {
    let h = harness();
    let ctx = h.ctx.clone().with_pinned_operation(Operation::ListAssets);
    let resp = handle_event(&ctx, post("anything", Some("valid-u1"), serde_json::json!({}))).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.table.query_count(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let h = harness();
    let mut ev = post("upload_asset", Some("valid-u1"), serde_json::json!({}));
    ev.body = Some("{\"document_name\": ".to_string());

    let resp = handle_event(&h.ctx, ev).await;
    assert_eq!(resp.status_code, 400);
    assert_eq!(error_message(&resp), "Invalid JSON format");
}

#[tokio::test]
async fn test_custom_cors_origin() {
    let h = harness();
    let ctx = h.ctx.clone().with_cors_origin("https://docs.example.com");
    let resp = handle_event(
        &ctx,
        post("list_assets", Some("valid-u1"), serde_json::json!({})),
    )
    .await;
    assert_eq!(
        resp.headers["Access-Control-Allow-Origin"],
        "https://docs.example.com"
    );
}

// --- Authentication ---

#[tokio::test]
async fn test_expired_token_is_401_without_query() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("list_assets", Some("expired"), serde_json::json!({})),
    )
    .await;

    assert_eq!(resp.status_code, 401);
    let body = json(&resp);
    assert_eq!(body["error"]["message"], "Invalid token");
    assert_eq!(body["error"]["code"], "SYS_AUTH_TOKEN_EXPIRED");
    assert_eq!(h.table.query_count(), 0);
}

#[tokio::test]
async fn test_bad_signature_is_401() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("list_assets", Some("forged"), serde_json::json!({})),
    )
    .await;

    assert_eq!(resp.status_code, 401);
    assert_eq!(json(&resp)["error"]["code"], "SYS_AUTH_INVALID_TOKEN");
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let h = harness();
    let resp = handle_event(&h.ctx, post("list_assets", None, serde_json::json!({}))).await;

    assert_eq!(resp.status_code, 401);
    assert_eq!(error_message(&resp), "Authorization header missing");
}

#[tokio::test]
async fn test_non_bearer_authorization_header() {
    let h = harness();
    let mut ev = post("list_assets", None, serde_json::json!({}));
    ev.headers
        .get_or_insert_with(HashMap::new)
        .insert("authorization".to_string(), "Basic dTE6cHc=".to_string());

    let resp = handle_event(&h.ctx, ev).await;
    assert_eq!(resp.status_code, 401);
    assert_eq!(error_message(&resp), "Invalid Authorization header format");
}

#[tokio::test]
async fn test_key_set_outage_is_500() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("list_assets", Some("jwks-down"), serde_json::json!({})),
    )
    .await;

    assert_eq!(resp.status_code, 500);
    assert_eq!(error_message(&resp), "Internal server error");
    assert_eq!(h.table.query_count(), 0);
}

#[tokio::test]
async fn test_auth_runs_before_body_parsing() {
    let h = harness();
    let mut ev = post("upload_asset", None, serde_json::json!({}));
    ev.body = Some("not json".to_string());

    let resp = handle_event(&h.ctx, ev).await;
    assert_eq!(resp.status_code, 401);
}

// --- Multipart ---

#[tokio::test]
async fn test_presign_zero_parts_is_empty() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_generate_presigned_urls",
            Some("valid-u1"),
            serde_json::json!({ "uploadId": "abc", "filename": "big.bin", "parts": 0 }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["partUrls"], serde_json::json!([]));
}

#[tokio::test]
async fn test_presign_urls_are_ascending() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_generate_presigned_urls",
            Some("valid-u1"),
            serde_json::json!({ "uploadId": "abc", "filename": "big.bin", "parts": "3" }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    let urls = json(&resp)["partUrls"].as_array().unwrap().clone();
    assert_eq!(urls.len(), 3);
    for (i, url) in urls.iter().enumerate() {
        let url = url.as_str().unwrap();
        assert!(url.starts_with("memory://u1/big.bin?uploadId=abc"));
        assert!(url.contains(&format!("partNumber={}", i + 1)));
        assert!(url.contains("expires=3600"));
    }
}

#[tokio::test]
async fn test_presign_rejects_bad_part_counts() {
    let h = harness();
    for parts in [serde_json::json!(-1), serde_json::json!(10_001), serde_json::json!("x")] {
        let resp = handle_event(
            &h.ctx,
            post(
                "multipart_generate_presigned_urls",
                Some("valid-u1"),
                serde_json::json!({ "uploadId": "abc", "filename": "big.bin", "parts": parts }),
            ),
        )
        .await;
        assert_eq!(resp.status_code, 400, "parts = {parts}");
    }
}

#[tokio::test]
async fn test_presign_requires_fields() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_generate_presigned_urls",
            Some("valid-u1"),
            serde_json::json!({ "filename": "big.bin", "parts": 2 }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(error_message(&resp), "uploadId, filename, and parts are required");
}

#[tokio::test]
async fn test_multipart_flow_assembles_object() {
    let h = harness();

    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_start_upload",
            Some("valid-u1"),
            serde_json::json!({ "filename": "big.bin" }),
        ),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    let upload_id = json(&resp)["uploadId"].as_str().unwrap().to_string();

    let e1 = h.store.upload_part(&upload_id, 1, b"part one, ".to_vec()).await.unwrap();
    let e2 = h.store.upload_part(&upload_id, 2, b"part two".to_vec()).await.unwrap();

    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_complete_upload",
            Some("valid-u1"),
            serde_json::json!({
                "uploadId": upload_id,
                "filename": "big.bin",
                "parts": [
                    { "PartNumber": 1, "ETag": e1 },
                    { "PartNumber": 2, "ETag": e2 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["message"], "Multipart upload completed successfully");

    let resp = handle_event(
        &h.ctx,
        post("view_asset", Some("valid-u1"), serde_json::json!({ "document_name": "big.bin" })),
    )
    .await;
    assert_eq!(json(&resp)["content"], "part one, part two");
}

#[tokio::test]
async fn test_complete_with_wrong_etag_is_400() {
    let h = harness();
    let upload_id = h.store.create_multipart_upload("u1/big.bin").await.unwrap();
    h.store.upload_part(&upload_id, 1, b"data".to_vec()).await.unwrap();

    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_complete_upload",
            Some("valid-u1"),
            serde_json::json!({
                "uploadId": upload_id,
                "filename": "big.bin",
                "parts": [{ "PartNumber": 1, "ETag": "\"wrong\"" }]
            }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert!(error_message(&resp).contains("InvalidPart"));
    assert_eq!(h.store.object_count().await, 0);
}

#[tokio::test]
async fn test_complete_for_another_callers_upload_is_400() {
    let h = harness();
    let upload_id = h.store.create_multipart_upload("u1/big.bin").await.unwrap();
    let etag = h.store.upload_part(&upload_id, 1, b"data".to_vec()).await.unwrap();

    // u2 のキーは u2/big.bin になるのでセッションと一致しない
    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_complete_upload",
            Some("valid-u2"),
            serde_json::json!({
                "uploadId": upload_id,
                "filename": "big.bin",
                "parts": [{ "PartNumber": 1, "ETag": etag }]
            }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert!(error_message(&resp).contains("NoSuchUpload"));
}

#[tokio::test]
async fn test_complete_missing_parts_lists_details() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "multipart_complete_upload",
            Some("valid-u1"),
            serde_json::json!({ "uploadId": "abc", "filename": "big.bin" }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    let details = json(&resp)["error"]["details"].as_array().unwrap().clone();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "parts");
}

// --- Account operations ---

#[tokio::test]
async fn test_register_needs_no_token() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "register",
            None,
            serde_json::json!({
                "username": "carol",
                "password": "S3cret!pw",
                "email": "c@example.com"
            }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(json(&resp)["message"], "User registration successful!");
}

#[tokio::test]
async fn test_register_rejection_returns_provider_message() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "register",
            None,
            serde_json::json!({
                "username": "taken",
                "password": "S3cret!pw",
                "email": "t@example.com"
            }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(error_message(&resp), "User already exists");
}

#[tokio::test]
async fn test_register_provider_outage_is_masked() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "register",
            None,
            serde_json::json!({
                "username": "offline",
                "password": "S3cret!pw",
                "email": "o@example.com"
            }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 500);
    assert_eq!(error_message(&resp), "Internal server error");
    assert!(!resp.body.contains("dns failure"));
}

#[tokio::test]
async fn test_confirm_registration() {
    let h = harness();
    let ok = handle_event(
        &h.ctx,
        post(
            "confirm_registration",
            None,
            serde_json::json!({ "username": "carol", "confirmation_code": "123456" }),
        ),
    )
    .await;
    assert_eq!(ok.status_code, 200);
    assert_eq!(json(&ok)["message"], "User confirmed successfully");

    let bad = handle_event(
        &h.ctx,
        post(
            "confirm_registration",
            None,
            serde_json::json!({ "username": "carol", "confirmation_code": "000000" }),
        ),
    )
    .await;
    assert_eq!(bad.status_code, 400);
    assert_eq!(error_message(&bad), "Invalid confirmation code.");
}

#[tokio::test]
async fn test_login_returns_tokens() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post(
            "login",
            None,
            serde_json::json!({ "username": "carol", "password": "correct-horse" }),
        ),
    )
    .await;

    assert_eq!(resp.status_code, 200);
    let body = json(&resp);
    assert_eq!(body["AccessToken"], "access");
    assert_eq!(body["IdToken"], "id");
    assert_eq!(body["ExpiresIn"], 3600);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("login", None, serde_json::json!({ "username": "carol", "password": "nope" })),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(error_message(&resp), "Incorrect username or password.");
    assert!(!resp.body.contains("nope"));
}

#[tokio::test]
async fn test_login_challenge_is_400() {
    let h = harness();
    let resp = handle_event(
        &h.ctx,
        post("login", None, serde_json::json!({ "username": "newbie", "password": "temp" })),
    )
    .await;

    assert_eq!(resp.status_code, 400);
    assert!(error_message(&resp).contains("NEW_PASSWORD_REQUIRED"));
}

// --- Local HTTP server ---

#[tokio::test]
async fn test_local_router_healthz() {
    let h = harness();
    let app = local::router(h.ctx);

    let resp = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_local_router_forwards_to_handler() {
    let h = harness();
    let app = local::router(h.ctx.clone());

    let req = Request::builder()
        .method("POST")
        .uri("/upload_asset")
        .header("Authorization", "Bearer valid-u1")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "document_name": "via-http.txt", "document": "aGVsbG8=" })
                .to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(h.store.get_object("u1/via-http.txt").await.unwrap(), b"hello");
}

async fn send(
    app: &axum::Router,
    req: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", "Bearer valid-u1")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_local_multipart_flow_over_http() {
    let store = Arc::new(InMemoryObjectStore::new().with_part_endpoint("http://localhost:8080"));
    let ctx = HandlerContext::new(
        store.clone(),
        Arc::new(CountingAssetTable::new()),
        Arc::new(TestIdentityProvider),
        Arc::new(TestTokenVerifier),
    );
    let app = local::router_with_part_uploads(ctx, store.clone());

    let (status, _, body) = send(
        &app,
        json_request("/multipart_start_upload", serde_json::json!({ "filename": "big.bin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let started: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app,
        json_request(
            "/multipart_generate_presigned_urls",
            serde_json::json!({ "uploadId": upload_id, "filename": "big.bin", "parts": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let presigned: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let urls = presigned["partUrls"].as_array().unwrap().clone();
    assert_eq!(urls.len(), 2);

    let mut parts = Vec::new();
    for (i, (url, chunk)) in urls.iter().zip(["hello ", "world"]).enumerate() {
        let path = url
            .as_str()
            .unwrap()
            .strip_prefix("http://localhost:8080")
            .unwrap()
            .to_string();
        let req = Request::builder()
            .method("PUT")
            .uri(path)
            .body(Body::from(chunk))
            .unwrap();
        let (status, headers, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let etag = headers["etag"].to_str().unwrap().to_string();
        parts.push(serde_json::json!({ "PartNumber": i + 1, "ETag": etag }));
    }

    let (status, _, _) = send(
        &app,
        json_request(
            "/multipart_complete_upload",
            serde_json::json!({ "uploadId": upload_id, "filename": "big.bin", "parts": parts }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.get_object("u1/big.bin").await.unwrap(), b"hello world");
}

#[tokio::test]
async fn test_local_part_put_for_unknown_upload_is_404() {
    let h = harness();
    let app = local::router_with_part_uploads(h.ctx.clone(), h.store.clone());

    let req = Request::builder()
        .method("PUT")
        .uri("/_local/parts/mem-upload-missing/1")
        .body(Body::from("data"))
        .unwrap();
    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().starts_with("NoSuchUpload"));
}
