pub mod account_handler;
pub mod asset_handler;
pub mod dispatch;
pub mod event;
pub mod local;
pub mod upload_handler;

use std::sync::Arc;

use docvault_server_common::ServiceError;
use serde::de::DeserializeOwned;

use crate::domain::repository::{AssetTable, IdentityProvider, ObjectStore};
use crate::infrastructure::TokenVerifier;
use crate::usecase::{
    CompleteUploadUseCase, ConfirmRegistrationUseCase, DeleteAssetUseCase, ListAssetsUseCase,
    LoginUseCase, PresignPartsUseCase, RegisterUserUseCase, StartUploadUseCase,
    UpdateAssetUseCase, UploadAssetUseCase, ViewAssetUseCase,
};

pub use dispatch::handle_event;
pub use event::{ApiEvent, ApiResponse};

/// Operation はルートで選ばれる処理の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UploadAsset,
    UpdateAsset,
    DeleteAsset,
    ListAssets,
    ViewAsset,
    StartUpload,
    PresignParts,
    CompleteUpload,
    Register,
    ConfirmRegistration,
    Login,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::UploadAsset,
        Operation::UpdateAsset,
        Operation::DeleteAsset,
        Operation::ListAssets,
        Operation::ViewAsset,
        Operation::StartUpload,
        Operation::PresignParts,
        Operation::CompleteUpload,
        Operation::Register,
        Operation::ConfirmRegistration,
        Operation::Login,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "upload_asset" => Some(Operation::UploadAsset),
            "update_asset" => Some(Operation::UpdateAsset),
            "delete_asset" | "delete_assets" => Some(Operation::DeleteAsset),
            "list_assets" => Some(Operation::ListAssets),
            "view_asset" => Some(Operation::ViewAsset),
            "multipart_start_upload" => Some(Operation::StartUpload),
            "multipart_generate_presigned_urls" => Some(Operation::PresignParts),
            "multipart_complete_upload" => Some(Operation::CompleteUpload),
            "register" => Some(Operation::Register),
            "confirm_registration" => Some(Operation::ConfirmRegistration),
            "login" => Some(Operation::Login),
            _ => None,
        }
    }

    /// パスの最後のセグメントで解決する。ステージ接頭辞は無視される。
    pub fn from_path(path: &str) -> Option<Self> {
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(Self::from_name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::UploadAsset => "upload_asset",
            Operation::UpdateAsset => "update_asset",
            Operation::DeleteAsset => "delete_asset",
            Operation::ListAssets => "list_assets",
            Operation::ViewAsset => "view_asset",
            Operation::StartUpload => "multipart_start_upload",
            Operation::PresignParts => "multipart_generate_presigned_urls",
            Operation::CompleteUpload => "multipart_complete_upload",
            Operation::Register => "register",
            Operation::ConfirmRegistration => "confirm_registration",
            Operation::Login => "login",
        }
    }

    /// アカウント系の操作は Bearer トークンを要求しない。
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Operation::Register | Operation::ConfirmRegistration | Operation::Login
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared state for the event handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub upload_asset_uc: Arc<UploadAssetUseCase>,
    pub update_asset_uc: Arc<UpdateAssetUseCase>,
    pub delete_asset_uc: Arc<DeleteAssetUseCase>,
    pub list_assets_uc: Arc<ListAssetsUseCase>,
    pub view_asset_uc: Arc<ViewAssetUseCase>,
    pub start_upload_uc: Arc<StartUploadUseCase>,
    pub presign_parts_uc: Arc<PresignPartsUseCase>,
    pub complete_upload_uc: Arc<CompleteUploadUseCase>,
    pub register_user_uc: Arc<RegisterUserUseCase>,
    pub confirm_registration_uc: Arc<ConfirmRegistrationUseCase>,
    pub login_uc: Arc<LoginUseCase>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub cors_allow_origin: String,
    /// 設定されていればパスに関係なくこの操作だけを実行する
    pub pinned_operation: Option<Operation>,
}

impl HandlerContext {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn AssetTable>,
        identity: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            upload_asset_uc: Arc::new(UploadAssetUseCase::new(store.clone(), table.clone())),
            update_asset_uc: Arc::new(UpdateAssetUseCase::new(store.clone(), table.clone())),
            delete_asset_uc: Arc::new(DeleteAssetUseCase::new(store.clone(), table.clone())),
            list_assets_uc: Arc::new(ListAssetsUseCase::new(table)),
            view_asset_uc: Arc::new(ViewAssetUseCase::new(store.clone())),
            start_upload_uc: Arc::new(StartUploadUseCase::new(store.clone())),
            presign_parts_uc: Arc::new(PresignPartsUseCase::new(store.clone())),
            complete_upload_uc: Arc::new(CompleteUploadUseCase::new(store)),
            register_user_uc: Arc::new(RegisterUserUseCase::new(identity.clone())),
            confirm_registration_uc: Arc::new(ConfirmRegistrationUseCase::new(identity.clone())),
            login_uc: Arc::new(LoginUseCase::new(identity)),
            verifier,
            cors_allow_origin: "*".to_string(),
            pinned_operation: None,
        }
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_allow_origin = origin.into();
        self
    }

    pub fn with_pinned_operation(mut self, operation: Operation) -> Self {
        self.pinned_operation = Some(operation);
        self
    }
}

/// JSON ボディを型付きのリクエストに読み替える。型が合わなければ 400。
pub(crate) fn parse_body<T: DeserializeOwned>(
    service: &str,
    body: serde_json::Value,
) -> Result<T, ServiceError> {
    serde_json::from_value(body).map_err(|e| {
        tracing::debug!(error = %e, "request body does not match the expected shape");
        ServiceError::bad_request(service, "Invalid request body")
    })
}

/// 内部エラーの詳細はログにだけ残し、呼び出し元には汎用メッセージを返す。
pub(crate) fn internal_error(service: &str, detail: impl std::fmt::Display) -> ServiceError {
    tracing::error!(service, error = %detail, "operation failed");
    ServiceError::internal(service, "Internal server error")
}
