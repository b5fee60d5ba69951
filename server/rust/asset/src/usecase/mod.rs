pub mod complete_upload;
pub mod confirm_registration;
pub mod delete_asset;
pub mod list_assets;
pub mod login;
pub mod presign_parts;
pub mod register_user;
pub mod start_upload;
pub mod update_asset;
pub mod upload_asset;
pub mod view_asset;

pub use complete_upload::CompleteUploadUseCase;
pub use confirm_registration::ConfirmRegistrationUseCase;
pub use delete_asset::DeleteAssetUseCase;
pub use list_assets::ListAssetsUseCase;
pub use login::LoginUseCase;
pub use presign_parts::PresignPartsUseCase;
pub use register_user::RegisterUserUseCase;
pub use start_upload::StartUploadUseCase;
pub use update_asset::UpdateAssetUseCase;
pub use upload_asset::UploadAssetUseCase;
pub use view_asset::ViewAssetUseCase;
