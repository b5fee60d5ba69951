pub mod account;
pub mod asset;
pub mod upload;

pub use account::{AuthOutcome, AuthenticationResult};
pub use asset::AssetRecord;
pub use upload::{CompletedPart, UploadSession};
