pub mod asset_table;
pub mod identity_provider;
pub mod object_store;

pub use asset_table::AssetTable;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
pub use object_store::{ObjectStore, ObjectStoreError};
