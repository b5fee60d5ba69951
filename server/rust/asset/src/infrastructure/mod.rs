mod aws_error;
pub mod cognito_client;
pub mod config;
pub mod dynamodb_table;
pub mod in_memory;
pub mod s3_storage;
pub mod token_verifier;

pub use cognito_client::CognitoIdentityProvider;
pub use config::Config;
pub use dynamodb_table::DynamoDbAssetTable;
pub use in_memory::{InMemoryAssetTable, InMemoryObjectStore};
pub use s3_storage::S3ObjectStore;
pub use token_verifier::TokenVerifier;
