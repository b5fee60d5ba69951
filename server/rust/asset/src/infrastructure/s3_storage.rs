use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};

use crate::domain::entity::CompletedPart;
use crate::domain::repository::{ObjectStore, ObjectStoreError};
use crate::infrastructure::aws_error::{classify, AwsFailure};

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, bucket: String) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
            bucket,
        }
    }

    pub fn from_client(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

fn to_completed_upload(parts: &[CompletedPart]) -> CompletedMultipartUpload {
    CompletedMultipartUpload::builder()
        .set_parts(Some(
            parts
                .iter()
                .map(|p| {
                    S3CompletedPart::builder()
                        .part_number(p.part_number)
                        .e_tag(&p.etag)
                        .build()
                })
                .collect(),
        ))
        .build()
}

fn to_store_error(key: &str, failure: AwsFailure) -> ObjectStoreError {
    match failure {
        AwsFailure::Service { code, .. } if code == "NoSuchKey" => {
            ObjectStoreError::NotFound(key.to_string())
        }
        AwsFailure::Service { code, message } => ObjectStoreError::Rejected { code, message },
        AwsFailure::Transport(msg) => ObjectStoreError::Unavailable(msg),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;
        Ok(())
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<String, ObjectStoreError> {
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;

        resp.upload_id()
            .map(str::to_string)
            .ok_or_else(|| ObjectStoreError::Unavailable("response carried no upload id".into()))
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?;

        let presigned = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(presigning)
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), ObjectStoreError> {
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(to_completed_upload(parts))
            .send()
            .await
            .map_err(|e| to_store_error(key, classify(e)))?;
        Ok(())
    }
}
