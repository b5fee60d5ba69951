use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::domain::entity::AssetRecord;
use crate::domain::repository::AssetTable;

const ATTR_USER_ID: &str = "user_id";
const ATTR_DOCUMENT_NAME: &str = "document_name";
const ATTR_UPLOAD_DATE: &str = "upload_date";

pub struct DynamoDbAssetTable {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbAssetTable {
    pub fn new(sdk_config: &aws_config::SdkConfig, table_name: String) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(sdk_config),
            table_name,
        }
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> anyhow::Result<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .with_context(|| format!("item attribute {name} missing or not a string"))
}

fn to_record(item: &HashMap<String, AttributeValue>) -> anyhow::Result<AssetRecord> {
    Ok(AssetRecord {
        user_id: string_attr(item, ATTR_USER_ID)?,
        document_name: string_attr(item, ATTR_DOCUMENT_NAME)?,
        // 古い行には upload_date が無いことがある
        upload_date: string_attr(item, ATTR_UPLOAD_DATE).unwrap_or_default(),
    })
}

#[async_trait]
impl AssetTable for DynamoDbAssetTable {
    async fn put(&self, record: &AssetRecord) -> anyhow::Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(ATTR_USER_ID, AttributeValue::S(record.user_id.clone()))
            .item(ATTR_DOCUMENT_NAME, AttributeValue::S(record.document_name.clone()))
            .item(ATTR_UPLOAD_DATE, AttributeValue::S(record.upload_date.clone()))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("put_item failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn update_upload_date(
        &self,
        user_id: &str,
        document_name: &str,
        upload_date: &str,
    ) -> anyhow::Result<()> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(ATTR_USER_ID, AttributeValue::S(user_id.to_string()))
            .key(ATTR_DOCUMENT_NAME, AttributeValue::S(document_name.to_string()))
            .update_expression("SET upload_date = :val1")
            .expression_attribute_values(":val1", AttributeValue::S(upload_date.to_string()))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("update_item failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, document_name: &str) -> anyhow::Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(ATTR_USER_ID, AttributeValue::S(user_id.to_string()))
            .key(ATTR_DOCUMENT_NAME, AttributeValue::S(document_name.to_string()))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("delete_item failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<AssetRecord>> {
        let mut records = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let resp = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("user_id = :uid")
                .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("query failed: {}", DisplayErrorContext(&e)))?;

            for item in resp.items() {
                records.push(to_record(item)?);
            }

            match resp.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}
