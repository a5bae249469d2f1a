//! DynamoDB-backed [`KeyValueTable`].

use super::{Item, KeyValueTable};
use crate::config::AwsSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// Table client over DynamoDB. Every attribute is written as a string (`S`).
#[derive(Clone)]
pub struct DynamoTable {
    client: Client,
}

impl DynamoTable {
    pub fn new(sdk_config: &aws_config::SdkConfig, settings: &AwsSettings) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl KeyValueTable for DynamoTable {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let item: HashMap<String, AttributeValue> = item
            .into_iter()
            .map(|(name, value)| (name, AttributeValue::S(value)))
            .collect();

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| Error::storage("put_item", table, DisplayErrorContext(&e)))?;
        Ok(())
    }
}
