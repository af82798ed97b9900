//! DynamoDB-backed `ChatLogStore`.
//!
//! Speaks the DynamoDB JSON 1.0 protocol directly: a single POST per scan
//! page with an `X-Amz-Target: DynamoDB_20120810.Scan` header, SigV4-signed.
//! The continuation key round-trips verbatim as `ExclusiveStartKey`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use streamlens_core::error::StoreError;
use streamlens_core::store::{ChatLogStore, ScanCursor, ScanPage, ScanRequest, StoredMessage};

use crate::sigv4::{self, Credentials};

const SCAN_TARGET: &str = "DynamoDB_20120810.Scan";

/// DynamoDB scan client for the chat log table.
pub struct DynamoClient {
    table: String,
    region: String,
    endpoint: String,
    host: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl DynamoClient {
    /// Create a client against the regional DynamoDB endpoint.
    pub fn new(
        table: impl Into<String>,
        region: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let region = region.into();
        let endpoint = format!("https://dynamodb.{region}.amazonaws.com");
        let host = host_of(&endpoint);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            table: table.into(),
            region,
            endpoint,
            host,
            credentials,
            client,
        }
    }

    /// Point at a custom endpoint (local DynamoDB).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self.host = host_of(&self.endpoint);
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    /// Build the Scan request body for one page.
    fn build_scan_body(&self, request: &ScanRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "TableName": self.table,
            "Limit": request.limit,
        });

        if let Some(filter) = &request.filter {
            body["FilterExpression"] = serde_json::json!("#c = :c AND #ts >= :since");
            body["ExpressionAttributeNames"] =
                serde_json::json!({ "#c": "channel", "#ts": "timestamp" });
            body["ExpressionAttributeValues"] = serde_json::json!({
                ":c": { "S": filter.channel },
                ":since": { "S": filter.since },
            });
        }

        if let Some(cursor) = &request.start_key {
            body["ExclusiveStartKey"] = cursor.0.clone();
        }

        body
    }
}

/// Authority part of an endpoint URL, port included — SigV4 signs the exact
/// `Host` header the client will send.
fn host_of(endpoint: &str) -> String {
    let rest = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    rest.split('/').next().unwrap_or(rest).to_string()
}

#[async_trait]
impl ChatLogStore for DynamoClient {
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, StoreError> {
        let body = serde_json::to_vec(&self.build_scan_body(&request))
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let headers = sigv4::sign_request(
            &self.credentials,
            &self.region,
            "dynamodb",
            &self.host,
            SCAN_TARGET,
            &body,
            chrono::Utc::now(),
        );

        debug!(table = %self.table, limit = request.limit, filtered = request.filter.is_some(), "DynamoDB scan page");

        let mut req = self.client.post(&self.endpoint).body(body);
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "DynamoDB scan error");
            return Err(StoreError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let output: ScanOutput = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("Failed to parse scan response: {e}")))?;

        parse_scan_output(output)
    }
}

// --- DynamoDB wire types ---

#[derive(Debug, Deserialize)]
struct ScanOutput {
    #[serde(rename = "Items", default)]
    items: Vec<HashMap<String, AttributeValue>>,

    #[serde(rename = "LastEvaluatedKey")]
    last_evaluated_key: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AttributeValue {
    #[serde(rename = "S")]
    s: Option<String>,
}

fn string_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<String, StoreError> {
    item.get(name)
        .and_then(|attr| attr.s.clone())
        .ok_or_else(|| StoreError::Decode(format!("Record missing string attribute '{name}'")))
}

fn parse_scan_output(output: ScanOutput) -> Result<ScanPage, StoreError> {
    let mut items = Vec::with_capacity(output.items.len());
    for item in &output.items {
        items.push(StoredMessage {
            channel: string_attr(item, "channel")?,
            username: string_attr(item, "username")?,
            message: string_attr(item, "message")?,
            timestamp: string_attr(item, "timestamp")?,
        });
    }

    Ok(ScanPage {
        items,
        cursor: output.last_evaluated_key.map(ScanCursor),
    })
}
