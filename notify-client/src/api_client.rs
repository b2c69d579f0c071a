use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach backend")?;

        if !response.status().is_success() {
            anyhow::bail!("Backend unhealthy: {}", response.status());
        }

        Ok(())
    }

    /// Inserts a notification for `user_id` and returns the created row.
    pub async fn create_notification(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Value> {
        let url = format!("{}/notifications", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "user_id": user_id,
                "title": title,
                "body": body,
            }))
            .send()
            .await
            .context("Failed to create notification")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Failed to create notification: {} - Response: {}", status, body);
        }

        let api_response: Value = response.json().await.context("Failed to parse response")?;

        // Extract the data from ApiResponse wrapper
        api_response["data"]
            .as_object()
            .context("No data object in response")
            .map(|obj| Value::Object(obj.clone()))
    }
}
