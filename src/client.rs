use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{record_from_value, AssessmentPayload, AssessmentRecord, TodayStats};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

pub const CREATE_PATH: &str = "/api/assessments";
pub const TODAY_PATH: &str = "/api/assessments/today";
pub const STATS_PATH: &str = "/api/assessments/today/stats";
pub const EXPORT_PATH: &str = "/api/assessments/today/export";

const SUCCESS_CODE: &str = "OK";

/// The four calls the field client makes against the assessment backend.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    async fn create_assessment(&self, payload: &AssessmentPayload) -> Result<(), ApiError>;

    async fn today_assessments(&self) -> Result<Vec<AssessmentRecord>, ApiError>;

    async fn today_stats(&self) -> Result<TodayStats, ApiError>;

    /// Raw spreadsheet bytes; the response carries no envelope.
    async fn export_today(&self) -> Result<Vec<u8>, ApiError>;
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.backend_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.backend_base_url.clone(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_envelope(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        read_envelope(response).await
    }
}

/// Accepts a body only when it decodes and its `code` is exactly `"OK"`.
async fn read_envelope(response: reqwest::Response) -> Result<Value, ApiError> {
    let body: Value = response.error_for_status()?.json().await?;
    check_code(body)
}

fn check_code(body: Value) -> Result<Value, ApiError> {
    if body.get("code").and_then(Value::as_str) == Some(SUCCESS_CODE) {
        return Ok(body);
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Err(ApiError::rejected(message))
}

#[async_trait]
impl AssessmentApi for BackendClient {
    async fn create_assessment(&self, payload: &AssessmentPayload) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(CREATE_PATH))
            .json(payload)
            .send()
            .await?;
        read_envelope(response).await?;
        Ok(())
    }

    async fn today_assessments(&self) -> Result<Vec<AssessmentRecord>, ApiError> {
        let mut body = self.get_envelope(TODAY_PATH).await?;
        let rows = match body.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let records: Vec<AssessmentRecord> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match record_from_value(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(index, "skipping unreadable assessment row: {err}");
                    None
                }
            })
            .collect();
        debug!(count = records.len(), "loaded today's assessments");
        Ok(records)
    }

    async fn today_stats(&self) -> Result<TodayStats, ApiError> {
        let body = self.get_envelope(STATS_PATH).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn export_today(&self) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.url(EXPORT_PATH))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "downloaded export");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_literal_ok_passes() {
        assert!(check_code(json!({ "code": "OK" })).is_ok());
        assert!(check_code(json!({ "code": "ok" })).is_err());
        assert!(check_code(json!({ "code": 200 })).is_err());
        assert!(check_code(json!({})).is_err());
    }

    #[test]
    fn rejection_carries_server_message() {
        let err = check_code(json!({ "code": "DUPLICATE", "message": "Already saved" })).unwrap_err();
        assert_eq!(err.user_message("fallback", "network"), "Already saved");
    }
}
