use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Row shape for the consent table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRow {
    pub participant_id: String,
    pub consented_at: String,
    pub items_json: Value,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub center: String,
}

/// Row shape for the answers table. The conflict target for upserts is the
/// composite key (participant_id, step, case_id, item_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRow {
    pub participant_id: String,
    pub step: String,
    pub case_id: Option<String>,
    pub item_id: String,
    pub value_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub updated_at: String,
}

/// Identifies an answer row for deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRef {
    pub participant_id: String,
    pub step: String,
    pub case_id: Option<String>,
    pub item_id: String,
}

/// Row shape for the submissions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub participant_id: String,
    pub submitted_at: String,
    pub completion_code: String,
}

/// Remote write failures. Collapsed to the two facts callers act on.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Remote persistence operations.
///
/// The backing store is the eventual system of record, but every call here
/// sees data that is already durable locally; implementations never gate the
/// caller's success.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn insert_consent(&self, row: &ConsentRow) -> Result<(), RemoteError>;
    async fn upsert_answer(&self, row: &AnswerRow) -> Result<(), RemoteError>;
    async fn delete_answer(&self, key: &AnswerRef) -> Result<(), RemoteError>;
    async fn insert_submission(&self, row: &SubmissionRow) -> Result<(), RemoteError>;
}

/// Connection settings for the hosted backend.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

#[cfg(feature = "http")]
impl RemoteConfig {
    /// Reads `SEGSTUDY_API_URL` / `SEGSTUDY_API_KEY`. Either one missing means
    /// the backend is unconfigured and the app runs local-only.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SEGSTUDY_API_URL").ok()?;
        let api_key = std::env::var("SEGSTUDY_API_KEY").ok()?;
        if base_url.is_empty() || api_key.is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

/// PostgREST-style HTTP client for the hosted backend.
#[cfg(feature = "http")]
#[derive(Debug)]
pub struct HttpRemote {
    client: reqwest::Client,
    config: RemoteConfig,
}

#[cfg(feature = "http")]
impl HttpRemote {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{table}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn execute(request: reqwest::RequestBuilder) -> Result<(), RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|error| RemoteError::Transport(error.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(response.status().as_u16()))
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl RemoteSync for HttpRemote {
    async fn insert_consent(&self, row: &ConsentRow) -> Result<(), RemoteError> {
        Self::execute(self.authed(self.client.post(self.endpoint("consent")).json(row))).await
    }

    async fn upsert_answer(&self, row: &AnswerRow) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.endpoint("answers"))
            .query(&[("on_conflict", "participant_id,step,case_id,item_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(row);
        Self::execute(self.authed(request)).await
    }

    async fn delete_answer(&self, key: &AnswerRef) -> Result<(), RemoteError> {
        let request = self.client.delete(self.endpoint("answers")).query(&[
            ("participant_id", format!("eq.{}", key.participant_id)),
            ("step", format!("eq.{}", key.step)),
            (
                "case_id",
                format!("eq.{}", key.case_id.as_deref().unwrap_or("")),
            ),
            ("item_id", format!("eq.{}", key.item_id)),
        ]);
        Self::execute(self.authed(request)).await
    }

    async fn insert_submission(&self, row: &SubmissionRow) -> Result<(), RemoteError> {
        Self::execute(self.authed(self.client.post(self.endpoint("submissions")).json(row))).await
    }
}
