use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered 200 with an error payload.
    #[error("{}: {}", .0.error, .0.message)]
    Api(ApiErrorBody),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: String,
    pub error: String,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePoll {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: u64,
    pub option_text: String,
    pub vote_count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: u64,
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub total_votes: u32,
    pub created_at: String,
    pub active: bool,
}

pub struct DashboardClient {
    client: Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, turning error payloads into [`SdkError::Api`].
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, SdkError> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SdkError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value = serde_json::from_str(&text)?;
        if value.get("status").and_then(Value::as_str) == Some("error")
            && value.get("error").is_some()
        {
            return Err(SdkError::Api(serde_json::from_value(value)?));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }

    /// Full infrastructure status, untyped.
    pub async fn status(&self) -> Result<Value, SdkError> {
        self.get("/api/resources/status").await
    }

    /// One resource by name (`ec2`, `alb`, `rds`, `s3`, `cloudfront`, `vpc`).
    /// `Value::Null` when the server could not describe it.
    pub async fn resource(&self, name: &str) -> Result<Value, SdkError> {
        self.get(&format!("/api/resources/{name}")).await
    }

    pub async fn resource_health(&self) -> Result<Value, SdkError> {
        self.get("/api/resources/health").await
    }

    pub async fn connection_status(&self, delay_ms: i64) -> Result<Value, SdkError> {
        self.get(&format!("/api/resources/connection-status?delay={delay_ms}"))
            .await
    }

    pub async fn deployment_progress(&self) -> Result<Value, SdkError> {
        self.get("/api/resources/deployment-progress").await
    }

    pub async fn list_polls(&self) -> Result<Vec<Poll>, SdkError> {
        self.get("/api/votes").await
    }

    pub async fn list_active_polls(&self) -> Result<Vec<Poll>, SdkError> {
        self.get("/api/votes/active").await
    }

    pub async fn get_poll(&self, id: u64) -> Result<Option<Poll>, SdkError> {
        self.get(&format!("/api/votes/{id}")).await
    }

    pub async fn create_poll(&self, request: &CreatePoll) -> Result<Poll, SdkError> {
        let resp = self
            .client
            .post(self.url("/api/votes"))
            .json(request)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn vote(&self, poll_id: u64, option_id: u64) -> Result<Poll, SdkError> {
        let resp = self
            .client
            .post(self.url(&format!("/api/votes/{poll_id}/options/{option_id}")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn deactivate(&self, poll_id: u64) -> Result<Poll, SdkError> {
        let resp = self
            .client
            .put(self.url(&format!("/api/votes/{poll_id}/deactivate")))
            .send()
            .await?;
        Self::decode(resp).await
    }
}
