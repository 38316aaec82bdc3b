//! HTTP client for a compute gateway fronting the imagery backend.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RemoteError;
use crate::monitor::{JobHandle, JobState};

use super::types::{ComputeRequest, ExportTicket, StatisticValue, TaskStatus};
use super::ComputeProvider;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Reported when the backend fails a task without saying why.
const UNKNOWN_FAILURE: &str = "Unknown error";

pub struct HttpComputeProvider {
    endpoint: String,
    project: Option<String>,
    token: Option<SecretString>,
    client: Client,
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    #[serde(flatten)]
    request: &'a ComputeRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    #[serde(alias = "id", alias = "handle")]
    task_id: String,
    #[serde(alias = "location", alias = "uri")]
    destination: String,
}

#[derive(Deserialize)]
struct ThumbnailResponse {
    url: String,
}

#[derive(Deserialize)]
struct StatisticResponse {
    values: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    state: String,
    #[serde(default, alias = "error_message")]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpComputeProvider {
    pub fn new(
        endpoint: impl Into<String>,
        project: Option<String>,
        token: Option<SecretString>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project,
            token,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token.expose_secret());
        }
        req
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &ComputeRequest,
    ) -> Result<T, RemoteError> {
        debug!(path, deliverable = %request.deliverable, "POST to compute gateway");
        let body = Envelope {
            project: self.project.as_deref(),
            request,
        };
        let response = self
            .request(Method::POST, path)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(response, None).await
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(error.to_string())
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    handle: Option<&JobHandle>,
) -> Result<T, RemoteError> {
    let status = response.status();
    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, handle))
    }
}

/// Maps a non-success HTTP status to the remote error taxonomy.
fn classify_failure(status: StatusCode, body: &str, handle: Option<&JobHandle>) -> RemoteError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.as_deref());
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if code == Some("invalid_region") =>
        {
            RemoteError::InvalidRegion(message)
        }
        StatusCode::NOT_FOUND => match handle {
            Some(handle) => RemoteError::UnknownJob(handle.to_string()),
            None => RemoteError::UnexpectedResponse(format!("{}: {}", status, message)),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            RemoteError::Unavailable(format!("{}: {}", status, message))
        }
        s if s.is_server_error() => RemoteError::Unavailable(format!("{}: {}", status, message)),
        _ => RemoteError::UnexpectedResponse(format!("{}: {}", status, message)),
    }
}

fn task_status_from(response: TaskResponse) -> Result<TaskStatus, RemoteError> {
    let state = JobState::from_remote(&response.state).ok_or_else(|| {
        RemoteError::UnexpectedResponse(format!("unknown task state '{}'", response.state))
    })?;
    let detail = match state {
        JobState::Failed | JobState::Cancelled => Some(
            response
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
        ),
        _ => response.error_message,
    };
    Ok(TaskStatus { state, detail })
}

#[async_trait]
impl ComputeProvider for HttpComputeProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit_export(&self, request: &ComputeRequest) -> Result<ExportTicket, RemoteError> {
        let response: ExportResponse = self.post("/exports", request).await?;
        Ok(ExportTicket {
            handle: JobHandle::new(response.task_id),
            location: response.destination,
        })
    }

    async fn get_thumbnail(&self, request: &ComputeRequest) -> Result<String, RemoteError> {
        let response: ThumbnailResponse = self.post("/thumbnails", request).await?;
        Ok(response.url)
    }

    async fn compute_statistic(
        &self,
        request: &ComputeRequest,
    ) -> Result<StatisticValue, RemoteError> {
        let response: StatisticResponse = self.post("/statistics", request).await?;
        Ok(StatisticValue(response.values))
    }

    async fn task_status(&self, handle: &JobHandle) -> Result<TaskStatus, RemoteError> {
        let response = self
            .request(Method::GET, &format!("/tasks/{}", handle))
            .send()
            .await
            .map_err(transport_error)?;
        let body: TaskResponse = handle_response(response, Some(handle)).await?;
        task_status_from(body)
    }
}
