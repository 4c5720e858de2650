use crate::{InternalError, RelayError, RequestMethod, WebhookConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// How the payload travels to the destination.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookBody {
    Json(Value),
    Query(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub url: String,
    pub body: WebhookBody,
}

impl WebhookRequest {
    pub fn build(config: &WebhookConfig, payload: Value) -> Result<Self, RelayError> {
        let body = match config.method {
            RequestMethod::Post => WebhookBody::Json(payload),
            RequestMethod::Get => WebhookBody::Query(query_params(&payload)?),
        };

        Ok(Self {
            url: config.webhook_url.clone(),
            body,
        })
    }

    pub fn method(&self) -> RequestMethod {
        match self.body {
            WebhookBody::Json(_) => RequestMethod::Post,
            WebhookBody::Query(_) => RequestMethod::Get,
        }
    }
}

/// Flattens the top level of a payload into query parameters.
///
/// Strings are passed verbatim, other scalars and nested values as their JSON
/// text, and nulls are left out.
pub fn query_params(payload: &Value) -> Result<Vec<(String, String)>, RelayError> {
    let Value::Object(map) = payload else {
        return Err(InternalError::invalid_argument(
            "GET payload must be a JSON object",
            Some("query_params"),
        ));
    };

    Ok(map
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key.clone(), s.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
    pub reason: Option<String>,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Performs one request. `Err` means no response was obtained at all.
    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse, RelayError>;
}

#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            InternalError::configuration_error(&e.to_string(), Some("http_client"))
        })?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for WebhookClient {
    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse, RelayError> {
        let request_builder = match &request.body {
            WebhookBody::Json(payload) => self.client.post(&request.url).json(payload),
            WebhookBody::Query(params) => self.client.get(&request.url).query(params),
        };

        let response = request_builder.send().await.map_err(|e| {
            InternalError::connection_error(&e.to_string(), Some("webhook"))
        })?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Failed to read webhook response body: {e}");
                String::new()
            }
        };

        Ok(WebhookResponse {
            status: status.as_u16(),
            body,
            reason: status.canonical_reason().map(str::to_string),
        })
    }
}
