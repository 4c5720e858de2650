use async_trait::async_trait;
use tokio::sync::Mutex;
use webhookrelay_domain::{
    InternalError, RelayError, WebhookRequest, WebhookResponse, WebhookTransport,
};

/// Records every request and answers with a fixed response, or with a
/// connection error when no response is configured.
#[derive(Debug, Default)]
pub struct MockTransport {
    response: Option<WebhookResponse>,
    requests: Mutex<Vec<WebhookRequest>>,
}

impl MockTransport {
    pub fn responding(status: u16, body: &str) -> Self {
        Self {
            response: Some(WebhookResponse {
                status,
                body: body.to_string(),
                reason: None,
            }),
            requests: Mutex::default(),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub async fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse, RelayError> {
        self.requests.lock().await.push(request.clone());

        self.response
            .clone()
            .ok_or_else(|| InternalError::connection_error("Connection refused", Some("mock")))
    }
}
