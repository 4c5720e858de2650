use crate::store::SettingsStore;
use async_trait::async_trait;
use tokio::sync::Mutex;
use webhookrelay_domain::{RelayError, WebhookConfig};

/// In-memory settings whose next `load` returns whatever was last `set`.
#[derive(Debug, Default)]
pub struct MockSettingsStore {
    config: Mutex<WebhookConfig>,
}

impl MockSettingsStore {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    pub async fn set(&self, config: WebhookConfig) {
        *self.config.lock().await = config;
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn load(&self) -> Result<WebhookConfig, RelayError> {
        Ok(self.config.lock().await.clone())
    }
}
