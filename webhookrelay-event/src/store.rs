use async_trait::async_trait;
use envconfig::Envconfig;
use std::{path::PathBuf, sync::Arc};
use webhookrelay_domain::{InternalError, RelayError, WebhookConfig, WebhookSettingsConfig};

/// Source of the persisted webhook settings.
#[async_trait]
pub trait SettingsStore {
    async fn load(&self) -> Result<WebhookConfig, RelayError>;
}

/// Settings persisted as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<WebhookConfig, RelayError> {
        let settings = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            InternalError::io_err(
                &format!("Could not read {}: {e}", self.path.display()),
                Some("settings"),
            )
        })?;

        WebhookConfig::from_json(&settings)
    }
}

/// Settings read from the `WEBHOOK_*` environment variables on every load.
#[derive(Debug, Clone, Default)]
pub struct EnvSettingsStore;

#[async_trait]
impl SettingsStore for EnvSettingsStore {
    async fn load(&self) -> Result<WebhookConfig, RelayError> {
        let settings = WebhookSettingsConfig::init_from_env()
            .map_err(|e| InternalError::configuration_error(&e.to_string(), Some("settings")))?;

        Ok(WebhookConfig::from(&settings))
    }
}

pub fn settings_store(settings: &WebhookSettingsConfig) -> Arc<dyn SettingsStore + Send + Sync> {
    match &settings.settings_path {
        Some(path) => Arc::new(FileSettingsStore::new(path)),
        None => Arc::new(EnvSettingsStore),
    }
}
