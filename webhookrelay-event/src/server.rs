use crate::{config::RelayConfig, dispatcher::Dispatcher, router, store::settings_store};
use anyhow::Result as AnyhowResult;
use axum::Router;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use webhookrelay_domain::WebhookClient;

pub struct AppState {
    pub config: RelayConfig,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Clone)]
pub struct Server {
    pub state: Arc<AppState>,
}

impl Server {
    pub async fn init(config: RelayConfig) -> AnyhowResult<Self> {
        let client = WebhookClient::new(Duration::from_secs(config.http_client_timeout_secs))?;
        let dispatcher = Dispatcher::new(Arc::new(client), settings_store(&config.webhook)).await?;

        Ok(Self::new(config, Arc::new(dispatcher)))
    }

    pub fn new(config: RelayConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: Arc::new(AppState { config, dispatcher }),
        }
    }

    pub async fn run(&self) -> AnyhowResult<()> {
        let app = router::get_router(&self.state);

        let app: Router<()> = app.with_state(self.state.clone());

        tracing::info!("Relay server listening on {}", self.state.config.address);

        let tcp_listener = TcpListener::bind(&self.state.config.address).await?;

        axum::serve(tcp_listener, app.into_make_service())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))
    }
}
