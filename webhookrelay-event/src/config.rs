use envconfig::Envconfig;
use std::{
    fmt::{Display, Formatter},
    net::SocketAddr,
};
use webhookrelay_domain::WebhookSettingsConfig;

#[derive(Envconfig, Clone)] // Intentionally no Debug so the webhook URL is not printed
pub struct RelayConfig {
    #[envconfig(from = "INTERNAL_SERVER_ADDRESS", default = "0.0.0.0:3005")]
    pub address: SocketAddr,
    #[envconfig(from = "API_VERSION", default = "v1")]
    pub api_version: String,
    #[envconfig(from = "HTTP_CLIENT_TIMEOUT_SECS", default = "30")]
    pub http_client_timeout_secs: u64,
    #[envconfig(from = "METRICS_SERVER_ADDRESS")]
    pub metrics_address: Option<SocketAddr>,
    #[envconfig(nested = true)]
    pub webhook: WebhookSettingsConfig,
}

impl Display for RelayConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "INTERNAL_SERVER_ADDRESS: {}", self.address)?;
        writeln!(f, "API_VERSION: {}", self.api_version)?;
        writeln!(
            f,
            "HTTP_CLIENT_TIMEOUT_SECS: {}",
            self.http_client_timeout_secs
        )?;
        if let Some(metrics_address) = &self.metrics_address {
            writeln!(f, "METRICS_SERVER_ADDRESS: {metrics_address}")?;
        }
        write!(f, "{}", self.webhook)
    }
}
