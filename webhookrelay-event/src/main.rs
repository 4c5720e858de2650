use anyhow::{Context, Result};
use dotenvy::dotenv;
use envconfig::Envconfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use webhookrelay_domain::telemetry::{get_subscriber, init_subscriber};
use webhookrelay_event::{config::RelayConfig, server::Server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("webhookrelay-event".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let config = RelayConfig::init_from_env()?;

    info!("Starting webhookrelay-event with config:\n{config}");

    if let Some(metrics_address) = config.metrics_address {
        PrometheusBuilder::new()
            .with_http_listener(metrics_address)
            .install()
            .with_context(|| "failed to install prometheus server")?;

        webhookrelay_event::metrics::describe();
    }

    let server = Server::init(config).await?;

    server.run().await
}
