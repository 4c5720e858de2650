use crate::{
    metrics::{DISPATCH_LATENCY_HISTOGRAM, DISPATCH_OUTCOMES_COUNTER, OUTCOME_LABEL},
    store::SettingsStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, error, info};
use webhookrelay_domain::{
    BodyTemplate, DispatchOutcome, Event, NormalizeExt, RelayError, TemplateExt, WebhookConfig,
    WebhookRequest, WebhookTransport,
};

/// Single entry point the host event bus calls for every event.
///
/// The active settings live behind an `Arc` snapshot. A dispatch clones the
/// snapshot once up front, so a concurrent `reload` never changes the settings
/// of a delivery already in flight.
pub struct Dispatcher {
    transport: Arc<dyn WebhookTransport>,
    settings_store: Arc<dyn SettingsStore + Send + Sync>,
    template: BodyTemplate,
    config: RwLock<Arc<WebhookConfig>>,
}

impl Dispatcher {
    pub async fn new(
        transport: Arc<dyn WebhookTransport>,
        settings_store: Arc<dyn SettingsStore + Send + Sync>,
    ) -> Result<Self, RelayError> {
        let config = settings_store.load().await?;

        Ok(Self::with_config(transport, settings_store, config))
    }

    pub fn with_config(
        transport: Arc<dyn WebhookTransport>,
        settings_store: Arc<dyn SettingsStore + Send + Sync>,
        config: WebhookConfig,
    ) -> Self {
        Self {
            transport,
            settings_store,
            template: BodyTemplate::default(),
            config: RwLock::new(Arc::new(config)),
        }
    }

    pub async fn current(&self) -> Arc<WebhookConfig> {
        self.config.read().await.clone()
    }

    /// Replaces the active settings with a fresh load from the settings store.
    /// On failure the previous settings stay in place.
    pub async fn reload(&self) -> Result<Arc<WebhookConfig>, RelayError> {
        let config = Arc::new(self.settings_store.load().await?);

        *self.config.write().await = config.clone();
        info!("Webhook settings reloaded:\n{config}");

        Ok(config)
    }

    /// Dispatches against the current settings, then logs and records the
    /// outcome. Failures end here and are never returned to the caller.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn handle(&self, event: Event) -> DispatchOutcome {
        let time = Instant::now();
        let config = self.current().await;

        let outcome = self.dispatch(&config, &event).await;

        match &outcome {
            DispatchOutcome::Skipped => debug!("Webhook disabled or not configured, skipping"),
            DispatchOutcome::BuildFailed(e) => error!("Could not build webhook payload: {e}"),
            DispatchOutcome::Delivered { url } => info!(url = %url, "Webhook delivered"),
            DispatchOutcome::RemoteRejected {
                status,
                body,
                reason,
            } => error!(
                status = status,
                body = %body,
                reason = reason.as_deref().unwrap_or_default(),
                "Webhook rejected by destination"
            ),
            DispatchOutcome::TransportFailed => error!("Webhook delivery failed: no response"),
        }

        let elapsed = Instant::now() - time;
        metrics::increment_counter!(DISPATCH_OUTCOMES_COUNTER, OUTCOME_LABEL => outcome.as_ref().to_string());
        metrics::histogram!(DISPATCH_LATENCY_HISTOGRAM, elapsed, OUTCOME_LABEL => outcome.as_ref().to_string());

        outcome
    }

    /// One delivery attempt for one event. Never retries.
    pub async fn dispatch(&self, config: &WebhookConfig, event: &Event) -> DispatchOutcome {
        if !config.is_active() {
            return DispatchOutcome::Skipped;
        }

        let request = match self
            .build_payload(config, event)
            .and_then(|payload| WebhookRequest::build(config, payload))
        {
            Ok(request) => request,
            Err(e) => return DispatchOutcome::BuildFailed(e),
        };

        debug!("Sending {} request to destination", request.method());

        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => DispatchOutcome::Delivered { url: request.url },
            Ok(response) => DispatchOutcome::RemoteRejected {
                status: response.status,
                body: response.body,
                reason: response.reason,
            },
            Err(e) => {
                debug!("Transport error: {e}");
                DispatchOutcome::TransportFailed
            }
        }
    }

    /// The body a dispatch would send: the rendered template when one is
    /// configured, `{"type", "data"}` with normalized data otherwise.
    pub fn build_payload(&self, config: &WebhookConfig, event: &Event) -> Result<Value, RelayError> {
        match config.template() {
            Some(template) => self.template.render_as_json(template, event),
            None => Ok(json!({
                "type": event.event_type,
                "data": event.event_data.normalize()?,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_settings_store::MockSettingsStore, mock_transport::MockTransport};
    use webhookrelay_domain::{EventData, RequestMethod, WebhookBody};

    fn dispatcher(transport: Arc<MockTransport>, config: WebhookConfig) -> Dispatcher {
        Dispatcher::with_config(
            transport,
            Arc::new(MockSettingsStore::new(config.clone())),
            config,
        )
    }

    #[tokio::test]
    async fn test_default_payload() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Post);
        let dispatcher = dispatcher(transport.clone(), config.clone());

        let event = Event::new(
            "download.completed",
            json!({ "name": "foo", "size": 42 }),
        );

        let outcome = dispatcher.dispatch(&config, &event).await;

        assert!(outcome.is_delivered());
        assert_eq!(
            transport.requests().await,
            vec![WebhookRequest {
                url: "http://localhost/hook".to_string(),
                body: WebhookBody::Json(json!({
                    "type": "download.completed",
                    "data": { "name": "foo", "size": 42 }
                })),
            }]
        );
    }

    #[tokio::test]
    async fn test_inactive_config_never_calls_transport() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let enabled = WebhookConfig::new("http://localhost/hook", RequestMethod::Post);
        let dispatcher = dispatcher(transport.clone(), enabled.clone());
        let event = Event::new("ping", EventData::Null);

        for config in [enabled.disabled(), WebhookConfig::new("", RequestMethod::Get)] {
            assert_eq!(
                dispatcher.dispatch(&config, &event).await,
                DispatchOutcome::Skipped
            );
        }

        assert_eq!(transport.calls().await, 0);
    }

    #[tokio::test]
    async fn test_template_parse_failure_is_a_build_failure() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Post)
            .with_template(r#"{"payload": ${data}"#);
        let dispatcher = dispatcher(transport.clone(), config.clone());

        let outcome = dispatcher
            .dispatch(&config, &Event::new("ping", r#"{"ok": true}"#))
            .await;

        match outcome {
            DispatchOutcome::BuildFailed(e) => assert!(e.is_template_substitution()),
            other => panic!("Unexpected outcome {other:?}"),
        }
        assert_eq!(transport.calls().await, 0);
    }

    #[tokio::test]
    async fn test_template_with_brace_sequences_is_delivered_as_written() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Post)
            .with_template(r#"{"note": "\\{{x}}", "raw": "{{{{x}}}}", "kind": "${type}"}"#);
        let dispatcher = dispatcher(transport.clone(), config.clone());

        let outcome = dispatcher
            .dispatch(&config, &Event::new("ping", EventData::Null))
            .await;

        assert!(outcome.is_delivered());
        assert_eq!(
            transport.requests().await[0].body,
            WebhookBody::Json(json!({ "note": "\\{{x}}", "raw": "{{{{x}}}}", "kind": "ping" }))
        );
    }

    #[tokio::test]
    async fn test_get_with_non_object_template_is_a_build_failure() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Get)
            .with_template(r#"["${type}"]"#);
        let dispatcher = dispatcher(transport.clone(), config.clone());

        let outcome = dispatcher
            .dispatch(&config, &Event::new("ping", EventData::Null))
            .await;

        assert!(matches!(outcome, DispatchOutcome::BuildFailed(_)));
        assert_eq!(transport.calls().await, 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_transport_failed() {
        let transport = Arc::new(MockTransport::unreachable());
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Post);
        let dispatcher = dispatcher(transport.clone(), config.clone());

        let outcome = dispatcher.handle(Event::new("ping", EventData::Null)).await;

        assert_eq!(outcome, DispatchOutcome::TransportFailed);
        assert_eq!(transport.calls().await, 1);
    }

    #[tokio::test]
    async fn test_redirect_statuses_count_as_delivered() {
        let transport = Arc::new(MockTransport::responding(302, ""));
        let config = WebhookConfig::new("http://localhost/hook", RequestMethod::Post);
        let dispatcher = dispatcher(transport, config.clone());

        let outcome = dispatcher
            .dispatch(&config, &Event::new("ping", EventData::Null))
            .await;

        assert!(outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot_without_touching_held_one() {
        let transport = Arc::new(MockTransport::responding(200, "ok"));
        let initial = WebhookConfig::new("http://localhost/a", RequestMethod::Post);
        let store = Arc::new(MockSettingsStore::new(initial.clone()));
        let dispatcher = Dispatcher::with_config(transport, store.clone(), initial);

        let held = dispatcher.current().await;
        store
            .set(WebhookConfig::new("http://localhost/b", RequestMethod::Get).disabled())
            .await;

        let reloaded = dispatcher.reload().await.expect("Failed to reload");

        assert_eq!(held.webhook_url, "http://localhost/a");
        assert!(held.is_active());
        assert_eq!(reloaded.webhook_url, "http://localhost/b");
        assert!(!dispatcher.current().await.is_active());
    }
}
