use futures::future::join_all;
use mockito::{Matcher, Server as MockServer};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use webhookrelay_domain::{
    DispatchOutcome, Event, EventData, EventRecord, RequestMethod, WebhookClient, WebhookConfig,
};
use webhookrelay_event::{dispatcher::Dispatcher, mock::mock_settings_store::MockSettingsStore};

fn dispatcher(config: WebhookConfig) -> Dispatcher {
    let client = WebhookClient::new(Duration::from_secs(5)).expect("Failed to build client");

    Dispatcher::with_config(
        Arc::new(client),
        Arc::new(MockSettingsStore::new(config.clone())),
        config,
    )
}

#[derive(Debug)]
struct TransferInfo {
    path: String,
    file_count: u64,
}

impl EventRecord for TransferInfo {
    fn fields(&self) -> Option<Vec<(String, EventData)>> {
        Some(vec![
            ("path".to_string(), EventData::from(self.path.as_str())),
            ("file_count".to_string(), EventData::from(self.file_count)),
        ])
    }

    fn describe(&self) -> String {
        format!("TransferInfo({})", self.path)
    }
}

#[tokio::test]
async fn test_default_mode_posts_type_and_normalized_data() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", "/hook")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "type": "download.completed",
            "data": { "name": "foo", "size": 42 }
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let url = mock_server.url() + "/hook";
    let dispatcher = dispatcher(WebhookConfig::new(&url, RequestMethod::Post));

    let outcome = dispatcher
        .handle(Event::new(
            "download.completed",
            json!({ "name": "foo", "size": 42 }),
        ))
        .await;

    assert_eq!(outcome, DispatchOutcome::Delivered { url });
    mock.assert_async().await;
}

#[tokio::test]
async fn test_records_in_event_data_are_expanded() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(json!({
            "type": "transfer.complete",
            "data": {
                "transfer": { "path": "/media/movies", "file_count": 3 },
                "tags": ["4k"]
            }
        })))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(WebhookConfig::new(
        mock_server.url() + "/hook",
        RequestMethod::Post,
    ));

    let data: EventData = vec![
        (
            "transfer".to_string(),
            EventData::record(TransferInfo {
                path: "/media/movies".to_string(),
                file_count: 3,
            }),
        ),
        (
            "tags".to_string(),
            EventData::Set(vec![EventData::from("4k"), EventData::from("4k")]),
        ),
    ]
    .into_iter()
    .collect();

    let outcome = dispatcher.handle(Event::new("transfer.complete", data)).await;

    assert!(outcome.is_delivered());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_template_mode_sends_rendered_body() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(json!({ "kind": "ping", "payload": { "ok": true } })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(
        WebhookConfig::new(mock_server.url() + "/hook", RequestMethod::Post)
            .with_template(r#"{"kind": "${type}", "payload": ${data}}"#),
    );

    let outcome = dispatcher
        .handle(Event::new("ping", r#"{"ok": true}"#))
        .await;

    assert!(outcome.is_delivered());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_template_makes_no_request() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher(
        WebhookConfig::new(mock_server.url() + "/hook", RequestMethod::Post)
            .with_template(r#"{"kind": ${type"#),
    );

    let outcome = dispatcher.handle(Event::new("ping", EventData::Null)).await;

    match outcome {
        DispatchOutcome::BuildFailed(e) => assert!(e.is_template_substitution()),
        other => panic!("Unexpected outcome {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_disabled_or_unset_url_makes_no_request() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let disabled = WebhookConfig::new(mock_server.url() + "/hook", RequestMethod::Post).disabled();
    let event = Event::new("download.completed", json!({ "name": "foo" }));

    assert!(dispatcher(disabled).handle(event.clone()).await.is_skipped());
    assert!(dispatcher(WebhookConfig::new("", RequestMethod::Post))
        .handle(event)
        .await
        .is_skipped());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_sends_query_params_and_no_body() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("GET", "/hook")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "download.completed".into()),
            Matcher::UrlEncoded("data".into(), r#"{"name":"foo","size":42}"#.into()),
        ]))
        .match_body(Matcher::Missing)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(WebhookConfig::new(
        mock_server.url() + "/hook",
        RequestMethod::Get,
    ));

    let outcome = dispatcher
        .handle(Event::new(
            "download.completed",
            json!({ "name": "foo", "size": 42 }),
        ))
        .await;

    assert!(outcome.is_delivered());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_rejected_without_retry() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", "/hook")
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(WebhookConfig::new(
        mock_server.url() + "/hook",
        RequestMethod::Post,
    ));

    let outcome = dispatcher.handle(Event::new("ping", EventData::Null)).await;

    assert_eq!(
        outcome,
        DispatchOutcome::RemoteRejected {
            status: 500,
            body: "boom".to_string(),
            reason: Some("Internal Server Error".to_string()),
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_destination_is_transport_failed() {
    let dispatcher = dispatcher(WebhookConfig::new(
        "http://127.0.0.1:1/hook",
        RequestMethod::Post,
    ));

    let outcome = dispatcher.handle(Event::new("ping", EventData::Null)).await;

    assert_eq!(outcome, DispatchOutcome::TransportFailed);
}

#[tokio::test]
async fn test_malformed_url_is_transport_failed() {
    let dispatcher = dispatcher(WebhookConfig::new("not a url", RequestMethod::Post));

    let outcome = dispatcher.handle(Event::new("ping", EventData::Null)).await;

    assert_eq!(outcome, DispatchOutcome::TransportFailed);
}

#[tokio::test]
async fn test_concurrent_events_are_each_delivered_once() {
    let mut mock_server = MockServer::new_async().await;

    let mock = mock_server
        .mock("POST", "/hook")
        .with_status(204)
        .expect(10)
        .create_async()
        .await;

    let dispatcher = Arc::new(dispatcher(WebhookConfig::new(
        mock_server.url() + "/hook",
        RequestMethod::Post,
    )));

    let outcomes = join_all((0..10i64).map(|i| {
        let dispatcher = dispatcher.clone();
        async move { dispatcher.handle(Event::new("tick", i)).await }
    }))
    .await;

    assert!(outcomes.iter().all(DispatchOutcome::is_delivered));
    mock.assert_async().await;
}
