use std::time::Duration;

use inbox_webhooks::{HttpWebhookClient, WebhookError, WebhookRpc};
use mockito::Matcher;
use serde_json::json;

fn client(url: &str) -> HttpWebhookClient {
    HttpWebhookClient::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_register_hook_posts_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks")
        .match_body(Matcher::PartialJson(json!({
            "namespace_id": "ns1",
            "parameters": { "callback_url": "https://example.com/cb" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"object":"webhook","id":"hook1","active":true}"#)
        .create_async()
        .await;

    let result = client(&server.url())
        .register_hook("ns1", json!({ "callback_url": "https://example.com/cb" }))
        .await
        .unwrap();

    assert_eq!(result["id"], "hook1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejection_is_remote_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks")
        .with_status(400)
        .with_body("bad filters")
        .create_async()
        .await;

    let err = client(&server.url())
        .register_hook("ns1", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, WebhookError::Remote(ref body) if body.contains("bad filters")));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_start_and_stop_paths() {
    let mut server = mockito::Server::new_async().await;
    let start = server
        .mock("POST", "/hooks/hook1/start")
        .with_status(200)
        .create_async()
        .await;
    let stop = server
        .mock("POST", "/hooks/hook1/stop")
        .with_status(404)
        .create_async()
        .await;

    // trailing slash on the base url is tolerated
    let client = client(&format!("{}/", server.url()));
    client.start_hook("hook1").await.unwrap();
    assert!(client.stop_hook("hook1").await.unwrap_err().is_remote());

    start.assert_async().await;
    stop.assert_async().await;
}
