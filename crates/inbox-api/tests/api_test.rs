use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use inbox_api::{build_router, config::Config, error::ApiError, state::AppState};
use inbox_persist::{Address, MemoryPersistenceClient, NewMessage, PersistenceClient};
use inbox_webhooks::LocalWebhookRegistry;

struct TestApp {
    router: Router,
    persist: Arc<dyn PersistenceClient>,
    ns: String,
}

impl TestApp {
    async fn new() -> Self {
        let persist: Arc<dyn PersistenceClient> = Arc::new(MemoryPersistenceClient::new());
        let namespace = persist
            .create_namespace("account-1", "ben@example.com", "gmail")
            .await
            .unwrap();
        let webhooks = Arc::new(LocalWebhookRegistry::new(persist.clone()));
        let state = Arc::new(AppState::new(Config::default(), persist.clone(), webhooks));

        Self {
            router: build_router(state),
            persist,
            ns: namespace.id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("/n/{}{}", self.ns, path)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(self.url(path));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let (status, bytes) = self.send(builder.body(body).unwrap()).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, path, Some(body)).await
    }

    async fn ingest(&self, sender: &str, subject: &str) -> inbox_persist::Message {
        self.persist
            .ingest_message(
                &self.ns,
                NewMessage {
                    subject: Some(subject.to_string()),
                    from: vec![Address::new(Some("Sender"), sender)],
                    to: vec![Address::new(None, "ben@example.com")],
                    body: format!("About {}", subject),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }
}

fn message_of(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_api_error_response() {
    let response = ApiError::BadRequest("Test error".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "message": "Test error", "type": "api_error" }));
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["type"], "api_error");
}

#[tokio::test]
async fn test_framework_errors_use_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::PATCH, "/tags/", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["type"], "api_error");

    let (status, body) = app.post("/files/", json!({ "file": "notes.txt" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "api_error");
    assert!(!message_of(&body).is_empty());
}

#[tokio::test]
async fn test_namespace_lookup() {
    let app = TestApp::new().await;

    let (status, body) = app.get("").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], app.ns.as_str());
    assert_eq!(body["email_address"], "ben@example.com");

    let request = Request::builder()
        .uri("/n/doesnotexist/tags/")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(message_of(&body).contains("Couldn't find namespace with id `doesnotexist`"));
}

#[tokio::test]
async fn test_paging_parameters_are_validated() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/threads/?limit=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "limit and offset parameters must be integers");

    let (status, _) = app.get("/threads/?offset=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/threads/?limit=1001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "cannot request more than 1000 resources at once.");
}

#[tokio::test]
async fn test_tags() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/tags/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 15);

    let (status, body) = app.post("/tags/", json!({ "name": "receipts" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "receipts");

    let (status, body) = app.post("/tags/", json!({ "name": "receipts" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(message_of(&body), "Tag name not available");

    let (status, _) = app.post("/tags/", json!({ "name": "inbox" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.post("/tags/", json!({ "name": "x", "color": "red" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Malformed tag request");

    let (status, body) = app.post("/tags/", json!({ "name": "a".repeat(192) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Tag name is too long.");
}

#[tokio::test]
async fn test_threads_filter_and_tag_updates() {
    let app = TestApp::new().await;
    let lunch = app.ingest("alice@example.com", "Lunch").await;
    app.ingest("carol@example.com", "Invoice").await;

    let (status, body) = app.get("/threads/?from=alice@example.com").await;
    assert_eq!(status, StatusCode::OK);
    let threads = body.as_array().unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], lunch.thread_id.as_str());

    let (status, body) = app.get("/threads/?tag=inbox").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let path = format!("/threads/{}", lunch.thread_id);
    let (status, body) = app
        .put(&path, json!({ "add_tags": ["starred"], "remove_tags": ["inbox"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"starred"));
    assert!(!names.contains(&"inbox"));

    let (status, body) = app.put(&path, json!({ "add_tags": ["sending"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Cannot add tag sending");

    let (status, _) = app.put(&path, json!({ "add_tags": ["nope"] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // An unknown tag rejects the whole update, removals included
    let (status, _) = app
        .put(&path, json!({ "remove_tags": ["starred"], "add_tags": ["nope"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.get(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["name"] == "starred"));

    let (status, body) = app.put(&path, json!({ "subject": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Can only add or remove tags from thread.");

    let (status, _) = app.get("/threads/doesnotexist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(message_of(&body), "API endpoint not yet implemented.");
}

#[tokio::test]
async fn test_message_unread_toggle() {
    let app = TestApp::new().await;
    let message = app.ingest("alice@example.com", "Lunch").await;
    let path = format!("/messages/{}", message.id);

    let (status, body) = app.get(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], true);

    let (status, body) = app.put(&path, json!({ "unread": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], false);

    let (_, thread) = app.get(&format!("/threads/{}", message.thread_id)).await;
    assert!(thread["tags"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["name"] != "unread"));

    let (status, body) = app.put(&path, json!({ "unread": "no" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Can only change the unread attribute of a message");

    let (status, _) = app.get("/messages/doesnotexist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contacts() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/contacts/", json!({ "name": "Alice Liddell", "email": "alice@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/contacts/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, body) = app.post("/contacts/", json!({ "name": null })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Contact name and email cannot both be null.");

    let (status, body) = app.get("/contacts/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.get("/contacts/?filter=alice&order_by=rank").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], id.as_str());

    let (status, _) = app.put(&format!("/contacts/{}", id), json!({})).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_file_upload_and_download() {
    let app = TestApp::new().await;

    let boundary = "XBOUNDARYX";
    let multipart = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello world\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(app.url("/files/"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart))
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let file = &body[0];
    assert_eq!(file["filename"], "notes.txt");
    assert_eq!(file["size"], 11);
    let id = file["id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/files/?filename=notes.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .uri(app.url(&format!("/files/{}/download", id)))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=notes.txt"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello world");

    let (status, _) = app.get("/files/doesnotexist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_draft_revisions_and_send() {
    let app = TestApp::new().await;

    let (status, draft) = app
        .post(
            "/drafts/",
            json!({ "subject": "Plans", "body": "First pass", "to": ["alice@example.com"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["state"], "draft");
    let first_id = draft["id"].as_str().unwrap().to_string();

    let (status, revised) = app
        .post(&format!("/drafts/{}", first_id), json!({ "body": "Second pass" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revised["subject"], "Plans");
    assert_eq!(revised["body"], "Second pass");
    let second_id = revised["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(&format!("/drafts/{}", first_id), json!({ "body": "Stale" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(message_of(&body).contains(&second_id));

    let (status, body) = app.get("/drafts/").await;
    assert_eq!(status, StatusCode::OK);
    let drafts = body.as_array().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0]["id"], second_id.as_str());

    let (status, body) = app.post("/drafts/", json!({ "tags": ["nope"] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message_of(&body), "Invalid tag public id nope");

    let (status, sent) = app.post("/send", json!({ "draft_id": second_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["state"], "sending");
    assert_eq!(sent["id"], second_id.as_str());
}

#[tokio::test]
async fn test_send_validation_and_direct_send() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/send", json!({ "subject": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Must specify either draft id or message recipients.");

    let (_, draft) = app.post("/drafts/", json!({ "subject": "Nobody" })).await;
    let (status, body) = app
        .post("/send", json!({ "draft_id": draft["id"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "No 'to:' recipients_specified");

    let (status, _) = app.post("/send", json!({ "draft_id": "doesnotexist" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, sent) = app
        .post(
            "/send",
            json!({ "to": [{ "name": "Alice", "email": "alice@example.com" }], "subject": "Now" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["state"], "sending");
    assert_eq!(sent["to"][0]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_delete_draft() {
    let app = TestApp::new().await;

    let (_, draft) = app.post("/drafts/", json!({ "subject": "Scratch" })).await;
    let path = format!("/drafts/{}", draft["id"].as_str().unwrap());

    let (status, body) = app.call(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], draft["id"]);

    let (status, _) = app.get(&path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_events_and_stamps() {
    let app = TestApp::new().await;
    app.ingest("alice@example.com", "Lunch").await;

    let (status, body) = app.get("/sync/events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "No stamp parameter in sync request.");

    let (status, body) = app.get("/sync/events?stamp=0&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Invalid limit parameter");

    let (status, body) = app.get("/sync/events?stamp=bogus").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message_of(&body), "Invalid stamp parameter");

    let (status, body) = app.get("/sync/events?stamp=0&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["events"][0]["object"], "namespace");
    assert_eq!(body["events"][0]["event"], "create");
    let stamp = body["stamp_end"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/sync/events?stamp={}", stamp)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_u64().unwrap() >= 2);

    let now = chrono::Utc::now().timestamp() + 60;
    let (status, body) = app.post("/sync/generate_stamp", json!({ "start": now })).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["stamp"], "0");

    let (status, body) = app.post("/sync/generate_stamp", json!({ "start": 0 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stamp"], "0");

    let (status, _) = app
        .post("/sync/generate_stamp", json!({ "start": "yesterday" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sync_attributes_match_resource() {
    let app = TestApp::new().await;
    let lunch = app.ingest("alice@example.com", "Lunch").await;

    let (status, body) = app.get("/sync/events?stamp=0").await;
    assert_eq!(status, StatusCode::OK);
    let event = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["object"] == "message" && e["id"] == lunch.id.as_str())
        .unwrap()
        .clone();

    let (status, message) = app.get(&format!("/messages/{}", lunch.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["attributes"], message);
    assert!(event["attributes"].get("is_read").is_none());
    assert!(event["attributes"].get("created_at").is_none());
}

#[tokio::test]
async fn test_webhooks() {
    let app = TestApp::new().await;

    let (status, hook) = app
        .post(
            "/webhooks/",
            json!({ "callback_url": "https://example.com/hook", "include_body": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hook["active"], true);
    let path = format!("/webhooks/{}", hook["id"].as_str().unwrap());

    let (status, body) = app.put(&path, json!({ "active": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.get(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, body) = app.get("/webhooks/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.post("/webhooks/", json!({ "callback_url": "ftp://x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message_of(&body), "Malformed webhook request");

    let (status, _) = app.put(&path, json!({ "active": "yes" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.put("/webhooks/doesnotexist", json!({ "active": true })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_event_lookup_not_implemented() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/events/anything").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}
