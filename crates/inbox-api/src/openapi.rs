use axum::Json;
use utoipa::OpenApi;

use crate::encoding::{
    AddressView, ContactView, DraftView, EventView, FileView, MessageView, NamespaceView,
    StampView, SuccessView, SyncEventsView, TagRefView, TagView, ThreadView,
};
use crate::routes::{
    contacts, drafts, files, home, messages, namespace, sync, tags, threads, webhooks,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Inbox API", description = "Per-namespace REST API over synced mail"),
    paths(
        home::health_check,
        namespace::read_namespace,
        tags::list_tags,
        tags::create_tag,
        threads::list_threads,
        threads::get_thread,
        threads::update_thread,
        messages::list_messages,
        messages::get_message,
        messages::update_message,
        contacts::list_contacts,
        contacts::create_contact,
        contacts::get_contact,
        files::list_files,
        files::get_file,
        files::upload_files,
        files::download_file,
        webhooks::list_webhooks,
        webhooks::create_webhook,
        webhooks::get_webhook,
        webhooks::update_webhook,
        drafts::list_drafts,
        drafts::get_draft,
        drafts::create_draft,
        drafts::update_draft,
        drafts::delete_draft,
        drafts::send,
        sync::sync_events,
        sync::generate_stamp,
    ),
    components(schemas(
        home::HealthResponse,
        tags::CreateTagRequest,
        threads::UpdateThreadRequest,
        messages::UpdateMessageRequest,
        contacts::CreateContactRequest,
        sync::GenerateStampRequest,
        AddressView,
        NamespaceView,
        TagView,
        TagRefView,
        ThreadView,
        FileView,
        MessageView,
        DraftView,
        ContactView,
        EventView,
        SyncEventsView,
        StampView,
        SuccessView,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "namespaces", description = "Namespace lookup"),
        (name = "tags", description = "Tags"),
        (name = "threads", description = "Threads"),
        (name = "messages", description = "Messages"),
        (name = "contacts", description = "Contacts"),
        (name = "files", description = "Uploaded and attached files"),
        (name = "webhooks", description = "Webhook registration"),
        (name = "drafts", description = "Drafts and sending"),
        (name = "sync", description = "Change log"),
    )
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_namespace_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/n/{namespace_public_id}/threads/"));
        assert!(doc.paths.paths.contains_key("/n/{namespace_public_id}/sync/events"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
