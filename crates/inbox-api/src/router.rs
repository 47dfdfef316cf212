use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::{errors, logging, namespace},
    openapi,
    routes::{
        contacts, drafts, events, files, home, messages, namespace as ns, sync, tags, threads,
        webhooks,
    },
    state::AppState,
};

/// Routes that live under one namespace, all behind namespace resolution
fn namespace_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(ns::read_namespace))
        // Tags
        .route("/tags/", get(tags::list_tags).post(tags::create_tag))
        // Threads
        .route("/threads/", get(threads::list_threads))
        .route(
            "/threads/:public_id",
            get(threads::get_thread)
                .put(threads::update_thread)
                .delete(threads::delete_thread),
        )
        // Messages
        .route("/messages/", get(messages::list_messages))
        .route(
            "/messages/:public_id",
            get(messages::get_message).put(messages::update_message),
        )
        // Contacts
        .route(
            "/contacts/",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/contacts/:public_id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Files
        .route("/files/", get(files::list_files).post(files::upload_files))
        .route("/files/:public_id", get(files::get_file))
        .route("/files/:public_id/download", get(files::download_file))
        // Events
        .route("/events/:public_id", get(events::read_event))
        // Webhooks
        .route(
            "/webhooks/",
            get(webhooks::list_webhooks).post(webhooks::create_webhook),
        )
        .route(
            "/webhooks/:public_id",
            get(webhooks::get_webhook)
                .put(webhooks::update_webhook)
                .delete(webhooks::delete_webhook),
        )
        // Drafts
        .route("/drafts/", get(drafts::list_drafts).post(drafts::create_draft))
        .route(
            "/drafts/:public_id",
            get(drafts::get_draft)
                .post(drafts::update_draft)
                .delete(drafts::delete_draft),
        )
        .route("/send", post(drafts::send))
        // Sync
        .route("/sync/events", get(sync::sync_events))
        .route("/sync/generate_stamp", post(sync::generate_stamp))
        .route_layer(middleware::from_fn_with_state(
            state,
            namespace::resolve_namespace,
        ))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/n/:namespace_public_id", namespace_routes(state.clone()))
        .fallback(home::not_found)
        .layer(middleware::from_fn(logging::log_request))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(errors::json_errors))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
