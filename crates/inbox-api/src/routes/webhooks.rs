use axum::{
    extract::{Path, State},
    Extension, Json,
};
use inbox_webhooks::{WebhookError, WebhookView};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    encoding::SuccessView,
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResourcePath},
    middleware::RequestContext,
    state::AppState,
};

const MALFORMED: &str = "Malformed webhook request";

fn webhook_not_found(public_id: &str) -> ApiError {
    ApiError::NotFound(format!("Couldn't find webhook with id {}", public_id))
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/webhooks/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses((status = 200, description = "Webhooks of the namespace")),
    tag = "webhooks"
)]
pub async fn list_webhooks(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<WebhookView>>> {
    let hooks = state.persist.list_webhooks(ctx.namespace_id()).await?;
    Ok(Json(hooks.iter().map(WebhookView::from).collect()))
}

/// Register a webhook with the webhook server
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/webhooks/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses(
        (status = 200, description = "Webhook as registered by the webhook server"),
        (status = 400, description = "Webhook server rejected the parameters")
    ),
    tag = "webhooks"
)]
pub async fn create_webhook(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    JsonBody(parameters): JsonBody,
) -> ApiResult<Json<Value>> {
    match state.webhooks.register_hook(ctx.namespace_id(), parameters).await {
        Ok(hook) => Ok(Json(hook)),
        Err(WebhookError::Remote(reason)) => {
            tracing::info!(namespace_id = %ctx.namespace_id(), %reason, "Webhook registration rejected");
            Err(ApiError::BadRequest(MALFORMED.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/webhooks/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Webhook public id")
    ),
    responses(
        (status = 200, description = "Webhook"),
        (status = 404, description = "Webhook not found")
    ),
    tag = "webhooks"
)]
pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<WebhookView>> {
    let hook = state
        .persist
        .get_webhook(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| webhook_not_found(&path.public_id))?;

    Ok(Json(WebhookView::from(&hook)))
}

/// Start or stop a webhook; only `active` can change
#[utoipa::path(
    put,
    path = "/n/{namespace_public_id}/webhooks/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Webhook public id")
    ),
    responses(
        (status = 200, description = "Hook toggled", body = SuccessView),
        (status = 400, description = "Body is not exactly {\"active\": bool}"),
        (status = 404, description = "Webhook not found")
    ),
    tag = "webhooks"
)]
pub async fn update_webhook(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
    body: JsonBody,
) -> ApiResult<Json<SuccessView>> {
    let active = body
        .exact_keys(&["active"])
        .and_then(|obj| obj.get("active"))
        .and_then(|v| v.as_bool())
        .ok_or_else(|| ApiError::BadRequest(MALFORMED.to_string()))?;

    state
        .persist
        .get_webhook(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| webhook_not_found(&path.public_id))?;

    let result = if active {
        state.webhooks.start_hook(&path.public_id).await
    } else {
        state.webhooks.stop_hook(&path.public_id).await
    };
    match result {
        Ok(()) => Ok(Json(SuccessView { success: true })),
        Err(WebhookError::Remote(_)) => Err(webhook_not_found(&path.public_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_webhook() -> ApiResult<()> {
    Err(ApiError::NotImplemented)
}
