use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    encoding::{self, MessageView},
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResourcePath},
    middleware::RequestContext,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
    pub unread: bool,
}

/// List messages matching the query filter
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/messages/",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("thread" = Option<String>, Query, description = "Thread public id"),
        ("from" = Option<String>, Query, description = "Sender address"),
        ("filename" = Option<String>, Query, description = "Attachment filename"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 10, max: 1000)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Messages", body = [MessageView]),
        (status = 400, description = "Invalid filter")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<MessageView>>> {
    let messages = state.persist.query_messages(&ctx.filter).await?;
    Ok(Json(encoding::list(&messages)))
}

fn message_not_found(public_id: &str, ctx: &RequestContext) -> ApiError {
    ApiError::NotFound(format!(
        "Couldn't find message with id {} on namespace {}",
        public_id,
        ctx.namespace_id()
    ))
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/messages/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Message public id")
    ),
    responses(
        (status = 200, description = "Message", body = MessageView),
        (status = 404, description = "Message not found")
    ),
    tag = "messages"
)]
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<MessageView>> {
    let message = state
        .persist
        .get_message(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| message_not_found(&path.public_id, &ctx))?;

    Ok(Json(MessageView::from(&message)))
}

/// Mark a message read or unread; thread tags follow
#[utoipa::path(
    put,
    path = "/n/{namespace_public_id}/messages/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Message public id")
    ),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Updated message", body = MessageView),
        (status = 400, description = "Body is not exactly {\"unread\": bool}"),
        (status = 404, description = "Message not found")
    ),
    tag = "messages"
)]
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
    body: JsonBody,
) -> ApiResult<Json<MessageView>> {
    state
        .persist
        .get_message(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| message_not_found(&path.public_id, &ctx))?;

    let unread = body
        .exact_keys(&["unread"])
        .and_then(|obj| obj.get("unread"))
        .and_then(|v| v.as_bool())
        .ok_or_else(|| {
            ApiError::BadRequest("Can only change the unread attribute of a message".to_string())
        })?;

    let message = state
        .persist
        .set_message_unread(ctx.namespace_id(), &path.public_id, unread)
        .await?;
    Ok(Json(MessageView::from(&message)))
}
