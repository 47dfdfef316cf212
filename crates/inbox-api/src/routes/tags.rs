use axum::{extract::State, Extension, Json};
use inbox_persist::MAX_INDEXABLE_LENGTH;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    encoding::{self, TagView},
    error::{ApiError, ApiResult},
    extract::JsonBody,
    middleware::RequestContext,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
}

/// List every tag of the namespace, canonical ones included
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/tags/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses((status = 200, description = "Tags", body = [TagView])),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<TagView>>> {
    let tags = state.persist.list_tags(ctx.namespace_id()).await?;
    Ok(Json(encoding::list(&tags)))
}

/// Create a user tag
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/tags/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    request_body = CreateTagRequest,
    responses(
        (status = 200, description = "Tag created", body = TagView),
        (status = 400, description = "Malformed request or name too long"),
        (status = 409, description = "Tag name not available")
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: JsonBody,
) -> ApiResult<Json<TagView>> {
    let name = body
        .exact_keys(&["name"])
        .and_then(|obj| obj.get("name"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("Malformed tag request".to_string()))?;

    if !state.persist.tag_name_available(ctx.namespace_id(), name).await? {
        return Err(ApiError::Conflict("Tag name not available".to_string()));
    }
    if name.chars().count() > MAX_INDEXABLE_LENGTH {
        return Err(ApiError::BadRequest("Tag name is too long.".to_string()));
    }

    let tag = state.persist.create_tag(ctx.namespace_id(), name).await?;
    tracing::info!(namespace_id = %ctx.namespace_id(), tag_id = %tag.id, "Tag created");
    Ok(Json(TagView::from(&tag)))
}
