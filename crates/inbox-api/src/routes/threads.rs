use axum::{
    extract::{Path, State},
    Extension, Json,
};
use inbox_persist::Tag;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    encoding::{self, ThreadView},
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResourcePath},
    middleware::RequestContext,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateThreadRequest {
    #[serde(default)]
    pub add_tags: Vec<String>,
    #[serde(default)]
    pub remove_tags: Vec<String>,
}

/// List threads matching the query filter
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/threads/",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("subject" = Option<String>, Query, description = "Exact subject"),
        ("tag" = Option<String>, Query, description = "Tag name or public id"),
        ("any_email" = Option<String>, Query, description = "Address in any header"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 10, max: 1000)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
        ("order_by" = Option<String>, Query, description = "`date` (default) or `subject`")
    ),
    responses(
        (status = 200, description = "Threads", body = [ThreadView]),
        (status = 400, description = "Invalid filter")
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<ThreadView>>> {
    let threads = state.persist.query_threads(&ctx.filter).await?;
    Ok(Json(encoding::list(&threads)))
}

fn thread_not_found(public_id: &str, ctx: &RequestContext) -> ApiError {
    ApiError::NotFound(format!(
        "Couldn't find thread with id `{}` on namespace {}",
        public_id,
        ctx.namespace_id()
    ))
}

/// Get a thread; ids are matched case-insensitively
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/threads/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Thread public id")
    ),
    responses(
        (status = 200, description = "Thread", body = ThreadView),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<ThreadView>> {
    let public_id = path.public_id.to_lowercase();
    let thread = state
        .persist
        .get_thread(ctx.namespace_id(), &public_id)
        .await?
        .ok_or_else(|| thread_not_found(&public_id, &ctx))?;

    Ok(Json(ThreadView::from(&thread)))
}

async fn resolve_tags(
    state: &AppState,
    ctx: &RequestContext,
    names: &[String],
    allowed: fn(&Tag) -> bool,
    verb: &str,
) -> ApiResult<Vec<Tag>> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag = state
            .persist
            .find_tag(ctx.namespace_id(), name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No tag found with name {}", name)))?;
        if !allowed(&tag) {
            return Err(ApiError::BadRequest(format!("Cannot {} tag {}", verb, name)));
        }
        tags.push(tag);
    }
    Ok(tags)
}

/// Add and remove tags on a thread
///
/// Every tag is validated before anything changes, so a rejected request
/// leaves the thread untouched.
#[utoipa::path(
    put,
    path = "/n/{namespace_public_id}/threads/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Thread public id")
    ),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Updated thread", body = ThreadView),
        (status = 400, description = "Malformed request or tag not user-modifiable"),
        (status = 404, description = "Thread or tag not found")
    ),
    tag = "threads"
)]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
    body: JsonBody,
) -> ApiResult<Json<ThreadView>> {
    let public_id = path.public_id;
    state
        .persist
        .get_thread(ctx.namespace_id(), &public_id)
        .await?
        .ok_or_else(|| thread_not_found(&public_id, &ctx))?;

    let malformed = || ApiError::BadRequest("Can only add or remove tags from thread.".to_string());
    let obj = body.object().ok_or_else(malformed)?;
    if !obj.keys().all(|k| k == "add_tags" || k == "remove_tags") {
        return Err(malformed());
    }
    let request: UpdateThreadRequest =
        serde_json::from_value(Value::Object(obj.clone())).map_err(|_| malformed())?;

    let remove = resolve_tags(&state, &ctx, &request.remove_tags, Tag::user_removable, "remove").await?;
    let add = resolve_tags(&state, &ctx, &request.add_tags, Tag::user_addable, "add").await?;

    let thread = state
        .persist
        .update_thread_tags(ctx.namespace_id(), &public_id, &add, &remove)
        .await?;
    Ok(Json(ThreadView::from(&thread)))
}

/// Moving threads to the trash is not supported yet
pub async fn delete_thread() -> ApiResult<()> {
    Err(ApiError::NotImplemented)
}
