use axum::{
    extract::{Path, State},
    Extension, Json,
};
use inbox_persist::{DraftUpdate, NewDraft};
use std::sync::Arc;

use crate::{
    encoding::{self, DraftView},
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResourcePath},
    middleware::RequestContext,
    state::AppState,
    validation::{get_attachments, get_tags, get_thread, parse_addresses},
};

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/drafts/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses((status = 200, description = "Latest revision of every unsent draft", body = [DraftView])),
    tag = "drafts"
)]
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<DraftView>>> {
    let drafts = state.persist.list_drafts(ctx.namespace_id()).await?;
    Ok(Json(encoding::list(&drafts)))
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/drafts/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Draft public id")
    ),
    responses(
        (status = 200, description = "Draft", body = DraftView),
        (status = 404, description = "Draft not found")
    ),
    tag = "drafts"
)]
pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<DraftView>> {
    let draft = state
        .persist
        .get_draft(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No draft found with id {}", path.public_id)))?;

    Ok(Json(DraftView::from(&draft)))
}

/// Body fields shared by draft creation and direct sends
async fn new_draft(state: &AppState, ctx: &RequestContext, body: &JsonBody, with_tags: bool) -> ApiResult<NewDraft> {
    let ns = ctx.namespace_id();
    let persist = state.persist.as_ref();

    let tags = if with_tags {
        get_tags(persist, ns, body.field("tags")).await?
    } else {
        Vec::new()
    };
    let files = get_attachments(persist, ns, body.field("files")).await?;
    let reply_to_thread = if with_tags {
        get_thread(persist, ns, body.field("reply_to_thread")).await?
    } else {
        None
    };

    Ok(NewDraft {
        to: parse_addresses("to", body.field("to"))?.unwrap_or_default(),
        cc: parse_addresses("cc", body.field("cc"))?.unwrap_or_default(),
        bcc: parse_addresses("bcc", body.field("bcc"))?.unwrap_or_default(),
        subject: body.string_field("subject")?,
        body: body.string_field("body")?,
        files,
        tags,
        reply_to_thread,
    })
}

/// Create a draft, optionally as a reply on an existing thread
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/drafts/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses(
        (status = 200, description = "Draft created", body = DraftView),
        (status = 404, description = "Unknown tag, file or reply thread")
    ),
    tag = "drafts"
)]
pub async fn create_draft(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: JsonBody,
) -> ApiResult<Json<DraftView>> {
    let new = new_draft(&state, &ctx, &body, true).await?;
    let draft = state.persist.create_draft(ctx.namespace_id(), new).await?;

    tracing::info!(namespace_id = %ctx.namespace_id(), draft_id = %draft.id, "Draft created");
    Ok(Json(DraftView::from(&draft)))
}

/// Save a new revision of a draft
///
/// Only the latest revision can be updated; updating an older one
/// answers 409 with the latest revision embedded in the message.
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/drafts/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Parent draft public id")
    ),
    responses(
        (status = 200, description = "New revision", body = DraftView),
        (status = 404, description = "Draft, tag or file not found"),
        (status = 409, description = "Draft already revised")
    ),
    tag = "drafts"
)]
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
    body: JsonBody,
) -> ApiResult<Json<DraftView>> {
    let ns = ctx.namespace_id();
    let parent = state
        .persist
        .get_draft(ns, &path.public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No draft with public id {}", path.public_id)))?;

    if let Some(latest_id) = parent.most_recent_revision_id.as_deref() {
        let latest = match state.persist.get_draft(ns, latest_id).await? {
            Some(latest) => serde_json::to_string(&DraftView::from(&latest))
                .map_err(|e| ApiError::Internal(e.to_string()))?,
            None => latest_id.to_string(),
        };
        return Err(ApiError::Conflict(format!(
            "Draft {} has already been updated to {}",
            path.public_id, latest
        )));
    }

    let persist = state.persist.as_ref();
    let tags = get_tags(persist, ns, body.field("tags")).await?;
    let files = match body.field("files") {
        Some(value) => Some(get_attachments(persist, ns, Some(value)).await?),
        None => None,
    };

    let update = DraftUpdate {
        to: parse_addresses("to", body.field("to"))?,
        cc: parse_addresses("cc", body.field("cc"))?,
        bcc: parse_addresses("bcc", body.field("bcc"))?,
        subject: body.string_field("subject")?,
        body: body.string_field("body")?,
        files,
        tags,
    };
    let draft = state.persist.update_draft(ns, &parent.id, update).await?;
    Ok(Json(DraftView::from(&draft)))
}

/// Delete a draft with every revision of it
#[utoipa::path(
    delete,
    path = "/n/{namespace_public_id}/drafts/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Draft public id")
    ),
    responses(
        (status = 200, description = "Deleted draft", body = DraftView),
        (status = 400, description = "Not a draft"),
        (status = 404, description = "Draft not found")
    ),
    tag = "drafts"
)]
pub async fn delete_draft(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<DraftView>> {
    let ns = ctx.namespace_id();
    let draft = state
        .persist
        .get_draft(ns, &path.public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No draft found with public_id {}", path.public_id)))?;
    if !draft.is_draft() {
        return Err(ApiError::BadRequest(format!(
            "Message with public id {} is not a draft",
            path.public_id
        )));
    }

    let deleted = state.persist.delete_draft(ns, &draft.id).await?;
    Ok(Json(DraftView::from(&deleted)))
}

/// Queue a message for delivery
///
/// Either sends an existing draft (`draft_id`) or creates one from the
/// body (`to` required). Delivery itself happens elsewhere; the draft is
/// only marked `sending`.
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/send",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses(
        (status = 200, description = "Draft queued for sending", body = DraftView),
        (status = 400, description = "No draft id or recipients, or not a draft"),
        (status = 404, description = "Draft or file not found")
    ),
    tag = "drafts"
)]
pub async fn send(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: JsonBody,
) -> ApiResult<Json<DraftView>> {
    let ns = ctx.namespace_id();
    let draft_id = body.string_field("draft_id")?;
    let has_recipients = body
        .field("to")
        .map_or(false, |to| to.as_array().map_or(true, |list| !list.is_empty()));
    if draft_id.is_none() && !has_recipients {
        return Err(ApiError::BadRequest(
            "Must specify either draft id or message recipients.".to_string(),
        ));
    }

    let draft = match draft_id {
        Some(draft_id) => {
            let draft = state
                .persist
                .get_draft(ns, &draft_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("No draft found with public_id {}", draft_id)))?;
            if draft.is_sent() || !draft.is_draft() {
                return Err(ApiError::BadRequest(format!(
                    "Message with public id {} is not a draft",
                    draft_id
                )));
            }
            if draft.to.is_empty() {
                return Err(ApiError::BadRequest("No 'to:' recipients_specified".to_string()));
            }
            draft
        }
        None => {
            let new = new_draft(&state, &ctx, &body, false).await?;
            state.persist.create_draft(ns, new).await?
        }
    };

    let sending = state.persist.mark_draft_sending(ns, &draft.id).await?;
    tracing::info!(namespace_id = %ns, draft_id = %sending.id, "Draft queued for sending");
    Ok(Json(DraftView::from(&sending)))
}
