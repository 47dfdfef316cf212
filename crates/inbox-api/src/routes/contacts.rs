use axum::{
    extract::{Path, State},
    Extension, Json,
};
use inbox_persist::OrderBy;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    encoding::{self, ContactView},
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResourcePath},
    middleware::RequestContext,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// List local contacts, or rank-search all contacts with `order_by=rank`
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/contacts/",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("filter" = Option<String>, Query, description = "Search text"),
        ("order_by" = Option<String>, Query, description = "`rank` to search"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 10, max: 1000)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses((status = 200, description = "Contacts", body = [ContactView])),
    tag = "contacts"
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<ContactView>>> {
    let contacts = if ctx.filter.order_by == OrderBy::Rank {
        let query = ctx.param("filter").unwrap_or("");
        state
            .persist
            .search_contacts(ctx.namespace_id(), query, ctx.limit, ctx.offset)
            .await?
    } else {
        state
            .persist
            .list_contacts(ctx.namespace_id(), ctx.limit, ctx.offset)
            .await?
    };

    Ok(Json(encoding::list(&contacts)))
}

#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/contacts/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Contact created", body = ContactView),
        (status = 400, description = "Name and email both missing")
    ),
    tag = "contacts"
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: JsonBody,
) -> ApiResult<Json<ContactView>> {
    let name = body.string_field("name")?.filter(|s| !s.is_empty());
    let email = body.string_field("email")?.filter(|s| !s.is_empty());
    if name.is_none() && email.is_none() {
        return Err(ApiError::BadRequest(
            "Contact name and email cannot both be null.".to_string(),
        ));
    }

    let contact = state
        .persist
        .create_contact(ctx.namespace_id(), name, email)
        .await?;
    Ok(Json(ContactView::from(&contact)))
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/contacts/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "Contact public id")
    ),
    responses(
        (status = 200, description = "Contact", body = ContactView),
        (status = 404, description = "Contact not found")
    ),
    tag = "contacts"
)]
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<ContactView>> {
    let contact = state
        .persist
        .get_contact(ctx.namespace_id(), &path.public_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Couldn't find contact with id {}", path.public_id))
        })?;

    Ok(Json(ContactView::from(&contact)))
}

pub async fn update_contact() -> ApiResult<()> {
    Err(ApiError::NotImplemented)
}

pub async fn delete_contact() -> ApiResult<()> {
    Err(ApiError::NotImplemented)
}
