use axum::{extract::State, Extension, Json};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    encoding::{StampView, SyncEventsView},
    error::{ApiError, ApiResult},
    extract::JsonBody,
    middleware::RequestContext,
    state::AppState,
};

pub const DEFAULT_EVENTS_LIMIT: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateStampRequest {
    /// Unix timestamp
    pub start: i64,
}

/// Changes since a stamp, oldest first
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/sync/events",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("stamp" = String, Query, description = "Stamp to resume from; `0` for the beginning"),
        ("limit" = Option<i64>, Query, description = "Maximum events (default: 100)")
    ),
    responses(
        (status = 200, description = "Events after the stamp", body = SyncEventsView),
        (status = 400, description = "Missing stamp or bad limit"),
        (status = 404, description = "Unknown stamp")
    ),
    tag = "sync"
)]
pub async fn sync_events(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<SyncEventsView>> {
    let limit = match ctx.param("limit") {
        None => DEFAULT_EVENTS_LIMIT,
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|l| *l > 0)
            .ok_or_else(|| ApiError::BadRequest("Invalid limit parameter".to_string()))?,
    };
    let stamp = ctx
        .param("stamp")
        .ok_or_else(|| ApiError::BadRequest("No stamp parameter in sync request.".to_string()))?;

    let events = state
        .persist
        .events_from_stamp(ctx.namespace_id(), stamp, limit)
        .await?;
    Ok(Json(SyncEventsView::new(stamp, &events)))
}

/// Stamp of the newest change at or before a unix timestamp
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/sync/generate_stamp",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    request_body = GenerateStampRequest,
    responses(
        (status = 200, description = "Stamp", body = StampView),
        (status = 400, description = "Body is not exactly {\"start\": <unix timestamp>}")
    ),
    tag = "sync"
)]
pub async fn generate_stamp(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: JsonBody,
) -> ApiResult<Json<StampView>> {
    let start = body
        .exact_keys(&["start"])
        .and_then(|obj| obj.get("start"))
        .and_then(|v| v.as_i64())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .ok_or_else(|| {
            ApiError::BadRequest(
                "generate_stamp request body must have the format {\"start\": <Unix timestamp>}"
                    .to_string(),
            )
        })?;

    let stamp = state
        .persist
        .stamp_from_timestamp(ctx.namespace_id(), start)
        .await?;
    Ok(Json(StampView { stamp }))
}
