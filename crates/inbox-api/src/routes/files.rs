use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use inbox_persist::{Block, NewBlock};
use std::sync::Arc;

use crate::{
    encoding::{self, FileView},
    error::{ApiError, ApiResult},
    extract::ResourcePath,
    middleware::RequestContext,
    mime,
    state::AppState,
};

/// Page size when the client does not pass `limit`
pub const DEFAULT_FILES_LIMIT: usize = 100;

/// List stored files, optionally by exact filename
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/files/",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("filename" = Option<String>, Query, description = "Exact filename"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 100, max: 1000)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses((status = 200, description = "Files", body = [FileView])),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<FileView>>> {
    let limit = if ctx.limit_given { ctx.limit } else { DEFAULT_FILES_LIMIT };
    let blocks = state
        .persist
        .list_blocks(ctx.namespace_id(), ctx.filter.filename.as_deref(), limit, ctx.offset)
        .await?;

    Ok(Json(encoding::list(&blocks)))
}

async fn find_block(state: &AppState, ctx: &RequestContext, public_id: &str) -> ApiResult<Block> {
    state
        .persist
        .get_block(ctx.namespace_id(), public_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Couldn't find file with id {} on namespace {}",
                public_id,
                ctx.namespace_id()
            ))
        })
}

#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/files/{public_id}",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "File public id")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileView),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Json<FileView>> {
    let block = find_block(&state, &ctx, &path.public_id).await?;
    if block.message_id.is_none() {
        tracing::debug!(block_id = %block.id, "File has no message, uploaded through the API");
    }
    Ok(Json(FileView::from(&block)))
}

/// Upload files as `multipart/form-data`; every field becomes one stored file
#[utoipa::path(
    post,
    path = "/n/{namespace_public_id}/files/",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses(
        (status = 200, description = "Stored files", body = [FileView]),
        (status = 400, description = "Malformed multipart body")
    ),
    tag = "files"
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Vec<FileView>>> {
    let mut multipart = multipart?;
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        tracing::info!(namespace_id = %ctx.namespace_id(), field = %name, "Processing upload");

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        uploads.push(NewBlock {
            filename,
            content_type,
            content_disposition: None,
            data: data.to_vec(),
        });
    }

    let blocks = state.persist.insert_blocks(ctx.namespace_id(), uploads).await?;
    Ok(Json(encoding::list(&blocks)))
}

/// Raw file contents as an attachment
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}/files/{public_id}/download",
    params(
        ("namespace_public_id" = String, Path, description = "Namespace public id"),
        ("public_id" = String, Path, description = "File public id")
    ),
    responses(
        (status = 200, description = "File contents as application/octet-stream"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(path): Path<ResourcePath>,
) -> ApiResult<Response> {
    let block = find_block(&state, &ctx, &path.public_id).await?;

    let content_type = match block.content_type.as_deref() {
        Some(ct) => ct.to_ascii_lowercase(),
        None => {
            tracing::warn!(block_id = %block.id, "Content type not set, defaulting to text/plain");
            mime::FALLBACK_CONTENT_TYPE.to_string()
        }
    };
    let filename = mime::download_filename(block.filename.as_deref(), &content_type);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={}", filename)),
        ],
        block.data,
    )
        .into_response())
}
