use axum::{Extension, Json};

use crate::{encoding::NamespaceView, middleware::RequestContext};

/// Namespace details
#[utoipa::path(
    get,
    path = "/n/{namespace_public_id}",
    params(("namespace_public_id" = String, Path, description = "Namespace public id")),
    responses(
        (status = 200, description = "Namespace", body = NamespaceView),
        (status = 404, description = "Namespace not found")
    ),
    tag = "namespaces"
)]
pub async fn read_namespace(Extension(ctx): Extension<RequestContext>) -> Json<NamespaceView> {
    Json(NamespaceView::from(&ctx.namespace))
}
