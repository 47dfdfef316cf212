//! Per-request namespace context.
//!
//! Runs on every `/n/:namespace_public_id/...` route before the handler:
//! resolves the namespace, validates paging and builds the listing filter.
//! Handlers read the result through `Extension<RequestContext>`.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    middleware::Next,
    response::Response,
};
use inbox_persist::{public_id, Filter, FilterParams, Namespace, PersistError};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const NAMESPACE_PARAM: &str = "namespace_public_id";
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub namespace: Namespace,
    pub filter: Filter,
    pub limit: usize,
    pub offset: usize,
    /// Whether the client passed `limit` explicitly
    pub limit_given: bool,
    pub query: HashMap<String, String>,
}

impl RequestContext {
    pub fn namespace_id(&self) -> &str {
        &self.namespace.id
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

pub async fn resolve_namespace(
    State(state): State<Arc<AppState>>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Path(params) = params?;
    let Query(query) = query?;
    let public_id = params
        .get(NAMESPACE_PARAM)
        .ok_or_else(|| ApiError::Internal("namespace route without namespace id".to_string()))?;

    let not_found = || ApiError::NotFound(format!("Couldn't find namespace with id `{}` ", public_id));
    if !public_id::is_valid(public_id) {
        return Err(not_found());
    }
    let namespace = state
        .persist
        .get_namespace(public_id)
        .await?
        .ok_or_else(not_found)?;

    let (limit, offset) = parse_paging(&query)?;
    let filter = Filter::parse(&namespace.id, &filter_params(&query), limit, offset).map_err(
        |e| match e {
            PersistError::InvalidFilter(msg) => ApiError::BadRequest(msg),
            other => ApiError::Persist(other),
        },
    )?;

    req.extensions_mut().insert(RequestContext {
        namespace,
        filter,
        limit,
        offset,
        limit_given: query.contains_key("limit"),
        query,
    });

    Ok(next.run(req).await)
}

fn parse_paging(query: &HashMap<String, String>) -> ApiResult<(usize, usize)> {
    let parse = |name: &str, default: i64| -> ApiResult<i64> {
        match query.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ApiError::BadRequest("limit and offset parameters must be integers".to_string())
            }),
        }
    };
    let limit = parse("limit", DEFAULT_LIMIT)?;
    let offset = parse("offset", 0)?;

    if limit < 0 || offset < 0 {
        return Err(ApiError::BadRequest(
            "limit and offset parameters must be nonnegative integers".to_string(),
        ));
    }
    if limit > MAX_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "cannot request more than {} resources at once.",
            MAX_LIMIT
        )));
    }
    Ok((limit as usize, offset as usize))
}

fn filter_params(query: &HashMap<String, String>) -> FilterParams {
    let get = |name: &str| query.get(name).cloned();
    FilterParams {
        subject: get("subject"),
        thread: get("thread"),
        to: get("to"),
        from: get("from"),
        cc: get("cc"),
        bcc: get("bcc"),
        any_email: get("any_email"),
        started_before: get("started_before"),
        started_after: get("started_after"),
        last_message_before: get("last_message_before"),
        last_message_after: get("last_message_after"),
        filename: get("filename"),
        tag: get("tag"),
        order_by: get("order_by"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_paging_defaults_and_bounds() {
        assert_eq!(parse_paging(&query(&[])).unwrap(), (10, 0));
        assert_eq!(parse_paging(&query(&[("limit", "1000"), ("offset", "5")])).unwrap(), (1000, 5));
        assert!(parse_paging(&query(&[("limit", "1001")])).is_err());
        assert!(parse_paging(&query(&[("offset", "-1")])).is_err());
        assert!(parse_paging(&query(&[("limit", "ten")])).is_err());
    }

    #[test]
    fn test_filter_params_from_query() {
        let params = filter_params(&query(&[("from", "a@example.com"), ("tag", "inbox")]));
        assert_eq!(params.from.as_deref(), Some("a@example.com"));
        assert_eq!(params.tag.as_deref(), Some("inbox"));
        assert!(params.subject.is_none());
    }
}
