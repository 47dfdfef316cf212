use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON request body, parsed whatever the declared content type
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::BadRequest(format!("Failed to decode JSON object: {}", e)))
    }
}

impl JsonBody {
    pub fn object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// The body as an object whose keys are exactly `keys`
    pub fn exact_keys(&self, keys: &[&str]) -> Option<&Map<String, Value>> {
        self.object()
            .filter(|obj| obj.len() == keys.len() && keys.iter().all(|k| obj.contains_key(*k)))
    }

    /// A field, with JSON `null` treated as absent
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.object()
            .and_then(|obj| obj.get(key))
            .filter(|v| !v.is_null())
    }

    pub fn string_field(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ApiError::BadRequest(format!("{} must be a string", key))),
        }
    }
}

/// `:public_id` segment of a resource route; the namespace segment is
/// consumed by the namespace middleware
#[derive(Debug, Deserialize)]
pub struct ResourcePath {
    pub public_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_keys() {
        let body = JsonBody(json!({ "name": "x" }));
        assert!(body.exact_keys(&["name"]).is_some());
        assert!(body.exact_keys(&["name", "other"]).is_none());

        let body = JsonBody(json!({ "name": "x", "color": "red" }));
        assert!(body.exact_keys(&["name"]).is_none());
        assert!(JsonBody(json!(["name"])).exact_keys(&["name"]).is_none());
    }

    #[test]
    fn test_null_fields_are_absent() {
        let body = JsonBody(json!({ "subject": null, "body": "hi", "to": 3 }));
        assert!(body.field("subject").is_none());
        assert_eq!(body.string_field("body").unwrap().as_deref(), Some("hi"));
        assert!(body.string_field("to").is_err());
    }
}
