//! Resolution of public ids found in draft and send request bodies.
//!
//! Unknown ids are reported as `NotFound`, the way the draft routes
//! answer them.

use inbox_persist::{Address, FileRef, PersistenceClient, TagRef};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

fn id_list<'a>(value: Option<&'a Value>, what: &str) -> ApiResult<Vec<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| ApiError::NotFound(format!("Invalid {} public id {}", what, item)))
            })
            .collect(),
        Some(other) => Err(ApiError::NotFound(format!("Invalid {} list {}", what, other))),
    }
}

/// Tags by name or public id
pub async fn get_tags(
    persist: &dyn PersistenceClient,
    namespace_id: &str,
    value: Option<&Value>,
) -> ApiResult<Vec<TagRef>> {
    let mut tags = Vec::new();
    for id in id_list(value, "tag")? {
        let tag = persist
            .find_tag(namespace_id, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Invalid tag public id {}", id)))?;
        tags.push(tag.to_ref());
    }
    Ok(tags)
}

pub async fn get_attachments(
    persist: &dyn PersistenceClient,
    namespace_id: &str,
    value: Option<&Value>,
) -> ApiResult<Vec<FileRef>> {
    let mut files = Vec::new();
    for id in id_list(value, "block")? {
        let block = persist
            .get_block(namespace_id, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Invalid block public id {}", id)))?;
        files.push(block.to_ref());
    }
    Ok(files)
}

pub async fn get_thread(
    persist: &dyn PersistenceClient,
    namespace_id: &str,
    value: Option<&Value>,
) -> ApiResult<Option<String>> {
    let id = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(id)) => id.to_lowercase(),
        Some(other) => return Err(ApiError::NotFound(format!("Invalid thread public id {}", other))),
    };

    persist
        .get_thread(namespace_id, &id)
        .await?
        .map(|thread| Some(thread.id))
        .ok_or_else(|| ApiError::NotFound(format!("Invalid thread public id {}", id)))
}

/// Recipient list: bare addresses or `{"name", "email"}` objects
pub fn parse_addresses(field: &str, value: Option<&Value>) -> ApiResult<Option<Vec<Address>>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::BadRequest(format!("{} must be a list of recipients", field))),
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(email) => Ok(Address::new(None, email.clone())),
            Value::Object(obj) => {
                let email = obj
                    .get("email")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ApiError::BadRequest(format!("Invalid recipient in {}", field)))?;
                let name = obj.get("name").and_then(Value::as_str);
                Ok(Address::new(name, email))
            }
            _ => Err(ApiError::BadRequest(format!("Invalid recipient in {}", field))),
        })
        .collect::<ApiResult<Vec<_>>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_persist::MemoryPersistenceClient;
    use serde_json::json;

    #[test]
    fn test_parse_addresses() {
        let value = json!(["a@example.com", { "name": "Bea", "email": "b@example.com" }]);
        let addrs = parse_addresses("to", Some(&value)).unwrap().unwrap();
        assert_eq!(addrs[0].email, "a@example.com");
        assert_eq!(addrs[1].name.as_deref(), Some("Bea"));

        assert!(parse_addresses("to", None).unwrap().is_none());
        assert!(parse_addresses("to", Some(&json!("a@example.com"))).is_err());
        assert!(parse_addresses("to", Some(&json!([{ "name": "x" }]))).is_err());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let persist = MemoryPersistenceClient::new();
        let ns = persist.create_namespace("acct", "me@example.com", "gmail").await.unwrap();

        let tags = get_tags(&persist, &ns.id, Some(&json!(["inbox", "starred"]))).await.unwrap();
        assert_eq!(tags.len(), 2);

        let err = get_tags(&persist, &ns.id, Some(&json!(["nope"]))).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = get_attachments(&persist, &ns.id, Some(&json!(["missing"]))).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = get_thread(&persist, &ns.id, Some(&json!("missing"))).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(get_thread(&persist, &ns.id, None).await.unwrap().is_none());
    }
}
