use crate::error::{ApiError, ApiResult};

/// Calendar events are not served yet
pub async fn read_event() -> ApiResult<()> {
    Err(ApiError::NotImplemented)
}
