//! Query-string extractor with validation.

use crate::errors::AppError;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Like [`ValidatedJson`](super::ValidatedJson) but for `?key=value` parameters.
///
/// ```ignore
/// async fn list(ValidatedQuery(filter): ValidatedQuery<UserFilter>) -> ... { }
/// ```
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state).await?;
        params.validate()?;
        Ok(ValidatedQuery(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Page {
        #[serde(default)]
        #[validate(range(max = 100))]
        limit: u32,
    }

    async fn handler(ValidatedQuery(page): ValidatedQuery<Page>) -> String {
        page.limit.to_string()
    }

    async fn call(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = Router::new()
            .route("/", get(handler))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_in_range_query_is_accepted() {
        let (status, _) = call("/?limit=100").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_out_of_range_query_is_rejected() {
        let (status, body) = call("/?limit=101").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unparseable_query_is_rejected() {
        let (status, body) = call("/?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_QUERY");
    }
}
