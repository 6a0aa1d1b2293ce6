//! Request extractors that reject with [`AppError`].
//!
//! axum's own `Json`, `Path` and `Query` answer malformed input with a
//! plain-text 4xx. These wrappers route the rejection through `AppError`, so
//! every client error carries the `{"error", "status"}` body.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Parse(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Parse(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde::Deserialize;
    use serde_json::Value;

    use crate::domain::PricingModel;

    #[derive(Debug, Deserialize)]
    struct StayRequest {
        model: PricingModel,
        nights: u32,
    }

    async fn extract(body: &str) -> Result<Json<StayRequest>, AppError> {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Json::<StayRequest>::from_request(request, &()).await
    }

    async fn error_body(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_body() {
        let Json(body) = extract(r#"{"model": "commissionable", "nights": 2}"#)
            .await
            .unwrap();
        assert_eq!(body.model, PricingModel::Commissionable);
        assert_eq!(body.nights, 2);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_400_json() {
        for body in [
            r#"{"model": "gross", "nights": 1}"#,
            r#"{"model": "net", "nights": -1}"#,
            r#"{"model": "net", "nights": "two"}"#,
            r#"{"model": "net""#,
        ] {
            let err = extract(body).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{}", body);
            let (status, json) = error_body(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["status"], 400);
            assert!(json["error"].as_str().is_some_and(|m| !m.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_400() {
        let request = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"model": "net", "nights": 1}"#))
            .unwrap();
        let err = Json::<StayRequest>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
