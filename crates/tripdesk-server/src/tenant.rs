//! Agency scoping for back-office requests.
//!
//! The gateway in front of the service authenticates the user and forwards
//! the agency they act for in `X-Agency-Id`.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use crate::error::AppError;

/// Header carrying the agency id.
pub const AGENCY_HEADER: &str = "x-agency-id";

/// The agency a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenant {
    pub agency_id: i64,
}

impl Tenant {
    fn from_header(value: Option<&str>) -> Result<Self, AppError> {
        let raw = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Auth(format!("Missing {} header", AGENCY_HEADER)))?;

        let agency_id = raw
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Auth(format!("Invalid {} header: {}", AGENCY_HEADER, raw)))?;

        Ok(Self { agency_id })
    }
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AGENCY_HEADER)
            .and_then(|v| v.to_str().ok());
        Tenant::from_header(value)
    }
}

/// `Option<Tenant>`: absent header is `None`, a malformed one still 401.
impl<S> OptionalFromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match parts.headers.get(AGENCY_HEADER) {
            None => Ok(None),
            Some(value) => Tenant::from_header(value.to_str().ok()).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_header() {
        assert_eq!(Tenant::from_header(Some(" 42 ")).unwrap().agency_id, 42);
    }

    #[test]
    fn test_missing_or_invalid_header() {
        assert!(matches!(Tenant::from_header(None), Err(AppError::Auth(_))));
        assert!(matches!(Tenant::from_header(Some("")), Err(AppError::Auth(_))));
        assert!(matches!(Tenant::from_header(Some("acme")), Err(AppError::Auth(_))));
        assert!(matches!(Tenant::from_header(Some("0")), Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_extractor_reads_header() {
        let (mut parts, _) = axum::http::Request::builder()
            .header("X-Agency-Id", "7")
            .body(())
            .unwrap()
            .into_parts();
        let tenant = <Tenant as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(tenant.agency_id, 7);
    }

    #[tokio::test]
    async fn test_optional_extractor() {
        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();
        let tenant =
            <Tenant as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert_eq!(tenant.unwrap(), None);

        let (mut parts, _) = axum::http::Request::builder()
            .header(AGENCY_HEADER, "abc")
            .body(())
            .unwrap()
            .into_parts();
        let tenant =
            <Tenant as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(tenant, Err(AppError::Auth(_))));
    }
}
