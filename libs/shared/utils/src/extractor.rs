use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use tracing::{debug, warn};

use shared_models::auth::{Requester, RequesterRole};
use shared_models::error::AppError;

use crate::validation::validate_identifier;

pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
pub const REQUESTER_ROLE_HEADER: &str = "x-requester-role";

/// Extracts the caller-supplied identity from the `X-Requester-Id` and
/// `X-Requester-Role` headers.
#[derive(Debug, Clone)]
pub struct RequesterIdentity(pub Requester);

impl<S> FromRequestParts<S> for RequesterIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match requester_from_headers(&parts.headers) {
            Ok(requester) => {
                debug!("Request made by {} {}", requester.role, requester.id);
                Ok(RequesterIdentity(requester))
            }
            Err(e) => {
                warn!(
                    "Rejected requester identity on {} {}: {}",
                    parts.method,
                    parts.uri.path(),
                    e
                );
                Err(e)
            }
        }
    }
}

pub fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, AppError> {
    let id = header_str(headers, REQUESTER_ID_HEADER)?;
    let id = validate_identifier("requester id", id)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    let role = header_str(headers, REQUESTER_ROLE_HEADER)?
        .parse::<RequesterRole>()
        .map_err(AppError::Auth)?;

    Ok(Requester { id, role })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .ok_or_else(|| AppError::Auth(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::Auth(format!("Invalid {} header format", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(id) = id {
            headers.insert(REQUESTER_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            headers.insert(REQUESTER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        headers
    }

    #[test]
    fn test_doctor_identity() {
        let requester = requester_from_headers(&headers(Some("D1"), Some("doctor"))).unwrap();
        assert_eq!(requester, Requester::doctor("D1"));
    }

    #[test]
    fn test_missing_role_is_auth_error() {
        let result = requester_from_headers(&headers(Some("P1"), None));
        assert_matches!(result, Err(AppError::Auth(_)));
    }

    #[test]
    fn test_non_alphanumeric_id_rejected() {
        let result = requester_from_headers(&headers(Some("P-1"), Some("patient")));
        assert_matches!(result, Err(AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_extractor_accepts_and_rejects_requests() {
        let request = axum::http::Request::builder()
            .uri("/appointments/A1/cancel")
            .header(REQUESTER_ID_HEADER, "P1")
            .header(REQUESTER_ROLE_HEADER, "patient")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let RequesterIdentity(requester) =
            RequesterIdentity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(requester, Requester::patient("P1"));

        let request = axum::http::Request::builder()
            .uri("/appointments/A1/cancel")
            .header(REQUESTER_ID_HEADER, "P1")
            .header(REQUESTER_ROLE_HEADER, "nurse")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert_matches!(
            RequesterIdentity::from_request_parts(&mut parts, &()).await,
            Err(AppError::Auth(_))
        );
    }
}
