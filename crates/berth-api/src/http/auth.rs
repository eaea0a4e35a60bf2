//! Credential extraction middleware.
//!
//! Requests without `x-berth-api-key` proceed as anonymous; the service
//! decides per operation whether that is acceptable. Malformed headers are
//! rejected here.

use axum::{http::Request, middleware::Next, response::Response};
use berth_labels::Credential;

use crate::http::constants::HEADER_API_KEY;
use crate::http::errors::ApiError;

pub(crate) async fn resolve_credential(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = extract_credential(&req)?;
    req.extensions_mut().insert(credential);
    Ok(next.run(req).await)
}

pub(crate) fn extract_credential<B>(req: &Request<B>) -> Result<Credential, ApiError> {
    let Some(header_value) = req.headers().get(HEADER_API_KEY) else {
        return Ok(Credential::Anonymous);
    };
    let raw = header_value
        .to_str()
        .map_err(|_| ApiError::unauthorized("API key header must be valid UTF-8"))?
        .trim();
    let (key_id, secret) = raw
        .split_once(':')
        .filter(|(key_id, secret)| !key_id.is_empty() && !secret.is_empty())
        .ok_or_else(|| ApiError::unauthorized("API key must be provided as key_id:secret"))?;
    Ok(Credential::api_key(key_id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn request(value: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/api/labels");
        if let Some(value) = value {
            builder = builder.header(HEADER_API_KEY, value);
        }
        builder.body(()).expect("request")
    }

    #[test]
    fn missing_header_is_anonymous() {
        let credential = extract_credential(&request(None)).expect("credential");
        assert_eq!(credential, Credential::Anonymous);
    }

    #[test]
    fn well_formed_header_yields_api_key() {
        let credential = extract_credential(&request(Some(" dev:secret "))).expect("credential");
        assert_eq!(credential, Credential::api_key("dev", "secret"));
    }

    #[test]
    fn malformed_headers_are_unauthorized() {
        for value in ["dev", ":secret", "dev:"] {
            let err = extract_credential(&request(Some(value))).unwrap_err();
            assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        }
    }
}
