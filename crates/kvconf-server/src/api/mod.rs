//! HTTP handlers for configurations, groups, health and metrics

pub mod config;
pub mod group;
pub mod health;
pub mod model;
pub mod openapi;
pub mod route;

use actix_web::{HttpRequest, http::header::CONTENT_TYPE, web};
use kvconf_common::{IDEMPOTENCY_KEY_HEADER, KvconfError};
use serde::de::DeserializeOwned;

use crate::model::constants::UNSUPPORTED_MEDIA_TYPE_MESSAGE;

/// Decode a JSON request body after checking its media type.
///
/// A missing or non-JSON `Content-Type` is rejected as unsupported; an
/// unparsable one, or a body that does not decode, as invalid.
pub fn json_body<T: DeserializeOwned>(req: &HttpRequest, body: &web::Bytes) -> Result<T, KvconfError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .ok_or_else(|| KvconfError::UnsupportedMediaType(UNSUPPORTED_MEDIA_TYPE_MESSAGE.to_string()))?
        .to_str()
        .map_err(|e| KvconfError::validation(format!("invalid Content-Type: {}", e)))?;

    let media_type: mime::Mime = content_type
        .parse()
        .map_err(|e| KvconfError::validation(format!("invalid Content-Type: {}", e)))?;
    if media_type.essence_str() != mime::APPLICATION_JSON.essence_str() {
        return Err(KvconfError::UnsupportedMediaType(
            UNSUPPORTED_MEDIA_TYPE_MESSAGE.to_string(),
        ));
    }

    serde_json::from_slice(body).map_err(|e| KvconfError::validation(e.to_string()))
}

/// The client's idempotency token, if one was sent
pub fn idempotency_token(req: &HttpRequest) -> Result<Option<String>, KvconfError> {
    match req.headers().get(IDEMPOTENCY_KEY_HEADER) {
        None => Ok(None),
        Some(value) => {
            let token = value
                .to_str()
                .map_err(|e| KvconfError::validation(format!("invalid {}: {}", IDEMPOTENCY_KEY_HEADER, e)))?
                .trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        version: String,
    }

    fn bytes(s: &'static str) -> web::Bytes {
        web::Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn test_json_body_accepts_json_with_charset() {
        let req = TestRequest::default()
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .to_http_request();
        let body: Body = json_body(&req, &bytes(r#"{"version":"v1"}"#)).unwrap();
        assert_eq!(body.version, "v1");
    }

    #[test]
    fn test_json_body_media_type_errors() {
        let req = TestRequest::default().to_http_request();
        let err = json_body::<Body>(&req, &bytes("{}")).unwrap_err();
        assert_eq!(
            err,
            KvconfError::UnsupportedMediaType(UNSUPPORTED_MEDIA_TYPE_MESSAGE.to_string())
        );

        let req = TestRequest::default()
            .insert_header((CONTENT_TYPE, "text/plain"))
            .to_http_request();
        let err = json_body::<Body>(&req, &bytes("{}")).unwrap_err();
        assert!(matches!(err, KvconfError::UnsupportedMediaType(_)));

        let req = TestRequest::default()
            .insert_header((CONTENT_TYPE, "not a media type"))
            .to_http_request();
        let err = json_body::<Body>(&req, &bytes("{}")).unwrap_err();
        assert!(matches!(err, KvconfError::Validation(_)));
    }

    #[test]
    fn test_json_body_malformed() {
        let req = TestRequest::default()
            .insert_header((CONTENT_TYPE, "application/json"))
            .to_http_request();
        let err = json_body::<Body>(&req, &bytes("{not json")).unwrap_err();
        assert!(matches!(err, KvconfError::Validation(_)));
    }

    #[test]
    fn test_idempotency_token() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(idempotency_token(&req).unwrap(), None);

        let req = TestRequest::default()
            .insert_header((IDEMPOTENCY_KEY_HEADER, "abc"))
            .to_http_request();
        assert_eq!(idempotency_token(&req).unwrap().as_deref(), Some("abc"));

        let req = TestRequest::default()
            .insert_header((IDEMPOTENCY_KEY_HEADER, ""))
            .to_http_request();
        assert_eq!(idempotency_token(&req).unwrap(), None);
    }
}
