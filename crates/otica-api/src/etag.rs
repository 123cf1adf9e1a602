//! Conditional GET support.
//!
//! The dashboard polls list and detail endpoints every few seconds; a matching
//! `If-None-Match` turns those polls into bodiless `304 Not Modified` replies.
//! Tags are recomputed from the serialized envelope on every request. They are
//! weak: the compression layer may gzip the body under the same tag, so two
//! representations share it and only weak comparison holds.

use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::response::ApiResponse;

const ETAG_HEX_LEN: usize = 32;

const WEAK_PREFIX: &str = "W/";

/// Weak tag over the uncompressed envelope: `W/"<SHA-256 prefix>"`
pub fn etag_for(body: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(body));
    format!("{}\"{}\"", WEAK_PREFIX, &digest[..ETAG_HEX_LEN])
}

/// `If-None-Match` with weak comparison: `*`, comma-separated lists, and
/// `W/` ignored on either side.
pub fn if_none_match_matches(header: &str, etag: &str) -> bool {
    fn opaque(tag: &str) -> &str {
        tag.strip_prefix(WEAK_PREFIX).unwrap_or(tag)
    }
    let etag = opaque(etag);
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == etag)
}

/// Wraps `data` in the success envelope and answers 304 when the client already has it.
pub fn cached<T: Serialize>(headers: &HeaderMap, data: T) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(&ApiResponse::success(data))
        .map_err(|e| ApiError::InternalError(format!("serializing response: {}", e)))?;
    let etag = etag_for(&body);
    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| ApiError::InternalError(format!("invalid etag header: {}", e)))?;

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| if_none_match_matches(value, &etag));

    let builder = Response::builder()
        .header(ETAG, etag_value)
        .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let response = if not_modified {
        builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())
    } else {
        builder
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(Body::from(body))
    };
    response.map_err(|e| ApiError::InternalError(format!("building response: {}", e)))
}
