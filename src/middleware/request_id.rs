//! Request ID middleware and extractor.
//!
//! Every request gets an `x-request-id` (generated when absent), echoed on
//! the response and forwarded to upstream services.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use std::convert::Infallible;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header name for request ID
pub const X_REQUEST_ID: &str = "x-request-id";

/// Set the request ID when missing (UUID v4) and copy it onto the response.
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header_name = HeaderName::from_static(X_REQUEST_ID);

    (
        SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header_name),
    )
}

/// Request ID of the current request, if any.
#[derive(Debug, Clone, Default)]
pub struct RequestId(pub Option<String>);

impl RequestId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(RequestId(id))
    }
}
