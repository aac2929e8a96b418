use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::debug;

use crate::domains::flow::{FlowPayload, FlowRequest, SessionToken};

/// Extract the flow-relevant parts of a request
///
/// Credentials come from request extensions: an upstream auth middleware
/// inserts the `SessionToken` it authenticated. An empty body means no
/// payload; a body that isn't valid JSON is rejected with 400. A malformed
/// query string is treated as empty.
#[async_trait]
impl<S> FromRequest<S> for FlowRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let query = Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .map(|Query(query)| query)
            .unwrap_or_default();
        let credentials = parts.extensions.get::<SessionToken>().cloned();
        let headers = parts.headers.clone();

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(IntoResponse::into_response)?;

        let payload = if bytes.is_empty() {
            None
        } else {
            let payload = serde_json::from_slice::<FlowPayload>(&bytes).map_err(|e| {
                debug!("Rejecting flow request body: {}", e);
                (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)).into_response()
            })?;
            Some(payload)
        };

        Ok(FlowRequest {
            headers,
            credentials,
            payload,
            query,
        })
    }
}
