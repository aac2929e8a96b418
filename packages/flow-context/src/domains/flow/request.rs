use axum::http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use typed_builder::TypedBuilder;

use super::metadata::FlowMetadata;
use super::token::SessionToken;

/// JSON body fields the flow context reads
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowPayload {
    #[serde(rename = "metricsContext", skip_serializing_if = "Option::is_none")]
    pub metrics_context: Option<FlowMetadata>,
    /// Account uid of an unauthenticated request (paired with `code`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The parts of an inbound request the flow context works with
#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct FlowRequest {
    #[builder(default)]
    pub headers: HeaderMap,
    /// Authenticated session token, when the request carries one
    #[builder(default, setter(strip_option))]
    pub credentials: Option<SessionToken>,
    #[builder(default, setter(strip_option))]
    pub payload: Option<FlowPayload>,
    #[builder(default)]
    pub query: HashMap<String, String>,
}

impl FlowRequest {
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
    }

    /// True when the client sent `DNT: 1`
    pub fn do_not_track(&self) -> bool {
        self.headers
            .get(axum::http::header::DNT)
            .is_some_and(|value| value.as_bytes() == b"1")
    }

    /// Inline flow metadata from the body
    pub fn metrics_context(&self) -> Option<&FlowMetadata> {
        self.payload.as_ref()?.metrics_context.as_ref()
    }

    pub fn metrics_context_mut(&mut self) -> Option<&mut FlowMetadata> {
        self.payload.as_mut()?.metrics_context.as_mut()
    }

    /// Declare which event completes the current flow
    ///
    /// Only annotates metadata the client already sent; never creates it.
    pub fn set_flow_complete_signal(&mut self, signal: &str, flow_type: &str) {
        if let Some(metadata) = self.metrics_context_mut() {
            metadata.flow_complete_signal = Some(signal.to_string());
            metadata.flow_type = Some(flow_type.to_string());
        }
    }
}
