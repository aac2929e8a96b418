//! Test harness wiring a FlowContext to a MockCache and a log recorder.

use flow_context::kernel::MockCache;
use flow_context::{Config, FlowContext, FlowMetadata, FlowPayload, FlowRequest, SessionToken};
use std::sync::Arc;
use test_context::AsyncTestContext;
use tracing::subscriber::DefaultGuard;

use super::RecordingLayer;

pub const FLOW_ID_KEY: &str = "S3CR37";
pub const FLOW_ID_EXPIRY_MS: i64 = 60_000;

pub struct FlowHarness {
    pub cache: MockCache,
    pub flow_context: FlowContext,
    pub logs: RecordingLayer,
}

impl AsyncTestContext for FlowHarness {
    async fn setup() -> Self {
        Self::with_cache(MockCache::new())
    }

    async fn teardown(self) {}
}

impl FlowHarness {
    pub fn with_cache(cache: MockCache) -> Self {
        let config = Config::new(FLOW_ID_KEY).with_flow_id_expiry_ms(FLOW_ID_EXPIRY_MS);
        let flow_context = FlowContext::new(Arc::new(cache.clone()), &config);

        Self {
            cache,
            flow_context,
            logs: RecordingLayer::default(),
        }
    }

    pub fn capture_logs(&self) -> DefaultGuard {
        self.logs.capture()
    }
}

/// A 64-character uid made of one repeated hex digit
pub fn uid_of(c: char) -> String {
    c.to_string().repeat(64)
}

pub fn token(uid: &str, id: &str) -> SessionToken {
    SessionToken::new(uid, id)
}

/// A request whose body carries the given metadata JSON
pub fn request_with_metadata(metadata: serde_json::Value) -> FlowRequest {
    let metadata: FlowMetadata = serde_json::from_value(metadata).expect("valid metadata");
    FlowRequest::builder()
        .payload(FlowPayload {
            metrics_context: Some(metadata),
            ..Default::default()
        })
        .build()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
