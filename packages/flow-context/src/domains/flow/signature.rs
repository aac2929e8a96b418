use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use super::request::FlowRequest;
use crate::common::FlowRejection;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters of random salt at the start of a flow id
pub const FLOW_SALT_LENGTH: usize = 32;

/// Hex characters of truncated HMAC at the end of a flow id
pub const FLOW_SIGNATURE_LENGTH: usize = 32;

pub const FLOW_ID_LENGTH: usize = FLOW_SALT_LENGTH + FLOW_SIGNATURE_LENGTH;

const VALIDATE_OP: &str = "flow.context.validate";

/// How tightly a signature is bound to the client's user agent
///
/// Verification tries the bound form first, then the unbound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentBinding {
    Bound,
    Unbound,
}

impl AgentBinding {
    /// Candidates in the order they are tried, strictest first
    pub const ORDER: [AgentBinding; 2] = [AgentBinding::Bound, AgentBinding::Unbound];

    fn agent<'a>(self, user_agent: Option<&'a str>) -> Option<&'a str> {
        match self {
            AgentBinding::Bound => user_agent,
            AgentBinding::Unbound => None,
        }
    }
}

/// Signs and verifies flow identifiers
///
/// A flow id is `salt || signature`: 32 hex chars of salt followed by the
/// first 32 hex chars of HMAC-SHA256(key, salt "\n" hex(begin time) ["\n" agent]).
#[derive(Clone)]
pub struct FlowSigner {
    key: Vec<u8>,
    expiry_ms: i64,
}

impl std::fmt::Debug for FlowSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSigner")
            .field("expiry_ms", &self.expiry_ms)
            .finish_non_exhaustive()
    }
}

impl FlowSigner {
    pub fn new(key: &str, expiry_ms: i64) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
            expiry_ms,
        }
    }

    pub fn expiry_ms(&self) -> i64 {
        self.expiry_ms
    }

    /// Start a new flow: fresh salt, signed against the begin time and agent
    pub fn sign(&self, flow_begin_time: i64, user_agent: Option<&str>) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        self.sign_with_salt(&salt, flow_begin_time, user_agent)
    }

    pub fn sign_with_salt(&self, salt: &str, flow_begin_time: i64, user_agent: Option<&str>) -> String {
        let signature = self.signature(salt, flow_begin_time, user_agent);
        format!("{}{}", salt, signature)
    }

    fn signature(&self, salt: &str, flow_begin_time: i64, user_agent: Option<&str>) -> String {
        let mut input = format!("{}\n{:x}", salt, flow_begin_time);
        if let Some(agent) = user_agent.filter(|agent| !agent.is_empty()) {
            input.push('\n');
            input.push_str(agent);
        }

        // HMAC takes any key length
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC key");
        mac.update(input.as_bytes());
        let mut signature = hex::encode(mac.finalize().into_bytes());
        signature.truncate(FLOW_SIGNATURE_LENGTH);
        signature
    }

    /// Check a flow id against its begin time at `now`
    pub fn verify(
        &self,
        flow_id: &str,
        flow_begin_time: i64,
        user_agent: Option<&str>,
        now: i64,
    ) -> Result<AgentBinding, FlowRejection> {
        if now.saturating_sub(flow_begin_time) > self.expiry_ms {
            return Err(FlowRejection::ExpiredFlowBeginTime);
        }

        if flow_id.len() <= FLOW_SALT_LENGTH || !flow_id.is_char_boundary(FLOW_SALT_LENGTH) {
            return Err(FlowRejection::InvalidSignature);
        }
        let (salt, supplied) = flow_id.split_at(FLOW_SALT_LENGTH);

        AgentBinding::ORDER
            .into_iter()
            .find(|binding| {
                let expected = self.signature(salt, flow_begin_time, binding.agent(user_agent));
                expected.as_bytes().ct_eq(supplied.as_bytes()).into()
            })
            .ok_or(FlowRejection::InvalidSignature)
    }

    /// Validate the flow carried by `request` at the current time
    pub fn validate(&self, request: &mut FlowRequest) -> bool {
        self.validate_at(request, chrono::Utc::now().timestamp_millis())
    }

    /// Validate the flow carried by `request` at `now`
    ///
    /// Logs the outcome. On failure `flowId` and `flowBeginTime` are removed
    /// from the request so nothing downstream sees them.
    pub fn validate_at(&self, request: &mut FlowRequest, now: i64) -> bool {
        let agent = request.user_agent().unwrap_or_default().to_string();

        match self.check(request, now) {
            Ok(_) => {
                info!(op = VALIDATE_OP, valid = true, agent = %agent, "flow validated");
                true
            }
            Err(reason) => {
                warn!(op = VALIDATE_OP, valid = false, reason = %reason, agent = %agent, "flow rejected");
                if let Some(metadata) = request.metrics_context_mut() {
                    metadata.strip_flow();
                }
                false
            }
        }
    }

    fn check(&self, request: &FlowRequest, now: i64) -> Result<AgentBinding, FlowRejection> {
        let payload = request.payload.as_ref().ok_or(FlowRejection::MissingPayload)?;
        let metadata = payload
            .metrics_context
            .as_ref()
            .ok_or(FlowRejection::MissingContext)?;
        let flow_id = metadata
            .flow_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(FlowRejection::MissingFlowId)?;
        let flow_begin_time = metadata
            .flow_begin_time
            .filter(|time| *time > 0)
            .ok_or(FlowRejection::MissingFlowBeginTime)?;

        self.verify(flow_id, flow_begin_time, request.user_agent(), now)
    }
}
