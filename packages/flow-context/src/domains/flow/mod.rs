//! Flow domain - signed flow identifiers and session-scoped flow metadata

pub mod context;
pub mod metadata;
pub mod request;
pub mod signature;
pub mod token;

pub use context::FlowContext;
pub use metadata::{flow_time, FlowEventData, FlowMetadata};
pub use request::{FlowPayload, FlowRequest};
pub use signature::{AgentBinding, FlowSigner, FLOW_ID_LENGTH, FLOW_SALT_LENGTH, FLOW_SIGNATURE_LENGTH};
pub use token::{resolve_token, SessionToken, TokenIdentity};
