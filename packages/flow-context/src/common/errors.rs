use thiserror::Error;

/// Errors raised by the flow context store
#[derive(Error, Debug)]
pub enum FlowContextError {
    /// Session token is missing its `uid` or `id`
    #[error("Invalid token")]
    InvalidToken,

    /// The cache client rejected an operation
    #[error(transparent)]
    Cache(#[from] anyhow::Error),
}

/// Reasons a submitted flow identifier is rejected
///
/// The display strings are the `reason` values logged by verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRejection {
    #[error("missing payload")]
    MissingPayload,

    #[error("missing context")]
    MissingContext,

    #[error("missing flowId")]
    MissingFlowId,

    #[error("missing flowBeginTime")]
    MissingFlowBeginTime,

    #[error("expired flowBeginTime")]
    ExpiredFlowBeginTime,

    #[error("invalid signature")]
    InvalidSignature,
}
