use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::request::FlowRequest;
use crate::common::FlowContextError;

/// Session token fields visible to the flow context
///
/// Inserted into request extensions by the authentication layer. Either field
/// may be missing on a malformed token; `TokenIdentity::from_token` rejects it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub id: Option<String>,
    pub uid: Option<String>,
}

impl SessionToken {
    pub fn new(uid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            uid: Some(uid.into()),
        }
    }

    pub fn has_id(&self) -> bool {
        non_empty(&self.id).is_some()
    }

    pub fn has_uid(&self) -> bool {
        non_empty(&self.uid).is_some()
    }
}

/// Resolve the token a request speaks for
///
/// Authenticated credentials win. Otherwise a body carrying both `uid` and
/// `code` (verification links, before a real token is attached) stands in for
/// one, with `code` as the token id.
pub fn resolve_token(request: &FlowRequest) -> Option<SessionToken> {
    if let Some(credentials) = &request.credentials {
        return Some(credentials.clone());
    }

    let payload = request.payload.as_ref()?;
    match (non_empty(&payload.uid), non_empty(&payload.code)) {
        (Some(uid), Some(code)) => Some(SessionToken::new(uid, code)),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// One-way cache key derived from a session token
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenIdentity(String);

impl TokenIdentity {
    /// Hash `uid` then `id` with SHA256, base64 encoded
    pub fn from_token(token: &SessionToken) -> Result<Self, FlowContextError> {
        let uid = non_empty(&token.uid).ok_or(FlowContextError::InvalidToken)?;
        let id = non_empty(&token.id).ok_or(FlowContextError::InvalidToken)?;

        let mut hasher = Sha256::new();
        hasher.update(uid.as_bytes());
        hasher.update(id.as_bytes());
        Ok(Self(STANDARD.encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::flow::request::FlowPayload;

    fn uid(c: char) -> String {
        c.to_string().repeat(64)
    }

    #[test]
    fn test_identity_is_deterministic() {
        let token = SessionToken::new(uid('c'), "foo");
        let a = TokenIdentity::from_token(&token).unwrap();
        let b = TokenIdentity::from_token(&token.clone()).unwrap();
        assert_eq!(a, b, "Same token should produce same identity");
    }

    #[test]
    fn test_identity_matches_sha256_of_uid_then_id() {
        let token = SessionToken::new(uid('c'), "foo");
        let identity = TokenIdentity::from_token(&token).unwrap();

        let mut hasher = Sha256::new();
        hasher.update(format!("{}foo", uid('c')).as_bytes());
        assert_eq!(identity.as_str(), STANDARD.encode(hasher.finalize()));
        // 32-byte digest, padded base64
        assert_eq!(identity.as_str().len(), 44);
    }

    #[test]
    fn test_distinct_tokens_have_distinct_identities() {
        let a = TokenIdentity::from_token(&SessionToken::new(uid('7'), "wibble")).unwrap();
        let b = TokenIdentity::from_token(&SessionToken::new(uid('7'), "wobble")).unwrap();
        let c = TokenIdentity::from_token(&SessionToken::new(uid('6'), "wibble")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_or_empty_fields_are_invalid() {
        let missing_uid = SessionToken {
            id: Some("foo".to_string()),
            uid: None,
        };
        let empty_id = SessionToken::new(uid('c'), "");

        assert!(matches!(
            TokenIdentity::from_token(&missing_uid),
            Err(FlowContextError::InvalidToken)
        ));
        assert!(matches!(
            TokenIdentity::from_token(&empty_id),
            Err(FlowContextError::InvalidToken)
        ));
    }

    #[test]
    fn test_credentials_win_over_body_token() {
        let credentials = SessionToken::new(uid('7'), "wibble");
        let request = FlowRequest::builder()
            .credentials(credentials.clone())
            .payload(FlowPayload {
                uid: Some(uid('6')),
                code: Some("blee".to_string()),
                ..Default::default()
            })
            .build();

        assert_eq!(resolve_token(&request), Some(credentials));
    }

    #[test]
    fn test_body_token_uses_code_as_id() {
        let request = FlowRequest::builder()
            .payload(FlowPayload {
                uid: Some(uid('6')),
                code: Some("blee".to_string()),
                ..Default::default()
            })
            .build();

        assert_eq!(
            resolve_token(&request),
            Some(SessionToken::new(uid('6'), "blee"))
        );
    }

    #[test]
    fn test_partial_body_token_is_absent() {
        let request = FlowRequest::builder()
            .payload(FlowPayload {
                uid: Some(uid('6')),
                ..Default::default()
            })
            .build();

        assert_eq!(resolve_token(&request), None);
        assert_eq!(resolve_token(&FlowRequest::default()), None);
    }
}
