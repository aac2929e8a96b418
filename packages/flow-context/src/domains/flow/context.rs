use std::sync::Arc;
use tracing::error;

use super::metadata::{FlowEventData, FlowMetadata};
use super::request::FlowRequest;
use super::signature::FlowSigner;
use super::token::{resolve_token, SessionToken, TokenIdentity};
use crate::common::FlowContextError;
use crate::config::Config;
use crate::kernel::{BaseCache, MemoryCache};

const STASH_OP: &str = "flow.context.stash";
const GATHER_OP: &str = "flow.context.gather";

/// Flow context service
///
/// Verifies flow identifiers and keeps flow metadata in the cache under the
/// session token's identity.
///
/// `stash` and `gather` log their failures and carry on; `clear` returns them.
#[derive(Clone)]
pub struct FlowContext {
    cache: Arc<dyn BaseCache>,
    signer: FlowSigner,
}

impl FlowContext {
    pub fn new(cache: Arc<dyn BaseCache>, config: &Config) -> Self {
        Self {
            cache,
            signer: FlowSigner::new(&config.flow_id_key, config.flow_id_expiry_ms),
        }
    }

    /// Build a flow context backed by an in-memory cache
    pub fn in_memory(config: &Config) -> Self {
        Self::new(Arc::new(MemoryCache::from_config(config)), config)
    }

    pub fn signer(&self) -> &FlowSigner {
        &self.signer
    }

    /// Validate the request's flow id, stripping it when invalid
    pub fn validate(&self, request: &mut FlowRequest) -> bool {
        self.signer.validate(request)
    }

    /// Save the request's inline metadata against `token`
    ///
    /// Never fails: invalid tokens and cache errors are logged and dropped.
    pub async fn stash(&self, token: &SessionToken, request: &FlowRequest) {
        let Some(metadata) = request.metrics_context() else {
            return;
        };

        let service = request
            .query
            .get("service")
            .cloned()
            .or_else(|| request.payload.as_ref()?.service.clone())
            .or_else(|| metadata.service.clone());

        if let Err(err) = self.write(token, metadata, service).await {
            error!(
                op = STASH_OP,
                err = %err,
                has_token = true,
                has_id = token.has_id(),
                has_uid = token.has_uid(),
                "failed to stash flow context"
            );
        }
    }

    async fn write(
        &self,
        token: &SessionToken,
        metadata: &FlowMetadata,
        service: Option<String>,
    ) -> Result<(), FlowContextError> {
        let identity = TokenIdentity::from_token(token)?;
        let record = metadata
            .to_cached_record(service)
            .map_err(anyhow::Error::from)?;
        self.cache.set(identity.as_str(), record).await?;
        Ok(())
    }

    /// Merge the request's flow metadata into `data`
    ///
    /// Inline metadata wins over the cache (which is then not read). Fields
    /// already set on `data` are kept, except `utm_*` under DNT, which is
    /// cleared whether or not any metadata was found. Never fails: when nothing can be
    /// gathered `data` comes back unchanged.
    pub async fn gather(&self, request: &FlowRequest, data: FlowEventData) -> FlowEventData {
        let now = chrono::Utc::now().timestamp_millis();
        self.gather_at(request, data, now).await
    }

    pub async fn gather_at(
        &self,
        request: &FlowRequest,
        mut data: FlowEventData,
        now: i64,
    ) -> FlowEventData {
        let cached = match request.metrics_context() {
            Some(_) => None,
            None => self.read(request).await,
        };

        let do_not_track = request.do_not_track();
        match request.metrics_context().or(cached.as_ref()) {
            Some(metadata) => data.merge_from(metadata, now, do_not_track),
            None if do_not_track => data.clear_utm(),
            None => {}
        }

        data
    }

    async fn read(&self, request: &FlowRequest) -> Option<FlowMetadata> {
        let token = resolve_token(request)?;

        match self.lookup(&token).await {
            Ok(metadata) => metadata,
            Err(err) => {
                error!(
                    op = GATHER_OP,
                    err = %err,
                    has_token = true,
                    has_id = token.has_id(),
                    has_uid = token.has_uid(),
                    "failed to gather flow context"
                );
                None
            }
        }
    }

    async fn lookup(&self, token: &SessionToken) -> Result<Option<FlowMetadata>, FlowContextError> {
        let identity = TokenIdentity::from_token(token)?;
        let Some(record) = self.cache.get(identity.as_str()).await? else {
            return Ok(None);
        };

        let metadata: FlowMetadata = serde_json::from_value(record).map_err(anyhow::Error::from)?;
        Ok(Some(metadata))
    }

    /// Delete the cached metadata for the request's token
    ///
    /// A request without a token is a no-op. Invalid tokens and cache
    /// failures are returned to the caller.
    pub async fn clear(&self, request: &FlowRequest) -> Result<(), FlowContextError> {
        let Some(token) = resolve_token(request) else {
            return Ok(());
        };

        let identity = TokenIdentity::from_token(&token)?;
        self.cache.del(identity.as_str()).await?;
        Ok(())
    }
}
