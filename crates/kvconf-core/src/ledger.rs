//! Idempotency ledger.
//!
//! A token is recorded as a bare key at the root of the key space. By default
//! the value is empty and the entry never expires. With a TTL configured the
//! value holds the expiry as decimal unix seconds.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kvconf_common::{CONFIGS_ROOT, GROUPS_ROOT, KvconfError, Result};
use kvconf_store::KvBackend;
use tracing::{debug, warn};

use crate::context::OpContext;
use crate::key::{new_id, validate_segment};

pub const DUPLICATE_REQUEST_MESSAGE: &str = "request has already been sent";

#[derive(Clone)]
pub struct IdempotencyLedger {
    backend: Arc<dyn KvBackend>,
    ttl: Option<Duration>,
    fail_open: bool,
}

impl IdempotencyLedger {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            ttl: None,
            fail_open: true,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// When disabled, a failed lookup is reported instead of treated as unseen
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Tokens become bare keys, so they may not nest or shadow an entity root
    pub fn validate_token(token: &str) -> Result<()> {
        validate_segment("idempotency key", token, false)?;
        if token == CONFIGS_ROOT || token == GROUPS_ROOT {
            return Err(KvconfError::validation(format!(
                "idempotency key must not be '{}'",
                token
            )));
        }
        Ok(())
    }

    pub async fn has_seen(&self, ctx: &OpContext, token: &str) -> Result<bool> {
        match ctx.run("get", self.backend.get(token)).await {
            Ok(Some(entry)) => Ok(!is_expired(&entry.value)),
            Ok(None) => Ok(false),
            Err(err @ KvconfError::Cancelled(_)) => Err(err),
            Err(err) if self.fail_open => {
                warn!(token = %token, error = %err, "Idempotency lookup failed, treating token as unseen");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn mark_seen(&self, ctx: &OpContext, token: &str) -> Result<String> {
        let value = match self.ttl {
            Some(ttl) => {
                let expires_at = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
                Bytes::from(expires_at.to_string())
            }
            None => Bytes::new(),
        };
        ctx.run("put", self.backend.put(token, value)).await?;
        Ok(token.to_string())
    }

    /// Run `create` at most once per token.
    ///
    /// Returns the created entity together with the token that was recorded:
    /// the caller's token, or a generated one when none was supplied. Failing
    /// to record the token does not fail the create.
    pub async fn create_once<T, F, Fut>(
        &self,
        ctx: &OpContext,
        token: Option<&str>,
        create: F,
    ) -> Result<(T, String)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(token) = token {
            Self::validate_token(token)?;
            if self.has_seen(ctx, token).await? {
                debug!(token = %token, "Rejecting duplicate create");
                return Err(KvconfError::Conflict(DUPLICATE_REQUEST_MESSAGE.to_string()));
            }
        }

        let created = create().await?;

        let token = token.map(str::to_string).unwrap_or_else(new_id);
        if let Err(err) = self.mark_seen(ctx, &token).await {
            warn!(token = %token, error = %err, "Failed to record idempotency key");
        }

        Ok((created, token))
    }
}

fn is_expired(value: &[u8]) -> bool {
    if value.is_empty() {
        return false;
    }
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .is_some_and(|expires_at| chrono::Utc::now().timestamp() >= expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvconf_store::MemoryKvBackend;
    use kvconf_store::testutil::{FaultInjectingBackend, FaultOp};

    fn ledger() -> (IdempotencyLedger, MemoryKvBackend) {
        let backend = MemoryKvBackend::new();
        (IdempotencyLedger::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn test_mark_then_seen() {
        let (ledger, backend) = ledger();
        let ctx = OpContext::background();

        assert!(!ledger.has_seen(&ctx, "token-1").await.unwrap());
        assert_eq!(ledger.mark_seen(&ctx, "token-1").await.unwrap(), "token-1");
        assert!(ledger.has_seen(&ctx, "token-1").await.unwrap());

        // Bare key with an empty value
        let entry = backend.get("token-1").await.unwrap().unwrap();
        assert!(entry.value.is_empty());
    }

    #[tokio::test]
    async fn test_create_once_rejects_duplicate() {
        let (ledger, _) = ledger();
        let ctx = OpContext::background();

        let (value, token) = ledger
            .create_once(&ctx, Some("T"), || async { Ok(1) })
            .await
            .unwrap();
        assert_eq!((value, token.as_str()), (1, "T"));

        let mut ran = false;
        let second = ledger
            .create_once(&ctx, Some("T"), || {
                ran = true;
                async { Ok(2) }
            })
            .await;
        assert_eq!(
            second.unwrap_err(),
            KvconfError::Conflict(DUPLICATE_REQUEST_MESSAGE.to_string())
        );
        assert!(!ran);

        let (value, _) = ledger
            .create_once(&ctx, Some("U"), || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_create_once_generates_token() {
        let (ledger, backend) = ledger();
        let ctx = OpContext::background();

        let (_, token) = ledger
            .create_once(&ctx, None, || async { Ok(()) })
            .await
            .unwrap();
        assert!(!token.is_empty());
        assert!(backend.get(&token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_create_marks_nothing() {
        let (ledger, backend) = ledger();
        let ctx = OpContext::background();

        let result: Result<((), String)> = ledger
            .create_once(&ctx, Some("T"), || async {
                Err(KvconfError::backend("write failed"))
            })
            .await;
        assert!(matches!(result, Err(KvconfError::Backend(_))));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_tokens() {
        for token in ["", "a/b", "configs", "groups"] {
            assert!(matches!(
                IdempotencyLedger::validate_token(token),
                Err(KvconfError::Validation(_))
            ));
        }
        assert!(IdempotencyLedger::validate_token("0f4c-req").is_ok());
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_open() {
        let backend = Arc::new(FaultInjectingBackend::new());
        backend.set_failing(FaultOp::Get, true);
        let ctx = OpContext::background();

        let ledger = IdempotencyLedger::new(backend.clone());
        assert!(!ledger.has_seen(&ctx, "T").await.unwrap());

        let strict = IdempotencyLedger::new(backend).with_fail_open(false);
        assert!(matches!(
            strict.has_seen(&ctx, "T").await,
            Err(KvconfError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_failure_does_not_fail_create() {
        let backend = Arc::new(FaultInjectingBackend::new());
        backend.set_failing(FaultOp::Put, true);
        let ledger = IdempotencyLedger::new(backend);
        let ctx = OpContext::background();

        let (value, token) = ledger
            .create_once(&ctx, Some("T"), || async { Ok("created") })
            .await
            .unwrap();
        assert_eq!(value, "created");
        assert_eq!(token, "T");
        // Nothing was recorded, so the token is still usable
        assert!(!ledger.has_seen(&ctx, "T").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_entries_expire() {
        let backend = MemoryKvBackend::new();
        let ctx = OpContext::background();
        let ledger =
            IdempotencyLedger::new(Arc::new(backend.clone())).with_ttl(Some(Duration::from_secs(60)));

        ledger.mark_seen(&ctx, "fresh").await.unwrap();
        assert!(ledger.has_seen(&ctx, "fresh").await.unwrap());

        let past = chrono::Utc::now().timestamp() - 1;
        backend
            .put("stale", Bytes::from(past.to_string()))
            .await
            .unwrap();
        assert!(!ledger.has_seen(&ctx, "stale").await.unwrap());
    }
}
