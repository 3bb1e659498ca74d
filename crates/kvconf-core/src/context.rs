//! Per-operation context carrying an optional deadline.
//!
//! Every repository and ledger call takes an [`OpContext`]. Each backend call
//! runs under the deadline, and multi-step operations check it before every
//! step so an expired request never starts new writes.

use std::future::Future;
use std::time::Duration;

use kvconf_common::{KvconfError, Result};
use kvconf_store::StoreResult;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context without a deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with `Cancelled` once the deadline has passed
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            return Err(KvconfError::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Run one backend call under this context.
    ///
    /// The call is not started when the deadline already passed, and is
    /// dropped mid-flight when the deadline passes while it is pending.
    pub async fn run<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.check()?;
        metrics::counter!("kv_backend_ops_total", "op" => op).increment(1);

        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(op, "Backend call aborted by deadline");
                    return Err(KvconfError::Cancelled(format!(
                        "deadline exceeded during {}",
                        op
                    )));
                }
            },
            None => call.await,
        };

        result.map_err(KvconfError::from)
    }
}
