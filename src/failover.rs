//! Failover policy shared by every store operation that touches the
//! primary port.
//!
//! The original conditional-fallback logic lived inline at each call site;
//! it is centralized here so writes and reads both degrade the same way.

use std::future::Future;

use log::warn;

use crate::{DaybookError, Result};

/// Decides how a primary-store failure is recovered and surfaced.
///
/// Writes mirror the record to the fallback and still fail the call, so
/// the caller knows durability is degraded. Reads recover silently with
/// whatever the fallback produced; absence after recovery is
/// indistinguishable from a genuine miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailoverPolicy;

impl FailoverPolicy {
    /// Runs a primary write. On failure, invokes `mirror` to preserve a
    /// copy in the fallback store, then fails with `StorageFailed`
    /// regardless of the mirror outcome.
    pub async fn write<Fut>(
        &self,
        op: &str,
        primary: Fut,
        mirror: impl FnOnce() -> Result<()>,
    ) -> Result<()>
    where
        Fut: Future<Output = Result<()>>,
    {
        match primary.await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Primary store failed during {}: {}", op, e);
                if let Err(mirror_err) = mirror() {
                    warn!("Fallback mirror also failed during {}: {}", op, mirror_err);
                }
                Err(DaybookError::StorageFailed {
                    message: format!("{} rejected by primary store: {}", op, e),
                })
            }
        }
    }

    /// Runs a primary read. On failure, logs a warning and returns the
    /// caller-supplied recovery value instead of surfacing the error.
    pub async fn read<T, Fut>(&self, op: &str, primary: Fut, recover: impl FnOnce() -> T) -> T
    where
        Fut: Future<Output = Result<T>>,
    {
        match primary.await {
            Ok(value) => value,
            Err(e) => {
                warn!("Primary store failed during {}, using fallback: {}", op, e);
                recover()
            }
        }
    }
}
