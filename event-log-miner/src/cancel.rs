//! Caller-scoped cancellation
//!
//! The miner checks these signals between stages only; a stage that has started
//! always runs to completion.

use crate::types::{MinerError, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag shared between a caller and a running miner
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelToken")
            .field(&self.is_cancelled())
            .finish()
    }
}

/// Cancellation token plus optional deadline, checked at stage boundaries
#[derive(Debug, Clone, Default)]
pub struct StageGuard {
    token: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl StageGuard {
    pub fn new(token: Option<CancelToken>, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// Fail if the caller cancelled or the deadline has passed
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.token.as_ref().is_some_and(CancelToken::is_cancelled) {
            log::debug!("Cancelled before stage '{}'", stage);
            return Err(MinerError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            log::debug!("Deadline passed before stage '{}'", stage);
            return Err(MinerError::DeadlineExceeded);
        }
        Ok(())
    }
}
