//! Per-context mutual exclusion.
//!
//! Every operation that mutates a context's voting round or progression
//! pointer runs while holding that context's [`ContextGuard`]. Distinct
//! contexts never contend. A context's lock is dropped from the registry
//! when its last guard is released with nobody waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::context::JudgingContext;

type LockMap = Mutex<HashMap<JudgingContext, Arc<tokio::sync::Mutex<()>>>>;

/// Registry of one async lock per judging context.
#[derive(Debug, Default)]
pub struct ContextLocks {
    locks: Arc<LockMap>,
}

impl ContextLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `context`.
    pub async fn acquire(&self, context: JudgingContext) -> ContextGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(context).or_default())
        };
        ContextGuard {
            context,
            registry: Arc::clone(&self.locks),
            _guard: lock.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Proof of exclusive access to one context. Released on drop.
#[derive(Debug)]
pub struct ContextGuard {
    context: JudgingContext,
    registry: Arc<LockMap>,
    _guard: OwnedMutexGuard<()>,
}

impl ContextGuard {
    /// The context this guard serializes.
    #[must_use]
    pub fn context(&self) -> JudgingContext {
        self.context
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Map entry plus this guard: no acquirer holds or waits for the lock.
        if locks
            .get(&self.context)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2)
        {
            locks.remove(&self.context);
        }
    }
}
