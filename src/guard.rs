use crate::error::{Result, SabotageError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    ApplyingOwnEdit,
}

/// Suppresses save handling while one of our own edits is being written.
///
/// Clones share the same state, so the writer and the save hook can each
/// hold one.
#[derive(Debug, Clone, Default)]
pub struct EditGuard {
    applying: Arc<AtomicBool>,
}

impl EditGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GuardState {
        if self.applying.load(Ordering::Acquire) {
            GuardState::ApplyingOwnEdit
        } else {
            GuardState::Idle
        }
    }

    pub fn should_handle_save(&self) -> bool {
        self.state() == GuardState::Idle
    }

    /// Enter `ApplyingOwnEdit`. The state returns to `Idle` when the token drops.
    pub fn begin_own_edit(&self) -> Result<OwnEdit> {
        self.applying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SabotageError::Reentrant)?;
        Ok(OwnEdit {
            applying: Arc::clone(&self.applying),
        })
    }
}

#[derive(Debug)]
#[must_use = "the guard returns to Idle as soon as the token is dropped"]
pub struct OwnEdit {
    applying: Arc<AtomicBool>,
}

impl Drop for OwnEdit {
    fn drop(&mut self) {
        self.applying.store(false, Ordering::Release);
    }
}
