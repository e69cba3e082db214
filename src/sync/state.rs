//! Sync state machine.
//!
//! ```text
//!          flush                 all persisted          display delay
//! Idle ───────────► Syncing(n) ────────────────► Synced ─────────────► Idle
//!   ▲                   │
//!   │                   │ any field failed
//!   │                   ▼
//!   └──(next clean flush)── Error
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

/// Snapshot published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub phase: SyncPhase,
    /// Drafts in the flush currently running.
    pub in_flight: usize,
    /// Drafts not yet confirmed persisted.
    pub pending: usize,
    pub last_error: Option<String>,
}

impl SyncState {
    pub fn is_error(&self) -> bool {
        self.phase == SyncPhase::Error
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            SyncPhase::Idle if self.pending > 0 => write!(f, "Unsaved changes ({})", self.pending),
            SyncPhase::Idle => f.write_str("Idle"),
            SyncPhase::Syncing => write!(f, "Syncing ({})…", self.in_flight),
            SyncPhase::Synced => f.write_str("Synced"),
            SyncPhase::Error => {
                write!(f, "Sync failed ({} pending)", self.pending)?;
                if let Some(error) = &self.last_error {
                    write!(f, ": {error}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut state = SyncState::default();
        assert_eq!(state.to_string(), "Idle");

        state.pending = 2;
        assert_eq!(state.to_string(), "Unsaved changes (2)");

        state.phase = SyncPhase::Syncing;
        state.in_flight = 3;
        assert_eq!(state.to_string(), "Syncing (3)…");

        state.phase = SyncPhase::Error;
        state.pending = 1;
        state.last_error = Some("write rejected: x".into());
        assert_eq!(state.to_string(), "Sync failed (1 pending): write rejected: x");
    }
}
