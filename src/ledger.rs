//! Win ledger: the record that a session won.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::db::{RewardStore, StoreError};

/// What [`WinLedger::record_win`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First win for the session.
    Recorded,
    /// The session had already won; nothing changed.
    AlreadyRecorded,
    /// No session id came with the win, so nothing can be claimed later.
    NoSession,
}

/// Idempotent record of winning sessions.
#[derive(Clone)]
pub struct WinLedger {
    store: Arc<dyn RewardStore>,
}

impl WinLedger {
    /// Creates a ledger over `store`.
    pub fn new(store: Arc<dyn RewardStore>) -> Self {
        Self { store }
    }

    /// Records a win for `session_id`.
    ///
    /// A missing or blank session id is not an error: the win stands but
    /// becomes unclaimable. Repeated wins for a session are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store write fails. Callers on the game
    /// path log and drop it.
    #[instrument(skip(self))]
    pub async fn record_win(&self, session_id: Option<&str>) -> Result<RecordOutcome, StoreError> {
        let Some(session_id) = session_id.map(str::trim).filter(|s| !s.is_empty()) else {
            warn!("Win not recorded: session id is missing");
            return Ok(RecordOutcome::NoSession);
        };

        if self.store.insert_win(session_id).await? {
            info!(session_id, "Win recorded");
            Ok(RecordOutcome::Recorded)
        } else {
            debug!(session_id, "Win already on record");
            Ok(RecordOutcome::AlreadyRecorded)
        }
    }

    /// Whether `session_id` has a recorded win.
    ///
    /// A failed lookup reads as "no win" so an outage never grants a reward.
    #[instrument(skip(self))]
    pub async fn has_win(&self, session_id: &str) -> bool {
        match self.store.find_win(session_id).await {
            Ok(record) => record.is_some(),
            Err(e) => {
                warn!(error = %e, session_id, "Win lookup failed, treating as no win");
                false
            }
        }
    }
}

impl std::fmt::Debug for WinLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinLedger").finish_non_exhaustive()
    }
}
