//! Promo code allocation.
//!
//! Claims one unused code from a finite pool and binds it to a claimant.
//! Safety under contention rests on the store's conditional update: a row
//! is only taken if it is still unused at the moment of the write. No lock
//! is held in-process, since claimants may live in other processes.

use std::sync::Arc;

use chrono::Utc;
use derive_more::{Display, Error};
use tracing::{debug, info, instrument, warn};

use crate::db::{RewardStore, StoreError};

/// Default number of select-then-swap rounds before giving up.
pub const MAX_CLAIM_ATTEMPTS: u32 = 8;

/// Why a claim failed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ClaimErrorKind {
    /// The pool has no unused codes left.
    #[display("no promo codes available")]
    Exhausted,
    /// Codes existed but every swap lost a race.
    #[display("promo code race not resolved after {} attempts", attempts)]
    RaceUnresolved {
        /// Rounds tried.
        attempts: u32,
    },
    /// The store failed.
    #[display("store request failed: {}", reason)]
    Store {
        /// Underlying failure.
        reason: String,
    },
}

/// Claim error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Claim error: {} at {}:{}", kind, file, line)]
pub struct ClaimError {
    /// Failure class.
    pub kind: ClaimErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ClaimError {
    /// Creates a new claim error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ClaimErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// The pool is sold out.
    pub fn is_exhausted(&self) -> bool {
        self.kind == ClaimErrorKind::Exhausted
    }

    /// A transient failure: store trouble or an unsettled race.
    pub fn is_unavailable(&self) -> bool {
        !self.is_exhausted()
    }
}

impl From<StoreError> for ClaimError {
    #[track_caller]
    fn from(err: StoreError) -> Self {
        Self::new(ClaimErrorKind::Store {
            reason: err.to_string(),
        })
    }
}

/// Hands out single-use codes, at most one per claimant.
#[derive(Clone)]
pub struct PromoAllocator {
    store: Arc<dyn RewardStore>,
    max_attempts: u32,
}

impl PromoAllocator {
    /// Creates an allocator with the default retry budget.
    pub fn new(store: Arc<dyn RewardStore>) -> Self {
        Self::with_max_attempts(store, MAX_CLAIM_ATTEMPTS)
    }

    /// Creates an allocator that gives up after `max_attempts` lost races.
    pub fn with_max_attempts(store: Arc<dyn RewardStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Claims a code for `claimant`.
    ///
    /// A claimant that already holds a code gets the same code back without
    /// consuming the pool. An anonymous claim (`None` or blank) always takes
    /// a fresh code.
    ///
    /// # Errors
    ///
    /// [`ClaimErrorKind::Exhausted`] when no unused code remains;
    /// [`ClaimErrorKind::RaceUnresolved`] when every round lost its race and
    /// unused codes still remain;
    /// [`ClaimErrorKind::Store`] when the store fails.
    #[instrument(skip(self))]
    pub async fn claim(&self, claimant: Option<&str>) -> Result<String, ClaimError> {
        let claimant = claimant.map(str::trim).filter(|c| !c.is_empty());

        if let Some(code) = self.bound_code(claimant).await? {
            debug!(?claimant, "Returning previously bound code");
            return Ok(code);
        }

        for attempt in 1..=self.max_attempts {
            let Some(candidate) = self.store.pick_unused_code().await? else {
                warn!(?claimant, "Promo code pool exhausted");
                return Err(ClaimError::new(ClaimErrorKind::Exhausted));
            };

            let now = Utc::now().naive_utc();
            if let Some(bound) = self.store.bind_code(*candidate.id(), claimant, now).await? {
                info!(?claimant, id = bound.id(), attempt, "Promo code claimed");
                return Ok(bound.code().clone());
            }

            debug!(?claimant, id = candidate.id(), attempt, "Lost race for code");
            // A concurrent retry for the same claimant may have won.
            if let Some(code) = self.bound_code(claimant).await? {
                return Ok(code);
            }
        }

        // Races lost to the last few codes read as a sold-out pool.
        if self.store.pick_unused_code().await?.is_none() {
            warn!(?claimant, "Promo code pool exhausted after lost races");
            return Err(ClaimError::new(ClaimErrorKind::Exhausted));
        }

        warn!(?claimant, attempts = self.max_attempts, "Promo code race not resolved");
        Err(ClaimError::new(ClaimErrorKind::RaceUnresolved {
            attempts: self.max_attempts,
        }))
    }

    async fn bound_code(&self, claimant: Option<&str>) -> Result<Option<String>, StoreError> {
        let Some(claimant) = claimant else {
            return Ok(None);
        };
        let existing = self.store.find_code_by_claimant(claimant).await?;
        Ok(existing.map(|row| row.code().clone()))
    }
}

impl std::fmt::Debug for PromoAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromoAllocator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
