//! The store collaborator used by the ledger and the allocator.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::db::{PoolStats, PromoCode, StoreError, WinRecord};

/// Transactional table access for wins and promo codes.
///
/// Implementations must keep the three outcomes apart: "no matching row"
/// (`Ok(None)` / `Ok(false)`), "row written" (`Ok(Some(_))` / `Ok(true)`),
/// and transport failure (`Err`).
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Inserts a win for `session_id` unless one exists.
    ///
    /// Returns `true` if a new row was created.
    async fn insert_win(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Looks up the win for `session_id`.
    async fn find_win(&self, session_id: &str) -> Result<Option<WinRecord>, StoreError>;

    /// Looks up the code already bound to `claimant`.
    async fn find_code_by_claimant(&self, claimant: &str) -> Result<Option<PromoCode>, StoreError>;

    /// Selects an unused code, chosen at random among the unused rows.
    async fn pick_unused_code(&self) -> Result<Option<PromoCode>, StoreError>;

    /// Atomically marks code `id` used by `claimant`, guarded by `is_used = false`.
    ///
    /// Returns `None` when the guard did not match (someone else took the
    /// row) or the claimant is already bound to another row.
    ///
    /// An `Err` does not prove the row stayed unused: a call that timed out
    /// may still have committed.
    async fn bind_code(
        &self,
        id: i32,
        claimant: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<Option<PromoCode>, StoreError>;

    /// Adds codes to the pool, ignoring ones already present.
    ///
    /// Returns how many were new.
    async fn seed_codes(&self, codes: Vec<String>) -> Result<usize, StoreError>;

    /// Counts total and unused codes.
    async fn pool_stats(&self) -> Result<PoolStats, StoreError>;
}
