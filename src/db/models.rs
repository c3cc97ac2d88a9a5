//! Database models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;

/// A session that reached a winning state.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::game_wins)]
pub struct WinRecord {
    session_id: String,
    won_at: NaiveDateTime,
}

/// Insertable win record.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_wins)]
pub struct NewWinRecord {
    session_id: String,
    won_at: NaiveDateTime,
}

/// One single-use code from the pool.
///
/// `is_used` flips to true exactly once, together with `used_at` and
/// `used_by`; the row is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, new)]
#[diesel(table_name = schema::promo_codes)]
pub struct PromoCode {
    id: i32,
    code: String,
    is_used: bool,
    used_at: Option<NaiveDateTime>,
    used_by: Option<String>,
}

/// Insertable pool entry, created unused.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::promo_codes)]
pub struct NewPromoCode {
    code: String,
}

/// Pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct PoolStats {
    total: i64,
    unused: i64,
}

impl PoolStats {
    /// Codes already bound to a claimant.
    pub fn used(&self) -> i64 {
        self.total - self.unused
    }
}
