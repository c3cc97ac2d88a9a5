//! Persistence layer for the win ledger and the promo code pool.

mod error;
mod models;
mod repository;
mod schema; // Diesel schema - internal use only
mod store;

pub use error::StoreError;
pub use models::{NewPromoCode, NewWinRecord, PoolStats, PromoCode, WinRecord};
pub use repository::{MIGRATIONS, SqliteStore};
pub use store::RewardStore;
