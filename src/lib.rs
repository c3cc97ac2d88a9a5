//! Tic-tac-toe promo server.
//!
//! A player beats a deliberately imperfect opponent, the win is written to
//! a ledger, and a Telegram bot later trades a verified win for a
//! single-use promo code.
//!
//! # Architecture
//!
//! - **Engine** ([`tictac_engine`]): stateless move step, no I/O
//! - **Win ledger**: idempotent "this session won" records
//! - **Allocator**: claims one code per claimant from a finite pool, safe
//!   under concurrent claims across processes
//! - **Sync loop**: polls Telegram, verifies wins, replies with codes
//! - **Server**: axum routes for moves and win/lose reports
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tictac_promo::{PromoAllocator, RewardStore, SqliteStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: Arc<dyn RewardStore> =
//!     Arc::new(SqliteStore::open("promo.db".to_string(), Duration::from_secs(15))?);
//! let allocator = PromoAllocator::new(store);
//! let code = allocator.claim(Some("tg:42")).await?;
//! println!("{}", code);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod game_service;
mod ledger;
mod promo;
mod server;
mod telegram;

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError, FileConfig, StoreSettings, normalize_value};

// Crate-level exports - Store
pub use db::{
    MIGRATIONS, NewPromoCode, NewWinRecord, PoolStats, PromoCode, RewardStore, SqliteStore,
    StoreError, WinRecord,
};

// Crate-level exports - Rewards
pub use ledger::{RecordOutcome, WinLedger};
pub use promo::{ClaimError, ClaimErrorKind, MAX_CLAIM_ATTEMPTS, PromoAllocator};

// Crate-level exports - Game
pub use game_service::{GameService, OpsChannel};
pub use tictac_engine::{Board, Cell, GameStatus, MoveError, MoveErrorKind, MoveOutcome};

// Crate-level exports - Messaging
pub use telegram::{
    ChannelError, DEFAULT_POLL_INTERVAL, InboundEvent, LONG_POLL_SECS, MessagingChannel,
    StartCommand, SyncLoop, SyncLoopHandle, TelegramChannel, claimant_for, parse_start,
};

// Crate-level exports - HTTP
pub use server::{
    ApiError, AppState, MAX_SESSION_ID_LEN, MoveRequest, MoveResponse, SessionRequest,
    SuccessResponse, router,
};
