//! SQLite-backed store for wins and promo codes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    NewPromoCode, NewWinRecord, PoolStats, PromoCode, RewardStore, StoreError, WinRecord, schema,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u64 = 5_000;

diesel::define_sql_function! {
    fn random() -> diesel::sql_types::BigInt;
}

/// SQLite store. Opens a connection per call on a blocking thread.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
    timeout: Duration,
}

impl SqliteStore {
    /// Creates a store for the database at `db_path` without touching it.
    ///
    /// Every call is bounded by `timeout`.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String, timeout: Duration) -> Self {
        info!(path = %db_path, ?timeout, "Creating SqliteStore");
        Self { db_path, timeout }
    }

    /// Creates a store and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String, timeout: Duration) -> Result<Self, StoreError> {
        let store = Self::new(db_path, timeout);
        store.migrate()?;
        Ok(store)
    }

    /// Runs pending migrations and switches the journal to WAL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn migrate(&self) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migrations failed: {}", e)))?;
        info!(applied = applied.len(), "Migrations up to date");
        Ok(())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::new(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }

    /// Runs `op` on a blocking thread with a fresh connection, bounded by
    /// the store timeout.
    ///
    /// A timeout only abandons the wait: the blocking task keeps running and
    /// may still commit. A named claimant finds such a late bind through
    /// [`RewardStore::find_code_by_claimant`] on retry; an anonymous bind
    /// that lands after its timeout leaves the code used with nobody told.
    async fn run<T, F>(&self, label: &'static str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = store.connection()?;
            op(&mut conn)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(StoreError::new(format!("{} task failed: {}", label, join))),
            Err(_) => {
                warn!(label, timeout = ?self.timeout, "Store call timed out");
                Err(StoreError::new(format!(
                    "{} timed out after {:?}",
                    label, self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl RewardStore for SqliteStore {
    #[instrument(skip(self))]
    async fn insert_win(&self, session_id: &str) -> Result<bool, StoreError> {
        let record = NewWinRecord::new(session_id.to_string(), Utc::now().naive_utc());
        let inserted = self
            .run("insert_win", move |conn| {
                Ok(diesel::insert_or_ignore_into(schema::game_wins::table)
                    .values(&record)
                    .execute(conn)?)
            })
            .await?;
        debug!(inserted, "Win insert finished");
        Ok(inserted == 1)
    }

    #[instrument(skip(self))]
    async fn find_win(&self, session_id: &str) -> Result<Option<WinRecord>, StoreError> {
        let session_id = session_id.to_string();
        self.run("find_win", move |conn| {
            Ok(schema::game_wins::table
                .filter(schema::game_wins::session_id.eq(session_id))
                .select(WinRecord::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_code_by_claimant(&self, claimant: &str) -> Result<Option<PromoCode>, StoreError> {
        let claimant = claimant.to_string();
        self.run("find_code_by_claimant", move |conn| {
            Ok(schema::promo_codes::table
                .filter(schema::promo_codes::used_by.eq(claimant))
                .select(PromoCode::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn pick_unused_code(&self) -> Result<Option<PromoCode>, StoreError> {
        // Random order spreads concurrent claimants over different rows.
        self.run("pick_unused_code", |conn| {
            Ok(schema::promo_codes::table
                .filter(schema::promo_codes::is_used.eq(false))
                .order(random())
                .select(PromoCode::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn bind_code(
        &self,
        id: i32,
        claimant: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<Option<PromoCode>, StoreError> {
        use schema::promo_codes::dsl;

        let claimant = claimant.map(str::to_string);
        self.run("bind_code", move |conn| {
            let updated = diesel::update(
                dsl::promo_codes
                    .filter(dsl::id.eq(id))
                    .filter(dsl::is_used.eq(false)),
            )
            .set((
                dsl::is_used.eq(true),
                dsl::used_at.eq(Some(at)),
                dsl::used_by.eq(claimant),
            ))
            .returning(PromoCode::as_returning())
            .get_result(conn)
            .optional();

            match updated {
                Ok(row) => Ok(row),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                    debug!(id, message = info.message(), "Claimant already bound elsewhere");
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    #[instrument(skip(self, codes), fields(count = codes.len()))]
    async fn seed_codes(&self, codes: Vec<String>) -> Result<usize, StoreError> {
        let inserted = self
            .run("seed_codes", move |conn| {
                conn.transaction::<_, DieselError, _>(|conn| {
                    let mut inserted = 0;
                    for code in codes {
                        inserted += diesel::insert_or_ignore_into(schema::promo_codes::table)
                            .values(&NewPromoCode::new(code))
                            .execute(conn)?;
                    }
                    Ok(inserted)
                })
                .map_err(StoreError::from)
            })
            .await?;
        info!(inserted, "Codes seeded");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn pool_stats(&self) -> Result<PoolStats, StoreError> {
        self.run("pool_stats", |conn| {
            let total: i64 = schema::promo_codes::table.count().get_result(conn)?;
            let unused: i64 = schema::promo_codes::table
                .filter(schema::promo_codes::is_used.eq(false))
                .count()
                .get_result(conn)?;
            Ok(PoolStats::new(total, unused))
        })
        .await
    }
}
