//! Game endpoints' business logic: the engine step plus win bookkeeping.

use std::sync::Arc;

use tictac_engine::{Board, GameStatus, MoveError, MoveOutcome, apply_move};
use tracing::{debug, error, instrument, warn};

use crate::WinLedger;
use crate::telegram::MessagingChannel;

/// Operational chat that hears about losses.
#[derive(Clone)]
pub struct OpsChannel {
    channel: Arc<dyn MessagingChannel>,
    chat_id: i64,
}

impl OpsChannel {
    /// Creates a notifier posting to `chat_id`.
    pub fn new(channel: Arc<dyn MessagingChannel>, chat_id: i64) -> Self {
        Self { channel, chat_id }
    }
}

/// Runs moves and records wins.
#[derive(Clone)]
pub struct GameService {
    ledger: WinLedger,
    ops: Option<OpsChannel>,
}

impl GameService {
    /// Creates a service; `ops` receives loss notifications when set.
    pub fn new(ledger: WinLedger, ops: Option<OpsChannel>) -> Self {
        Self { ledger, ops }
    }

    /// Validates and plays one move, then records the win if there is one.
    ///
    /// Ledger trouble never changes the returned result.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] for a malformed board or an illegal cell.
    #[instrument(skip(self, cells))]
    pub async fn play_move(
        &self,
        session_id: Option<&str>,
        cells: &[i64],
        cell_index: i64,
    ) -> Result<MoveOutcome, MoveError> {
        let outcome = {
            let board = Board::from_cells(cells)?;
            let mut rng = rand::thread_rng();
            apply_move(board, cell_index, &mut rng)?
        };
        debug!(status = %outcome.status(), "Move played");

        if outcome.status() == GameStatus::Win {
            self.record_win(session_id).await;
        }
        Ok(outcome)
    }

    /// Records a win reported by the client.
    #[instrument(skip(self))]
    pub async fn report_win(&self, session_id: Option<&str>) {
        self.record_win(session_id).await;
    }

    /// Notes a loss; the ops chat is told in the background.
    #[instrument(skip(self))]
    pub fn report_lose(&self, session_id: Option<&str>) {
        let Some(ops) = self.ops.clone() else {
            debug!("No ops chat configured, loss not forwarded");
            return;
        };
        let text = match session_id {
            Some(session_id) => format!("❌ Loss (session {})", session_id),
            None => "❌ Loss".to_string(),
        };
        tokio::spawn(async move {
            if let Err(e) = ops.channel.send_text(ops.chat_id, &text).await {
                warn!(error = %e, "Failed to forward loss notification");
            }
        });
    }

    async fn record_win(&self, session_id: Option<&str>) {
        // The game answer stands whether or not the ledger write lands.
        match self.ledger.record_win(session_id).await {
            Ok(outcome) => debug!(?outcome, "Win bookkeeping done"),
            Err(e) => error!(error = %e, ?session_id, "Failed to record win"),
        }
    }
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("ledger", &self.ledger)
            .field("ops_chat", &self.ops.as_ref().map(|o| o.chat_id))
            .finish()
    }
}
