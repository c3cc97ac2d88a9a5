//! Polling loop bridging Telegram to the win ledger and the allocator.
//!
//! The cursor lives in memory only. A restart replays whatever Telegram
//! still holds, which is safe because claims are idempotent per chat.
//! Persisting the cursor would be the upgrade if replays ever matter.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::messages::{self, StartCommand};
use super::{ChannelError, InboundEvent, MessagingChannel};
use crate::{PromoAllocator, WinLedger};

/// Pause between iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Server-side long-poll wait per fetch.
pub const LONG_POLL_SECS: u64 = 10;

/// Pulls new messages, verifies wins, and hands out codes.
pub struct SyncLoop {
    channel: Arc<dyn MessagingChannel>,
    ledger: WinLedger,
    allocator: PromoAllocator,
    cursor: Option<i64>,
    interval: Duration,
    wait_secs: u64,
}

impl SyncLoop {
    /// Creates a loop with the default interval and long-poll wait.
    pub fn new(
        channel: Arc<dyn MessagingChannel>,
        ledger: WinLedger,
        allocator: PromoAllocator,
    ) -> Self {
        Self {
            channel,
            ledger,
            allocator,
            cursor: None,
            interval: DEFAULT_POLL_INTERVAL,
            wait_secs: LONG_POLL_SECS,
        }
    }

    /// Sets the pause between iterations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the long-poll wait passed to the channel.
    pub fn with_wait_secs(mut self, wait_secs: u64) -> Self {
        self.wait_secs = wait_secs;
        self
    }

    /// Highest event id seen so far.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Runs one fetch-and-handle pass. Returns how many events arrived.
    ///
    /// The cursor moves past each event before it is handled, so an event
    /// whose handling is cut short is not fetched again.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if fetching fails. Reply failures are logged
    /// and do not stop the batch.
    #[instrument(skip(self), fields(cursor = ?self.cursor))]
    pub async fn sync_once(&mut self) -> Result<usize, ChannelError> {
        let since = self.cursor.map(|c| c + 1);
        let events = self.channel.fetch_events(since, self.wait_secs).await?;
        if events.is_empty() {
            return Ok(0);
        }
        debug!(count = events.len(), "Handling events");

        for event in &events {
            self.cursor = Some(self.cursor.map_or(*event.id(), |c| c.max(*event.id())));
            self.handle_event(event).await;
        }
        Ok(events.len())
    }

    async fn handle_event(&self, event: &InboundEvent) {
        let (Some(chat_id), Some(text)) = (*event.chat_id(), event.text().as_deref()) else {
            return;
        };
        if let Some(command) = messages::parse_start(text) {
            self.handle_start(chat_id, command).await;
        }
    }

    #[instrument(skip(self))]
    async fn handle_start(&self, chat_id: i64, command: StartCommand<'_>) {
        let session_id = match command {
            StartCommand::Greeting => return self.reply(chat_id, messages::GREETING).await,
            StartCommand::Unrecognized(payload) => {
                debug!(chat_id, payload, "Unrecognized start payload");
                return self.reply(chat_id, messages::LINK_NOT_RECOGNIZED).await;
            }
            StartCommand::Session(session_id) => session_id,
        };

        if !self.ledger.has_win(session_id).await {
            return self.reply(chat_id, messages::NO_WIN_YET).await;
        }

        let claimant = messages::claimant_for(chat_id);
        match self.allocator.claim(Some(&claimant)).await {
            Ok(code) => {
                info!(chat_id, session_id, "Promo code delivered");
                self.reply(chat_id, &messages::code_issued(&code)).await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    claimant = %claimant,
                    exhausted = e.is_exhausted(),
                    "Promo code claim failed"
                );
                self.reply(chat_id, messages::NONE_AVAILABLE).await;
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.channel.send_text(chat_id, text).await {
            error!(error = %e, chat_id, "Failed to send reply");
        }
    }

    /// Starts polling on a background task.
    ///
    /// Iterations never overlap: the next one is scheduled only after the
    /// previous one settles, whatever its result.
    pub fn spawn(self) -> SyncLoopHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        SyncLoopHandle { stop_tx, join }
    }

    async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "Telegram polling started");
        loop {
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            if let Err(e) = self.sync_once().await {
                warn!(error = %e, "Telegram polling error");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Telegram polling stopped");
    }
}

impl std::fmt::Debug for SyncLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncLoop")
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .field("wait_secs", &self.wait_secs)
            .finish_non_exhaustive()
    }
}

/// Handle to a running [`SyncLoop`].
#[derive(Debug)]
pub struct SyncLoopHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SyncLoopHandle {
    /// Whether the loop task is still alive.
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Stops scheduling new iterations and waits for the current one.
    pub async fn stop(self) {
        // Send fails only if the loop already exited.
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "Telegram polling task ended abnormally");
        }
    }
}
