//! Telegram side of the reward flow: the Bot API channel and the polling
//! loop that turns `/start <session>` into a promo code.

mod channel;
mod messages;
mod sync;

pub use channel::{ChannelError, InboundEvent, MessagingChannel, TelegramChannel};
pub use messages::{StartCommand, claimant_for, parse_start};
pub use sync::{DEFAULT_POLL_INTERVAL, LONG_POLL_SECS, SyncLoop, SyncLoopHandle};
