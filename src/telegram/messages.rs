//! Bot command parsing and reply texts.

use std::sync::LazyLock;

use regex::Regex;

/// Shape of a session token handed out by the game front end.
static SESSION_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^s_[0-9a-fA-F-]{10,}$").ok());

fn is_session_token(payload: &str) -> bool {
    SESSION_TOKEN
        .as_ref()
        .is_some_and(|re| re.is_match(payload))
}

pub(crate) const GREETING: &str =
    "Hi! Come back through the bot link in the game after you win to get your promo code ✨";
pub(crate) const LINK_NOT_RECOGNIZED: &str =
    "That doesn't look like a game link. Open the bot with the button shown after a win 🙂";
pub(crate) const NO_WIN_YET: &str =
    "No win on record yet 😌\nWin a game first, then come back through the link.";
pub(crate) const NONE_AVAILABLE: &str =
    "Looks like the promo codes have run out 😔\nPlease try again later or contact support.";

pub(crate) fn code_issued(code: &str) -> String {
    format!("🎉 You won! Your promo code: {}", code)
}

/// A parsed `/start` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCommand<'a> {
    /// `/start` with nothing after it.
    Greeting,
    /// A payload that is not a session token.
    Unrecognized(&'a str),
    /// A well-formed session token.
    Session(&'a str),
}

/// Parses `/start` (or `/start@botname`) and its payload.
///
/// Returns `None` for any other text.
pub fn parse_start(text: &str) -> Option<StartCommand<'_>> {
    let mut words = text.split_whitespace();
    let command = words.next()?;
    let is_start = command == "/start"
        || command
            .strip_prefix("/start@")
            .is_some_and(|bot| !bot.is_empty());
    if !is_start {
        return None;
    }

    Some(match words.next() {
        None => StartCommand::Greeting,
        Some(payload) if is_session_token(payload) => StartCommand::Session(payload),
        Some(payload) => StartCommand::Unrecognized(payload),
    })
}

/// Claimant identity for a chat.
///
/// Rewards bind to the chat, not the game session, so one chat holds at most
/// one code however many sessions it links.
pub fn claimant_for(chat_id: i64) -> String {
    format!("tg:{}", chat_id)
}
