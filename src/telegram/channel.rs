//! Messaging channel abstraction and the Telegram Bot API implementation.

use std::time::Duration;

use async_trait::async_trait;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Request timeout for `getUpdates`; must exceed the long-poll wait.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Request timeout for `sendMessage`.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// An inbound text event. Either field may be missing for non-text updates.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct InboundEvent {
    id: i64,
    chat_id: Option<i64>,
    text: Option<String>,
}

/// Messaging transport error.
#[derive(Debug, Clone, Display, Error)]
#[display("Channel error: {} at {}:{}", message, file, line)]
pub struct ChannelError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ChannelError {
    /// Creates a new channel error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for ChannelError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors can embed the request URL, which carries the token.
        Self::new(format!("HTTP error: {}", err.without_url()))
    }
}

/// A channel that can be polled for new events and can send text.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    /// Fetches events with id `>= since` (all pending events when `None`),
    /// waiting up to `wait_secs` for something to arrive.
    async fn fetch_events(
        &self,
        since: Option<i64>,
        wait_secs: u64,
    ) -> Result<Vec<InboundEvent>, ChannelError>;

    /// Sends `text` to `chat_id`.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ChannelError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Option<Chat>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

impl From<Update> for InboundEvent {
    fn from(update: Update) -> Self {
        let (chat_id, text) = match update.message {
            Some(message) => (message.chat.map(|c| c.id), message.text),
            None => (None, None),
        };
        Self::new(update.update_id, chat_id, text)
    }
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramChannel {
    /// Creates a client for the public Bot API.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the HTTP client cannot be built.
    pub fn new(token: String) -> Result<Self, ChannelError> {
        Self::with_api_base(token, DEFAULT_API_BASE.to_string())
    }

    /// Creates a client against a different API host.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the HTTP client cannot be built.
    pub fn with_api_base(token: String, api_base: String) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, ChannelError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response: ApiResponse<T> = self
            .client
            .post(self.url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            let description = response.description.unwrap_or_default();
            error!(method, %description, "Telegram API returned ok=false");
            return Err(ChannelError::new(format!("{} failed: {}", method, description)));
        }
        response
            .result
            .ok_or_else(|| ChannelError::new(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl MessagingChannel for TelegramChannel {
    #[instrument(skip(self))]
    async fn fetch_events(
        &self,
        since: Option<i64>,
        wait_secs: u64,
    ) -> Result<Vec<InboundEvent>, ChannelError> {
        let request = GetUpdates {
            timeout: wait_secs,
            offset: since,
            allowed_updates: ["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request, FETCH_TIMEOUT).await?;
        debug!(count = updates.len(), "Fetched updates");
        Ok(updates.into_iter().map(InboundEvent::from).collect())
    }

    #[instrument(skip(self, text))]
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let request = SendMessage { chat_id, text };
        let _sent: serde_json::Value = self.call("sendMessage", &request, SEND_TIMEOUT).await?;
        debug!(chat_id, "Message sent");
        Ok(())
    }
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}
