//! Chat transport boundary.
//!
//! The bot core does not speak IRC itself. It consumes an abstract transport
//! that can post to a channel and send private notices; the line protocol
//! (NICK/USER/PING/JOIN framing) lives in whatever client embeds this crate.

use async_trait::async_trait;

/// An inbound chat message the dispatcher may act on.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Nick of the sender.
    pub from: String,
    /// Channel the message arrived on.
    pub channel: String,
    /// Full message text, trigger token included.
    pub text: String,
}

/// Outbound chat capability.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a message to a channel, visible to everyone in it.
    async fn deliver(&self, channel: &str, text: &str) -> anyhow::Result<()>;

    /// Send a private notice to a single user.
    async fn notice(&self, user: &str, text: &str) -> anyhow::Result<()>;
}
