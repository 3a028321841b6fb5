//! Collaborator traits. The platform SDK clients live elsewhere; the relay
//! engine only sees these seams, which also keeps the engine testable with
//! in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::DeliveryError,
    types::{DcOutgoing, OutboundDraft, TgAttachment},
};

/// Operations the relay needs from the Delta Chat host framework.
#[async_trait]
pub trait DeltachatClient: Send + Sync {
    /// Whether the chat is a group (multi-user) chat.
    async fn is_multiuser(&self, chat_id: i64) -> anyhow::Result<bool>;

    /// Number of contacts currently in the chat.
    async fn member_count(&self, chat_id: i64) -> anyhow::Result<usize>;

    /// Contact id of the bot account itself.
    fn self_contact(&self) -> i64;

    /// Whether `msg_id` still resolves to a message in the account.
    async fn has_message(&self, msg_id: i64) -> bool;

    /// Deliver a message into a chat, returning the new message id.
    async fn send(&self, chat_id: i64, outgoing: DcOutgoing) -> anyhow::Result<i64>;
}

/// Message delivery into Telegram chats.
#[async_trait]
pub trait TelegramSender: Send + Sync {
    /// Send the draft, returning the Telegram message id on success.
    async fn send(&self, chat_id: i64, draft: OutboundDraft) -> Result<i64, DeliveryError>;
}

/// Attachment retrieval from Telegram.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Download the attachment into `dest_dir`, returning the file path.
    async fn download(
        &self,
        attachment: &TgAttachment,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf>;
}
