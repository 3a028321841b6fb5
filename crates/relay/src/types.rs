use std::path::PathBuf;

/// Snapshot of a Delta Chat message captured by the host framework's
/// message filter, carried through the relay queue to the delivery worker.
#[derive(Debug, Clone)]
pub struct DcMessage {
    pub id: i64,
    pub chat_id: i64,
    /// Message body; empty string when the message has no text.
    pub text: String,
    /// Rich HTML body, if the message carries one.
    pub html: Option<String>,
    /// Path of the attachment inside the host account's blob directory.
    pub file: Option<PathBuf>,
    /// Id of the message this one quotes, if any.
    pub quote_id: Option<i64>,
    /// Display name of the sending contact.
    pub sender_name: String,
    /// Override name configured on the session, preferred over
    /// `sender_name` when present.
    pub override_sender_name: Option<String>,
}

/// View type hint for an outgoing Delta Chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcViewType {
    Sticker,
}

/// Draft of a message to deliver into a Delta Chat group.
#[derive(Debug, Clone, Default)]
pub struct DcOutgoing {
    pub text: Option<String>,
    /// Sender name shown in Delta Chat instead of the bot's own.
    pub override_sender_name: Option<String>,
    pub file: Option<PathBuf>,
    pub viewtype: Option<DcViewType>,
    /// Delta Chat message id to quote.
    pub quote: Option<i64>,
}

impl DcOutgoing {
    /// Plain-text draft, used for notices.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A downloadable attachment on an inbound Telegram message.
#[derive(Debug, Clone)]
pub struct TgAttachment {
    pub file_id: String,
    pub size: u64,
    pub file_name: Option<String>,
    pub is_sticker: bool,
}

/// Platform-neutral view of an inbound Telegram group message.
#[derive(Debug, Clone)]
pub struct TgIncoming {
    pub chat_id: i64,
    pub msg_id: i64,
    /// Text or caption. `None` when the message carries neither.
    pub text: Option<String>,
    /// Sender's first and last name joined.
    pub sender_name: String,
    pub attachment: Option<TgAttachment>,
    /// Telegram id of the message this one replies to.
    pub reply_to_msg_id: Option<i64>,
}

/// Draft of a message to deliver to a Telegram chat. Built fresh per
/// destination and discarded after the send.
#[derive(Debug, Clone, Default)]
pub struct OutboundDraft {
    pub text: String,
    pub file: Option<PathBuf>,
    /// Telegram message id to reply to.
    pub reply_to: Option<i64>,
}

/// One unit of work on the Delta Chat → Telegram queue.
#[derive(Debug, Clone)]
pub struct RelayItem {
    pub tgchat: i64,
    pub message: DcMessage,
}
