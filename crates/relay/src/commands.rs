//! The Delta Chat command surface and host framework hooks: `/bridge`,
//! `/unbridge`, the message filter feeding the relay queue, and the
//! membership-change hook. The host framework dispatches into these; the
//! replies travel back through it.

use std::sync::Arc;

use tracing::{debug, error, warn};

use tgbridge_store::{Error as StoreError, LinkStore};

use crate::{
    clients::DeltachatClient,
    queue::RelayProducer,
    types::{DcMessage, RelayItem},
};

/// A user-visible reply to a command, quoted against the invoking message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
}

impl CommandReply {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Whether the reply carries the failure marker.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.text.starts_with('❌')
    }
}

/// Command handlers and hooks invoked by the host framework's dispatch.
pub struct BridgeHooks {
    pub deltachat: Arc<dyn DeltachatClient>,
    pub links: Arc<LinkStore>,
    pub producer: RelayProducer,
}

impl BridgeHooks {
    /// `/bridge <telegram-chat-id>`: link the invoking group.
    pub async fn bridge(&self, chat_id: i64, payload: &str) -> CommandReply {
        let Ok(tgchat) = payload.trim().parse::<i64>() else {
            return CommandReply::new("❌ You must provide the ID of the Telegram chat");
        };

        let multiuser = self
            .deltachat
            .is_multiuser(chat_id)
            .await
            .unwrap_or_else(|e| {
                warn!(chat_id, error = %e, "chat type lookup failed");
                false
            });
        if !multiuser {
            return CommandReply::new("❌ Bridging is supported in group chats only");
        }

        match self.links.add_link(chat_id, tgchat).await {
            Ok(()) => CommandReply::new("✔️Bridged"),
            Err(StoreError::AlreadyBridged { .. }) => {
                CommandReply::new("❌ This chat is already bridged")
            },
            Err(e) => {
                error!(chat_id, tgchat, error = %e, "failed to add link");
                CommandReply::new("❌ This chat is already bridged")
            },
        }
    }

    /// `/unbridge`: remove the invoking group's link.
    pub async fn unbridge(&self, chat_id: i64) -> CommandReply {
        match self.links.remove_link(chat_id).await {
            Ok(()) => CommandReply::new("✔️Bridge removed"),
            Err(StoreError::NotBridged { .. }) => {
                CommandReply::new("❌ This chat is not bridged")
            },
            Err(e) => {
                error!(chat_id, error = %e, "failed to remove link");
                CommandReply::new("❌ This chat is not bridged")
            },
        }
    }

    /// Message filter: enqueue group messages from linked chats onto the
    /// relay queue. Fire-and-forget from the dispatcher's point of view.
    pub async fn filter_message(&self, message: DcMessage) {
        let multiuser = self
            .deltachat
            .is_multiuser(message.chat_id)
            .await
            .unwrap_or(false);
        if !multiuser {
            return;
        }

        match self.links.find_by_dcchat(message.chat_id).await {
            Ok(Some(tgchat)) => {
                debug!(msg_id = message.id, tgchat, "queuing message to telegram");
                self.producer.enqueue(RelayItem { tgchat, message });
            },
            Ok(None) => {},
            Err(e) => error!(chat_id = message.chat_id, error = %e, "link lookup failed"),
        }
    }

    /// Membership-change hook: drop the chat's link when the bot itself was
    /// removed or the group has emptied out.
    pub async fn member_removed(&self, chat_id: i64, contact_id: i64) {
        if contact_id != self.deltachat.self_contact() {
            match self.deltachat.member_count(chat_id).await {
                Ok(n) if n > 1 => return,
                Ok(_) => {},
                Err(e) => {
                    warn!(chat_id, error = %e, "member count lookup failed");
                    return;
                },
            }
        }

        match self.links.remove_link(chat_id).await {
            Ok(()) => debug!(chat_id, "removed bridge after membership change"),
            Err(StoreError::NotBridged { .. }) => {},
            Err(e) => error!(chat_id, error = %e, "failed to remove link"),
        }
    }
}
