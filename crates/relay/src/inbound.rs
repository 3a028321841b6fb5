//! The Telegram → Delta Chat path. Event-driven: the Telegram session event
//! loop already serializes message events per connection, so no queue sits
//! in this direction.

use std::sync::Arc;

use tracing::{debug, error, warn};

use tgbridge_store::{CacheKey, IdentityCache, LinkStore};

use crate::{
    clients::{AttachmentFetcher, DeltachatClient},
    types::{DcOutgoing, DcViewType, TgIncoming},
};

/// Handler for inbound Telegram group messages.
pub struct InboundRelay {
    pub deltachat: Arc<dyn DeltachatClient>,
    pub fetcher: Arc<dyn AttachmentFetcher>,
    pub links: Arc<LinkStore>,
    pub cache: Arc<IdentityCache>,
    /// Attachments above this size are not downloaded.
    pub max_attachment_size: u64,
}

impl InboundRelay {
    /// Relay one Telegram message to every linked Delta Chat group.
    ///
    /// Per-destination failures are logged and do not stop delivery to the
    /// remaining destinations. The download directory is released after all
    /// destinations have been attempted.
    pub async fn relay(&self, incoming: TgIncoming) {
        debug!(
            msg_id = incoming.msg_id,
            chat_id = incoming.chat_id,
            "got message from telegram"
        );

        // A message with neither text nor an attachment is dropped before
        // any store access. Media without a caption (stickers never have
        // one) still goes through.
        let text = incoming.text.clone().unwrap_or_default();
        if text.is_empty() && incoming.attachment.is_none() {
            debug!(msg_id = incoming.msg_id, "ignoring message without content");
            return;
        }

        let dcchats = match self.links.find_all_by_tgchat(incoming.chat_id).await {
            Ok(dcchats) => dcchats,
            Err(e) => {
                error!(chat_id = incoming.chat_id, error = %e, "link lookup failed");
                return;
            },
        };
        if dcchats.is_empty() {
            debug!(chat_id = incoming.chat_id, "ignoring message from unbridged chat");
            return;
        }

        // Scoped download dir, removed on drop once all sends are done.
        let workdir = match tempfile::tempdir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "failed to create download dir, relaying text only");
                None
            },
        };

        let mut file = None;
        let mut viewtype = None;
        if let (Some(attachment), Some(dir)) = (&incoming.attachment, &workdir) {
            if attachment.size <= self.max_attachment_size {
                match self.fetcher.download(attachment, dir.path()).await {
                    Ok(path) => {
                        if attachment.is_sticker {
                            viewtype = Some(DcViewType::Sticker);
                        }
                        file = Some(path);
                    },
                    Err(e) => {
                        warn!(file_id = %attachment.file_id, error = %e, "attachment download failed");
                    },
                }
            } else {
                debug!(
                    size = attachment.size,
                    max = self.max_attachment_size,
                    "attachment exceeds maximum size, skipping"
                );
            }
        }

        // A caption-less attachment that was skipped or failed to download
        // leaves nothing to deliver.
        if text.is_empty() && file.is_none() {
            debug!(msg_id = incoming.msg_id, "ignoring message with no deliverable content");
            return;
        }

        let quote = self.resolve_quote(&incoming).await;

        for dcchat in dcchats {
            let outgoing = DcOutgoing {
                text: (!text.is_empty()).then(|| text.clone()),
                override_sender_name: Some(incoming.sender_name.clone()),
                file: file.clone(),
                viewtype,
                quote,
            };
            match self.deltachat.send(dcchat, outgoing).await {
                Ok(dc_msg_id) => {
                    self.record_pair(incoming.chat_id, dc_msg_id, incoming.msg_id)
                        .await;
                },
                Err(e) => {
                    error!(dcchat, error = %e, "delivery to delta chat group failed");
                },
            }
        }
    }

    /// Resolve the quoted Telegram message to its Delta Chat twin, dropping
    /// the quote when the paired message no longer exists.
    async fn resolve_quote(&self, incoming: &TgIncoming) -> Option<i64> {
        let reply_to = incoming.reply_to_msg_id?;
        let key = CacheKey::telegram(incoming.chat_id, reply_to);
        let dc_msg_id = match self.cache.get(&key).await {
            Ok(id) => id?,
            Err(e) => {
                warn!(reply_to, error = %e, "quote lookup failed");
                return None;
            },
        };
        if self.deltachat.has_message(dc_msg_id).await {
            Some(dc_msg_id)
        } else {
            debug!(dc_msg_id, "quoted message no longer exists");
            None
        }
    }

    async fn record_pair(&self, tgchat: i64, dc_msg_id: i64, tg_msg_id: i64) {
        for (key, value) in [
            (CacheKey::deltachat(tgchat, dc_msg_id), tg_msg_id),
            (CacheKey::telegram(tgchat, tg_msg_id), dc_msg_id),
        ] {
            if let Err(e) = self.cache.put(&key, value).await {
                warn!(key = key.as_str(), error = %e, "failed to record message pair");
            }
        }
    }
}
