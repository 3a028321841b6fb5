//! The Delta Chat → Telegram delivery worker.

use std::sync::Arc;

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    tgbridge_common::text::shorten_text,
    tgbridge_store::{CacheKey, IdentityCache, LinkStore},
};

use crate::{
    clients::{DeltachatClient, TelegramSender},
    media,
    queue::RelayConsumer,
    types::{DcOutgoing, OutboundDraft, RelayItem},
};

/// Sent to each Delta Chat group whose link was removed after a terminal
/// delivery failure.
pub const UNBRIDGED_NOTICE: &str = "❌ Chat unbridged from Telegram chat, make sure the chat ID \
     is correct or that the bot was not removed from the Telegram chat";

/// Maximum sender-name length composed into the outbound text.
const MAX_SENDER_NAME_LEN: usize = 30;

/// The single long-lived consumer of the relay queue.
///
/// Each iteration handles one queued item end to end; nothing a single item
/// does can abort the loop.
pub struct DcToTgWorker {
    pub telegram: Arc<dyn TelegramSender>,
    pub deltachat: Arc<dyn DeltachatClient>,
    pub links: Arc<LinkStore>,
    pub cache: Arc<IdentityCache>,
}

impl DcToTgWorker {
    /// Drain the queue until cancelled or all producers are gone.
    pub async fn run(&self, mut consumer: RelayConsumer, cancel: CancellationToken) {
        info!("delta chat to telegram worker started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                item = consumer.next() => match item {
                    Some(item) => self.process(item).await,
                    None => break,
                },
            }
        }
        info!("delta chat to telegram worker stopped");
    }

    /// One relay iteration.
    ///
    /// Temp files created while resolving the attachment are dropped when
    /// this returns, whatever the outcome.
    pub async fn process(&self, item: RelayItem) {
        let RelayItem { tgchat, message } = item;
        debug!(msg_id = message.id, tgchat, "sending message to telegram");

        let file = media::resolve_outbound_file(&message).await;
        if message.text.is_empty() && file.is_none() {
            debug!(msg_id = message.id, "ignoring unsupported message");
            return;
        }

        let reply_to = match message.quote_id {
            Some(quote_id) => self
                .cache
                .get(&CacheKey::deltachat(tgchat, quote_id))
                .await
                .unwrap_or_else(|e| {
                    warn!(quote_id, error = %e, "quote lookup failed");
                    None
                }),
            None => None,
        };

        let name = message
            .override_sender_name
            .as_deref()
            .unwrap_or(&message.sender_name);
        let draft = OutboundDraft {
            text: format!("{}: {}", shorten_text(name, MAX_SENDER_NAME_LEN), message.text),
            file: file.as_ref().map(|f| f.path().to_path_buf()),
            reply_to,
        };

        match self.telegram.send(tgchat, draft).await {
            Ok(tg_msg_id) => {
                self.record_pair(tgchat, message.id, tg_msg_id).await;
            },
            Err(e) if e.is_permanent() => {
                error!(tgchat, error = %e, "telegram destination unreachable, unbridging");
                self.unbridge_destination(tgchat).await;
            },
            Err(e) => {
                warn!(msg_id = message.id, tgchat, error = %e, "dropping message");
            },
        }
    }

    /// Record both directions of the id pair. Best-effort: the cache only
    /// affects reply threading.
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

    /// Remove every link into `tgchat` and tell the affected Delta Chat
    /// groups. Notification failures are logged, not retried.
    async fn unbridge_destination(&self, tgchat: i64) {
        let dcchats = match self.links.remove_links_by_tgchat(tgchat).await {
            Ok(dcchats) => dcchats,
            Err(e) => {
                error!(tgchat, error = %e, "failed to remove links for unreachable chat");
                return;
            },
        };
        for dcchat in dcchats {
            debug!(dcchat, tgchat, "removed bridge to unreachable telegram chat");
            if let Err(e) = self
                .deltachat
                .send(dcchat, DcOutgoing::text(UNBRIDGED_NOTICE))
                .await
            {
                warn!(dcchat, error = %e, "failed to notify unbridged chat");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {std::sync::Arc, tgbridge_store::CacheKey};

    use super::*;
    use crate::testing::{MockDeltachat, MockTelegram, dc_message, memory_stores};

    async fn worker() -> (DcToTgWorker, Arc<MockTelegram>, Arc<MockDeltachat>) {
        let (links, cache) = memory_stores().await;
        let telegram = Arc::new(MockTelegram::new());
        let deltachat = Arc::new(MockDeltachat::new());
        let worker = DcToTgWorker {
            telegram: Arc::clone(&telegram) as Arc<dyn TelegramSender>,
            deltachat: Arc::clone(&deltachat) as Arc<dyn DeltachatClient>,
            links,
            cache,
        };
        (worker, telegram, deltachat)
    }

    #[tokio::test]
    async fn delivery_composes_sender_prefix() {
        let (worker, telegram, _) = worker().await;
        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, "hello"),
            })
            .await;

        let (chat, draft) = telegram.last_sent().unwrap();
        assert_eq!(chat, -100);
        assert_eq!(draft.text, "alice: hello");
        assert!(draft.file.is_none());
    }

    #[tokio::test]
    async fn override_name_preferred_and_shortened() {
        let (worker, telegram, _) = worker().await;
        let mut message = dc_message(42, 10, "hi");
        message.override_sender_name =
            Some("an unreasonably long announcement channel name".into());
        worker
            .process(RelayItem {
                tgchat: -100,
                message,
            })
            .await;

        let (_, draft) = telegram.last_sent().unwrap();
        let name = draft.text.split(':').next().unwrap();
        assert!(name.chars().count() <= 30);
        assert!(name.ends_with('…'));
    }

    #[tokio::test]
    async fn successful_delivery_records_both_cache_keys() {
        let (worker, _, _) = worker().await;
        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, "hello"),
            })
            .await;

        let tg_id = worker
            .cache
            .get(&CacheKey::deltachat(-100, 42))
            .await
            .unwrap()
            .unwrap();
        let dc_id = worker
            .cache
            .get(&CacheKey::telegram(-100, tg_id))
            .await
            .unwrap();
        assert_eq!(dc_id, Some(42));
    }

    #[tokio::test]
    async fn quoted_message_resolves_reply_target() {
        let (worker, telegram, _) = worker().await;
        worker
            .cache
            .put(&CacheKey::deltachat(-100, 41), 9000)
            .await
            .unwrap();

        let mut message = dc_message(42, 10, "replying");
        message.quote_id = Some(41);
        worker
            .process(RelayItem {
                tgchat: -100,
                message,
            })
            .await;

        let (_, draft) = telegram.last_sent().unwrap();
        assert_eq!(draft.reply_to, Some(9000));
    }

    #[tokio::test]
    async fn empty_message_is_dropped() {
        let (worker, telegram, _) = worker().await;
        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, ""),
            })
            .await;
        assert!(telegram.last_sent().is_none());
    }

    #[tokio::test]
    async fn transient_failure_keeps_links() {
        let (worker, telegram, _) = worker().await;
        worker.links.add_link(10, -100).await.unwrap();
        telegram.fail_transiently(-100);

        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, "hello"),
            })
            .await;

        assert_eq!(worker.links.find_by_dcchat(10).await.unwrap(), Some(-100));
    }

    #[tokio::test]
    async fn permanent_failure_unbridges_and_notifies_all() {
        let (worker, telegram, deltachat) = worker().await;
        worker.links.add_link(10, -100).await.unwrap();
        worker.links.add_link(11, -100).await.unwrap();
        worker.links.add_link(12, -200).await.unwrap();
        telegram.fail_permanently(-100);

        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, "hello"),
            })
            .await;

        assert_eq!(worker.links.find_by_dcchat(10).await.unwrap(), None);
        assert_eq!(worker.links.find_by_dcchat(11).await.unwrap(), None);
        assert_eq!(worker.links.find_by_dcchat(12).await.unwrap(), Some(-200));

        for chat in [10, 11] {
            let notices = deltachat.sent_to(chat);
            assert_eq!(notices.len(), 1);
            assert_eq!(notices[0].text.as_deref(), Some(UNBRIDGED_NOTICE));
        }
        assert!(deltachat.sent_to(12).is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_stop_remaining_notices() {
        let (worker, telegram, deltachat) = worker().await;
        worker.links.add_link(10, -100).await.unwrap();
        worker.links.add_link(11, -100).await.unwrap();
        telegram.fail_permanently(-100);
        deltachat.fail_chat(10);

        worker
            .process(RelayItem {
                tgchat: -100,
                message: dc_message(42, 10, "hello"),
            })
            .await;

        assert_eq!(deltachat.sent_to(11).len(), 1);
    }
}
