//! The Delta Chat → Telegram relay queue.
//!
//! An unbounded mpsc channel: the producer side lives in the host
//! framework's synchronous message filter and must never block its caller,
//! the single consumer is the delivery worker awaiting inside the Telegram
//! session's event loop. FIFO per arrival order. The queue may grow while
//! the consumer is stalled by connectivity loss; that is accepted.

use {tokio::sync::mpsc, tracing::warn};

use crate::types::RelayItem;

/// Create a linked producer/consumer pair.
#[must_use]
pub fn relay_queue() -> (RelayProducer, RelayConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RelayProducer { tx }, RelayConsumer { rx })
}

/// Producer half. Cheap to clone; one per host dispatch context.
#[derive(Clone)]
pub struct RelayProducer {
    tx: mpsc::UnboundedSender<RelayItem>,
}

impl RelayProducer {
    /// Enqueue an item, fire-and-forget. Never blocks.
    pub fn enqueue(&self, item: RelayItem) {
        if self.tx.send(item).is_err() {
            warn!("relay queue closed, dropping message");
        }
    }
}

/// Consumer half, owned exclusively by the delivery worker.
pub struct RelayConsumer {
    rx: mpsc::UnboundedReceiver<RelayItem>,
}

impl RelayConsumer {
    /// Wait for the next item. `None` once all producers are gone.
    pub async fn next(&mut self) -> Option<RelayItem> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DcMessage;

    fn message(id: i64) -> DcMessage {
        DcMessage {
            id,
            chat_id: 1,
            text: "hi".into(),
            html: None,
            file: None,
            quote_id: None,
            sender_name: "alice".into(),
            override_sender_name: None,
        }
    }

    #[tokio::test]
    async fn fifo_order_preserved() {
        let (producer, mut consumer) = relay_queue();
        for id in 0..5 {
            producer.enqueue(RelayItem {
                tgchat: -100,
                message: message(id),
            });
        }
        for id in 0..5 {
            let item = consumer.next().await.unwrap();
            assert_eq!(item.message.id, id);
        }
    }

    #[tokio::test]
    async fn consumer_sees_none_after_producers_drop() {
        let (producer, mut consumer) = relay_queue();
        producer.enqueue(RelayItem {
            tgchat: -100,
            message: message(1),
        });
        drop(producer);
        assert!(consumer.next().await.is_some());
        assert!(consumer.next().await.is_none());
    }

    #[test]
    fn enqueue_after_consumer_drop_does_not_panic() {
        let (producer, consumer) = relay_queue();
        drop(consumer);
        producer.enqueue(RelayItem {
            tgchat: -100,
            message: message(1),
        });
    }
}
