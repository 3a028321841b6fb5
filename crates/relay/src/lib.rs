//! The bidirectional relay engine.
//!
//! Two independent execution contexts meet here. The Delta Chat side (the
//! host bot framework's dispatch) produces onto the relay queue and invokes
//! the command surface in [`commands`]; the Telegram side runs the
//! [`worker::DcToTgWorker`] loop and the event-driven
//! [`inbound::InboundRelay`] handler. They share only the queue and the
//! lock-guarded link store.

pub mod clients;
pub mod commands;
pub mod error;
pub mod inbound;
pub mod media;
pub mod queue;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod worker;

pub use {
    clients::{AttachmentFetcher, DeltachatClient, TelegramSender},
    commands::{BridgeHooks, CommandReply},
    error::DeliveryError,
    inbound::InboundRelay,
    queue::{RelayConsumer, RelayProducer, relay_queue},
    types::{DcMessage, DcOutgoing, DcViewType, OutboundDraft, RelayItem, TgAttachment, TgIncoming},
    worker::DcToTgWorker,
};
