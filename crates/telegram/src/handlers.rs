use {
    teloxide::{
        Bot,
        payloads::SendMessageSetters,
        prelude::*,
        types::{MediaKind, Message, MessageKind, ReplyParameters},
    },
    tracing::debug,
};

use tgbridge_relay::{InboundRelay, TgAttachment, TgIncoming};

/// Reply to `/start` in a direct chat.
pub const START_NOTICE: &str =
    "This is a Delta Chat bridge relaybot and does not support direct chats";

/// Handle a single inbound Telegram message from the polling loop.
///
/// Commands are answered and consume the event; anything else goes to the
/// relay.
pub async fn handle_message(
    bot: &Bot,
    relay: &InboundRelay,
    msg: Message,
) -> anyhow::Result<()> {
    match command_of(&msg) {
        Some("start") if msg.chat.is_private() => {
            bot.send_message(msg.chat.id, START_NOTICE)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        },
        Some("id") => {
            bot.send_message(msg.chat.id, msg.chat.id.to_string())
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        },
        _ => {},
    }

    relay.relay(to_incoming(&msg)).await;
    Ok(())
}

/// The bot command invoked by the message, with any `@botname` suffix
/// stripped: `/id@bridge_bot arg` → `id`.
fn command_of(msg: &Message) -> Option<&str> {
    let text = msg.text()?;
    let first = text.split_whitespace().next()?;
    let cmd = first.strip_prefix('/')?;
    Some(cmd.split('@').next().unwrap_or(cmd))
}

/// Project a teloxide message onto the relay's platform-neutral view.
fn to_incoming(msg: &Message) -> TgIncoming {
    TgIncoming {
        chat_id: msg.chat.id.0,
        msg_id: i64::from(msg.id.0),
        text: extract_text(msg),
        sender_name: sender_name(msg),
        attachment: extract_attachment(msg),
        reply_to_msg_id: msg.reply_to_message().map(|m| i64::from(m.id.0)),
    }
}

/// Sender's first and last name joined, as shown to Delta Chat users.
fn sender_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|u| match &u.last_name {
            Some(last) => format!("{} {last}", u.first_name),
            None => u.first_name.clone(),
        })
        .unwrap_or_default()
}

/// Extract text or caption from a message.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            MediaKind::Audio(a) => a.caption.clone(),
            MediaKind::Voice(v) => v.caption.clone(),
            MediaKind::Video(v) => v.caption.clone(),
            MediaKind::Animation(a) => a.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

/// Extract the downloadable attachment, if any.
fn extract_attachment(msg: &Message) -> Option<TgAttachment> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    let attachment = match &common.media_kind {
        MediaKind::Document(d) => TgAttachment {
            file_id: d.document.file.id.clone(),
            size: u64::from(d.document.file.size),
            file_name: d.document.file_name.clone(),
            is_sticker: false,
        },
        // Largest photo size is last.
        MediaKind::Photo(p) => {
            let largest = p.photo.last()?;
            TgAttachment {
                file_id: largest.file.id.clone(),
                size: u64::from(largest.file.size),
                file_name: Some("photo.jpg".into()),
                is_sticker: false,
            }
        },
        MediaKind::Sticker(s) => TgAttachment {
            file_id: s.sticker.file.id.clone(),
            size: u64::from(s.sticker.file.size),
            file_name: Some("sticker.webp".into()),
            is_sticker: true,
        },
        MediaKind::Audio(a) => TgAttachment {
            file_id: a.audio.file.id.clone(),
            size: u64::from(a.audio.file.size),
            file_name: a.audio.file_name.clone(),
            is_sticker: false,
        },
        MediaKind::Voice(v) => TgAttachment {
            file_id: v.voice.file.id.clone(),
            size: u64::from(v.voice.file.size),
            file_name: Some("voice.ogg".into()),
            is_sticker: false,
        },
        MediaKind::Video(v) => TgAttachment {
            file_id: v.video.file.id.clone(),
            size: u64::from(v.video.file.size),
            file_name: v.video.file_name.clone(),
            is_sticker: false,
        },
        MediaKind::Animation(a) => TgAttachment {
            file_id: a.animation.file.id.clone(),
            size: u64::from(a.animation.file.size),
            file_name: a.animation.file_name.clone(),
            is_sticker: false,
        },
        _ => {
            debug!(msg_id = msg.id.0, "no downloadable attachment");
            return None;
        },
    };
    Some(attachment)
}
