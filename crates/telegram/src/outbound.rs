use {
    async_trait::async_trait,
    teloxide::{
        ApiError, Bot, RequestError,
        payloads::{SendDocumentSetters, SendMessageSetters},
        prelude::*,
        types::{ChatId, InputFile, MessageId, ReplyParameters},
    },
    tracing::debug,
};

use tgbridge_relay::{DeliveryError, OutboundDraft, TelegramSender};

/// Sends worker drafts into Telegram chats.
pub struct TelegramOutbound {
    pub bot: Bot,
}

#[async_trait]
impl TelegramSender for TelegramOutbound {
    async fn send(&self, chat_id: i64, draft: OutboundDraft) -> Result<i64, DeliveryError> {
        let chat = ChatId(chat_id);
        let reply_params = reply_parameters_for(draft.reply_to);

        let sent = if let Some(file) = &draft.file {
            let mut req = self.bot.send_document(chat, InputFile::file(file.clone()));
            if !draft.text.is_empty() {
                req = req.caption(&draft.text);
            }
            if let Some(rp) = reply_params {
                req = req.reply_parameters(rp);
            }
            req.await.map_err(classify_send_error)?
        } else {
            let mut req = self.bot.send_message(chat, &draft.text);
            if let Some(rp) = reply_params {
                req = req.reply_parameters(rp);
            }
            req.await.map_err(classify_send_error)?
        };

        debug!(chat_id, tg_msg_id = sent.id.0, "sent message to telegram");
        Ok(i64::from(sent.id.0))
    }
}

/// Reply target for a draft. A cached id outside the Bot API's i32 range
/// cannot name a real message, so the reply is dropped rather than sent
/// against a truncated id.
fn reply_parameters_for(reply_to: Option<i64>) -> Option<ReplyParameters> {
    let id = reply_to.and_then(|id| i32::try_from(id).ok())?;
    Some(ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

/// Map a teloxide error onto the relay's failure taxonomy.
///
/// Only errors that mean the chat can never be reached again (deleted,
/// bot removed, id invalid) are permanent; everything else is a one-off.
fn classify_send_error(error: RequestError) -> DeliveryError {
    match &error {
        RequestError::Api(
            ApiError::ChatNotFound
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::GroupDeactivated,
        ) => DeliveryError::permanent(error.to_string()),
        _ => DeliveryError::transient_from("telegram send failed", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_target_outside_i32_range_is_dropped() {
        let params = reply_parameters_for(Some(9000)).unwrap();
        assert_eq!(params.message_id, MessageId(9000));

        assert!(reply_parameters_for(Some(i64::from(i32::MAX) + 1)).is_none());
        assert!(reply_parameters_for(Some(-1)).is_some());
        assert!(reply_parameters_for(None).is_none());
    }

    #[test]
    fn unreachable_chat_errors_are_permanent() {
        for api_error in [
            ApiError::ChatNotFound,
            ApiError::BotKicked,
            ApiError::BotKickedFromSupergroup,
            ApiError::GroupDeactivated,
        ] {
            let classified = classify_send_error(RequestError::Api(api_error));
            assert!(classified.is_permanent());
        }
    }

    #[test]
    fn other_errors_are_transient() {
        let classified = classify_send_error(RequestError::RetryAfter(
            teloxide::types::Seconds::from_seconds(30),
        ));
        assert!(!classified.is_permanent());

        let classified =
            classify_send_error(RequestError::Api(ApiError::Unknown("flood".into())));
        assert!(!classified.is_permanent());
    }
}
