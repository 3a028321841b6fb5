use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, Bot, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    tgbridge_config::TelegramCredentials,
    tgbridge_relay::{DcToTgWorker, DeltachatClient, InboundRelay, RelayConsumer},
    tgbridge_store::{IdentityCache, LinkStore},
};

use crate::{
    fetch::TelegramFetcher,
    handlers,
    outbound::TelegramOutbound,
    session::SessionState,
};

/// Everything the Telegram session needs from the rest of the bridge.
pub struct SessionDeps {
    pub deltachat: Arc<dyn DeltachatClient>,
    pub links: Arc<LinkStore>,
    pub cache: Arc<IdentityCache>,
    /// Consumer half of the relay queue, handed to the delivery worker.
    pub consumer: RelayConsumer,
    pub max_attachment_size: u64,
}

/// Connect the bot and start the session: the delivery worker and the
/// long-polling loop, both running until the returned token is cancelled.
///
/// Returns `None` without connecting when the credentials are incomplete.
pub async fn start_session(
    credentials: &TelegramCredentials,
    session: SessionState,
    deps: SessionDeps,
) -> anyhow::Result<Option<CancellationToken>> {
    let Some(token) = credentials.token.as_ref().filter(|_| credentials.is_complete()) else {
        warn!("telegram session not configured");
        return Ok(None);
    };

    // Client timeout longer than the long-polling timeout (30s) so the HTTP
    // client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    let commands = vec![BotCommand::new("id", "gets the ID of the current chat")];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "connected to telegram");

    let cancel = CancellationToken::new();

    let worker = DcToTgWorker {
        telegram: Arc::new(TelegramOutbound { bot: bot.clone() }),
        deltachat: Arc::clone(&deps.deltachat),
        links: Arc::clone(&deps.links),
        cache: Arc::clone(&deps.cache),
    };
    let worker_cancel = cancel.clone();
    let consumer = deps.consumer;
    tokio::spawn(async move {
        worker.run(consumer, worker_cancel).await;
    });

    let relay = InboundRelay {
        deltachat: deps.deltachat,
        fetcher: Arc::new(TelegramFetcher { bot: bot.clone() }),
        links: deps.links,
        cache: deps.cache,
        max_attachment_size: deps.max_attachment_size,
    };

    let loop_cancel = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset = session.load_offset();

        loop {
            if loop_cancel.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                if let Err(e) =
                                    handlers::handle_message(&bot, &relay, msg).await
                                {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                    session.store_offset(offset);
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!("another bot instance is already running with this token, stopping");
                    loop_cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(Some(cancel))
}
