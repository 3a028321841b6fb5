//! The `tgbridge telegram` subcommand: persist Telegram session settings.

use {clap::Args, secrecy::Secret, tracing::info};

use {
    tgbridge_config::{load_config, save_config, session_path},
    tgbridge_telegram::SessionState,
};

#[derive(Args)]
pub struct TelegramArgs {
    /// Set the API ID.
    #[arg(long)]
    api_id: Option<String>,

    /// Set the API hash.
    #[arg(long)]
    api_hash: Option<String>,

    /// Set the bot token.
    #[arg(long)]
    token: Option<String>,

    /// Set the maximum attachment size (bytes) allowed to be bridged.
    #[arg(long)]
    max_size: Option<u64>,
}

pub fn handle_telegram(args: TelegramArgs) -> anyhow::Result<()> {
    let mut config = load_config();

    if let Some(max_size) = args.max_size {
        config.max_attachment_size = max_size;
        save_config(&config)?;
        println!("Maximum attachment size updated.");
        return Ok(());
    }

    if let Some(api_id) = args.api_id {
        config.telegram.api_id = Some(api_id);
        println!("API ID updated.");
    }

    if let Some(api_hash) = args.api_hash {
        config.telegram.api_hash = Some(api_hash);
        println!("API hash updated.");
    }

    if let Some(token) = args.token {
        config.telegram.token = Some(Secret::new(token));
        // A session bound to the old token would conflict with the new one.
        SessionState::new(session_path()).invalidate();
        info!("session state invalidated after token rotation");
        println!("Token updated.");
    }

    let path = save_config(&config)?;
    info!(path = %path.display(), "telegram settings saved");
    Ok(())
}
