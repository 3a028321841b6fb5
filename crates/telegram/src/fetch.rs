use std::path::{Path, PathBuf};

use {async_trait::async_trait, teloxide::{Bot, prelude::*}, tracing::debug};

use tgbridge_relay::{AttachmentFetcher, TgAttachment};

/// Downloads Telegram attachments via the Bot API file endpoint.
pub struct TelegramFetcher {
    pub bot: Bot,
}

#[async_trait]
impl AttachmentFetcher for TelegramFetcher {
    async fn download(
        &self,
        attachment: &TgAttachment,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let file = self.bot.get_file(&attachment.file_id).await?;

        // Bot API file URL: https://api.telegram.org/file/bot<token>/<file_path>
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );
        let response = reqwest::get(&url).await?;
        if !response.status().is_success() {
            anyhow::bail!("failed to download file: HTTP {}", response.status());
        }

        let name = attachment.file_name.clone().unwrap_or_else(|| {
            file.path
                .rsplit('/')
                .next()
                .unwrap_or("attachment.bin")
                .to_string()
        });
        let dest = dest_dir.join(name);
        tokio::fs::write(&dest, response.bytes().await?).await?;

        debug!(file_id = %attachment.file_id, dest = %dest.display(), "downloaded attachment");
        Ok(dest)
    }
}
