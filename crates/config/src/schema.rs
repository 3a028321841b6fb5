use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default maximum attachment size bridged from Telegram (5 MiB).
pub const DEFAULT_MAX_ATTACHMENT_SIZE: u64 = 1024 * 1024 * 5;

/// Telegram API credentials for the bridge bot session.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramCredentials {
    /// Application API ID from my.telegram.org.
    pub api_id: Option<String>,

    /// Application API hash from my.telegram.org.
    pub api_hash: Option<String>,

    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_opt_secret")]
    pub token: Option<Secret<String>>,
}

impl TelegramCredentials {
    /// Whether all three values required to open a session are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.api_id.is_some() && self.api_hash.is_some() && self.token.is_some()
    }
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("api_id", &self.api_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub telegram: TelegramCredentials,

    /// Maximum size in bytes of a Telegram attachment that will be
    /// downloaded and relayed to Delta Chat. Larger files are skipped.
    pub max_attachment_size: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramCredentials::default(),
            max_attachment_size: DEFAULT_MAX_ATTACHMENT_SIZE,
        }
    }
}

fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
