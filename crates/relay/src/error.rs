use std::error::Error as StdError;

/// Failure delivering a message to Telegram.
///
/// The classification drives the recovery policy: a permanent failure
/// cascades into link removal for the destination, anything else is logged
/// and the single affected item dropped. Neither variant ever aborts the
/// worker loop.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The destination can never again receive messages without manual
    /// re-bridging (chat deleted, bot removed, invalid chat id).
    #[error("destination permanently unreachable: {context}")]
    Permanent { context: String },

    /// One-off failure (network blip, rate limit, malformed content).
    #[error("delivery failed: {context}")]
    Transient {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl DeliveryError {
    #[must_use]
    pub fn permanent(context: impl Into<String>) -> Self {
        Self::Permanent {
            context: context.into(),
        }
    }

    #[must_use]
    pub fn transient(context: impl Into<String>) -> Self {
        Self::Transient {
            context: context.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn transient_from(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }
}
