//! Bridge lifecycle, driven by the host bot framework.
//!
//! The host's dispatch thread owns the [`BridgeHooks`]; the Telegram session
//! (connection, event handlers, and the delivery worker) runs cooperatively
//! on a dedicated single-threaded runtime on its own OS thread. The two
//! sides share only the relay queue and the lock-guarded link store.

use std::{path::Path, sync::Arc};

use {
    tokio_util::sync::CancellationToken,
    tracing::{error, warn},
};

use {
    tgbridge_config::BridgeConfig,
    tgbridge_relay::{BridgeHooks, DeltachatClient, relay_queue},
    tgbridge_store::{IdentityCache, LinkStore},
};

use crate::{
    bot::{SessionDeps, start_session},
    session::SessionState,
};

/// A running bridge instance.
pub struct BridgePlugin {
    hooks: Arc<BridgeHooks>,
    cancel: CancellationToken,
    session_thread: Option<std::thread::JoinHandle<()>>,
}

impl BridgePlugin {
    /// Open the database under `data_dir` and start the Telegram session.
    ///
    /// When the Telegram credentials are incomplete the command surface
    /// still works; only the session thread stays down.
    pub async fn start(
        config: &BridgeConfig,
        deltachat: Arc<dyn DeltachatClient>,
        data_dir: &Path,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let pool = tgbridge_store::open_database(&data_dir.join("sqlite.db")).await?;
        let links = Arc::new(LinkStore::new(pool.clone()));
        let cache = Arc::new(IdentityCache::new(pool));
        if let Err(e) = cache.purge_expired().await {
            warn!(error = %e, "identity cache purge failed");
        }

        let (producer, consumer) = relay_queue();
        let hooks = Arc::new(BridgeHooks {
            deltachat: Arc::clone(&deltachat),
            links: Arc::clone(&links),
            producer,
        });

        let cancel = CancellationToken::new();
        let deps = SessionDeps {
            deltachat,
            links,
            cache,
            consumer,
            max_attachment_size: config.max_attachment_size,
        };
        let credentials = config.telegram.clone();
        let session = SessionState::new(data_dir.join("telegram.session"));

        let parent = cancel.clone();
        let session_thread = std::thread::Builder::new()
            .name("tgbridge-telegram".into())
            .spawn(move || run_session_thread(credentials, session, deps, parent))?;

        Ok(Self {
            hooks,
            cancel,
            session_thread: Some(session_thread),
        })
    }

    /// Command handlers and hooks for the host framework's dispatch.
    #[must_use]
    pub fn hooks(&self) -> Arc<BridgeHooks> {
        Arc::clone(&self.hooks)
    }

    /// Coarse shutdown: cancel the session and join its thread. In-flight
    /// deliveries are abandoned.
    pub fn stop(mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.session_thread.take() {
            let _ = thread.join();
        }
    }
}

/// Body of the Telegram session thread: a current-thread runtime hosting
/// the polling loop and the delivery worker, interleaved cooperatively.
fn run_session_thread(
    credentials: tgbridge_config::TelegramCredentials,
    session: SessionState,
    deps: SessionDeps,
    parent: CancellationToken,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build telegram session runtime");
            return;
        },
    };

    runtime.block_on(async move {
        match start_session(&credentials, session, deps).await {
            Ok(Some(session_cancel)) => {
                tokio::select! {
                    () = parent.cancelled() => session_cancel.cancel(),
                    () = session_cancel.cancelled() => {},
                }
            },
            Ok(None) => {},
            Err(e) => error!(error = %e, "failed to start telegram session"),
        }
    });
}
