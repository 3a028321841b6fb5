//! In-memory fakes for the collaborator traits, shared by the engine tests.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;

use tgbridge_store::{IdentityCache, LinkStore};

use crate::{
    clients::{AttachmentFetcher, DeltachatClient, TelegramSender},
    error::DeliveryError,
    types::{DcMessage, DcOutgoing, OutboundDraft, TgAttachment},
};

pub async fn memory_stores() -> (Arc<LinkStore>, Arc<IdentityCache>) {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    LinkStore::init(&pool).await.unwrap();
    IdentityCache::init(&pool).await.unwrap();
    (
        Arc::new(LinkStore::new(pool.clone())),
        Arc::new(IdentityCache::new(pool)),
    )
}

pub fn dc_message(id: i64, chat_id: i64, text: &str) -> DcMessage {
    DcMessage {
        id,
        chat_id,
        text: text.to_string(),
        html: None,
        file: None,
        quote_id: None,
        sender_name: "alice".into(),
        override_sender_name: None,
    }
}

#[derive(Default)]
pub struct MockDeltachat {
    pub group_chats: Mutex<HashSet<i64>>,
    pub member_counts: Mutex<HashMap<i64, usize>>,
    pub self_contact: i64,
    pub known_messages: Mutex<HashSet<i64>>,
    pub failing_chats: Mutex<HashSet<i64>>,
    pub sent: Mutex<Vec<(i64, DcOutgoing)>>,
    next_id: AtomicI64,
}

impl MockDeltachat {
    pub fn new() -> Self {
        Self {
            self_contact: 1,
            next_id: AtomicI64::new(500),
            ..Self::default()
        }
    }

    pub fn add_group(&self, chat_id: i64, members: usize) {
        self.group_chats.lock().unwrap().insert(chat_id);
        self.member_counts.lock().unwrap().insert(chat_id, members);
    }

    pub fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<DcOutgoing> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == chat_id)
            .map(|(_, o)| o.clone())
            .collect()
    }
}

#[async_trait]
impl DeltachatClient for MockDeltachat {
    async fn is_multiuser(&self, chat_id: i64) -> anyhow::Result<bool> {
        Ok(self.group_chats.lock().unwrap().contains(&chat_id))
    }

    async fn member_count(&self, chat_id: i64) -> anyhow::Result<usize> {
        Ok(*self.member_counts.lock().unwrap().get(&chat_id).unwrap_or(&0))
    }

    fn self_contact(&self) -> i64 {
        self.self_contact
    }

    async fn has_message(&self, msg_id: i64) -> bool {
        self.known_messages.lock().unwrap().contains(&msg_id)
    }

    async fn send(&self, chat_id: i64, outgoing: DcOutgoing) -> anyhow::Result<i64> {
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            anyhow::bail!("chat {chat_id} rejected the message");
        }
        self.sent.lock().unwrap().push((chat_id, outgoing));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct MockTelegram {
    pub sent: Mutex<Vec<(i64, OutboundDraft)>>,
    pub permanent_chats: Mutex<HashSet<i64>>,
    pub transient_chats: Mutex<HashSet<i64>>,
    next_id: AtomicI64,
}

impl MockTelegram {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(7000),
            ..Self::default()
        }
    }

    pub fn fail_permanently(&self, chat_id: i64) {
        self.permanent_chats.lock().unwrap().insert(chat_id);
    }

    pub fn fail_transiently(&self, chat_id: i64) {
        self.transient_chats.lock().unwrap().insert(chat_id);
    }

    pub fn last_sent(&self) -> Option<(i64, OutboundDraft)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TelegramSender for MockTelegram {
    async fn send(&self, chat_id: i64, draft: OutboundDraft) -> Result<i64, DeliveryError> {
        if self.permanent_chats.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::permanent("chat not found"));
        }
        if self.transient_chats.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::transient("flood wait"));
        }
        self.sent.lock().unwrap().push((chat_id, draft));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct MockFetcher {
    pub downloads: Mutex<Vec<String>>,
}

#[async_trait]
impl AttachmentFetcher for MockFetcher {
    async fn download(
        &self,
        attachment: &TgAttachment,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        self.downloads
            .lock()
            .unwrap()
            .push(attachment.file_id.clone());
        let name = attachment.file_name.as_deref().unwrap_or("file.bin");
        let path = dest_dir.join(name);
        std::fs::write(&path, b"payload")?;
        Ok(path)
    }
}
