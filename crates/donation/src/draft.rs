//! Quick-tag form drafts
//!
//! The draft is a timestamped snapshot of the form under
//! [`STORAGE_KEY_QUICK_TAG_DRAFT`]. It is discarded on successful
//! submission, on "start fresh", and on load once older than the
//! configured maximum age.

use chrono::{DateTime, Utc};
use freetag_core::{KeyValueStore, STORAGE_KEY_QUICK_TAG_DRAFT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::DraftConfig;
use crate::error::DonationResult;
use crate::form::DonationForm;

/// Stored draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub form: DonationForm,
    pub saved_at: DateTime<Utc>,
}

/// Save / load / clear with expiry
pub struct DraftStore<S: ?Sized> {
    store: Arc<S>,
    max_age: chrono::Duration,
}

impl<S: ?Sized> Clone for DraftStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            max_age: self.max_age,
        }
    }
}

impl<S: KeyValueStore + ?Sized> DraftStore<S> {
    pub fn new(store: Arc<S>, config: &DraftConfig) -> Self {
        Self {
            store,
            max_age: config.max_age(),
        }
    }

    /// Write the form with `now` as its timestamp
    pub fn save(&self, form: &DonationForm, now: DateTime<Utc>) -> DonationResult<()> {
        let snapshot = DraftSnapshot {
            form: form.clone(),
            saved_at: now,
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.set(STORAGE_KEY_QUICK_TAG_DRAFT, &json)?;
        Ok(())
    }

    /// Stored snapshot, without expiry checks
    pub fn snapshot(&self) -> Option<DraftSnapshot> {
        let raw = self.store.get(STORAGE_KEY_QUICK_TAG_DRAFT)?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable donation draft");
                None
            }
        }
    }

    /// Restore the draft, discarding it if expired or unreadable
    pub fn load(&self, now: DateTime<Utc>) -> Option<DonationForm> {
        let Some(snapshot) = self.snapshot() else {
            if self.store.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_some() {
                self.discard();
            }
            return None;
        };

        let age = now.signed_duration_since(snapshot.saved_at);
        if age > self.max_age {
            tracing::info!(saved_at = %snapshot.saved_at, "Donation draft expired, discarding");
            self.discard();
            return None;
        }

        Some(snapshot.form)
    }

    /// Remove the draft
    pub fn clear(&self) -> DonationResult<()> {
        self.store.remove(STORAGE_KEY_QUICK_TAG_DRAFT)?;
        Ok(())
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "Failed to discard donation draft");
        }
    }
}

enum Command {
    Update(DonationForm),
    Flush(oneshot::Sender<DonationResult<()>>),
    Discard,
}

/// Debounced background saving of a draft
///
/// Edits are written once no further edit arrives for the debounce
/// period. Pending edits are written when the saver is closed or dropped.
pub struct DraftAutosaver {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl DraftAutosaver {
    /// Start the saver task on the current runtime
    pub fn spawn<S>(store: DraftStore<S>, config: &DraftConfig) -> Self
    where
        S: KeyValueStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_autosaver(store, config.debounce(), rx));
        Self { tx, task }
    }

    /// Record an edit; written after the debounce period
    pub fn update(&self, form: DonationForm) {
        if self.tx.send(Command::Update(form)).is_err() {
            tracing::warn!("Draft autosaver stopped, edit not saved");
        }
    }

    /// Write any pending edit now
    pub async fn flush(&self) -> DonationResult<()> {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_err() {
            return Ok(());
        }
        done.await.unwrap_or(Ok(()))
    }

    /// Drop any pending edit and remove the stored draft ("start fresh")
    pub fn discard(&self) {
        let _ = self.tx.send(Command::Discard);
    }

    /// Write any pending edit and stop the task
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Draft autosaver task failed");
        }
    }
}

async fn run_autosaver<S>(
    store: DraftStore<S>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) where
    S: KeyValueStore + ?Sized,
{
    let mut pending: Option<DonationForm> = None;
    let timer = tokio::time::sleep(debounce);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Update(form)) => {
                    pending = Some(form);
                    timer.as_mut().reset(Instant::now() + debounce);
                }
                Some(Command::Flush(ack)) => {
                    let result = match pending.take() {
                        Some(form) => store.save(&form, Utc::now()),
                        None => Ok(()),
                    };
                    let _ = ack.send(result);
                }
                Some(Command::Discard) => {
                    pending = None;
                    store.discard();
                }
                None => {
                    if let Some(form) = pending.take() {
                        save_logged(&store, &form);
                    }
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(form) = pending.take() {
                    save_logged(&store, &form);
                }
            }
        }
    }
}

fn save_logged<S: KeyValueStore + ?Sized>(store: &DraftStore<S>, form: &DonationForm) {
    match store.save(form, Utc::now()) {
        Ok(()) => tracing::debug!("Donation draft saved"),
        Err(e) => tracing::warn!(error = %e, "Failed to save donation draft"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freetag_core::{FileStore, MemoryStore};

    fn store() -> (Arc<MemoryStore>, DraftStore<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(memory.clone(), &DraftConfig::default());
        (memory, drafts)
    }

    #[test]
    fn test_save_and_load() {
        let (_memory, drafts) = store();
        let form = DonationForm::new("FT-1001", "75");
        let now = Utc::now();

        drafts.save(&form, now).unwrap();
        assert_eq!(drafts.load(now), Some(form));
        assert_eq!(drafts.snapshot().unwrap().saved_at, now);
    }

    #[test]
    fn test_expired_draft_is_cleared() {
        let (memory, drafts) = store();
        let saved_at = Utc::now();
        drafts.save(&DonationForm::new("FT-1001", "75"), saved_at).unwrap();

        let almost = saved_at + chrono::Duration::days(7);
        assert!(drafts.load(almost).is_some());

        let expired = almost + chrono::Duration::seconds(1);
        assert!(drafts.load(expired).is_none());
        assert!(memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_none());
    }

    #[test]
    fn test_corrupt_draft_is_cleared() {
        let (memory, drafts) = store();
        memory.set(STORAGE_KEY_QUICK_TAG_DRAFT, "{not json").unwrap();

        assert!(drafts.load(Utc::now()).is_none());
        assert!(memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_none());
    }

    #[test]
    fn test_saved_at_is_iso8601() {
        let (memory, drafts) = store();
        drafts.save(&DonationForm::default(), Utc::now()).unwrap();

        let raw = memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let saved_at = value["savedAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(saved_at).is_ok());
    }

    #[test]
    fn test_file_backed_draft_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let form = DonationForm::new("FT-1001", "20");
        let now = Utc::now();

        {
            let file = Arc::new(FileStore::open(&path).unwrap());
            DraftStore::new(file, &DraftConfig::default()).save(&form, now).unwrap();
        }

        let file = Arc::new(FileStore::open(&path).unwrap());
        let drafts = DraftStore::new(file, &DraftConfig::default());
        assert_eq!(drafts.load(now), Some(form));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_debounces() {
        let (memory, drafts) = store();
        let saver = DraftAutosaver::spawn(drafts.clone(), &DraftConfig::default());

        saver.update(DonationForm::new("FT-1001", "1"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        saver.update(DonationForm::new("FT-1001", "12"));
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Second edit reset the timer
        assert!(memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_none());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(drafts.snapshot().unwrap().form.amount, "12");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (_memory, drafts) = store();
        let saver = DraftAutosaver::spawn(drafts.clone(), &DraftConfig::default());

        saver.update(DonationForm::new("FT-1001", "40"));
        saver.flush().await.unwrap();
        assert_eq!(drafts.snapshot().unwrap().form.amount, "40");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_persists_pending_and_discard_clears() {
        let (memory, drafts) = store();
        let saver = DraftAutosaver::spawn(drafts.clone(), &DraftConfig::default());
        saver.update(DonationForm::new("FT-1001", "5"));
        saver.close().await;
        assert!(memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_some());

        let saver = DraftAutosaver::spawn(drafts, &DraftConfig::default());
        saver.update(DonationForm::new("FT-1001", "6"));
        saver.discard();
        saver.flush().await.unwrap();
        assert!(memory.get(STORAGE_KEY_QUICK_TAG_DRAFT).is_none());
    }
}
