//! Durable key/value storage for the working draft.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Enquiry;

/// Key under which the draft is stored. Bump the suffix when the draft
/// layout changes incompatibly.
pub const DRAFT_STORAGE_KEY: &str = "enquiryForm_v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("draft storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("draft could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("draft storage lock poisoned")]
    Poisoned,
}

/// A string key/value store that survives restarts.
pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryDraftStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        // Write-then-rename; readers never see a partial draft.
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Load the saved draft. A draft that no longer parses is removed and
/// treated as absent.
pub fn load_draft(store: &dyn DraftStore) -> Result<Option<Enquiry>, StoreError> {
    let Some(saved) = store.get(DRAFT_STORAGE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<Enquiry>(&saved) {
        Ok(draft) => {
            debug!("Restored saved enquiry draft");
            Ok(Some(draft))
        }
        Err(e) => {
            warn!("Discarding unreadable enquiry draft: {}", e);
            store.remove(DRAFT_STORAGE_KEY)?;
            Ok(None)
        }
    }
}

pub fn save_draft(store: &dyn DraftStore, draft: &Enquiry) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(draft)?;
    store.set(DRAFT_STORAGE_KEY, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, ServiceType};

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path().join("drafts"));
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "{\"a\":1}").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("{\"a\":1}"));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn saved_draft_is_restored() {
        let store = MemoryDraftStore::new();
        let mut draft = Enquiry {
            full_name: "Kavya".into(),
            ..Default::default()
        };
        draft.select_service(Some(ServiceType::BlouseDesign));
        draft.blouse_mut().unwrap().neck_style = "Boat".into();

        save_draft(&store, &draft).unwrap();
        assert_eq!(load_draft(&store).unwrap(), Some(draft));
    }

    #[test]
    fn draft_with_photos_and_fit_amounts_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path());
        let mut draft = Enquiry {
            full_name: "Farah".into(),
            pickup_date: chrono::NaiveDate::from_ymd_opt(2025, 4, 2),
            ..Default::default()
        };
        draft.select_service(Some(ServiceType::Alteration));
        let alteration = draft.alteration_mut().unwrap();
        alteration.fit_areas = vec!["Waist".into()];
        alteration.fit_amounts.insert("Waist".into(), "1.5 in".into());
        draft
            .add_attachments(vec![
                Attachment::new("front.jpg", "image/jpeg", vec![0u8, 255, 128, 7]),
                Attachment::new("back.webp", "image/webp", Vec::<u8>::new()),
            ])
            .unwrap();

        save_draft(&store, &draft).unwrap();
        let restored = load_draft(&store).unwrap().unwrap();
        assert_eq!(restored, draft);
        assert_eq!(restored.reference_photos[0].data.as_ref(), &[0u8, 255, 128, 7]);
    }

    #[test]
    fn corrupt_draft_is_discarded() {
        let store = MemoryDraftStore::new();
        store.set(DRAFT_STORAGE_KEY, "{\"fullName\": ").unwrap();
        assert_eq!(load_draft(&store).unwrap(), None);
        assert_eq!(store.get(DRAFT_STORAGE_KEY).unwrap(), None);
    }
}
