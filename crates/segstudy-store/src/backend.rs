use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(feature = "fs")]
use std::path::PathBuf;

/// The four addressable slots of on-device storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    Session,
    Answers,
    Queue,
    Consent,
}

impl StorageSlot {
    pub const ALL: [StorageSlot; 4] = [
        StorageSlot::Session,
        StorageSlot::Answers,
        StorageSlot::Queue,
        StorageSlot::Consent,
    ];

    /// Stable key the slot is persisted under.
    pub fn key(self) -> &'static str {
        match self {
            StorageSlot::Session => "segstudy_session",
            StorageSlot::Answers => "segstudy_answers",
            StorageSlot::Queue => "segstudy_offline_queue",
            StorageSlot::Consent => "segstudy_consent",
        }
    }
}

/// On-device key-value persistence.
///
/// Implementations are passed into the data layer explicitly; there is no
/// ambient global store, so tests can inject an isolated backend.
pub trait StorageBackend: Send + Sync {
    fn load(&self, slot: StorageSlot) -> Option<String>;
    fn store(&self, slot: StorageSlot, payload: &str);
    fn remove(&self, slot: StorageSlot);
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<&'static str, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, slot: StorageSlot) -> Option<String> {
        self.slots.lock().expect("slots lock").get(slot.key()).cloned()
    }

    fn store(&self, slot: StorageSlot, payload: &str) {
        self.slots
            .lock()
            .expect("slots lock")
            .insert(slot.key(), payload.to_string());
    }

    fn remove(&self, slot: StorageSlot) {
        self.slots.lock().expect("slots lock").remove(slot.key());
    }
}

/// Filesystem backend: one JSON file per slot under a directory.
#[cfg(feature = "fs")]
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

#[cfg(feature = "fs")]
impl FileBackend {
    /// Creates the backing directory when missing.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

#[cfg(feature = "fs")]
impl StorageBackend for FileBackend {
    fn load(&self, slot: StorageSlot) -> Option<String> {
        std::fs::read_to_string(self.path(slot)).ok()
    }

    fn store(&self, slot: StorageSlot, payload: &str) {
        if let Err(error) = std::fs::write(self.path(slot), payload) {
            tracing::error!(slot = slot.key(), %error, "failed to persist storage slot");
        }
    }

    fn remove(&self, slot: StorageSlot) {
        let _ = std::fs::remove_file(self.path(slot));
    }
}
