#![allow(missing_docs)]

pub mod autosave;
pub mod backend;
pub mod consent;
pub mod datalayer;
pub mod error;
pub mod queue;
pub mod remote;
pub mod session;

pub use autosave::{AnswerWrite, Autosave, Debouncer};
#[cfg(feature = "fs")]
pub use backend::FileBackend;
pub use backend::{MemoryBackend, StorageBackend, StorageSlot};
pub use consent::{ConsentItem, ConsentRecord};
pub use datalayer::DataLayer;
pub use error::StoreError;
pub use queue::{QueuedAction, QueuedPayload};
#[cfg(feature = "http")]
pub use remote::{HttpRemote, RemoteConfig};
pub use remote::{AnswerRef, AnswerRow, ConsentRow, RemoteError, RemoteSync, SubmissionRow};
pub use session::{COMPLETED_STEP, ParticipantSession, SessionPatch};
