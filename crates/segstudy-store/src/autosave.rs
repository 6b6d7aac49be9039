use std::time::{Duration, Instant};

use segstudy_forms::AnswerValue;

use crate::backend::StorageBackend;
use crate::datalayer::DataLayer;
use crate::error::StoreError;

/// Collapses rapid repeated calls into a single deferred invocation.
///
/// Deadlines are explicit `Instant`s rather than live timers, so the
/// scheduler works with whatever loop the caller owns and tests never sleep.
/// At most one value is pending per instance; a new call always supersedes
/// the previous one.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Stores `value` as the latest pending call and re-arms the quiet
    /// interval from `now`.
    pub fn schedule_at(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    pub fn schedule(&mut self, value: T) {
        self.schedule_at(value, Instant::now());
    }

    /// Takes the pending value once its quiet interval has elapsed.
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= now)
        {
            return self.pending.take().map(|pending| pending.value);
        }
        None
    }

    /// Takes the pending value immediately, bypassing the remaining wait.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Drops the pending value without invoking anything. Teardown path.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// One deferred answer write.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerWrite {
    pub step: String,
    pub case_id: Option<String>,
    pub item_id: String,
    pub value: AnswerValue,
}

/// Debounced autosave over a data layer.
///
/// `record` writes the answer to local storage synchronously, so intermediate
/// values are never lost; only the remote call is deferred and collapsed.
pub struct Autosave {
    debouncer: Debouncer<AnswerWrite>,
}

impl Autosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
        }
    }

    /// Persists the answer locally right away and schedules the remote write.
    pub fn record<B: StorageBackend>(
        &mut self,
        layer: &DataLayer<B>,
        write: AnswerWrite,
    ) -> Result<(), StoreError> {
        self.record_at(layer, write, Instant::now())
    }

    pub fn record_at<B: StorageBackend>(
        &mut self,
        layer: &DataLayer<B>,
        write: AnswerWrite,
        now: Instant,
    ) -> Result<(), StoreError> {
        layer.write_local_answer(
            &write.step,
            write.case_id.as_deref(),
            &write.item_id,
            &write.value,
        )?;
        self.debouncer.schedule_at(write, now);
        Ok(())
    }

    /// Performs the deferred remote write when its quiet interval elapsed.
    pub async fn pump<B: StorageBackend>(
        &mut self,
        layer: &DataLayer<B>,
        now: Instant,
    ) -> Result<(), StoreError> {
        if let Some(write) = self.debouncer.fire_due(now) {
            layer
                .sync_answer_remote(
                    &write.step,
                    write.case_id.as_deref(),
                    &write.item_id,
                    &write.value,
                )
                .await?;
        }
        Ok(())
    }

    /// Forces any pending remote write. Called before navigation, save-and-
    /// exit, and submission so no unsent edit is lost.
    pub async fn flush<B: StorageBackend>(&mut self, layer: &DataLayer<B>) -> Result<(), StoreError> {
        if let Some(write) = self.debouncer.flush() {
            layer
                .sync_answer_remote(
                    &write.step,
                    write.case_id.as_deref(),
                    &write.item_id,
                    &write.value,
                )
                .await?;
        }
        Ok(())
    }

    /// Discards any pending write without sending it.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
