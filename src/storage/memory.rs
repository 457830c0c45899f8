use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use anyhow::{bail, Result};
use chrono::NaiveDate;

use super::{entities::WorkEntry, log_store::LogStore};

/// [LogStore] kept in memory. Lets the reminder flow run without touching the disk, and can be
/// switched into a failing mode to act like a full disk.
#[derive(Default)]
pub struct MemoryLogStore {
    days: Mutex<BTreeMap<NaiveDate, Vec<WorkEntry>>>,
    failing: AtomicBool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails as if the log directory was unwritable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn row_count(&self) -> usize {
        self.days.lock().map(|v| v.values().map(Vec::len).sum()).unwrap_or(0)
    }
}

impl LogStore for MemoryLogStore {
    async fn entries_for(&self, date: NaiveDate) -> Result<Vec<WorkEntry>> {
        let days = self.days.lock().map_err(|_| anyhow::anyhow!("Log store poisoned"))?;
        Ok(days.get(&date).cloned().unwrap_or_default())
    }

    async fn last_entry(&self, date: NaiveDate) -> Result<Option<WorkEntry>> {
        let days = self.days.lock().map_err(|_| anyhow::anyhow!("Log store poisoned"))?;
        Ok(days.get(&date).and_then(|v| v.last().cloned()))
    }

    async fn write(&self, entry: &WorkEntry) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Log directory is not writable");
        }
        let mut days = self.days.lock().map_err(|_| anyhow::anyhow!("Log store poisoned"))?;
        days.entry(entry.date).or_default().push(entry.clone());
        Ok(())
    }

    async fn days(&self) -> Result<Vec<NaiveDate>> {
        let days = self.days.lock().map_err(|_| anyhow::anyhow!("Log store poisoned"))?;
        Ok(days.keys().rev().copied().collect())
    }
}
