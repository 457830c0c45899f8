use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, info};

use crate::utils::{clock::Clock, time::wall_time};

use super::{
    entities::{EntryDraft, WorkEntry},
    log_store::LogStore,
};

/// How far back to look for the last used project and for project suggestions.
pub const RECENT_DAYS: i64 = 30;

/// Bridges what the user typed and the [LogStore]: assigns `start_time`/`end_time` so that a
/// day's entries partition the time between the first reminder and the last save.
pub struct WorkLog<S: LogStore> {
    store: S,
    clock: Arc<dyn Clock>,
    session_start: Option<NaiveDateTime>,
}

impl<S: LogStore> WorkLog<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            session_start: None,
        }
    }

    /// The first entry of the day starts here instead of at midnight, if it is the same day.
    pub fn with_session_start(mut self, session_start: NaiveDateTime) -> Self {
        self.session_start = Some(session_start);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Saves a new entry ending now and starting where the previous entry of today ended.
    pub async fn append(&self, draft: EntryDraft) -> Result<WorkEntry> {
        if !draft.has_description() {
            bail!("Description is required");
        }

        let now = self.clock.now();
        let date = now.date_naive();
        let end_time = wall_time(now);

        let start_time = match self.store.last_entry(date).await? {
            Some(previous) => previous.end_time,
            None => self.day_start(date),
        };

        let entry = WorkEntry {
            date,
            // The wall clock might have been moved back since the previous save.
            start_time: start_time.min(end_time),
            end_time,
            project: draft.project,
            task_type: draft.task_type,
            description: draft.description,
        };

        self.store.write(&entry).await?;
        info!(
            "Saved entry {} {}-{} {}/{}",
            entry.date, entry.start_time, entry.end_time, entry.project, entry.task_type
        );
        Ok(entry)
    }

    pub async fn read_today(&self) -> Result<Vec<WorkEntry>> {
        self.read_day(self.today()).await
    }

    pub async fn read_day(&self, date: NaiveDate) -> Result<Vec<WorkEntry>> {
        self.store.entries_for(date).await
    }

    /// Project and task type of the most recent entry, looking back [RECENT_DAYS].
    pub async fn last_used(&self) -> Result<Option<(String, String)>> {
        for date in self.recent_days().await? {
            if let Some(entry) = self.store.last_entry(date).await? {
                debug!("Last used values come from {date}");
                return Ok(Some((entry.project, entry.task_type)));
            }
        }
        Ok(None)
    }

    /// Distinct non-empty projects of the last [RECENT_DAYS], most recently used first.
    pub async fn recent_projects(&self) -> Result<Vec<String>> {
        let mut projects: Vec<String> = vec![];
        for date in self.recent_days().await? {
            let entries = self.store.entries_for(date).await?;
            for entry in entries.into_iter().rev() {
                if !entry.project.is_empty() && !projects.contains(&entry.project) {
                    projects.push(entry.project);
                }
            }
        }
        Ok(projects)
    }

    async fn recent_days(&self) -> Result<Vec<NaiveDate>> {
        let today = self.today();
        let oldest = today - Duration::days(RECENT_DAYS);
        Ok(self
            .store
            .days()
            .await?
            .into_iter()
            .filter(|date| *date <= today && *date > oldest)
            .collect())
    }

    fn day_start(&self, date: NaiveDate) -> NaiveTime {
        match self.session_start {
            Some(start) if start.date() == date => {
                let time = start.time();
                time.with_nanosecond(0).unwrap_or(time)
            }
            _ => NaiveTime::MIN,
        }
    }
}
