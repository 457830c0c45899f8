use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Column order of every day file. Spreadsheets rely on it, never reorder.
pub const CSV_HEADER: [&str; 6] = [
    "date",
    "start_time",
    "end_time",
    "project",
    "task_type",
    "description",
];

/// One saved row of a day file. Entries are immutable once written.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct WorkEntry {
    pub date: NaiveDate,
    #[serde(with = "wall_time_ser")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_time_ser")]
    pub end_time: NaiveTime,
    pub project: String,
    pub task_type: String,
    pub description: String,
}

impl WorkEntry {
    /// Time attributed to this entry. Rows whose end precedes their start (hand-edited files)
    /// count as zero.
    pub fn duration(&self) -> Duration {
        let duration = self.end_time - self.start_time;
        if duration < Duration::zero() {
            Duration::zero()
        } else {
            duration
        }
    }
}

/// What the user typed in the entry dialog. Times are assigned by
/// [WorkLog::append](super::work_log::WorkLog::append).
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct EntryDraft {
    pub project: String,
    pub task_type: String,
    pub description: String,
}

impl EntryDraft {
    pub fn new(
        project: impl AsRef<str>,
        task_type: impl AsRef<str>,
        description: impl AsRef<str>,
    ) -> Self {
        Self {
            project: single_line(project.as_ref()),
            task_type: single_line(task_type.as_ref()),
            description: single_line(description.as_ref()),
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Every entry has to stay on one line so the last row can be read from the end of the file.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

mod wall_time_ser {
    use chrono::NaiveTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{parse_wall_time, TIME_FORMAT};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_wall_time(s.trim()).ok_or_else(|| D::Error::custom(format!("invalid time {s:?}")))
    }
}
