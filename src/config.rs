//! Settings are stored as `settings.json` in the application directory. Loading never fails:
//! a missing file gives defaults and every malformed field falls back to its own default.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::utils::dir::default_log_dir;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u32 = 45;
pub const DEFAULT_SNOOZE_DURATION_MINUTES: u32 = 10;
pub const DEFAULT_TASK_TYPES: [&str; 6] = [
    "Development",
    "Meeting",
    "Review",
    "Learning",
    "Support",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub reminder_interval_minutes: u32,
    pub snooze_duration_minutes: u32,
    pub log_dir: PathBuf,
    pub task_types: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
            snooze_duration_minutes: DEFAULT_SNOOZE_DURATION_MINUTES,
            log_dir: default_log_dir(),
            task_types: DEFAULT_TASK_TYPES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.reminder_interval_minutes) * 60)
    }

    pub fn snooze_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.snooze_duration_minutes) * 60)
    }

    /// First task type, used when nothing has been logged yet.
    pub fn default_task_type(&self) -> &str {
        self.task_types
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TASK_TYPES[0])
    }

    pub fn load(app_dir: &Path) -> Self {
        let path = app_dir.join(SETTINGS_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings at {path:?}, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Can't read settings at {path:?}, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Field by field parsing, so one bad value doesn't throw away the rest.
    pub fn from_json(content: &str) -> Self {
        let mut settings = Self::default();
        let value = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!("Settings should be a json object, got {other}. Using defaults");
                return settings;
            }
            Err(e) => {
                warn!("Malformed settings, using defaults: {e}");
                return settings;
            }
        };

        if let Some(v) = value.get("reminder_interval_minutes") {
            match positive_minutes(v) {
                Some(minutes) => settings.reminder_interval_minutes = minutes,
                None => warn!(
                    "Invalid reminder_interval_minutes {v}, using {DEFAULT_REMINDER_INTERVAL_MINUTES}"
                ),
            }
        }

        if let Some(v) = value.get("snooze_duration_minutes") {
            match positive_minutes(v) {
                Some(minutes) => settings.snooze_duration_minutes = minutes,
                None => warn!(
                    "Invalid snooze_duration_minutes {v}, using {DEFAULT_SNOOZE_DURATION_MINUTES}"
                ),
            }
        }

        // Older settings files call it worklog_dir.
        if let Some(v) = value.get("log_dir").or_else(|| value.get("worklog_dir")) {
            match v.as_str().map(str::trim).filter(|v| !v.is_empty()) {
                Some(dir) => settings.log_dir = PathBuf::from(dir),
                None => warn!("Invalid log_dir {v}, using {:?}", settings.log_dir),
            }
        }

        if let Some(v) = value.get("task_types") {
            match task_types(v) {
                Some(types) => settings.task_types = types,
                None => warn!("Invalid task_types {v}, using defaults"),
            }
        }

        settings
    }

    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let path = app_dir.join(SETTINGS_FILE_NAME);
        std::fs::create_dir_all(app_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Can't write {path:?}"))?;
        info!("Saved settings to {path:?}");
        Ok(())
    }
}

/// Accepts `45` and `"45"`. Zero, negatives and fractions are rejected.
fn positive_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(minutes).ok().filter(|v| *v > 0)
}

fn task_types(value: &Value) -> Option<Vec<String>> {
    let mut types = Vec::<String>::new();
    for item in value.as_array()? {
        let item = item.as_str()?.trim();
        if !item.is_empty() && !types.iter().any(|v| v == item) {
            types.push(item.to_string());
        }
    }
    (!types.is_empty()).then_some(types)
}
