use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::config::Settings;

#[derive(Debug, Parser)]
pub struct SettingsCommand {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Minutes between reminders")]
    interval: Option<u32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Minutes a snooze lasts")]
    snooze: Option<u32>,
    #[arg(long = "log-dir", help = "Directory with the daily CSV files")]
    log_dir: Option<PathBuf>,
    #[arg(
        long = "task-types",
        value_delimiter = ',',
        num_args = 1..,
        help = "Comma separated task types, the first one is the default"
    )]
    task_types: Option<Vec<String>>,
}

impl SettingsCommand {
    /// Returns whether anything was changed.
    fn apply(self, settings: &mut Settings) -> bool {
        let mut changed = false;
        if let Some(interval) = self.interval {
            settings.reminder_interval_minutes = interval;
            changed = true;
        }
        if let Some(snooze) = self.snooze {
            settings.snooze_duration_minutes = snooze;
            changed = true;
        }
        if let Some(log_dir) = self.log_dir {
            settings.log_dir = log_dir;
            changed = true;
        }
        if let Some(task_types) = self.task_types {
            let mut cleaned = Vec::<String>::new();
            for task_type in task_types.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
                if !cleaned.iter().any(|v| v == task_type) {
                    cleaned.push(task_type.to_string());
                }
            }
            if !cleaned.is_empty() {
                settings.task_types = cleaned;
                changed = true;
            }
        }
        changed
    }
}

/// Command to process `settings` command. Without options it prints current settings.
pub fn process_settings_command(
    command: SettingsCommand,
    app_dir: &Path,
    mut settings: Settings,
) -> Result<()> {
    if command.apply(&mut settings) {
        settings.save(app_dir)?;
        println!("Settings saved. Restart the tray for them to take effect.");
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
