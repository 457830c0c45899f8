use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use crate::{
    config::Settings,
    storage::{entities::EntryDraft, log_store::CsvLogStore, work_log::WorkLog},
    summary::render::format_duration,
    utils::{
        clock::{Clock, DefaultClock},
        time::parse_wall_time,
    },
};

use super::Args;

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(short, long, help = "What you worked on")]
    description: String,
    #[arg(short, long, help = "Project. Defaults to the last used one")]
    project: Option<String>,
    #[arg(
        short = 't',
        long = "task-type",
        help = "One of the configured task types. Defaults to the last used one"
    )]
    task_type: Option<String>,
    #[arg(
        long,
        help = "When the first entry of the day started, for example 08:30. Defaults to midnight"
    )]
    since: Option<String>,
}

/// Command to process `log` command. Same as saving the reminder dialog, except that nothing
/// is prompted.
pub async fn process_log_command(
    LogCommand {
        description,
        project,
        task_type,
        since,
    }: LogCommand,
    settings: &Settings,
) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let mut log = WorkLog::new(CsvLogStore::new(settings.log_dir.clone()), clock.clone());

    if let Some(since) = since {
        let Some(time) = parse_wall_time(&since) else {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Can't parse {since} as HH:MM"),
                )
                .into());
        };
        log = log.with_session_start(clock.now().date_naive().and_time(time));
    }

    let (last_project, last_task_type) = log
        .last_used()
        .await?
        .unwrap_or_else(|| (String::new(), settings.default_task_type().to_string()));

    let task_type = match task_type {
        Some(task_type) => resolve_task_type(&task_type, settings)?,
        None => last_task_type,
    };
    let project = project.unwrap_or(last_project);

    let draft = EntryDraft::new(project, task_type, description);
    if !draft.has_description() {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                "Description can't be empty",
            )
            .into());
    }

    let entry = log.append(draft).await?;
    println!(
        "Logged {} {}-{} ({}) {} – {} – {}",
        entry.date,
        entry.start_time,
        entry.end_time,
        format_duration(entry.duration()),
        entry.project,
        entry.task_type,
        entry.description
    );
    Ok(())
}

/// Case-insensitive match against configured task types, returning the configured spelling.
fn resolve_task_type(value: &str, settings: &Settings) -> Result<String> {
    let value = value.trim();
    settings
        .task_types
        .iter()
        .find(|v| v.eq_ignore_ascii_case(value))
        .cloned()
        .ok_or_else(|| {
            Args::command()
                .error(
                    clap::error::ErrorKind::InvalidValue,
                    format!(
                        "Unknown task type {value}. Expected one of: {}",
                        settings.task_types.join(", ")
                    ),
                )
                .into()
        })
}
