pub mod log;
pub mod settings;
pub mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{process_log_command, LogCommand};
use settings::{process_settings_command, SettingsCommand};
use summary::{process_summary_command, SummaryCommand};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    config::Settings,
    tray::{args::TrayArgs, run_tray},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, TRAY_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "worklog", version, long_about = None)]
#[command(about = "Asks what you are working on and keeps a daily work log", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory for settings and logs. By default $APPDATA, $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Run the reminder tray in this terminal")]
    Tray {
        #[command(flatten)]
        args: TrayArgs,
    },
    #[command(about = "Log an entry right now, without waiting for a reminder")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Show the summary of a day")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "Show or change settings")]
    Settings {
        #[command(flatten)]
        command: SettingsCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            dir
        }
        None => create_application_default_path()?,
    };

    match args.commands {
        Commands::Tray { args: tray_args } => {
            let _guard =
                enable_logging(TRAY_PREFIX, &app_dir, tray_args.log, tray_args.log_console)?;
            let mut settings = Settings::load(&app_dir);
            if let Some(log_dir) = tray_args.log_dir {
                settings.log_dir = log_dir;
            }
            if let Some(interval) = tray_args.interval {
                settings.reminder_interval_minutes = interval;
            }
            if let Some(snooze) = tray_args.snooze {
                settings.snooze_duration_minutes = snooze;
            }
            run_tray(settings).await
        }
        Commands::Log { command } => {
            let _guard = enable_cli_logging(&app_dir, args.log)?;
            process_log_command(command, &Settings::load(&app_dir)).await
        }
        Commands::Summary { command } => {
            let _guard = enable_cli_logging(&app_dir, args.log)?;
            process_summary_command(command, &Settings::load(&app_dir)).await
        }
        Commands::Settings { command } => {
            let _guard = enable_cli_logging(&app_dir, args.log)?;
            process_settings_command(command, &app_dir, Settings::load(&app_dir))
        }
    }
}

fn enable_cli_logging(app_dir: &std::path::Path, verbose: bool) -> Result<WorkerGuard> {
    let logging_level = if verbose {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, app_dir, logging_level, verbose)
}
