use std::path::PathBuf;

use clap::Args;
use tracing::level_filters::LevelFilter;

#[derive(Args, Debug)]
pub struct TrayArgs {
    /// Directory with the daily CSV files. Overrides settings for this run.
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,
    /// Minutes between reminders. Overrides settings for this run.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,
    /// Minutes a snooze lasts. Overrides settings for this run.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub snooze: Option<u32>,
    /// This option is for debugging purposes only. It garbles the screen.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
