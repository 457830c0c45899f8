use std::{fmt::Display, io::IsTerminal};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::info;

use crate::{
    config::Settings,
    storage::log_store::{CsvLogStore, LogStore},
    summary::{render::render_summary, summarize},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long,
        short,
        help = "Day to summarize. Examples are \"yesterday\", \"friday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Copy the summary to the clipboard")]
    copy: bool,
}

/// Command to process `summary` command. Prints entries of one day grouped by project and task
/// type.
pub async fn process_summary_command(
    SummaryCommand {
        date,
        date_style,
        copy,
    }: SummaryCommand,
    settings: &Settings,
) -> Result<()> {
    let date = match date {
        Some(date) => parse_day(&date, date_style)?,
        None => Local::now().date_naive(),
    };

    let store = CsvLogStore::new(settings.log_dir.clone());
    let entries = store.entries_for(date).await?;
    let groups = summarize(&entries);

    println!(
        "{}",
        render_summary(date, &groups, std::io::stdout().is_terminal())
    );

    if copy {
        let text = render_summary(date, &groups, false);
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text))
            .context("Can't access the clipboard")?;
        info!("Copied summary of {date} to clipboard");
        println!("Copied to clipboard!");
    }
    Ok(())
}

fn parse_day(value: &str, date_style: DateStyle) -> Result<NaiveDate> {
    match parse_date_string(value, Local::now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value}: {e}"),
            )
            .into()),
    }
}
