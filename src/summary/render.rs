use ansi_term::{Colour, Style};
use chrono::{Duration, NaiveDate};

use super::{total_duration, SummaryGroup};

const NO_PROJECT: &str = "No Project";

/// Formats a duration as `2h 30m`, or `45m` below an hour. Seconds are dropped, not rounded.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// Human readable summary of a day. `colored` adds terminal styling, leave it off for anything
/// that is copied elsewhere.
pub fn render_summary(date: NaiveDate, groups: &[SummaryGroup], colored: bool) -> String {
    let heading = if colored {
        Style::new().bold()
    } else {
        Style::new()
    };
    let dim = if colored {
        Colour::Cyan.normal()
    } else {
        Style::new()
    };

    let mut out = format!(
        "{}\n",
        heading.paint(format!("Work summary for {}", date.format("%A, %B %d, %Y")))
    );

    if groups.is_empty() {
        out.push_str("No entries logged for this day.");
        return out;
    }

    for group in groups {
        let project = if group.project.is_empty() {
            NO_PROJECT
        } else {
            group.project.as_str()
        };
        out.push_str(&format!(
            "{} – {} – {}\n",
            heading.paint(project),
            group.task_type,
            dim.paint(format_duration(group.duration))
        ));
        for description in &group.descriptions {
            out.push_str(&format!("  • {description}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{} – {}",
        heading.paint("Total"),
        dim.paint(format_duration(total_duration(groups)))
    ));
    out
}
