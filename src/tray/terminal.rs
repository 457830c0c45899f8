//! Terminal host for the tray: maps crossterm keys onto menu commands and dialog input, and
//! redraws the screen with ratatui after every event.

use std::io::{self, Stdout};

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Terminal,
};
use tokio::{sync::mpsc::UnboundedReceiver, time::Instant};
use tracing::warn;

use super::{
    controller::{AppState, TrayCommand},
    dialog::{DialogField, DialogInput, DialogOrigin, DialogStatus, EntryDialog},
    notify::Notice,
    scheduler::ReminderState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    Command(TrayCommand),
    Dialog(DialogInput),
}

/// Keys go to the dialog while one is open, to the menu otherwise. Ctrl+C always exits.
pub fn map_key(key: KeyEvent, dialog_open: bool) -> Option<TerminalEvent> {
    // Windows reports releases too.
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(TerminalEvent::Command(TrayCommand::Exit));
    }

    if dialog_open {
        let input = match key.code {
            KeyCode::Enter => DialogInput::Confirm,
            KeyCode::Esc => DialogInput::Dismiss,
            KeyCode::Char('s') | KeyCode::Char('S') if ctrl => DialogInput::Snooze,
            KeyCode::Tab => DialogInput::NextField,
            KeyCode::BackTab => DialogInput::PreviousField,
            KeyCode::Up => DialogInput::Up,
            KeyCode::Down => DialogInput::Down,
            KeyCode::Backspace => DialogInput::Backspace,
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                DialogInput::Char(c)
            }
            _ => return None,
        };
        return Some(TerminalEvent::Dialog(input));
    }

    let command = match key.code {
        KeyCode::Char('l') => TrayCommand::LogNow,
        KeyCode::Char('s') => TrayCommand::TodaySummary,
        KeyCode::Char('p') => TrayCommand::TogglePause,
        KeyCode::Char('q') => TrayCommand::Exit,
        _ => return None,
    };
    Some(TerminalEvent::Command(command))
}

/// Wall-clock time at which `deadline` happens.
fn wall_time_of(deadline: Instant, now: DateTime<Local>, now_instant: Instant) -> DateTime<Local> {
    let left = deadline.saturating_duration_since(now_instant);
    now + chrono::Duration::from_std(left).unwrap_or_else(|_| chrono::Duration::zero())
}

/// Reminder status followed by the menu.
pub fn header_lines(
    state: &AppState,
    now: DateTime<Local>,
    now_instant: Instant,
) -> [String; 2] {
    let interval_minutes = state.scheduler().interval().as_secs() / 60;

    let status = match state.reminder_state() {
        ReminderState::Running { due } => format!(
            "next reminder at {} (every {interval_minutes}m)",
            wall_time_of(due, now, now_instant).format("%H:%M")
        ),
        ReminderState::Snoozed { until } => format!(
            "snoozed until {}",
            wall_time_of(until, now, now_instant).format("%H:%M")
        ),
        ReminderState::Paused => "reminders paused".to_string(),
    };
    let pause_label = if state.scheduler().is_paused() {
        "Resume reminders"
    } else {
        "Pause reminders"
    };

    [
        format!("Work logger - {status}"),
        format!("[l] Log now   [s] Today's summary   [p] {pause_label}   [q] Exit"),
    ]
}

/// Title and body of the open dialog.
pub fn dialog_lines(dialog: &EntryDialog, state: &AppState) -> (String, Vec<String>) {
    let interval_minutes = state.scheduler().interval().as_secs() / 60;
    let snooze_minutes = state.scheduler().snooze_duration().as_secs() / 60;
    let marker = |field: DialogField| if dialog.focus() == field { ">" } else { " " };
    let question = match dialog.origin() {
        DialogOrigin::Reminder => {
            format!("What did you work on in the last {interval_minutes} minutes?")
        }
        DialogOrigin::Manual => "What did you work on?".to_string(),
    };

    let mut lines = vec![
        format!(
            "{} Description: {}",
            marker(DialogField::Description),
            dialog.description()
        ),
        format!(
            "{} Project:     {}",
            marker(DialogField::Project),
            dialog.project()
        ),
        format!(
            "{} Task type:   < {} >",
            marker(DialogField::TaskType),
            dialog.task_type()
        ),
        format!("[Enter] Save   [Ctrl+S] Snooze {snooze_minutes}m   [Esc] Skip   [Tab] Next field"),
    ];

    match dialog.status() {
        Some(DialogStatus::DescriptionRequired) => lines.push("Description is required!".into()),
        Some(DialogStatus::SaveFailed(reason)) => {
            lines.push(format!("Error saving: {reason}. Press Enter to retry."))
        }
        None => {}
    }
    (question, lines)
}

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Line::from(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        )))
}

/// Owns the terminal while the tray runs. Raw mode and the alternate screen are undone on drop,
/// including on error paths.
pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    notices: UnboundedReceiver<Notice>,
    last_notice: Option<Notice>,
}

impl TerminalScreen {
    pub fn enter(notices: UnboundedReceiver<Notice>) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            notices,
            last_notice: None,
        })
    }

    pub fn draw(
        &mut self,
        state: &AppState,
        dialog: Option<&EntryDialog>,
        now: DateTime<Local>,
        now_instant: Instant,
    ) -> Result<()> {
        while let Ok(notice) = self.notices.try_recv() {
            self.last_notice = Some(notice);
        }

        let header = header_lines(state, now, now_instant);
        let notice = self
            .last_notice
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        let dialog = dialog.map(|v| dialog_lines(v, state));
        let dialog_height = dialog
            .as_ref()
            .map(|(_, lines)| lines.len() as u16 + 2)
            .unwrap_or(0);

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(0),
                    Constraint::Length(dialog_height),
                ])
                .split(frame.area());

            let header = Paragraph::new(vec![
                Line::from(Span::styled(
                    header[0].as_str(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(header[1].as_str()),
            ])
            .block(Block::default().borders(Borders::BOTTOM));
            frame.render_widget(header, chunks[0]);

            let notice = Paragraph::new(notice.lines().map(Line::from).collect::<Vec<_>>())
                .wrap(Wrap { trim: false });
            frame.render_widget(notice, chunks[1]);

            if let Some((title, lines)) = dialog {
                let lines = lines.into_iter().map(Line::from).collect::<Vec<_>>();
                let dialog = Paragraph::new(lines).block(panel_block(title));
                frame.render_widget(dialog, chunks[2]);
            }
        })?;
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let restored = disable_raw_mode()
            .and_then(|_| self.terminal.backend_mut().execute(LeaveAlternateScreen).map(|_| ()))
            .and_then(|_| self.terminal.show_cursor());
        if let Err(e) = restored {
            warn!("Failed to restore terminal {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{Local, TimeZone};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use tokio::time::Instant;

    use crate::{
        storage::entities::WorkEntry,
        tray::{
            controller::{AppState, TrayCommand},
            dialog::{DialogInput, DialogOrigin, EntryDialog},
            notify::Notice,
            scheduler::ReminderScheduler,
        },
    };

    use super::{dialog_lines, header_lines, map_key, TerminalEvent};

    const MINUTE: Duration = Duration::from_secs(60);

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_dialog_keyboard_contract() {
        assert_eq!(
            map_key(key(KeyCode::Enter), true),
            Some(TerminalEvent::Dialog(DialogInput::Confirm))
        );
        assert_eq!(
            map_key(key(KeyCode::Esc), true),
            Some(TerminalEvent::Dialog(DialogInput::Dismiss))
        );
        assert_eq!(
            map_key(ctrl('s'), true),
            Some(TerminalEvent::Dialog(DialogInput::Snooze))
        );
        assert_eq!(
            map_key(key(KeyCode::Char('s')), true),
            Some(TerminalEvent::Dialog(DialogInput::Char('s')))
        );
    }

    #[test]
    fn test_menu_keys_without_dialog() {
        assert_eq!(
            map_key(key(KeyCode::Char('l')), false),
            Some(TerminalEvent::Command(TrayCommand::LogNow))
        );
        assert_eq!(
            map_key(key(KeyCode::Char('s')), false),
            Some(TerminalEvent::Command(TrayCommand::TodaySummary))
        );
        assert_eq!(
            map_key(key(KeyCode::Char('p')), false),
            Some(TerminalEvent::Command(TrayCommand::TogglePause))
        );
        assert_eq!(map_key(key(KeyCode::Enter), false), None);
    }

    #[test]
    fn test_ctrl_c_exits_everywhere_and_releases_are_ignored() {
        for dialog_open in [true, false] {
            assert_eq!(
                map_key(ctrl('c'), dialog_open),
                Some(TerminalEvent::Command(TrayCommand::Exit))
            );
        }
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(release, true), None);
    }

    #[test]
    fn test_screen_shows_schedule_notice_and_dialog() {
        let start = Instant::now();
        let now = Local.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let state = AppState::new(
            ReminderScheduler::new(45 * MINUTE, 10 * MINUTE, start),
            "ProjX".into(),
            "Meeting".into(),
        );
        let dialog = EntryDialog::new(
            DialogOrigin::Reminder,
            "ProjX".into(),
            "Meeting",
            Arc::from(vec!["Development".to_string(), "Meeting".to_string()]),
            vec![],
        );
        let notice = Notice::Saved(WorkEntry {
            date: now.date_naive(),
            start_time: now.time(),
            end_time: now.time(),
            project: "ProjX".into(),
            task_type: "Meeting".into(),
            description: "standup".into(),
        });

        let header = header_lines(&state, now, start);
        let (title, lines) = dialog_lines(&dialog, &state);

        assert_eq!(header[0], "Work logger - next reminder at 09:45 (every 45m)");
        assert!(header[1].contains("[p] Pause reminders"));
        assert!(notice.to_string().contains("Entry logged"));
        assert_eq!(title, "What did you work on in the last 45 minutes?");
        assert_eq!(lines[0], "> Description: ");
        assert_eq!(lines[2], "  Task type:   < Meeting >");
        assert!(lines[3].contains("Snooze 10m"));
    }

    #[test]
    fn test_header_follows_pause_and_snooze() {
        let start = Instant::now();
        let now = Local.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut state = AppState::new(
            ReminderScheduler::new(45 * MINUTE, 10 * MINUTE, start),
            String::new(),
            "Development".into(),
        );

        state.scheduler_mut().snooze(start);
        assert_eq!(header_lines(&state, now, start)[0], "Work logger - snoozed until 09:10");

        state.scheduler_mut().pause();
        let header = header_lines(&state, now, start);
        assert_eq!(header[0], "Work logger - reminders paused");
        assert!(header[1].contains("[p] Resume reminders"));
    }
}
