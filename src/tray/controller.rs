use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::Settings,
    storage::{entities::WorkEntry, log_store::LogStore, work_log::WorkLog},
    summary::{render::render_summary, summarize},
    utils::clock::Clock,
};

use super::{
    dialog::{DialogInput, DialogOrigin, DialogResolution, EntryDialog},
    notify::{Notice, Notifier},
    scheduler::{ReminderScheduler, ReminderState},
};

/// The tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    LogNow,
    TodaySummary,
    TogglePause,
    Exit,
}

/// Mutable state of a running tray: the reminder schedule and the values the next dialog is
/// prefilled with.
#[derive(Debug)]
pub struct AppState {
    scheduler: ReminderScheduler,
    last_project: String,
    last_task_type: String,
}

impl AppState {
    pub fn new(scheduler: ReminderScheduler, last_project: String, last_task_type: String) -> Self {
        Self {
            scheduler,
            last_project,
            last_task_type,
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ReminderScheduler {
        &mut self.scheduler
    }

    pub fn reminder_state(&self) -> ReminderState {
        self.scheduler.state()
    }

    pub fn last_project(&self) -> &str {
        &self.last_project
    }

    pub fn last_task_type(&self) -> &str {
        &self.last_task_type
    }

    pub fn remember(&mut self, entry: &WorkEntry) {
        self.last_project.clone_from(&entry.project);
        self.last_task_type.clone_from(&entry.task_type);
    }
}

/// Drives everything the user sees: reminders, the entry dialog and the menu. Only one dialog is
/// ever open.
pub struct TrayController<S: LogStore, N: Notifier> {
    state: AppState,
    log: WorkLog<S>,
    notifier: N,
    task_types: Arc<[String]>,
    dialog: Option<EntryDialog>,
    clock: Arc<dyn Clock>,
    running: bool,
}

impl<S: LogStore, N: Notifier> TrayController<S, N> {
    /// Prefills project and task type from the most recent entry in the log.
    pub async fn new(
        log: WorkLog<S>,
        settings: &Settings,
        clock: Arc<dyn Clock>,
        notifier: N,
    ) -> Self {
        let scheduler = ReminderScheduler::new(
            settings.reminder_interval(),
            settings.snooze_duration(),
            clock.instant(),
        );

        let (last_project, last_task_type) = match log.last_used().await {
            Ok(Some(values)) => values,
            Ok(None) => (String::new(), settings.default_task_type().to_string()),
            Err(e) => {
                warn!("Can't read previous entries {e:?}");
                (String::new(), settings.default_task_type().to_string())
            }
        };

        Self {
            state: AppState::new(scheduler, last_project, last_task_type),
            log,
            notifier,
            task_types: settings.task_types.iter().cloned().collect(),
            dialog: None,
            clock,
            running: true,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dialog(&self) -> Option<&EntryDialog> {
        self.dialog.as_ref()
    }

    pub fn work_log(&self) -> &WorkLog<S> {
        &self.log
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.scheduler().next_deadline()
    }

    pub fn start(&mut self) {
        let interval_minutes = self.state.scheduler().interval().as_secs() / 60;
        info!("Tray started, reminders every {interval_minutes} minutes");
        self.notifier.notify(Notice::Started { interval_minutes });
    }

    /// The reminder timer went off, possibly late.
    #[instrument(skip(self))]
    pub async fn on_timer(&mut self) {
        let now = self.clock.instant();
        if !self.state.scheduler_mut().fire(now) {
            return;
        }
        if self.dialog.is_some() {
            debug!("Reminder due while a dialog is open, skipping it");
            return;
        }
        self.open_dialog(DialogOrigin::Reminder).await;
    }

    #[instrument(skip(self))]
    pub async fn handle_command(&mut self, command: TrayCommand) {
        match command {
            TrayCommand::LogNow => {
                if self.dialog.is_some() {
                    debug!("Dialog already open");
                    return;
                }
                self.open_dialog(DialogOrigin::Manual).await;
            }
            TrayCommand::TodaySummary => self.show_summary().await,
            TrayCommand::TogglePause => {
                let now = self.clock.instant();
                if self.state.scheduler_mut().toggle_pause(now) {
                    info!("Reminders paused");
                    self.notifier.notify(Notice::Paused);
                } else {
                    info!("Reminders resumed");
                    self.notifier.notify(Notice::Resumed);
                }
            }
            TrayCommand::Exit => self.exit(),
        }
    }

    /// Feeds one input into the open dialog. Ignored when no dialog is open.
    pub async fn handle_dialog_input(&mut self, input: DialogInput) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let origin = dialog.origin();
        let Some(resolution) = dialog.handle(input) else {
            return;
        };

        let now = self.clock.instant();
        match resolution {
            DialogResolution::Save(draft) => match self.log.append(draft).await {
                Ok(entry) => {
                    self.dialog = None;
                    self.state.remember(&entry);
                    if origin == DialogOrigin::Reminder {
                        self.state.scheduler_mut().restart(now);
                    }
                    self.notifier.notify(Notice::Saved(entry));
                }
                Err(e) => {
                    error!("Failed to save entry {e:?}");
                    let reason = format!("{e:#}");
                    if let Some(dialog) = self.dialog.as_mut() {
                        dialog.save_failed(reason.clone());
                    }
                    self.notifier.notify(Notice::StorageFailed(reason));
                }
            },
            DialogResolution::Skip => {
                debug!("Dialog skipped");
                self.dialog = None;
                if origin == DialogOrigin::Reminder {
                    self.state.scheduler_mut().restart(now);
                }
            }
            DialogResolution::Snooze => {
                self.dialog = None;
                let scheduler = self.state.scheduler_mut();
                scheduler.snooze(now);
                if !scheduler.is_paused() {
                    let minutes = scheduler.snooze_duration().as_secs() / 60;
                    info!("Snoozed for {minutes} minutes");
                    self.notifier.notify(Notice::Snoozed { minutes });
                }
            }
        }
    }

    /// Cancels the timer and drops any open dialog without writing it.
    pub fn exit(&mut self) {
        if self.dialog.take().is_some() {
            info!("Closing open dialog on exit");
        }
        self.state.scheduler_mut().cancel();
        self.running = false;
    }

    async fn open_dialog(&mut self, origin: DialogOrigin) {
        let projects = self.log.recent_projects().await.unwrap_or_else(|e| {
            warn!("Can't read recent projects {e:?}");
            vec![]
        });
        debug!("Opening {origin:?} dialog");
        self.dialog = Some(EntryDialog::new(
            origin,
            self.state.last_project().to_string(),
            self.state.last_task_type(),
            self.task_types.clone(),
            projects,
        ));
    }

    async fn show_summary(&mut self) {
        match self.log.read_today().await {
            Ok(entries) => {
                let text = render_summary(self.log.today(), &summarize(&entries), false);
                self.notifier.notify(Notice::Summary(text));
            }
            Err(e) => {
                error!("Failed to read today's log {e:?}");
                self.notifier.notify(Notice::StorageFailed(format!("{e:#}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        config::Settings,
        storage::{memory::MemoryLogStore, work_log::WorkLog},
        summary::summarize,
        tray::{
            dialog::{DialogInput, DialogOrigin, DialogStatus},
            notify::{MockNotifier, Notice, Notifier},
            scheduler::ReminderState,
        },
        utils::{clock::test_clock::TestClock, logging::TEST_LOGGING},
    };

    use super::{TrayCommand, TrayController};

    const MINUTE: Duration = Duration::from_secs(60);

    impl Notifier for Vec<Notice> {
        fn notify(&mut self, notice: Notice) {
            self.push(notice);
        }
    }

    fn nine_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    }

    fn settings() -> Settings {
        Settings {
            reminder_interval_minutes: 45,
            snooze_duration_minutes: 10,
            ..Settings::default()
        }
    }

    async fn controller<N: Notifier>(
        clock: &TestClock,
        store: Arc<MemoryLogStore>,
        notifier: N,
    ) -> TrayController<Arc<MemoryLogStore>, N> {
        let clock: Arc<TestClock> = Arc::new(clock.clone());
        let log = WorkLog::new(store, clock.clone()).with_session_start(nine_am());
        TrayController::new(log, &settings(), clock, notifier).await
    }

    async fn type_text<N: Notifier>(
        controller: &mut TrayController<Arc<MemoryLogStore>, N>,
        text: &str,
    ) {
        for c in text.chars() {
            controller.handle_dialog_input(DialogInput::Char(c)).await;
        }
    }

    async fn switch_project<N: Notifier>(
        controller: &mut TrayController<Arc<MemoryLogStore>, N>,
        project: &str,
        task_type: char,
    ) {
        controller.handle_dialog_input(DialogInput::NextField).await;
        let current = controller.dialog().unwrap().project().len();
        for _ in 0..current {
            controller.handle_dialog_input(DialogInput::Backspace).await;
        }
        type_text(controller, project).await;
        controller.handle_dialog_input(DialogInput::NextField).await;
        controller
            .handle_dialog_input(DialogInput::Char(task_type))
            .await;
        controller.handle_dialog_input(DialogInput::NextField).await;
    }

    #[tokio::test]
    async fn test_reminders_saves_and_skips_make_the_summary() {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;
        controller.start();

        clock.advance_minutes(45);
        controller.on_timer().await;
        assert_eq!(
            controller.dialog().map(|d| d.origin()),
            Some(DialogOrigin::Reminder)
        );
        switch_project(&mut controller, "ProjX", 'd').await;
        type_text(&mut controller, "A").await;
        controller.handle_dialog_input(DialogInput::Confirm).await;
        assert!(controller.dialog().is_none());

        clock.advance_minutes(45);
        controller.on_timer().await;
        // Project and task type are remembered.
        assert_eq!(controller.dialog().unwrap().project(), "ProjX");
        type_text(&mut controller, "B").await;
        controller.handle_dialog_input(DialogInput::Confirm).await;

        clock.advance_minutes(45);
        controller.on_timer().await;
        controller.handle_dialog_input(DialogInput::Dismiss).await;
        assert!(controller.dialog().is_none());

        clock.advance_minutes(45);
        controller.on_timer().await;
        switch_project(&mut controller, "ProjY", 'm').await;
        type_text(&mut controller, "C").await;
        controller.handle_dialog_input(DialogInput::Confirm).await;

        assert_eq!(store.row_count(), 3);
        let groups = summarize(&controller.work_log().read_today().await.unwrap());
        assert_eq!(groups.len(), 2);
        assert_eq!(
            (groups[0].project.as_str(), groups[0].task_type.as_str()),
            ("ProjX", "Development")
        );
        assert_eq!(groups[0].duration, chrono::Duration::minutes(90));
        assert_eq!(groups[0].descriptions, vec!["A", "B"]);
        assert_eq!(
            (groups[1].project.as_str(), groups[1].task_type.as_str()),
            ("ProjY", "Meeting")
        );
        assert_eq!(groups[1].duration, chrono::Duration::minutes(90));
        assert_eq!(groups[1].descriptions, vec!["C"]);

        let saved = controller
            .notifier()
            .iter()
            .filter(|n| matches!(n, Notice::Saved(_)))
            .count();
        assert_eq!(saved, 3);
    }

    #[tokio::test]
    async fn test_empty_description_keeps_dialog_open() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();
        let mut controller = controller(&clock, store.clone(), notifier).await;

        controller.handle_command(TrayCommand::LogNow).await;
        type_text(&mut controller, "   ").await;
        controller.handle_dialog_input(DialogInput::Confirm).await;

        let dialog = controller.dialog().expect("dialog should stay open");
        assert_eq!(dialog.status(), Some(&DialogStatus::DescriptionRequired));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_timer_while_dialog_open_does_not_stack() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store, vec![]).await;

        clock.advance_minutes(45);
        controller.on_timer().await;
        type_text(&mut controller, "still typing").await;

        clock.advance_minutes(45);
        controller.on_timer().await;

        assert_eq!(controller.dialog().unwrap().description(), "still typing");
        assert_eq!(
            controller.next_deadline(),
            Some(clock_instant(&clock) + 45 * MINUTE)
        );
    }

    #[tokio::test]
    async fn test_log_now_leaves_countdown_alone() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;
        let first_due = controller.next_deadline();

        clock.advance_minutes(20);
        controller.handle_command(TrayCommand::LogNow).await;
        assert_eq!(
            controller.dialog().map(|d| d.origin()),
            Some(DialogOrigin::Manual)
        );
        type_text(&mut controller, "hotfix").await;
        controller.handle_dialog_input(DialogInput::Confirm).await;

        assert_eq!(store.row_count(), 1);
        assert_eq!(controller.next_deadline(), first_due);
    }

    #[tokio::test]
    async fn test_snooze_then_regular_interval() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;

        clock.advance_minutes(45);
        controller.on_timer().await;
        controller.handle_dialog_input(DialogInput::Snooze).await;
        assert!(controller.dialog().is_none());
        let snoozed_at = clock_instant(&clock);
        assert_eq!(
            controller.state().reminder_state(),
            ReminderState::Snoozed {
                until: snoozed_at + 10 * MINUTE
            }
        );

        clock.advance_minutes(9);
        controller.on_timer().await;
        assert!(controller.dialog().is_none());

        clock.advance_minutes(1);
        controller.on_timer().await;
        assert!(controller.dialog().is_some());
        controller.handle_dialog_input(DialogInput::Dismiss).await;

        assert_eq!(
            controller.state().reminder_state(),
            ReminderState::Running {
                due: clock_instant(&clock) + 45 * MINUTE
            }
        );
        assert_eq!(store.row_count(), 0);
        assert_eq!(controller.notifier(), &vec![Notice::Snoozed { minutes: 10 }]);
    }

    #[tokio::test]
    async fn test_snoozing_log_now_dialog() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;

        clock.advance_minutes(20);
        controller.handle_command(TrayCommand::LogNow).await;
        type_text(&mut controller, "not now").await;
        controller.handle_dialog_input(DialogInput::Snooze).await;

        assert!(controller.dialog().is_none());
        assert_eq!(
            controller.state().reminder_state(),
            ReminderState::Snoozed {
                until: clock_instant(&clock) + 10 * MINUTE
            }
        );

        clock.advance_minutes(10);
        controller.on_timer().await;
        assert_eq!(
            controller.dialog().map(|d| d.origin()),
            Some(DialogOrigin::Reminder)
        );
        assert_eq!(store.row_count(), 0);
        assert_eq!(controller.notifier(), &vec![Notice::Snoozed { minutes: 10 }]);
    }

    #[tokio::test]
    async fn test_closed_terminal_skips_dialog_and_exits() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;

        clock.advance_minutes(45);
        controller.on_timer().await;
        type_text(&mut controller, "half typed").await;

        controller.handle_dialog_input(DialogInput::Close).await;
        assert!(controller.dialog().is_none());
        assert_eq!(
            controller.next_deadline(),
            Some(clock_instant(&clock) + 45 * MINUTE)
        );

        controller.exit();
        assert!(!controller.is_running());
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(store.row_count(), 0);
        assert!(controller.notifier().is_empty());
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store, vec![]).await;

        clock.advance_minutes(30);
        controller.handle_command(TrayCommand::TogglePause).await;

        clock.advance_minutes(300);
        controller.on_timer().await;
        assert!(controller.dialog().is_none());
        assert_eq!(controller.next_deadline(), None);

        controller.handle_command(TrayCommand::TogglePause).await;
        assert_eq!(
            controller.next_deadline(),
            Some(clock_instant(&clock) + 45 * MINUTE)
        );
        assert_eq!(controller.notifier(), &vec![Notice::Paused, Notice::Resumed]);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_entry_for_retry() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| matches!(n, Notice::StorageFailed(_)))
            .times(1)
            .return_const(());
        notifier
            .expect_notify()
            .withf(|n| matches!(n, Notice::Saved(_)))
            .times(1)
            .return_const(());
        let mut controller = controller(&clock, store.clone(), notifier).await;

        clock.advance_minutes(45);
        controller.on_timer().await;
        type_text(&mut controller, "release notes").await;

        store.set_failing(true);
        controller.handle_dialog_input(DialogInput::Confirm).await;
        let dialog = controller.dialog().expect("entry should not be lost");
        assert_eq!(dialog.description(), "release notes");
        assert!(matches!(dialog.status(), Some(DialogStatus::SaveFailed(_))));
        assert_eq!(store.row_count(), 0);

        store.set_failing(false);
        controller.handle_dialog_input(DialogInput::Confirm).await;
        assert!(controller.dialog().is_none());
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_exit_drops_dialog_and_timer() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store.clone(), vec![]).await;

        controller.handle_command(TrayCommand::LogNow).await;
        type_text(&mut controller, "half an entry").await;
        controller.handle_command(TrayCommand::Exit).await;

        assert!(!controller.is_running());
        assert!(controller.dialog().is_none());
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_is_notified() {
        let clock = TestClock::starting_at(nine_am());
        let store = Arc::new(MemoryLogStore::new());
        let mut controller = controller(&clock, store, vec![]).await;

        controller.handle_command(TrayCommand::TodaySummary).await;

        let [Notice::Summary(text)] = controller.notifier().as_slice() else {
            panic!("expected a single summary notice");
        };
        assert!(text.starts_with("Work summary for Friday, October 16, 2026"));
    }

    fn clock_instant(clock: &TestClock) -> tokio::time::Instant {
        use crate::utils::clock::Clock;
        clock.instant()
    }
}
