use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

/// A single pending deadline. The event loop sleeps until [ScheduledTask::deadline], tests just
/// pass later instants to [ScheduledTask::is_due].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    due: Option<Instant>,
}

impl ScheduledTask {
    pub fn schedule(&mut self, at: Instant) {
        self.due = Some(at);
    }

    pub fn reschedule(&mut self, now: Instant, after: Duration) {
        self.schedule(now + after);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }

    /// A deadline in the past is due. Callbacks delivered late (after sleep/hibernate) fire
    /// once, immediately.
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.due, Some(due) if due <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Running { due: Instant },
    Paused,
    Snoozed { until: Instant },
}

/// Recurring reminder with a snooze override. All transitions take the current instant, nothing
/// in here reads a clock.
#[derive(Debug)]
pub struct ReminderScheduler {
    interval: Duration,
    snooze: Duration,
    task: ScheduledTask,
    paused: bool,
    snoozed: bool,
}

impl ReminderScheduler {
    /// Starts in `Running` with a full countdown.
    pub fn new(interval: Duration, snooze: Duration, now: Instant) -> Self {
        let mut task = ScheduledTask::default();
        task.reschedule(now, interval);
        Self {
            interval,
            snooze,
            task,
            paused: false,
            snoozed: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snooze_duration(&self) -> Duration {
        self.snooze
    }

    pub fn state(&self) -> ReminderState {
        match (self.paused, self.snoozed, self.task.deadline()) {
            (false, true, Some(until)) => ReminderState::Snoozed { until },
            (false, false, Some(due)) => ReminderState::Running { due },
            _ => ReminderState::Paused,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.task.deadline()
    }

    /// Called when the timer went off. Returns whether a reminder is due, in which case the
    /// scheduler is already back in `Running` with a fresh countdown.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.task.is_due(now) {
            trace!("Timer woke up early");
            return false;
        }
        if self.snoozed {
            debug!("Snooze is over");
        }
        self.snoozed = false;
        self.task.reschedule(now, self.interval);
        true
    }

    /// Restarts the regular countdown from `now`. No effect while paused.
    pub fn restart(&mut self, now: Instant) {
        if self.paused {
            return;
        }
        self.snoozed = false;
        self.task.reschedule(now, self.interval);
    }

    /// Replaces the countdown with a one-shot snooze timer. Paused stays paused.
    pub fn snooze(&mut self, now: Instant) {
        if self.paused {
            debug!("Ignoring snooze while paused");
            return;
        }
        self.snoozed = true;
        self.task.reschedule(now, self.snooze);
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.snoozed = false;
        self.task.cancel();
    }

    /// Resuming always starts a full countdown, time left before pausing is forgotten.
    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.restart(now);
    }

    /// Returns `true` if reminders are paused afterwards.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.paused {
            self.resume(now);
        } else {
            self.pause();
        }
        self.paused
    }

    /// Cancels everything. Used on exit.
    pub fn cancel(&mut self) {
        self.task.cancel();
        self.snoozed = false;
    }
}
