//! The reminder tray. One event loop on one thread waits for whichever comes first: a key, the
//! next reminder or a shutdown signal.

use std::{future, sync::Arc};

use anyhow::Result;
use controller::TrayController;
use crossterm::event::{Event, EventStream};
use dialog::DialogInput;
use futures::StreamExt;
use notify::Notifier;
use terminal::{map_key, TerminalEvent, TerminalScreen};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    config::Settings,
    storage::{
        log_store::{CsvLogStore, LogStore},
        work_log::WorkLog,
    },
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod controller;
pub mod dialog;
pub mod notify;
pub mod scheduler;
pub mod shutdown;
pub mod terminal;

/// Represents the starting point for the tray.
pub async fn run_tray(settings: Settings) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let session_start = clock.now().naive_local();

    info!("Writing work log into {:?}", settings.log_dir);
    let log = WorkLog::new(CsvLogStore::new(settings.log_dir.clone()), clock.clone())
        .with_session_start(session_start);

    let (sender, receiver) = mpsc::unbounded_channel();
    let mut controller = TrayController::new(log, &settings, clock.clone(), sender).await;

    let shutdown_token = CancellationToken::new();
    let signals = tokio::spawn(shutdown::detect_shutdown(shutdown_token.clone()));

    let result = match TerminalScreen::enter(receiver) {
        Ok(mut screen) => {
            controller.start();
            event_loop(&mut controller, &mut screen, clock.as_ref(), &shutdown_token).await
        }
        Err(e) => Err(e),
    };

    controller.exit();
    shutdown_token.cancel();
    signals.abort();

    if let Err(e) = &result {
        error!("Tray stopped with an error {e:?}");
    }
    result
}

async fn event_loop<S: LogStore, N: Notifier>(
    controller: &mut TrayController<S, N>,
    screen: &mut TerminalScreen,
    clock: &dyn Clock,
    shutdown: &CancellationToken,
) -> Result<()> {
    let mut events = EventStream::new();

    while controller.is_running() {
        screen.draw(
            controller.state(),
            controller.dialog(),
            clock.now(),
            clock.instant(),
        )?;

        let deadline = controller.next_deadline();
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested");
                controller.exit();
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => match map_key(key, controller.dialog().is_some()) {
                    Some(TerminalEvent::Command(command)) => controller.handle_command(command).await,
                    Some(TerminalEvent::Dialog(input)) => controller.handle_dialog_input(input).await,
                    None => (),
                },
                // Resizes and the like only need a redraw.
                Some(Ok(_)) => (),
                Some(Err(e)) => {
                    error!("Can't read from terminal {e:?}");
                    controller.exit();
                    return Err(e.into());
                }
                None => {
                    info!("Terminal closed");
                    controller.handle_dialog_input(DialogInput::Close).await;
                    controller.exit();
                }
            },
            _ = wait_for(clock, deadline) => controller.on_timer().await,
        }
    }

    Ok(())
}

async fn wait_for(clock: &dyn Clock, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep_until(deadline).await,
        None => future::pending().await,
    }
}
