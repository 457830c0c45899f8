use anyhow::Result;

/// Everything in worklog runs on one thread: the tray loop, its timer and the dialog.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
