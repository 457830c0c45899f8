use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. In raw mode Ctrl+C arrives as a key instead, this covers
/// signals coming from outside the terminal.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
