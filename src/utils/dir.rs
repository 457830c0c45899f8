use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

const APPLICATION_DIR_NAME: &str = "worklog";

/// Directory holding settings and tracing logs. Work log CSV files live elsewhere, see
/// [default_log_dir].
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = PathBuf::from(
                env::var("APPDATA").context("APPDATA should be present on Windows")?,
            );
            path.push(APPLICATION_DIR_NAME);
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
            path.push(APPLICATION_DIR_NAME);
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// Default location of the daily CSV files: `dailylogs` in the user's home directory.
/// Not created here, the log store creates it on first use.
pub fn default_log_dir() -> PathBuf {
    #[cfg(windows)]
    let home = env::var("USERPROFILE");
    #[cfg(not(windows))]
    let home = env::var("HOME");

    home.map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("dailylogs")
}
