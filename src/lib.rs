//! Small reminder utility that periodically asks what you are working on and keeps the answers
//! in one CSV file per day. The same files are later grouped into a daily summary.
//!

pub mod cli;
pub mod config;
pub mod fs;
pub mod storage;
pub mod summary;
pub mod tray;
pub mod utils;
