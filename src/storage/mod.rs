//!  Storage is organized through [log_store::CsvLogStore].
//!  The basic idea is:
//!   - There is a directory with one `YYYY-MM-DD.csv` file per day.
//!   - Files are only ever appended to, one flushed line per entry.
//!   - An entry starts where the previous entry of the same day ended, see [work_log::WorkLog].

pub mod entities;
pub mod log_store;
pub mod memory;
pub mod work_log;
