use std::{
    future::Future,
    io::{ErrorKind, SeekFrom},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::{
    fs::operations::read_last_line,
    utils::time::{date_to_record_name, record_name_to_date},
};

use super::entities::{WorkEntry, CSV_HEADER};

/// Interface for abstracting storage of work entries. Entries of a day are kept in the order
/// they were written, which is also `end_time` order.
pub trait LogStore {
    /// All entries of a day. A day without a log is an empty day, not an error.
    fn entries_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<WorkEntry>>>;

    /// Last entry written for a day. Used to chain `start_time` of the next entry.
    fn last_entry(&self, date: NaiveDate) -> impl Future<Output = Result<Option<WorkEntry>>>;

    /// Appends one entry to the log of `entry.date`.
    fn write(&self, entry: &WorkEntry) -> impl Future<Output = Result<()>>;

    /// Days that have a log, most recent first.
    fn days(&self) -> impl Future<Output = Result<Vec<NaiveDate>>>;
}

impl<T: Deref> LogStore for T
where
    T::Target: LogStore,
{
    fn entries_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<WorkEntry>>> {
        self.deref().entries_for(date)
    }

    fn last_entry(&self, date: NaiveDate) -> impl Future<Output = Result<Option<WorkEntry>>> {
        self.deref().last_entry(date)
    }

    fn write(&self, entry: &WorkEntry) -> impl Future<Output = Result<()>> {
        self.deref().write(entry)
    }

    fn days(&self) -> impl Future<Output = Result<Vec<NaiveDate>>> {
        self.deref().days()
    }
}

/// The main realization of [LogStore]: one CSV file per calendar day inside `log_dir`.
pub struct CsvLogStore {
    log_dir: PathBuf,
}

impl CsvLogStore {
    /// The directory is created lazily on first write, so an unwritable location only fails the
    /// save that hits it.
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(date_to_record_name(date))
    }

    async fn get_all_inner(&self, path: &Path) -> Result<Vec<WorkEntry>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<u8>, std::io::Error> {
            debug!("Extracting {path:?}");
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let mut content = Vec::new();
            let result = file.read_to_end(&mut content).await;
            file.unlock_async().await?;
            result?;
            Ok(content)
        }

        match extract(path).await {
            Ok(content) => Ok(parse_rows(path, &content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
        }
    }

    /// Reads the last line of a day file without going through the whole file.
    async fn read_last_line(path: &Path) -> std::result::Result<String, std::io::Error> {
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let result = read_last_line(&mut file, &mut [0; 1024]).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut File, entry: &WorkEntry) -> Result<()> {
        let length = file.metadata().await?.len();
        let mut buffer = vec![];
        // Files saved by spreadsheets often lack the final line break.
        if length > 0 && !Self::ends_with_newline(file).await? {
            buffer.push(b'\n');
        }
        buffer.extend(encode_row(entry, length == 0)?);
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn ends_with_newline(file: &mut File) -> std::result::Result<bool, std::io::Error> {
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] == b'\n')
    }
}

impl LogStore for CsvLogStore {
    async fn entries_for(&self, date: NaiveDate) -> Result<Vec<WorkEntry>> {
        self.get_all_inner(&self.path_for(date)).await
    }

    async fn last_entry(&self, date: NaiveDate) -> Result<Option<WorkEntry>> {
        let path = self.path_for(date);
        let line = match Self::read_last_line(&path).await {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };

        let line = line.as_str();
        if is_header(line) {
            return Ok(None);
        }

        match parse_row(line) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // Blank trailing lines or a hand-edited row. Reading the whole file skips those.
                warn!("Last line of {path:?} is not an entry ({e}), reading the whole file");
                Ok(self.get_all_inner(&path).await?.pop())
            }
        }
    }

    async fn write(&self, entry: &WorkEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .with_context(|| format!("Can't create log directory {:?}", self.log_dir))?;

        let path = self.path_for(entry.date);
        let mut file = File::options()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Can't open {path:?} for writing"))?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, entry).await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to append to {path:?}"))
    }

    async fn days(&self) -> Result<Vec<NaiveDate>> {
        let mut read_dir = match tokio::fs::read_dir(&self.log_dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => Err(e)?,
        };

        let mut days = vec![];
        while let Some(item) = read_dir.next_entry().await? {
            if let Some(date) = record_name_to_date(&item.file_name().to_string_lossy()) {
                days.push(date);
            }
        }
        days.sort_unstable_by(|a, b| b.cmp(a));
        Ok(days)
    }
}

fn header_record() -> StringRecord {
    StringRecord::from(CSV_HEADER.to_vec())
}

fn is_header(line: &str) -> bool {
    line.trim() == CSV_HEADER.join(",")
}

fn encode_row(entry: &WorkEntry, with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    writer.serialize(entry)?;
    Ok(writer.into_inner()?)
}

fn parse_row(line: &str) -> Result<WorkEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        anyhow::bail!("Empty line");
    }
    Ok(record.deserialize(Some(&header_record()))?)
}

fn parse_rows(path: &Path, content: &[u8]) -> Vec<WorkEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);
    let mut entries = vec![];
    for row in reader.deserialize::<WorkEntry>() {
        match row {
            Ok(v) => entries.push(v),
            Err(e) => {
                // ignore rows we can't understand. The file belongs to the user and might have
                // been edited by hand.
                warn!("Skipping illegal row in {path:?}: {e}")
            }
        }
    }
    entries
}
