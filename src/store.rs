//! Plain-text annotation store.
//!
//! One record per line:
//!
//! ```text
//! # comment
//! 2023-08-23; [speetto] 10000
//! 24-08-2023; [lotto] 5000
//! ```
//!
//! Dates are written as `YYYY-MM-DD`; `DD-MM-YYYY` and `MM/DD/YYYY` are
//! accepted when reading.

use std::collections::BTreeMap;
use std::io::{self, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::annotation::{Annotation, AnnotationGateway};
use crate::error::AnnotationError;

/// Parses a record date in any of the accepted formats.
fn parse_record_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Parses one store line. `Ok(None)` for blank lines and comments.
fn parse_line(line: &str, line_num: usize) -> Result<Option<Annotation>, AnnotationError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parse_err = |reason: String| AnnotationError::Parse {
        line: line_num,
        reason,
    };

    // Split the date from the record body at the first semicolon.
    let (date_part, rest) = line
        .split_once(';')
        .ok_or_else(|| parse_err("missing ';' after date".into()))?;
    let date = parse_record_date(date_part.trim())
        .ok_or_else(|| parse_err(format!("unrecognized date {:?}", date_part.trim())))?;

    let rest = rest.trim();
    let body = rest
        .strip_prefix('[')
        .ok_or_else(|| parse_err("missing [kind] block".into()))?;
    let (kind, amount_text) = body
        .split_once(']')
        .ok_or_else(|| parse_err("unterminated [kind] block".into()))?;
    let amount = amount_text
        .trim()
        .parse::<i64>()
        .map_err(|e| parse_err(format!("invalid amount {:?}: {e}", amount_text.trim())))?;

    Annotation::validated(date, kind, amount)
        .map(Some)
        .map_err(|e| parse_err(e.to_string()))
}

async fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn append_line(file: &mut File, line: &str) -> io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

fn format_line(record: &Annotation) -> String {
    format!(
        "{}; [{}] {}\n",
        record.date.format("%Y-%m-%d"),
        record.kind,
        record.amount
    )
}

/// Gateway persisting annotations to a line-oriented text file.
///
/// The whole file is indexed in memory on open; writes append a line and
/// only then update the index. A failed append is truncated away.
#[derive(Debug)]
pub struct FileGateway {
    path: PathBuf,
    index: RwLock<BTreeMap<NaiveDate, Vec<Annotation>>>,
}

impl FileGateway {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// Malformed lines are skipped with a warning.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AnnotationError> {
        let path = path.as_ref().to_path_buf();
        let mut index: BTreeMap<NaiveDate, Vec<Annotation>> = BTreeMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for (i, line) in contents.lines().enumerate() {
                    match parse_line(line, i + 1) {
                        Ok(Some(record)) => index.entry(record.date).or_default().push(record),
                        Ok(None) => {}
                        Err(e) => warn!(path = %path.display(), "skipping record: {e}"),
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "annotation file not found, starting empty");
            }
            Err(e) => return Err(e.into()),
        }

        debug!(path = %path.display(), dates = index.len(), "annotation store opened");
        Ok(FileGateway {
            path,
            index: RwLock::new(index),
        })
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.index.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }
}

impl AnnotationGateway for FileGateway {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<Annotation>, AnnotationError> {
        Ok(self
            .index
            .read()
            .await
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        date: NaiveDate,
        kind: &str,
        amount: i64,
    ) -> Result<Annotation, AnnotationError> {
        let record = Annotation::validated(date, kind, amount)?;

        // Hold the write lock across the append so lines and index stay in order.
        let mut index = self.index.write().await;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;
        let len = file.metadata().await?.len();

        let mut line = format_line(&record);
        if len > 0 && !ends_with_newline(&mut file).await? {
            // Never glue a record onto an unterminated last line.
            line.insert(0, '\n');
        }
        if let Err(e) = append_line(&mut file, &line).await {
            if let Err(rollback) = file.set_len(len).await {
                warn!(path = %self.path.display(), "could not truncate partial record: {rollback}");
            }
            return Err(e.into());
        }

        index.entry(date).or_default().push(record.clone());
        debug!(%date, kind = %record.kind, amount, "annotation stored");
        Ok(record)
    }
}
