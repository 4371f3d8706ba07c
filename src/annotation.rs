//! Per-day numeric records and the gateway used to read and write them.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::error::AnnotationError;

/// A numeric record attached to a calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub date: NaiveDate,
    pub kind: String,
    pub amount: i64,
}

impl Annotation {
    /// Builds a record after checking it can be stored.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::InvalidRecord`] when `kind` is blank or
    /// contains a store delimiter, or when `amount` is negative.
    pub fn validated(date: NaiveDate, kind: &str, amount: i64) -> Result<Self, AnnotationError> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(AnnotationError::InvalidRecord {
                reason: "kind is empty".into(),
            });
        }
        if let Some(c) = kind.chars().find(|c| matches!(c, ';' | '[' | ']' | '\n' | '\r')) {
            return Err(AnnotationError::InvalidRecord {
                reason: format!("kind contains reserved character {c:?}"),
            });
        }
        if amount < 0 {
            return Err(AnnotationError::InvalidRecord {
                reason: format!("amount must be non-negative, got {amount}"),
            });
        }
        Ok(Annotation {
            date,
            kind: kind.to_string(),
            amount,
        })
    }
}

/// Asynchronous store of annotations keyed by calendar date.
///
/// Implementations own the authoritative records; window builders only read
/// through [`fetch`](AnnotationGateway::fetch).
pub trait AnnotationGateway: Send + Sync {
    /// Records stored for exactly `date`, empty if there are none.
    fn fetch(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Annotation>, AnnotationError>> + Send;

    /// Stores a new record. A failed write leaves earlier records intact.
    fn create(
        &self,
        date: NaiveDate,
        kind: &str,
        amount: i64,
    ) -> impl Future<Output = Result<Annotation, AnnotationError>> + Send;
}

/// In-process gateway backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: RwLock<BTreeMap<NaiveDate, Vec<Annotation>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records.
    pub fn with_records(records: impl IntoIterator<Item = Annotation>) -> Self {
        let mut map: BTreeMap<NaiveDate, Vec<Annotation>> = BTreeMap::new();
        for record in records {
            map.entry(record.date).or_default().push(record);
        }
        MemoryGateway {
            records: RwLock::new(map),
        }
    }
}

impl AnnotationGateway for MemoryGateway {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<Annotation>, AnnotationError> {
        Ok(self
            .records
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
        self.records
            .write()
            .await
            .entry(date)
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}
