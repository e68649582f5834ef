//! This module provides the record storage engine.
//! The only engine implemented is [`JsonStore`], which keeps every record in one JSON document
//! and funnels all writes through a single writer thread. Callers should depend on the
//! [`RecordEngine`] trait so that the document could later be swapped for a real database.
use crate::record::{NewRecord, Record};
use crate::Result;

/// A trait for the basic functionality of a positional record store
pub trait RecordEngine: Clone + Send + 'static {
    /// Returns every record, in document order.
    ///
    /// Never fails: a missing or unreadable document reads as an empty sequence.
    fn read(&self) -> Vec<Record>;

    /// Appends a new record built from `item` and returns the full updated sequence.
    fn append(&self, item: NewRecord) -> Result<Vec<Record>>;

    /// Sets `field` of the record at `index` to `value` and returns the full updated sequence.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIndex` if there is no record at `index`, and
    /// `StoreError::NotNumeric` if `quantity` or `price` was given non-numeric text. The
    /// document is not written in either case.
    fn patch_field(&self, index: i64, field: String, value: String) -> Result<Vec<Record>>;
}

mod json;
mod queue;

pub use self::json::JsonStore;
