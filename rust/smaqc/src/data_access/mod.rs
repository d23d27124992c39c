//! The port through which every metric reads the relational store.
//!
//! The store itself is a black box: a query is staged as text, a reader is
//! initialized for it, and rows come back one at a time as column-name to
//! string-value maps restricted to the columns the caller asked for.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::errors::{
    DataAccessError,
    FieldError,
};
use std::collections::HashMap;
use std::str::FromStr;

/// A single row, string-encoded, keyed by column name.
///
/// SQL `NULL` values are never stored; asking for them behaves as if the
/// column were absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    values: HashMap<String, String>,
}

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|x| x.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only the requested columns.
    pub fn restrict(mut self, columns: &[&str]) -> Self {
        self.values.retain(|k, _| columns.contains(&k.as_str()));
        self
    }

    /// Parse a required column.
    pub fn parse<T: FromStr>(&self, column: &'static str) -> Result<T, FieldError> {
        let raw = self.get(column).ok_or(FieldError::Missing { column })?;
        raw.trim().parse::<T>().map_err(|_| FieldError::Unparsable {
            column,
            value: raw.to_string(),
        })
    }

    /// Parse an optional column, `None` when absent or unparsable.
    pub fn parse_optional<T: FromStr>(&self, column: &str) -> Option<T> {
        self.get(column).and_then(|x| x.trim().parse::<T>().ok())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }
}

/// Query execution against the relational store.
///
/// Usage is always `set_query` followed by either `init_reader` and a loop
/// over `read_row`, or a single `read_single_row`.
pub trait DataAccess {
    /// Stage a query. Replaces any previously staged query and drops its reader.
    fn set_query(&mut self, sql: &str);

    /// Prepare the row stream for the staged query.
    fn init_reader(&mut self) -> Result<(), DataAccessError>;

    /// Next row of the stream, `None` once exhausted.
    fn read_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError>;

    /// At most one row of the staged query. The stream is released afterwards.
    fn read_single_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError>;
}

impl<D: DataAccess + ?Sized> DataAccess for Box<D> {
    fn set_query(&mut self, sql: &str) {
        (**self).set_query(sql)
    }

    fn init_reader(&mut self) -> Result<(), DataAccessError> {
        (**self).init_reader()
    }

    fn read_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        (**self).read_row(columns)
    }

    fn read_single_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        (**self).read_single_row(columns)
    }
}
