use thiserror::Error;

/// Failures raised by a [`crate::data_access::DataAccess`] implementation.
///
/// These are the only faults that abort a metric. The runner downgrades
/// them to a `"Null"` value for that metric and moves on.
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("no query has been staged on the reader")]
    NoQueryStaged,

    #[error("the reader was not initialized for the staged query")]
    ReaderNotInitialized,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Row-level decoding failure.
///
/// Never fatal to a metric; rows failing on a required column are skipped
/// and counted by [`crate::models::records::Decoded`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("column `{column}` is missing from the row")]
    Missing { column: &'static str },

    #[error("column `{column}` holds an unparsable value `{value}`")]
    Unparsable { column: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum SmaqcError {
    #[error("data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("unknown metric `{name}`")]
    UnknownMetric { name: String },
}

impl From<rusqlite::Error> for SmaqcError {
    fn from(x: rusqlite::Error) -> Self {
        Self::DataAccess(DataAccessError::Sqlite(x))
    }
}

pub type Result<T> = std::result::Result<T, SmaqcError>;
