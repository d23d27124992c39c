use super::{
    DataAccess,
    RowMap,
};
use crate::errors::DataAccessError;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{
    debug,
    instrument,
};

/// [`DataAccess`] over a SQLite database.
///
/// `init_reader` runs the staged query to completion and buffers its rows,
/// so a reader never holds a statement borrow across calls.
pub struct SqliteStore {
    conn: Connection,
    staged: Option<String>,
    buffered: Option<VecDeque<RowMap>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .field("staged", &self.staged)
            .field(
                "buffered_rows",
                &self.buffered.as_ref().map(|x| x.len()),
            )
            .finish()
    }
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> Result<Self, DataAccessError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            staged: None,
            buffered: None,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    #[instrument(skip(self), level = "trace")]
    fn execute(&self, sql: &str) -> Result<VecDeque<RowMap>, DataAccessError> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|x| x.to_string()).collect();
        let mut rows = stmt.query([])?;
        let mut out = VecDeque::new();
        while let Some(row) = rows.next()? {
            let mut map = RowMap::new();
            for (i, name) in names.iter().enumerate() {
                if let Some(value) = value_as_string(row.get_ref(i)?) {
                    map.insert(name.as_str(), value);
                }
            }
            out.push_back(map);
        }
        debug!("Query returned {} rows", out.len());
        Ok(out)
    }
}

fn value_as_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(x) => Some(x.to_string()),
        ValueRef::Real(x) => Some(x.to_string()),
        ValueRef::Text(x) => Some(String::from_utf8_lossy(x).into_owned()),
        ValueRef::Blob(_) => None,
    }
}

impl DataAccess for SqliteStore {
    fn set_query(&mut self, sql: &str) {
        self.staged = Some(sql.to_string());
        self.buffered = None;
    }

    fn init_reader(&mut self) -> Result<(), DataAccessError> {
        let sql = self.staged.as_deref().ok_or(DataAccessError::NoQueryStaged)?;
        let rows = self.execute(sql)?;
        self.buffered = Some(rows);
        Ok(())
    }

    fn read_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        let buffered = self
            .buffered
            .as_mut()
            .ok_or(DataAccessError::ReaderNotInitialized)?;
        Ok(buffered.pop_front().map(|row| row.restrict(columns)))
    }

    fn read_single_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        self.init_reader()?;
        let out = self.read_row(columns);
        self.buffered = None;
        out
    }
}
