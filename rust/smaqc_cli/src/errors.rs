use smaqc::errors::{
    DataAccessError,
    SmaqcError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error interpreting the config: {0}")]
    Config(String),

    #[error(transparent)]
    Smaqc(#[from] SmaqcError),
}

impl From<DataAccessError> for CliError {
    fn from(e: DataAccessError) -> Self {
        CliError::Smaqc(e.into())
    }
}
