pub mod data_access;
pub mod dispatch;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod runner;
pub mod utils;

pub use data_access::{
    DataAccess,
    RowMap,
    SqliteStore,
};
pub use dispatch::{
    Dispatcher,
    MetricRegistry,
};
pub use errors::{
    DataAccessError,
    SmaqcError,
};
pub use metrics::{
    Measurements,
    ScratchCache,
};
pub use models::{
    Mode,
    RunContext,
};
pub use runner::{
    DatasetResults,
    MetricOutcome,
    MetricRunner,
    NULL_VALUE,
};
