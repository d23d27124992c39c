pub mod format;
pub mod stats;
