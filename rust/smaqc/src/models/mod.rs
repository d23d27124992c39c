pub mod mode;
pub mod records;

pub use mode::{
    Mode,
    PROTON_MASS,
    RunContext,
};
pub use records::{
    CleavageState,
    CountRow,
    Decoded,
    FromRow,
    PeakStats,
    Psm,
    ScalarRow,
    ScanRecord,
    ScanRecordEx,
    ScanTime,
    ScanType,
    fetch,
    fetch_one,
};
