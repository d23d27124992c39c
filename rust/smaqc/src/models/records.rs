//! Typed records decoded from [`RowMap`]s at the data-access boundary.
//!
//! Required columns that fail to parse skip the row and are counted in
//! [`Decoded::skipped`]; optional columns decode to `None`.

use crate::data_access::{
    DataAccess,
    RowMap,
};
use crate::errors::{
    DataAccessError,
    FieldError,
};
use tracing::{
    debug,
    warn,
};

pub trait FromRow: Sized {
    /// Columns requested from the reader for every row.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &RowMap) -> Result<Self, FieldError>;
}

#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub skipped: usize,
    pub first_error: Option<FieldError>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            first_error: None,
        }
    }
}

impl<T> Decoded<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, decoded: Result<T, FieldError>) {
        match decoded {
            Ok(x) => self.records.push(x),
            Err(e) => {
                self.skipped += 1;
                if self.first_error.is_none() {
                    self.first_error = Some(e);
                }
            }
        }
    }
}

/// Stage `sql`, drain every row and decode it as `T`.
pub fn fetch<T: FromRow, D: DataAccess + ?Sized>(
    db: &mut D,
    sql: &str,
) -> Result<Decoded<T>, DataAccessError> {
    db.set_query(sql);
    db.init_reader()?;
    let mut out = Decoded::default();
    while let Some(row) = db.read_row(T::COLUMNS)? {
        out.push(T::from_row(&row));
    }
    if out.skipped > 0 {
        warn!(
            "Skipped {} of {} {} rows with unusable values",
            out.skipped,
            out.skipped + out.records.len(),
            short_type_name::<T>(),
        );
        debug!("First decoding failure: {:?}", out.first_error);
    }
    Ok(out)
}

/// Stage `sql` and decode at most one row as `T`.
pub fn fetch_one<T: FromRow, D: DataAccess + ?Sized>(
    db: &mut D,
    sql: &str,
) -> Result<Option<T>, DataAccessError> {
    db.set_query(sql);
    let Some(row) = db.read_single_row(T::COLUMNS)? else {
        return Ok(None);
    };
    match T::from_row(&row) {
        Ok(x) => Ok(Some(x)),
        Err(e) => {
            warn!("Discarding {} row: {}", short_type_name::<T>(), e);
            Ok(None)
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A single numeric column named `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRow(pub f64);

impl FromRow for ScalarRow {
    const COLUMNS: &'static [&'static str] = &["value"];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self(row.parse("value")?))
    }
}

/// A grouped count, `key` / `count` columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountRow {
    pub key: i64,
    pub count: f64,
}

impl FromRow for CountRow {
    const COLUMNS: &'static [&'static str] = &["key", "count"];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            key: row.parse("key")?,
            count: row.parse("count")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Ms1,
    Ms2,
}

impl ScanType {
    pub fn code(self) -> i64 {
        match self {
            ScanType::Ms1 => 1,
            ScanType::Ms2 => 2,
        }
    }

    fn from_code(column: &'static str, code: i64) -> Result<Self, FieldError> {
        match code {
            1 => Ok(ScanType::Ms1),
            2 => Ok(ScanType::Ms2),
            other => Err(FieldError::Unparsable {
                column,
                value: other.to_string(),
            }),
        }
    }
}

/// Per-scan instrument statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub scan_number: i64,
    /// Minutes.
    pub scan_time: f64,
    pub scan_type: ScanType,
    pub total_ion_intensity: f64,
    pub base_peak_intensity: Option<f64>,
    pub base_peak_signal_to_noise: Option<f64>,
    pub ion_count_raw: Option<i64>,
}

impl FromRow for ScanRecord {
    const COLUMNS: &'static [&'static str] = &[
        "scan_number",
        "scan_time",
        "scan_type",
        "total_ion_intensity",
        "base_peak_intensity",
        "base_peak_signal_to_noise",
        "ion_count_raw",
    ];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            scan_number: row.parse("scan_number")?,
            scan_time: row.parse("scan_time")?,
            scan_type: ScanType::from_code("scan_type", row.parse("scan_type")?)?,
            total_ion_intensity: row.parse("total_ion_intensity")?,
            base_peak_intensity: row.parse_optional("base_peak_intensity"),
            base_peak_signal_to_noise: row.parse_optional("base_peak_signal_to_noise"),
            ion_count_raw: row.parse_optional("ion_count_raw"),
        })
    }
}

/// The scan-number to scan-time part of a [`ScanRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanTime {
    pub scan_number: i64,
    pub scan_time: f64,
}

impl FromRow for ScanTime {
    const COLUMNS: &'static [&'static str] = &["scan_number", "scan_time"];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            scan_number: row.parse("scan_number")?,
            scan_time: row.parse("scan_time")?,
        })
    }
}

/// Extended per-scan attributes. Not every instrument export carries them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRecordEx {
    pub scan_number: i64,
    pub ion_injection_time: Option<f64>,
}

impl FromRow for ScanRecordEx {
    const COLUMNS: &'static [&'static str] = &["scan_number", "ion_injection_time"];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            scan_number: row.parse("scan_number")?,
            ion_injection_time: row.parse_optional("ion_injection_time"),
        })
    }
}

/// Chromatographic peak statistics for one fragmentation event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakStats {
    pub frag_scan_number: i64,
    pub mz: f64,
    pub optimal_peak_apex_scan_number: i64,
    pub fwhm_in_scans: f64,
    pub peak_max_intensity: f64,
    pub parent_ion_intensity: f64,
}

impl FromRow for PeakStats {
    const COLUMNS: &'static [&'static str] = &[
        "frag_scan_number",
        "mz",
        "optimal_peak_apex_scan_number",
        "fwhm_in_scans",
        "peak_max_intensity",
        "parent_ion_intensity",
    ];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            frag_scan_number: row.parse("frag_scan_number")?,
            mz: row.parse("mz")?,
            optimal_peak_apex_scan_number: row.parse("optimal_peak_apex_scan_number")?,
            fwhm_in_scans: row.parse("fwhm_in_scans")?,
            peak_max_intensity: row.parse("peak_max_intensity")?,
            parent_ion_intensity: row.parse("parent_ion_intensity")?,
        })
    }
}

/// Enzymatic cleavage completeness of an identified peptide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleavageState {
    NonTryptic = 0,
    PartiallyTryptic = 1,
    FullyTryptic = 2,
}

impl CleavageState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CleavageState::NonTryptic),
            1 => Some(CleavageState::PartiallyTryptic),
            2 => Some(CleavageState::FullyTryptic),
            _ => None,
        }
    }
}

/// One peptide-spectrum match, projected onto uniform column names by
/// [`crate::models::Mode::psm_columns_sql`].
#[derive(Debug, Clone, PartialEq)]
pub struct Psm {
    pub scan: i64,
    pub charge: i64,
    pub peptide: String,
    /// Mode dependent, lower is better in both conventions.
    pub score: f64,
    pub peptide_mh: f64,
    /// Observed minus theoretical mass in Da, when the source reports it.
    pub delta_mass: Option<f64>,
    pub unique_seq_id: i64,
    pub cleavage_state: Option<CleavageState>,
}

impl FromRow for Psm {
    const COLUMNS: &'static [&'static str] = &[
        "scan",
        "charge",
        "peptide",
        "score",
        "peptide_mh",
        "delta_mass",
        "unique_seq_id",
        "cleavage_state",
    ];

    fn from_row(row: &RowMap) -> Result<Self, FieldError> {
        Ok(Self {
            scan: row.parse("scan")?,
            charge: row.parse("charge")?,
            peptide: row.parse("peptide")?,
            score: row.parse("score")?,
            peptide_mh: row.parse("peptide_mh")?,
            delta_mass: row.parse_optional("delta_mass"),
            unique_seq_id: row.parse("unique_seq_id")?,
            cleavage_state: row
                .parse_optional::<i64>("cleavage_state")
                .and_then(CleavageState::from_code),
        })
    }
}

impl Psm {
    pub fn monoisotopic_mass(&self) -> f64 {
        self.peptide_mh - super::mode::PROTON_MASS
    }
}
