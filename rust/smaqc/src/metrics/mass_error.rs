//! Precursor mass measurement error (MS1_5 family).

use super::Measurements;
use crate::data_access::{
    DataAccess,
    RowMap,
};
use crate::errors::{
    FieldError,
    Result,
};
use crate::models::{
    FromRow,
    Mode,
    PROTON_MASS,
};
use crate::utils::format;
use crate::utils::stats::{
    ISOTOPE_UNIT_MASS,
    correct_mass_error,
    median,
    rounded_index,
};
use tracing::debug;

const KEY_COUNT: &str = "MS1_5_Count";
const KEY_MEDIAN_DA: &str = "MS1_5_MedianDa";
const KEY_MEAN_ABS_DA: &str = "MS1_5_MeanAbsDa";
const KEY_MEDIAN_PPM: &str = "MS1_5_MedianPpm";
const KEY_IQR_PPM: &str = "MS1_5_IqrPpm";

#[derive(Debug, Clone, Copy, PartialEq)]
struct PrecursorMatch {
    scan: i64,
    charge: i64,
    peptide_mh: f64,
    delta_mass: Option<f64>,
    parent_mz: Option<f64>,
}

impl FromRow for PrecursorMatch {
    const COLUMNS: &'static [&'static str] =
        &["scan", "charge", "peptide_mh", "delta_mass", "parent_mz"];

    fn from_row(row: &RowMap) -> std::result::Result<Self, FieldError> {
        Ok(Self {
            scan: row.parse("scan")?,
            charge: row.parse("charge")?,
            peptide_mh: row.parse("peptide_mh")?,
            delta_mass: row.parse_optional("delta_mass"),
            parent_mz: row.parse_optional("parent_mz"),
        })
    }
}

impl PrecursorMatch {
    fn theoretical_mass(&self) -> f64 {
        self.peptide_mh - PROTON_MASS
    }

    /// Observed minus theoretical neutral mass (Da), before isotope correction.
    fn raw_delta(&self, mode: Mode) -> Option<f64> {
        let reported = match mode {
            Mode::Phrp => self.delta_mass,
            Mode::Legacy => None,
        };
        reported.or_else(|| {
            let mz = self.parent_mz?;
            if self.charge <= 0 {
                return None;
            }
            let observed = (mz - PROTON_MASS) * self.charge as f64;
            Some(observed - self.theoretical_mass())
        })
    }

    /// Isotope corrected error in Da and ppm.
    fn corrected(&self, mode: Mode) -> Option<(f64, f64)> {
        let theoretical = self.theoretical_mass();
        if theoretical <= 0.0 {
            return None;
        }
        let delta = correct_mass_error(self.raw_delta(mode)?, ISOTOPE_UNIT_MASS);
        Some((delta, delta / theoretical * 1e6))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MassErrorSummary {
    pub median_da: f64,
    pub mean_abs_da: f64,
    pub median_ppm: f64,
    pub iqr_ppm: f64,
}

impl MassErrorSummary {
    fn from_errors(errors: &[(f64, f64)]) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        let da: Vec<f64> = errors.iter().map(|x| x.0).collect();
        let mut ppm: Vec<f64> = errors.iter().map(|x| x.1).collect();
        ppm.sort_by(|a, b| a.total_cmp(b));
        let q1 = ppm[rounded_index(ppm.len(), 0.25)];
        let q3 = ppm[rounded_index(ppm.len(), 0.75)];
        Some(Self {
            median_da: median(&da),
            mean_abs_da: da.iter().map(|x| x.abs()).sum::<f64>() / da.len() as f64,
            median_ppm: median(&ppm),
            iqr_ppm: q3 - q1,
        })
    }
}

impl<D: DataAccess> Measurements<D> {
    pub(crate) fn mass_error_summary(&mut self) -> Result<Option<MassErrorSummary>> {
        if let Some(count) = self.cache.get(KEY_COUNT) {
            if count == 0.0 {
                return Ok(None);
            }
            return Ok(Some(MassErrorSummary {
                median_da: self.cache.get_or(KEY_MEDIAN_DA, 0.0),
                mean_abs_da: self.cache.get_or(KEY_MEAN_ABS_DA, 0.0),
                median_ppm: self.cache.get_or(KEY_MEDIAN_PPM, 0.0),
                iqr_ppm: self.cache.get_or(KEY_IQR_PPM, 0.0),
            }));
        }

        let sql = format!(
            "SELECT p.scan AS scan, p.charge AS charge, p.peptide_mh AS peptide_mh, \
             {delta} AS delta_mass, sic.mz AS parent_mz \
             FROM {table} p \
             LEFT JOIN sic_stats sic ON sic.random_id = p.random_id AND sic.frag_scan_number = p.scan \
             WHERE p.random_id = {id} AND {pass} \
             ORDER BY p.scan, p.peptide_mh",
            delta = match self.mode() {
                Mode::Phrp => "p.delm_da",
                Mode::Legacy => "p.delta_mass",
            },
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        );
        let mut matches = self.fetch::<PrecursorMatch>(&sql)?.records;
        // Rows repeated per protein carry the same precursor.
        matches.dedup_by(|a, b| a.scan == b.scan && a.peptide_mh == b.peptide_mh);

        let mode = self.mode();
        let errors: Vec<(f64, f64)> = matches.iter().filter_map(|x| x.corrected(mode)).collect();
        let summary = MassErrorSummary::from_errors(&errors);
        debug!(
            "Mass error summary over {} precursors: {:?}",
            errors.len(),
            summary
        );

        self.cache.set(KEY_COUNT, errors.len() as f64);
        if let Some(s) = summary {
            self.cache.set(KEY_MEDIAN_DA, s.median_da);
            self.cache.set(KEY_MEAN_ABS_DA, s.mean_abs_da);
            self.cache.set(KEY_MEDIAN_PPM, s.median_ppm);
            self.cache.set(KEY_IQR_PPM, s.iqr_ppm);
        }
        Ok(summary)
    }

    /// Median precursor mass error (Da).
    pub fn ms1_5a(&mut self) -> Result<String> {
        let summary = self.mass_error_summary()?;
        Ok(format::fixed_or_empty(summary.map(|x| x.median_da), 6))
    }

    /// Mean absolute precursor mass error (Da).
    pub fn ms1_5b(&mut self) -> Result<String> {
        let summary = self.mass_error_summary()?;
        Ok(format::fixed_or_empty(summary.map(|x| x.mean_abs_da), 6))
    }

    /// Median precursor mass error (ppm).
    pub fn ms1_5c(&mut self) -> Result<String> {
        let summary = self.mass_error_summary()?;
        Ok(format::fixed_or_empty(summary.map(|x| x.median_ppm), 4))
    }

    /// Interquartile range of the precursor mass error (ppm).
    pub fn ms1_5d(&mut self) -> Result<String> {
        let summary = self.mass_error_summary()?;
        Ok(format::fixed_or_empty(summary.map(|x| x.iqr_ppm), 4))
    }
}
