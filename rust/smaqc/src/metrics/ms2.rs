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
    ScanRecord,
    ScanType,
};
use crate::utils::format;
use crate::utils::stats::{
    median,
    quartile_for,
};
use tracing::debug;

const KEY_COUNT: &str = "MS2_4_Count";
const KEY_QUARTILES: [&str; 4] = ["MS2_4_Q1", "MS2_4_Q2", "MS2_4_Q3", "MS2_4_Q4"];

/// One MS2 scan with its precursor peak maximum and best identification score.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ms2Scan {
    scan_number: i64,
    peak_max_intensity: Option<f64>,
    best_score: Option<f64>,
}

impl FromRow for Ms2Scan {
    const COLUMNS: &'static [&'static str] =
        &["scan_number", "peak_max_intensity", "best_score"];

    fn from_row(row: &RowMap) -> std::result::Result<Self, FieldError> {
        Ok(Self {
            scan_number: row.parse("scan_number")?,
            peak_max_intensity: row.parse_optional("peak_max_intensity"),
            best_score: row.parse_optional("best_score"),
        })
    }
}

/// Fraction of passing scans per intensity quartile, `NaN` for an empty quartile.
fn quartile_fractions(scans: &[Ms2Scan], mode: Mode) -> [f64; 4] {
    let mut totals = [0usize; 4];
    let mut passed = [0usize; 4];
    for (rank, scan) in scans.iter().enumerate() {
        let q = quartile_for(rank, scans.len()) as usize - 1;
        totals[q] += 1;
        if scan.best_score.is_some_and(|x| mode.passes(x)) {
            passed[q] += 1;
        }
    }
    let mut out = [f64::NAN; 4];
    for q in 0..4 {
        if totals[q] > 0 {
            out[q] = passed[q] as f64 / totals[q] as f64;
        }
    }
    out
}

impl<D: DataAccess> Measurements<D> {
    /// MS2 scans carrying a passing identification.
    fn identified_ms2_scans(&mut self) -> Result<Vec<ScanRecord>> {
        let sql = format!(
            "SELECT scan_number, scan_time, scan_type, total_ion_intensity, base_peak_intensity, \
             base_peak_signal_to_noise, ion_count_raw \
             FROM scan_stats WHERE random_id = {id} AND scan_type = {ms2} \
             AND scan_number IN ({passing}) \
             ORDER BY scan_number",
            id = self.run.run_id,
            ms2 = ScanType::Ms2.code(),
            passing = self.passing_scans_sql(),
        );
        Ok(self.fetch::<ScanRecord>(&sql)?.records)
    }

    /// Median ion injection time of identified MS2 scans (ms).
    pub fn ms2_1(&mut self) -> Result<String> {
        let times = self.ion_injection_times(ScanType::Ms2, true)?;
        if times.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&times), 2))
    }

    /// Median base peak signal to noise of identified MS2 scans.
    pub fn ms2_2(&mut self) -> Result<String> {
        let values: Vec<f64> = self
            .identified_ms2_scans()?
            .into_iter()
            .filter_map(|x| x.base_peak_signal_to_noise)
            .collect();
        if values.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&values), 2))
    }

    /// Median number of peaks in identified MS2 scans.
    pub fn ms2_3(&mut self) -> Result<String> {
        let values: Vec<f64> = self
            .identified_ms2_scans()?
            .into_iter()
            .filter_map(|x| x.ion_count_raw.map(|c| c as f64))
            .collect();
        if values.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&values), 0))
    }

    fn ms2_quartile_fraction(&mut self, quartile: usize) -> Result<f64> {
        if let Some(count) = self.cache.get(KEY_COUNT) {
            if count == 0.0 {
                return Ok(f64::NAN);
            }
            return Ok(self.cache.get_or(KEY_QUARTILES[quartile], f64::NAN));
        }

        let sql = format!(
            "SELECT ss.scan_number AS scan_number, MAX(sic.peak_max_intensity) AS peak_max_intensity, \
             MIN(p.{score}) AS best_score \
             FROM scan_stats ss \
             LEFT JOIN sic_stats sic ON sic.random_id = ss.random_id AND sic.frag_scan_number = ss.scan_number \
             LEFT JOIN {table} p ON p.random_id = ss.random_id AND p.scan = ss.scan_number \
             WHERE ss.random_id = {id} AND ss.scan_type = {ms2} \
             GROUP BY ss.scan_number \
             ORDER BY COALESCE(MAX(sic.peak_max_intensity), 0), ss.scan_number",
            score = self.mode().score_column(),
            table = self.mode().table(),
            id = self.run.run_id,
            ms2 = ScanType::Ms2.code(),
        );
        let scans = self.fetch::<Ms2Scan>(&sql)?.records;
        let fractions = quartile_fractions(&scans, self.mode());
        debug!(
            "MS2 identification by intensity quartile over {} scans \
             (scan {:?} lowest at {:?}, scan {:?} highest at {:?}): {:?}",
            scans.len(),
            scans.first().map(|x| x.scan_number),
            scans.first().and_then(|x| x.peak_max_intensity),
            scans.last().map(|x| x.scan_number),
            scans.last().and_then(|x| x.peak_max_intensity),
            fractions
        );

        self.cache.set(KEY_COUNT, scans.len() as f64);
        for (key, value) in KEY_QUARTILES.iter().zip(fractions) {
            self.cache.set(key, value);
        }
        Ok(fractions[quartile])
    }

    /// Fraction of MS2 scans identified, lowest precursor intensity quartile.
    pub fn ms2_4a(&mut self) -> Result<String> {
        Ok(format::fixed(self.ms2_quartile_fraction(0)?, 4))
    }

    /// Fraction of MS2 scans identified, second precursor intensity quartile.
    pub fn ms2_4b(&mut self) -> Result<String> {
        Ok(format::fixed(self.ms2_quartile_fraction(1)?, 4))
    }

    /// Fraction of MS2 scans identified, third precursor intensity quartile.
    pub fn ms2_4c(&mut self) -> Result<String> {
        Ok(format::fixed(self.ms2_quartile_fraction(2)?, 4))
    }

    /// Fraction of MS2 scans identified, highest precursor intensity quartile.
    pub fn ms2_4d(&mut self) -> Result<String> {
        Ok(format::fixed(self.ms2_quartile_fraction(3)?, 4))
    }
}
