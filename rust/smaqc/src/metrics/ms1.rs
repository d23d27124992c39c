use super::Measurements;
use crate::data_access::DataAccess;
use crate::errors::Result;
use crate::models::{
    ScanRecordEx,
    ScanType,
};
use crate::utils::format;
use crate::utils::stats::{
    median,
    percentile_trim,
};

impl<D: DataAccess> Measurements<D> {
    /// Ion injection times of scans of `scan_type`, optionally restricted to
    /// scans carrying a passing identification.
    ///
    /// Extended scan statistics are optional; when absent this is empty.
    pub(crate) fn ion_injection_times(
        &mut self,
        scan_type: ScanType,
        identified_only: bool,
    ) -> Result<Vec<f64>> {
        let restriction = if identified_only {
            format!("AND ex.scan_number IN ({})", self.passing_scans_sql())
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT ex.scan_number AS scan_number, ex.ion_injection_time AS ion_injection_time \
             FROM scan_stats_ex ex \
             JOIN scan_stats ss ON ss.random_id = ex.random_id AND ss.scan_number = ex.scan_number \
             WHERE ex.random_id = {id} AND ss.scan_type = {scan_type} {restriction}",
            id = self.run.run_id,
            scan_type = scan_type.code(),
        );
        Ok(self
            .fetch::<ScanRecordEx>(&sql)?
            .records
            .into_iter()
            .filter_map(|x| x.ion_injection_time)
            .collect())
    }

    /// Median MS1 ion injection time (ms).
    pub fn ms1_1(&mut self) -> Result<String> {
        let times = self.ion_injection_times(ScanType::Ms1, false)?;
        if times.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&times), 2))
    }

    /// `column` of the MS1 scans inside the elution window.
    fn ms1_values_in_elution_window(&mut self, column: &str) -> Result<Vec<f64>> {
        let Some(window) = self.elution_window()? else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {column} AS value FROM scan_stats \
             WHERE random_id = {id} AND scan_type = {ms1} \
             AND scan_number BETWEEN {start} AND {end}",
            id = self.run.run_id,
            ms1 = ScanType::Ms1.code(),
            start = window.scan_start,
            end = window.scan_end,
        );
        self.values(&sql)
    }

    /// Median base peak signal to noise of MS1 scans inside the elution window.
    pub fn ms1_2a(&mut self) -> Result<String> {
        let values = self.ms1_values_in_elution_window("base_peak_signal_to_noise")?;
        if values.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&values), 2))
    }

    /// Median total ion current (thousands) of MS1 scans inside the elution window.
    pub fn ms1_2b(&mut self) -> Result<String> {
        let values = self.ms1_values_in_elution_window("total_ion_intensity")?;
        if values.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&values) / 1000.0, 2))
    }

    /// MS1 peak maxima of the passing identifications, one per scan.
    fn identified_peak_maxima(&mut self) -> Result<Vec<f64>> {
        let sql = format!(
            "SELECT DISTINCT p.scan, sic.peak_max_intensity AS value \
             FROM {table} p \
             JOIN sic_stats sic ON sic.random_id = p.random_id AND sic.frag_scan_number = p.scan \
             WHERE p.random_id = {id} AND {pass}",
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        );
        self.values(&sql)
    }

    /// Dynamic range: 95th over 5th percentile of identified peak maxima.
    pub fn ms1_3a(&mut self) -> Result<String> {
        let maxima = self.identified_peak_maxima()?;
        let trimmed = percentile_trim(&maxima, 0.05, 0.95);
        let (Some(lo), Some(hi)) = (trimmed.first(), trimmed.last()) else {
            return Ok(String::new());
        };
        if *lo <= 0.0 {
            return Ok(String::new());
        }
        Ok(format::intensity(hi / lo))
    }

    /// Median of identified peak maxima.
    pub fn ms1_3b(&mut self) -> Result<String> {
        let maxima = self.identified_peak_maxima()?;
        if maxima.is_empty() {
            return Ok(String::new());
        }
        Ok(format::intensity(median(&maxima)))
    }
}
