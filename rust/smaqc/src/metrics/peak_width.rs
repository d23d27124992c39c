//! Chromatographic peak widths of the best identification of every
//! peptide and charge, and the metrics built on them.

use super::Measurements;
use crate::data_access::DataAccess;
use crate::errors::Result;
use crate::models::{
    PeakStats,
    Psm,
    ScanTime,
};
use crate::utils::format;
use crate::utils::stats::{
    median,
    rank_window,
};
use std::collections::{
    BTreeMap,
    HashMap,
};
use tracing::debug;

/// Lookups built once per dataset.
#[derive(Debug, Default)]
pub(crate) struct PeakWidthLookups {
    /// Best (lowest) scoring scan per peptide and charge.
    best_scans: BTreeMap<(String, i64), (f64, i64)>,
    /// Peak statistics (FWHM, apex scan, intensities) per fragmentation scan.
    peaks: HashMap<i64, PeakStats>,
    /// Scan time (minutes) per scan number.
    scan_times: BTreeMap<i64, f64>,
    /// Peak widths in seconds, ordered by scan number of the best scan.
    widths: Vec<f64>,
}

impl PeakWidthLookups {
    fn build(psms: Vec<Psm>, peaks: Vec<PeakStats>, scan_times: Vec<ScanTime>) -> Self {
        let mut best_scans: BTreeMap<(String, i64), (f64, i64)> = BTreeMap::new();
        for psm in psms {
            let key = (psm.peptide, psm.charge);
            match best_scans.get_mut(&key) {
                // Ties keep the earliest scan.
                Some(best) if psm.score < best.0 => *best = (psm.score, psm.scan),
                Some(_) => {}
                None => {
                    best_scans.insert(key, (psm.score, psm.scan));
                }
            }
        }

        let mut out = Self {
            best_scans,
            peaks: peaks.into_iter().map(|x| (x.frag_scan_number, x)).collect(),
            scan_times: scan_times
                .into_iter()
                .map(|x| (x.scan_number, x.scan_time))
                .collect(),
            widths: Vec::new(),
        };
        out.widths = out
            .best_scan_numbers()
            .into_iter()
            .filter_map(|scan| out.peak_width_seconds(scan))
            .collect();
        out
    }

    /// Scan numbers of the best identifications, ascending.
    fn best_scan_numbers(&self) -> Vec<i64> {
        let mut scans: Vec<i64> = self.best_scans.values().map(|x| x.1).collect();
        scans.sort_unstable();
        scans
    }

    /// Peak statistics of every best scan that has them, ordered by scan.
    pub(crate) fn best_scan_peaks(&self) -> Vec<PeakStats> {
        self.best_scan_numbers()
            .into_iter()
            .filter_map(|scan| self.peaks.get(&scan).copied())
            .collect()
    }

    fn time_at_or_before(&self, scan: i64) -> Option<f64> {
        self.scan_times
            .range(..=scan)
            .next_back()
            .or_else(|| self.scan_times.iter().next())
            .map(|(_, t)| *t)
    }

    fn time_at_or_after(&self, scan: i64) -> Option<f64> {
        self.scan_times
            .range(scan..)
            .next()
            .or_else(|| self.scan_times.iter().next_back())
            .map(|(_, t)| *t)
    }

    fn peak_width_seconds(&self, frag_scan: i64) -> Option<f64> {
        let peak = self.peaks.get(&frag_scan)?;
        let half_width = (peak.fwhm_in_scans / 2.0).round();
        if !half_width.is_finite() {
            return None;
        }
        // Saturates for absurd widths; the checked bounds below then drop the row.
        let half_width = half_width as i64;
        let apex = peak.optimal_peak_apex_scan_number;
        let start = self.time_at_or_before(apex.checked_sub(half_width)?)?;
        let end = self.time_at_or_after(apex.checked_add(half_width)?)?;
        Some((end - start) * 60.0)
    }

    pub(crate) fn widths(&self) -> &[f64] {
        &self.widths
    }
}

impl<D: DataAccess> Measurements<D> {
    pub(crate) fn peak_width_lookups(&mut self) -> Result<&PeakWidthLookups> {
        let lookups = match self.peak_widths.take() {
            Some(x) => x,
            None => self.build_peak_width_lookups()?,
        };
        Ok(self.peak_widths.insert(lookups))
    }

    fn build_peak_width_lookups(&mut self) -> Result<PeakWidthLookups> {
        let id = self.run.run_id;
        let psm_sql = format!(
            "SELECT {cols} {from} ORDER BY p.scan",
            cols = self.mode().psm_columns_sql("p"),
            from = self.passing_psms(),
        );
        let psms = self.fetch::<Psm>(&psm_sql)?.records;
        let peaks = self
            .fetch::<PeakStats>(&format!(
                "SELECT frag_scan_number, mz, optimal_peak_apex_scan_number, fwhm_in_scans, \
                 peak_max_intensity, parent_ion_intensity \
                 FROM sic_stats WHERE random_id = {id}"
            ))?
            .records;
        let scan_times = self
            .fetch::<ScanTime>(&format!(
                "SELECT scan_number, scan_time FROM scan_stats WHERE random_id = {id}"
            ))?
            .records;

        let lookups = PeakWidthLookups::build(psms, peaks, scan_times);
        debug!(
            "Built peak width lookups: {} best scans, {} widths",
            lookups.best_scans.len(),
            lookups.widths.len()
        );
        Ok(lookups)
    }

    fn median_peak_width(&mut self, lo_frac: f64, hi_frac: f64) -> Result<String> {
        let widths = self.peak_width_lookups()?.widths();
        let window = rank_window(widths, lo_frac, hi_frac);
        if window.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&window), 2))
    }

    /// Median peak width (seconds) over all identified peptides.
    pub fn c_3a(&mut self) -> Result<String> {
        self.median_peak_width(0.0, 1.0)
    }

    /// Median peak width for peptides in the middle half of the separation.
    pub fn c_3b(&mut self) -> Result<String> {
        self.median_peak_width(0.25, 0.75)
    }

    /// Median peak width over the first 10% of the separation.
    pub fn c_4a(&mut self) -> Result<String> {
        self.median_peak_width(0.0, 0.10)
    }

    /// Median peak width over the last 10% of the separation.
    pub fn c_4b(&mut self) -> Result<String> {
        self.median_peak_width(0.90, 1.0)
    }

    /// Median peak width over the middle 10% of the separation.
    pub fn c_4c(&mut self) -> Result<String> {
        self.median_peak_width(0.45, 0.55)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn psm(scan: i64, peptide: &str, charge: i64, score: f64) -> Psm {
        Psm {
            scan,
            charge,
            peptide: peptide.to_string(),
            score,
            peptide_mh: 1000.0,
            delta_mass: None,
            unique_seq_id: 1,
            cleavage_state: None,
        }
    }

    fn peak(frag: i64, apex: i64, fwhm: f64) -> PeakStats {
        PeakStats {
            frag_scan_number: frag,
            mz: 500.0,
            optimal_peak_apex_scan_number: apex,
            fwhm_in_scans: fwhm,
            peak_max_intensity: 1e5,
            parent_ion_intensity: 5e4,
        }
    }

    fn times(n: i64) -> Vec<ScanTime> {
        (1..=n)
            .map(|scan_number| ScanTime {
                scan_number,
                scan_time: scan_number as f64 * 0.5,
            })
            .collect()
    }

    #[test]
    fn test_best_scan_tie_keeps_earliest() {
        let psms = vec![
            psm(4, "PEPTIDE", 2, -5.0),
            psm(8, "PEPTIDE", 2, -5.0),
            psm(9, "PEPTIDE", 3, -2.0),
            psm(12, "PEPTIDE", 3, -6.0),
        ];
        let lookups = PeakWidthLookups::build(psms, vec![], times(20));
        assert_eq!(lookups.best_scan_numbers(), vec![4, 12]);
    }

    #[test]
    fn test_peak_width_uses_nearest_scans() {
        let lookups = PeakWidthLookups::build(
            vec![psm(6, "PEPTIDE", 2, -3.0)],
            vec![peak(6, 10, 4.0)],
            times(20),
        );
        // Scans 8..=12 -> 4.0 to 6.0 minutes.
        assert_eq!(lookups.widths(), &[120.0]);

        // Half width reaching past the first scan clamps to it.
        let lookups = PeakWidthLookups::build(
            vec![psm(6, "PEPTIDE", 2, -3.0)],
            vec![peak(6, 2, 10.0)],
            times(20),
        );
        // Scans 1 (clamped from -3) ..=7 -> 0.5 to 3.5 minutes.
        assert_eq!(lookups.widths(), &[180.0]);
    }

    #[test]
    fn test_best_scans_without_peaks_are_dropped() {
        let lookups = PeakWidthLookups::build(
            vec![psm(6, "AAA", 2, -3.0), psm(7, "BBB", 2, -3.0)],
            vec![peak(7, 7, 2.0)],
            times(20),
        );
        assert_eq!(lookups.widths().len(), 1);
        assert_eq!(lookups.best_scan_peaks().len(), 1);
    }

    #[test]
    fn test_corrupt_fwhm_is_skipped() {
        let psms = vec![
            psm(4, "AAA", 2, -3.0),
            psm(6, "BBB", 2, -3.0),
            psm(8, "CCC", 2, -3.0),
        ];
        let peaks = vec![
            peak(4, 10, f64::MAX),
            peak(6, 10, f64::NAN),
            peak(8, 10, 4.0),
        ];
        let lookups = PeakWidthLookups::build(psms, peaks, times(20));
        assert_eq!(lookups.widths(), &[120.0]);
    }
}
