use super::{
    Measurements,
    group_ratio,
};
use crate::data_access::DataAccess;
use crate::errors::Result;
use crate::models::ScanType;
use crate::utils::format;
use crate::utils::stats::{
    median,
    rank_window,
};
use std::collections::BTreeMap;

impl<D: DataAccess> Measurements<D> {
    /// Number of unique peptides keyed by how many passing spectra identified them.
    fn peptides_by_spectrum_count(&mut self) -> Result<BTreeMap<i64, f64>> {
        let sql = format!(
            "SELECT spectra AS key, COUNT(*) AS count FROM ( \
                 SELECT p.unique_seq_id, COUNT(DISTINCT p.scan) AS spectra {from} \
                 GROUP BY p.unique_seq_id \
             ) GROUP BY spectra",
            from = self.passing_psms(),
        );
        self.counts(&sql)
    }

    /// Peptides identified by one spectrum over peptides identified by two.
    pub fn ds_1a(&mut self) -> Result<String> {
        let counts = self.peptides_by_spectrum_count()?;
        Ok(format::fixed(group_ratio(&counts, 1, 2), 3))
    }

    /// Peptides identified by two spectra over peptides identified by three.
    pub fn ds_1b(&mut self) -> Result<String> {
        let counts = self.peptides_by_spectrum_count()?;
        Ok(format::fixed(group_ratio(&counts, 2, 3), 3))
    }

    fn scans_in_elution_window(&mut self, scan_type: ScanType) -> Result<String> {
        let Some(window) = self.elution_window()? else {
            return Ok(String::new());
        };
        let sql = format!(
            "SELECT COUNT(*) AS value FROM scan_stats \
             WHERE random_id = {id} AND scan_type = {scan_type} \
             AND scan_number BETWEEN {start} AND {end}",
            id = self.run.run_id,
            scan_type = scan_type.code(),
            start = window.scan_start,
            end = window.scan_end,
        );
        let n = self.scalar(&sql)?;
        Ok(format::count(n as usize))
    }

    /// MS1 scans acquired inside the elution window.
    pub fn ds_2a(&mut self) -> Result<String> {
        self.scans_in_elution_window(ScanType::Ms1)
    }

    /// MS2 scans acquired inside the elution window.
    pub fn ds_2b(&mut self) -> Result<String> {
        self.scans_in_elution_window(ScanType::Ms2)
    }

    /// Peak maximum over sampled parent intensity for every best scan,
    /// paired with the peak maximum.
    fn sampling_ratios(&mut self) -> Result<Vec<(f64, f64)>> {
        let peaks = self.peak_width_lookups()?.best_scan_peaks();
        Ok(peaks
            .into_iter()
            .filter(|x| x.parent_ion_intensity > 0.0)
            .map(|x| {
                (
                    x.peak_max_intensity,
                    x.peak_max_intensity / x.parent_ion_intensity,
                )
            })
            .collect())
    }

    /// Median ratio of MS1 peak maximum to the MS1 intensity sampled at fragmentation.
    pub fn ds_3a(&mut self) -> Result<String> {
        let ratios: Vec<f64> = self.sampling_ratios()?.into_iter().map(|x| x.1).collect();
        if ratios.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&ratios), 3))
    }

    /// Same as DS_3A, restricted to the lower half of peaks by peak maximum.
    pub fn ds_3b(&mut self) -> Result<String> {
        let mut ratios = self.sampling_ratios()?;
        if ratios.is_empty() {
            return Ok(String::new());
        }
        ratios.sort_by(|a, b| a.0.total_cmp(&b.0));
        let lower: Vec<f64> = rank_window(&ratios, 0.0, 0.5)
            .into_iter()
            .map(|x| x.1)
            .collect();
        Ok(format::fixed(median(&lower), 3))
    }
}
