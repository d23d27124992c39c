use super::{
    Measurements,
    group_ratio,
};
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
    ScanRecord,
    ScanType,
};
use crate::utils::format;
use crate::utils::stats::median;
use std::collections::{
    BTreeMap,
    HashSet,
};

/// Fold change in total ion current between consecutive MS1 scans that
/// counts as an ion source instability.
const TIC_FOLD_CHANGE: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
struct PeptidePrecursor {
    unique_seq_id: i64,
    mz: f64,
}

impl FromRow for PeptidePrecursor {
    const COLUMNS: &'static [&'static str] = &["unique_seq_id", "mz"];

    fn from_row(row: &RowMap) -> std::result::Result<Self, FieldError> {
        Ok(Self {
            unique_seq_id: row.parse("unique_seq_id")?,
            mz: row.parse("mz")?,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TicChanges {
    scans: usize,
    drops: usize,
    jumps: usize,
}

fn tic_changes(tic: &[f64]) -> TicChanges {
    let mut out = TicChanges {
        scans: tic.len(),
        ..Default::default()
    };
    for pair in tic.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev <= 0.0 || cur <= 0.0 {
            continue;
        }
        if prev / cur > TIC_FOLD_CHANGE {
            out.drops += 1;
        } else if cur / prev > TIC_FOLD_CHANGE {
            out.jumps += 1;
        }
    }
    out
}

impl<D: DataAccess> Measurements<D> {
    fn ms1_tic_changes(&mut self) -> Result<TicChanges> {
        let sql = format!(
            "SELECT scan_number, scan_time, scan_type, total_ion_intensity, base_peak_intensity, \
             base_peak_signal_to_noise, ion_count_raw \
             FROM scan_stats WHERE random_id = {id} AND scan_type = {ms1} \
             ORDER BY scan_number",
            id = self.run.run_id,
            ms1 = ScanType::Ms1.code(),
        );
        let scans = self.fetch::<ScanRecord>(&sql)?.records;
        let tic: Vec<f64> = scans.iter().map(|x| x.total_ion_intensity).collect();
        Ok(tic_changes(&tic))
    }

    /// Times the MS1 total ion current fell more than tenfold between adjacent scans.
    pub fn is_1a(&mut self) -> Result<String> {
        let changes = self.ms1_tic_changes()?;
        if changes.scans == 0 {
            return Ok(String::new());
        }
        Ok(format::count(changes.drops))
    }

    /// Times the MS1 total ion current rose more than tenfold between adjacent scans.
    pub fn is_1b(&mut self) -> Result<String> {
        let changes = self.ms1_tic_changes()?;
        if changes.scans == 0 {
            return Ok(String::new());
        }
        Ok(format::count(changes.jumps))
    }

    /// Median precursor m/z of the unique identified peptides.
    pub fn is_2(&mut self) -> Result<String> {
        let sql = format!(
            "SELECT p.unique_seq_id AS unique_seq_id, sic.mz AS mz \
             FROM {table} p \
             JOIN sic_stats sic ON sic.random_id = p.random_id AND sic.frag_scan_number = p.scan \
             WHERE p.random_id = {id} AND {pass} \
             ORDER BY p.scan, p.unique_seq_id",
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        );
        let precursors = self.fetch::<PeptidePrecursor>(&sql)?.records;
        let mut seen = HashSet::new();
        let mzs: Vec<f64> = precursors
            .into_iter()
            .filter(|x| seen.insert(x.unique_seq_id))
            .map(|x| x.mz)
            .collect();
        if mzs.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&mzs), 4))
    }

    /// Passing identified spectra per precursor charge.
    fn spectra_by_charge(&mut self) -> Result<BTreeMap<i64, f64>> {
        let sql = format!(
            "SELECT p.charge AS key, COUNT(DISTINCT p.scan) AS count {from} GROUP BY p.charge",
            from = self.passing_psms(),
        );
        self.counts(&sql)
    }

    /// Ratio of 1+ to 2+ identifications.
    pub fn is_3a(&mut self) -> Result<String> {
        let counts = self.spectra_by_charge()?;
        Ok(format::fixed(group_ratio(&counts, 1, 2), 6))
    }

    /// Ratio of 3+ to 2+ identifications.
    pub fn is_3b(&mut self) -> Result<String> {
        let counts = self.spectra_by_charge()?;
        Ok(format::fixed(group_ratio(&counts, 3, 2), 6))
    }

    /// Ratio of 4+ to 2+ identifications.
    pub fn is_3c(&mut self) -> Result<String> {
        let counts = self.spectra_by_charge()?;
        Ok(format::fixed(group_ratio(&counts, 4, 2), 6))
    }
}
