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
    Decoded,
    FromRow,
};
use crate::utils::format;
use crate::utils::stats::rounded_index;
use std::collections::HashSet;
use tracing::debug;

const KEY_UNIQUE_PEPTIDES: &str = "C_2A_UniquePeptides";
const KEY_SCAN_START: &str = "C_2A_RegionScanStart";
const KEY_SCAN_END: &str = "C_2A_RegionScanEnd";
const KEY_TIME_START: &str = "C_2A_RegionTimeStart";
const KEY_TIME_END: &str = "C_2A_RegionTimeEnd";
const KEY_PEPTIDES_IN_WINDOW: &str = "C_2A_RegionPeptides";

/// Minutes between fragmentation and peak apex beyond which an
/// identification counts as early or late.
const ELUTION_OFFSET_MINUTES: f64 = 4.0;

/// Span of the separation holding the middle half of the identified peptides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElutionWindow {
    pub scan_start: i64,
    pub scan_end: i64,
    /// Minutes.
    pub time_start: f64,
    /// Minutes.
    pub time_end: f64,
    /// Unique peptides first identified inside the window.
    pub peptides: usize,
}

impl ElutionWindow {
    pub fn minutes(&self) -> f64 {
        self.time_end - self.time_start
    }
}

#[derive(Debug, Clone, Copy)]
struct IdentifiedScan {
    scan: i64,
    unique_seq_id: i64,
    scan_time: f64,
}

impl FromRow for IdentifiedScan {
    const COLUMNS: &'static [&'static str] = &["scan", "unique_seq_id", "scan_time"];

    fn from_row(row: &RowMap) -> std::result::Result<Self, FieldError> {
        Ok(Self {
            scan: row.parse("scan")?,
            unique_seq_id: row.parse("unique_seq_id")?,
            scan_time: row.parse("scan_time")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct ElutionOffset {
    scan: i64,
    frag_time: f64,
    apex_time: f64,
}

impl FromRow for ElutionOffset {
    const COLUMNS: &'static [&'static str] = &["scan", "frag_time", "apex_time"];

    fn from_row(row: &RowMap) -> std::result::Result<Self, FieldError> {
        Ok(Self {
            scan: row.parse("scan")?,
            frag_time: row.parse("frag_time")?,
            apex_time: row.parse("apex_time")?,
        })
    }
}

impl<D: DataAccess> Measurements<D> {
    /// The elution window, computed on first use for the current dataset.
    pub fn elution_window(&mut self) -> Result<Option<ElutionWindow>> {
        if let Some(unique) = self.cache.get(KEY_UNIQUE_PEPTIDES) {
            if unique == 0.0 {
                return Ok(None);
            }
            return Ok(Some(ElutionWindow {
                scan_start: self.cache.get_or(KEY_SCAN_START, 0.0) as i64,
                scan_end: self.cache.get_or(KEY_SCAN_END, 0.0) as i64,
                time_start: self.cache.get_or(KEY_TIME_START, 0.0),
                time_end: self.cache.get_or(KEY_TIME_END, 0.0),
                peptides: self.cache.get_or(KEY_PEPTIDES_IN_WINDOW, 0.0) as usize,
            }));
        }

        let window = self.compute_elution_window()?;
        match window {
            Some(w) => {
                self.cache.set(KEY_SCAN_START, w.scan_start as f64);
                self.cache.set(KEY_SCAN_END, w.scan_end as f64);
                self.cache.set(KEY_TIME_START, w.time_start);
                self.cache.set(KEY_TIME_END, w.time_end);
                self.cache.set(KEY_PEPTIDES_IN_WINDOW, w.peptides as f64);
            }
            None => self.cache.set(KEY_UNIQUE_PEPTIDES, 0.0),
        }
        Ok(window)
    }

    fn compute_elution_window(&mut self) -> Result<Option<ElutionWindow>> {
        let sql = format!(
            "SELECT p.scan AS scan, p.unique_seq_id AS unique_seq_id, ss.scan_time AS scan_time \
             FROM {table} p \
             JOIN scan_stats ss ON ss.random_id = p.random_id AND ss.scan_number = p.scan \
             WHERE p.random_id = {id} AND {pass} \
             ORDER BY p.scan, p.unique_seq_id",
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        );
        let decoded: Decoded<IdentifiedScan> = self.fetch(&sql)?;

        let mut seen = HashSet::new();
        let first_seen: Vec<IdentifiedScan> = decoded
            .records
            .into_iter()
            .filter(|x| seen.insert(x.unique_seq_id))
            .collect();
        if first_seen.is_empty() {
            return Ok(None);
        }
        self.cache.set(KEY_UNIQUE_PEPTIDES, first_seen.len() as f64);

        let start = first_seen[rounded_index(first_seen.len(), 0.25)];
        let end = first_seen[rounded_index(first_seen.len(), 0.75)];
        let peptides = first_seen
            .iter()
            .filter(|x| x.scan >= start.scan && x.scan <= end.scan)
            .count();
        let window = ElutionWindow {
            scan_start: start.scan,
            scan_end: end.scan,
            time_start: start.scan_time,
            time_end: end.scan_time,
            peptides,
        };
        debug!("Elution window: {:?}", window);
        Ok(Some(window))
    }

    /// Passing identifications (one per scan) with fragmentation and apex times.
    fn elution_offsets(&mut self) -> Result<Vec<ElutionOffset>> {
        let sql = format!(
            "SELECT p.scan AS scan, frag.scan_time AS frag_time, apex.scan_time AS apex_time \
             FROM {table} p \
             JOIN sic_stats sic ON sic.random_id = p.random_id AND sic.frag_scan_number = p.scan \
             JOIN scan_stats frag ON frag.random_id = p.random_id AND frag.scan_number = sic.frag_scan_number \
             JOIN scan_stats apex ON apex.random_id = p.random_id \
                 AND apex.scan_number = sic.optimal_peak_apex_scan_number \
             WHERE p.random_id = {id} AND {pass} \
             ORDER BY p.scan",
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        );
        let mut offsets = self.fetch::<ElutionOffset>(&sql)?.records;
        offsets.dedup_by_key(|x| x.scan);
        Ok(offsets)
    }

    fn elution_offset_fraction(&mut self, early: bool) -> Result<String> {
        let offsets = self.elution_offsets()?;
        if offsets.is_empty() {
            return Ok(String::new());
        }
        let hits = offsets
            .iter()
            .filter(|x| {
                let delta = if early {
                    x.apex_time - x.frag_time
                } else {
                    x.frag_time - x.apex_time
                };
                delta > ELUTION_OFFSET_MINUTES
            })
            .count();
        Ok(format::fixed(hits as f64 / offsets.len() as f64, 6))
    }

    /// Fraction of identifications made more than 4 minutes before the peak apex.
    pub fn c_1a(&mut self) -> Result<String> {
        self.elution_offset_fraction(true)
    }

    /// Fraction of identifications made more than 4 minutes after the peak apex.
    pub fn c_1b(&mut self) -> Result<String> {
        self.elution_offset_fraction(false)
    }

    /// Minutes spanned by the middle half of the identified peptides.
    pub fn c_2a(&mut self) -> Result<String> {
        let window = self.elution_window()?;
        Ok(format::fixed_or_empty(window.map(|w| w.minutes()), 4))
    }

    /// Unique peptides identified per minute inside the elution window.
    pub fn c_2b(&mut self) -> Result<String> {
        let Some(window) = self.elution_window()? else {
            return Ok(String::new());
        };
        let minutes = window.minutes();
        if minutes <= 0.0 {
            return Ok(String::new());
        }
        Ok(format::fixed(window.peptides as f64 / minutes, 4))
    }
}
