//! The metric catalog.
//!
//! Every metric is a zero-argument method on [`Measurements`] returning its
//! formatted value, or an empty string when no qualifying rows exist.
//! Families live in their own modules; [`catalog`] lists them all.
//!
//! Values reused by several metrics (the elution window, peak widths, the
//! mass error summary, the MS2 intensity quartiles) are memoized per dataset.
//! Consumers call the producer directly, so the catalog can be run in any
//! order or subset.

pub mod cache;
pub mod catalog;
mod chromatography;
mod dynamic_sampling;
mod ion_source;
mod mass_error;
mod ms1;
mod ms2;
mod peak_width;
mod peptide;

pub use cache::ScratchCache;
pub use catalog::{
    MetricEntry,
    MetricFn,
    catalog,
};
pub use chromatography::ElutionWindow;

use crate::data_access::DataAccess;
use crate::errors::Result;
use crate::models::{
    CountRow,
    Decoded,
    FromRow,
    Mode,
    RunContext,
    ScalarRow,
    fetch,
    fetch_one,
};
use peak_width::PeakWidthLookups;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-dataset state of the metric catalog.
pub struct Measurements<D: DataAccess> {
    db: D,
    run: RunContext,
    cache: ScratchCache,
    peak_widths: Option<PeakWidthLookups>,
}

impl<D: DataAccess> Measurements<D> {
    pub fn new(db: D, run: RunContext) -> Self {
        Self {
            db,
            run,
            cache: ScratchCache::new(),
            peak_widths: None,
        }
    }

    /// Drop every per-dataset value and switch to `run`.
    pub fn reset(&mut self, run: RunContext) {
        debug!(
            "Resetting measurement state ({} cached values) for run {}",
            self.cache.len(),
            run.run_id
        );
        self.run = run;
        self.cache.clear();
        self.peak_widths = None;
    }

    pub fn run(&self) -> RunContext {
        self.run
    }

    pub fn mode(&self) -> Mode {
        self.run.mode
    }

    pub fn cache(&self) -> &ScratchCache {
        &self.cache
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn into_inner(self) -> D {
        self.db
    }

    fn fetch<T: FromRow>(&mut self, sql: &str) -> Result<Decoded<T>> {
        Ok(fetch(&mut self.db, sql)?)
    }

    fn fetch_one<T: FromRow>(&mut self, sql: &str) -> Result<Option<T>> {
        Ok(fetch_one(&mut self.db, sql)?)
    }

    /// Every `value` column of the query.
    fn values(&mut self, sql: &str) -> Result<Vec<f64>> {
        let decoded: Decoded<ScalarRow> = self.fetch(sql)?;
        Ok(decoded.records.into_iter().map(|x| x.0).collect())
    }

    /// `key` to `count` for a grouped query.
    fn counts(&mut self, sql: &str) -> Result<BTreeMap<i64, f64>> {
        let decoded: Decoded<CountRow> = self.fetch(sql)?;
        Ok(decoded
            .records
            .into_iter()
            .map(|x| (x.key, x.count))
            .collect())
    }

    /// Single `value` of an aggregate query, 0 when the query yields no row.
    fn scalar(&mut self, sql: &str) -> Result<f64> {
        let row: Option<ScalarRow> = self.fetch_one(sql)?;
        Ok(row.map(|x| x.0).unwrap_or(0.0))
    }

    /// `FROM`/`WHERE` clause over the passing identifications, aliased `p`.
    fn passing_psms(&self) -> String {
        format!(
            "FROM {table} p WHERE p.random_id = {id} AND {pass}",
            table = self.mode().table(),
            id = self.run.run_id,
            pass = self.mode().passing_sql("p"),
        )
    }

    /// Sub-select of the scan numbers carrying a passing identification.
    fn passing_scans_sql(&self) -> String {
        format!("SELECT p.scan {}", self.passing_psms())
    }
}

/// `num / den`, 0 when the denominator group is absent or empty.
fn group_ratio(counts: &BTreeMap<i64, f64>, num: i64, den: i64) -> f64 {
    let num = counts.get(&num).copied().unwrap_or(0.0);
    match counts.get(&den).copied() {
        Some(den) if den > 0.0 => num / den,
        _ => 0.0,
    }
}
