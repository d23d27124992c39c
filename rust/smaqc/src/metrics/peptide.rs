use super::{
    Measurements,
    group_ratio,
};
use crate::data_access::DataAccess;
use crate::errors::Result;
use crate::models::CleavageState;
use crate::utils::format;
use crate::utils::stats::median;
use std::collections::BTreeMap;

const FULLY_TRYPTIC: i64 = CleavageState::FullyTryptic as i64;
const PARTIALLY_TRYPTIC: i64 = CleavageState::PartiallyTryptic as i64;

/// What a tryptic-state count counts.
#[derive(Debug, Clone, Copy)]
enum TrypticUnit {
    Spectra,
    Peptides,
    PeptideCharges,
}

impl TrypticUnit {
    fn distinct_sql(self) -> &'static str {
        match self {
            TrypticUnit::Spectra => "p.scan",
            TrypticUnit::Peptides => "p.unique_seq_id",
            TrypticUnit::PeptideCharges => "p.unique_seq_id || '/' || p.charge",
        }
    }
}

impl<D: DataAccess> Measurements<D> {
    /// Median reporting score, over passing or over all identifications.
    fn median_display_score(&mut self, passing_only: bool) -> Result<String> {
        let from = if passing_only {
            self.passing_psms()
        } else {
            format!(
                "FROM {table} p WHERE p.random_id = {id}",
                table = self.mode().table(),
                id = self.run.run_id,
            )
        };
        let sql = format!(
            "SELECT DISTINCT p.scan, p.{score} AS value {from}",
            score = self.mode().score_column(),
        );
        let mode = self.mode();
        let scores: Vec<f64> = self
            .values(&sql)?
            .into_iter()
            .filter_map(|x| mode.display_score(x))
            .collect();
        if scores.is_empty() {
            return Ok(String::new());
        }
        Ok(format::fixed(median(&scores), 3))
    }

    /// Median identification score of passing identifications.
    pub fn p_1a(&mut self) -> Result<String> {
        self.median_display_score(true)
    }

    /// Median identification score of all identifications.
    pub fn p_1b(&mut self) -> Result<String> {
        self.median_display_score(false)
    }

    /// Passing identifications grouped by cleavage state.
    ///
    /// A unit listed under several states (one row per protein) counts once,
    /// under its most tryptic state.
    fn tryptic_counts(&mut self, unit: TrypticUnit) -> Result<BTreeMap<i64, f64>> {
        let sql = format!(
            "SELECT u.state AS key, COUNT(*) AS count FROM ( \
             SELECT {distinct} AS unit, MAX(p.cleavage_state) AS state {from} \
             GROUP BY {distinct}) u \
             WHERE u.state IS NOT NULL GROUP BY u.state",
            distinct = unit.distinct_sql(),
            from = self.passing_psms(),
        );
        self.counts(&sql)
    }

    fn fully_tryptic(&mut self, unit: TrypticUnit) -> Result<String> {
        let counts = self.tryptic_counts(unit)?;
        let n = counts.get(&FULLY_TRYPTIC).copied().unwrap_or(0.0);
        Ok(format::count(n as usize))
    }

    /// Fully tryptic identified spectra.
    pub fn p_2a(&mut self) -> Result<String> {
        self.fully_tryptic(TrypticUnit::Spectra)
    }

    /// Fully tryptic unique peptide and charge combinations.
    pub fn p_2b(&mut self) -> Result<String> {
        self.fully_tryptic(TrypticUnit::PeptideCharges)
    }

    /// Fully tryptic unique peptides.
    pub fn p_2c(&mut self) -> Result<String> {
        self.fully_tryptic(TrypticUnit::Peptides)
    }

    /// Partially tryptic over fully tryptic unique peptides.
    pub fn p_3(&mut self) -> Result<String> {
        let counts = self.tryptic_counts(TrypticUnit::Peptides)?;
        Ok(format::fixed(
            group_ratio(&counts, PARTIALLY_TRYPTIC, FULLY_TRYPTIC),
            6,
        ))
    }

    /// Fully tryptic share of all unique identified peptides.
    pub fn p_4a(&mut self) -> Result<String> {
        let counts = self.tryptic_counts(TrypticUnit::Peptides)?;
        let fully = counts.get(&FULLY_TRYPTIC).copied().unwrap_or(0.0);
        let sql = format!(
            "SELECT COUNT(DISTINCT {distinct}) AS value {from}",
            distinct = TrypticUnit::Peptides.distinct_sql(),
            from = self.passing_psms(),
        );
        let total = self.scalar(&sql)?;
        let ratio = if total > 0.0 { fully / total } else { 0.0 };
        Ok(format::fixed(ratio, 6))
    }
}
