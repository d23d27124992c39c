use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::str::FromStr;

/// Mass of a proton, used to move between M+H and neutral monoisotopic mass.
pub const PROTON_MASS: f64 = 1.00727649;

/// Identification source convention for one run.
///
/// Both conventions score "lower is better"; they differ in which table the
/// identifications live in, the score column, the passing threshold, and how
/// the precursor mass error is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// PHRP-normalized results, scored by MS-GF spectral E-value.
    Phrp,
    /// X!Tandem-style results, scored by log10 of the expectation value.
    Legacy,
}

impl Mode {
    pub const PHRP_THRESHOLD: f64 = 1e-12;
    pub const LEGACY_THRESHOLD: f64 = -2.0;

    pub fn table(self) -> &'static str {
        match self {
            Mode::Phrp => "phrp_psms",
            Mode::Legacy => "xt_results",
        }
    }

    pub fn score_column(self) -> &'static str {
        match self {
            Mode::Phrp => "spec_evalue",
            Mode::Legacy => "peptide_expectation_value_log",
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            Mode::Phrp => Self::PHRP_THRESHOLD,
            Mode::Legacy => Self::LEGACY_THRESHOLD,
        }
    }

    pub fn passes(self, score: f64) -> bool {
        score <= self.threshold()
    }

    /// SQL predicate equivalent to [`Mode::passes`] for the table aliased as `alias`.
    pub fn passing_sql(self, alias: &str) -> String {
        let literal = match self {
            Mode::Phrp => "1e-12",
            Mode::Legacy => "-2",
        };
        format!("{alias}.{} <= {literal}", self.score_column())
    }

    /// Score on a "higher is better" scale for reporting.
    ///
    /// Non-positive E-values have no logarithm and are dropped.
    pub fn display_score(self, score: f64) -> Option<f64> {
        match self {
            Mode::Phrp if score > 0.0 => Some(-score.log10()),
            Mode::Phrp => None,
            Mode::Legacy => Some(-score),
        }
    }

    /// SELECT list projecting the identification table onto the uniform
    /// column names read by [`crate::models::Psm`].
    pub fn psm_columns_sql(self, alias: &str) -> String {
        let delta = match self {
            Mode::Phrp => format!("{alias}.delm_da"),
            Mode::Legacy => format!("{alias}.delta_mass"),
        };
        format!(
            "{alias}.scan AS scan, {alias}.charge AS charge, {alias}.peptide AS peptide, \
             {alias}.{score} AS score, {alias}.peptide_mh AS peptide_mh, {delta} AS delta_mass, \
             {alias}.unique_seq_id AS unique_seq_id, {alias}.cleavage_state AS cleavage_state",
            score = self.score_column(),
        )
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Phrp => write!(f, "phrp"),
            Mode::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "phrp" => Ok(Mode::Phrp),
            "legacy" | "xtandem" => Ok(Mode::Legacy),
            other => Err(format!(
                "unknown mode `{}`, expected `phrp` or `legacy`",
                other
            )),
        }
    }
}

/// Identifies the run being processed and the convention its
/// identifications follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: u32,
    pub mode: Mode,
}

impl RunContext {
    pub fn new(run_id: u32, mode: Mode) -> Self {
        Self { run_id, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_inclusive() {
        assert!(Mode::Legacy.passes(-2.0));
        assert!(!Mode::Legacy.passes(-1.99));
        assert!(Mode::Phrp.passes(1e-12));
        assert!(Mode::Phrp.passes(3e-15));
        assert!(!Mode::Phrp.passes(2e-12));
    }

    #[test]
    fn test_display_score() {
        assert_eq!(Mode::Legacy.display_score(-3.5), Some(3.5));
        let phrp = Mode::Phrp.display_score(1e-10).unwrap();
        assert!((phrp - 10.0).abs() < 1e-9);
        assert_eq!(Mode::Phrp.display_score(0.0), None);
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("PHRP".parse::<Mode>(), Ok(Mode::Phrp));
        assert_eq!("legacy".parse::<Mode>(), Ok(Mode::Legacy));
        assert!("mascot".parse::<Mode>().is_err());
        let json = serde_json::to_string(&Mode::Legacy).unwrap();
        assert_eq!(json, "\"legacy\"");
    }

    #[test]
    fn test_passing_sql() {
        assert_eq!(
            Mode::Legacy.passing_sql("p"),
            "p.peptide_expectation_value_log <= -2"
        );
        assert_eq!(Mode::Phrp.passing_sql("x"), "x.spec_evalue <= 1e-12");
    }
}
