#![allow(dead_code)]

use rusqlite::{
    Connection,
    params,
};
use smaqc::data_access::{
    DataAccess,
    RowMap,
    SqliteStore,
};
use smaqc::errors::DataAccessError;
use smaqc::models::PROTON_MASS;

pub const LEGACY_RUN: u32 = 1;
pub const PHRP_RUN: u32 = 2;
pub const EMPTY_RUN: u32 = 3;
pub const CLEAVAGE_RUN: u32 = 4;

const SCHEMA: &str = "
CREATE TABLE scan_stats (
    random_id INTEGER, scan_number INTEGER, scan_time REAL, scan_type INTEGER,
    total_ion_intensity REAL, base_peak_intensity REAL, base_peak_mz REAL,
    base_peak_signal_to_noise REAL, ion_count INTEGER, ion_count_raw INTEGER
);
CREATE TABLE scan_stats_ex (
    random_id INTEGER, scan_number INTEGER, ion_injection_time REAL
);
CREATE TABLE sic_stats (
    random_id INTEGER, frag_scan_number INTEGER, mz REAL,
    optimal_peak_apex_scan_number INTEGER, fwhm_in_scans REAL,
    peak_max_intensity REAL, parent_ion_intensity REAL, peak_signal_to_noise REAL
);
CREATE TABLE xt_results (
    random_id INTEGER, scan INTEGER, charge INTEGER, peptide TEXT,
    peptide_expectation_value_log REAL, peptide_mh REAL, delta_mass REAL,
    unique_seq_id INTEGER, cleavage_state INTEGER
);
CREATE TABLE phrp_psms (
    random_id INTEGER, scan INTEGER, charge INTEGER, peptide TEXT,
    spec_evalue REAL, peptide_mh REAL, delm_da REAL, delm_ppm REAL,
    unique_seq_id INTEGER, cleavage_state INTEGER
);
";

struct Scan {
    number: i64,
    tic: f64,
}

struct Peak {
    frag: i64,
    mz: f64,
    apex: i64,
    fwhm: f64,
    peak_max: f64,
    parent: f64,
}

struct LegacyPsm {
    scan: i64,
    charge: i64,
    peptide: &'static str,
    score: f64,
    unique_seq_id: i64,
    cleavage_state: i64,
    /// Precursor error (Da) baked into `peptide_mh` against the peak m/z.
    error_da: f64,
}

/// Visit `0..n` in a fixed scrambled order.
fn scrambled(n: usize) -> impl Iterator<Item = usize> {
    // 7 is coprime with every fixture length used here.
    (0..n).map(move |i| (i * 7 + 3) % n)
}

/// Scans 1 to 10, one minute apart starting at 0, odd scans MS1 and even
/// scans MS2.
///
/// | frag | apex | fwhm | peak max | parent | score | charge | state |
/// |------|------|------|----------|--------|-------|--------|-------|
/// | 2    | 9    | 4    | 6e5      | 3e5    | -5    | 2      | 2     |
/// | 4    | 5    | 2    | 1e5      | 5e4    | -3    | 2      | 2     |
/// | 6    | 1    | 2    | 3e5      | 1e5    | -1    | 2      | 0     |
/// | 8    | 7    | 2    | 2e5      | 1e5    | -1.5  | 1      | 2     |
/// | 10   | 9    | 6    | 4e5      | 1e5    | -4    | 3      | 1     |
///
/// Scan 2 is reported twice (one row per protein). Only scans 2, 4 and 10
/// pass the legacy threshold, and only scan 2 is identified more than four
/// minutes before its apex.
fn insert_legacy_run(conn: &Connection) -> rusqlite::Result<()> {
    let run = LEGACY_RUN;
    let ms1_tic = [1e6, 2e6, 1e5, 1.5e6, 1.2e6];
    let scans: Vec<Scan> = (1..=10)
        .map(|n| Scan {
            number: n,
            tic: if n % 2 == 1 {
                ms1_tic[(n as usize - 1) / 2]
            } else {
                5e4
            },
        })
        .collect();
    for i in scrambled(scans.len()) {
        let s = &scans[i];
        let scan_type = if s.number % 2 == 1 { 1 } else { 2 };
        conn.execute(
            "INSERT INTO scan_stats VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run,
                s.number,
                (s.number - 1) as f64,
                scan_type,
                s.tic,
                s.tic / 10.0,
                400.0 + s.number as f64,
                (s.number * 10) as f64,
                s.number * 90,
                s.number * 100,
            ],
        )?;
        let injection = if scan_type == 1 {
            s.number * 5 + 5
        } else {
            s.number * 5 - 5
        };
        conn.execute(
            "INSERT INTO scan_stats_ex VALUES (?1, ?2, ?3)",
            params![run, s.number, injection as f64],
        )?;
    }

    let peaks = [
        Peak { frag: 2, mz: 500.25, apex: 9, fwhm: 4.0, peak_max: 6e5, parent: 3e5 },
        Peak { frag: 4, mz: 600.5, apex: 5, fwhm: 2.0, peak_max: 1e5, parent: 5e4 },
        Peak { frag: 6, mz: 650.0, apex: 1, fwhm: 2.0, peak_max: 3e5, parent: 1e5 },
        Peak { frag: 8, mz: 680.0, apex: 7, fwhm: 2.0, peak_max: 2e5, parent: 1e5 },
        Peak { frag: 10, mz: 700.75, apex: 9, fwhm: 6.0, peak_max: 4e5, parent: 1e5 },
    ];
    for i in scrambled(peaks.len()) {
        let p = &peaks[i];
        conn.execute(
            "INSERT INTO sic_stats VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![run, p.frag, p.mz, p.apex, p.fwhm, p.peak_max, p.parent, 25.0],
        )?;
    }

    let psms = [
        LegacyPsm { scan: 2, charge: 2, peptide: "K.PEPTIDEA.R", score: -5.0, unique_seq_id: 101, cleavage_state: 2, error_da: 0.002 },
        LegacyPsm { scan: 2, charge: 2, peptide: "K.PEPTIDEA.R", score: -5.0, unique_seq_id: 101, cleavage_state: 2, error_da: 0.002 },
        LegacyPsm { scan: 4, charge: 2, peptide: "R.PEPTIDEB.K", score: -3.0, unique_seq_id: 102, cleavage_state: 2, error_da: -0.001 },
        LegacyPsm { scan: 6, charge: 2, peptide: "A.PEPTIDEC.G", score: -1.0, unique_seq_id: 103, cleavage_state: 0, error_da: 0.0 },
        LegacyPsm { scan: 8, charge: 1, peptide: "K.PEPTIDED.R", score: -1.5, unique_seq_id: 104, cleavage_state: 2, error_da: 0.0 },
        // Monoisotopic peak missed, the 13C peak was picked.
        LegacyPsm { scan: 10, charge: 3, peptide: "K.PEPTIDEE.A", score: -4.0, unique_seq_id: 105, cleavage_state: 1, error_da: 1.00335483 + 0.0005 },
    ];
    for i in scrambled(psms.len()) {
        let p = &psms[i];
        let mz = peaks
            .iter()
            .find(|x| x.frag == p.scan)
            .map(|x| x.mz)
            .unwrap_or(500.0);
        let observed = (mz - PROTON_MASS) * p.charge as f64;
        let peptide_mh = observed - p.error_da + PROTON_MASS;
        conn.execute(
            "INSERT INTO xt_results VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run,
                p.scan,
                p.charge,
                p.peptide,
                p.score,
                peptide_mh,
                // Legacy delta mass is ignored in favour of the parent m/z.
                99.0,
                p.unique_seq_id,
                p.cleavage_state,
            ],
        )?;
    }
    Ok(())
}

/// PHRP identifications only: two passing (1e-15, 1e-13) and one failing
/// (1e-8) spectrum, with reported mass errors of 3 mDa, -1 mDa and 0.
fn insert_phrp_run(conn: &Connection) -> rusqlite::Result<()> {
    let run = PHRP_RUN;
    let rows: [(i64, i64, &str, f64, f64, i64, i64); 3] = [
        (20, 2, "K.AAAK.R", 1e-15, 0.003, 201, 2),
        (21, 3, "K.CCCR.A", 1e-13, -0.001, 202, 1),
        (22, 2, "K.DDDK.R", 1e-8, 0.0, 203, 2),
    ];
    for i in scrambled(rows.len()) {
        let (scan, charge, peptide, evalue, delm, uid, state) = rows[i];
        conn.execute(
            "INSERT INTO phrp_psms VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![run, scan, charge, peptide, evalue, 1200.5, delm, delm / 1200.0 * 1e6, uid, state],
        )?;
    }
    Ok(())
}

/// Legacy identifications only. Scan 2 maps to two proteins, fully
/// tryptic in one and partially tryptic in the other.
fn insert_cleavage_run(conn: &Connection) -> rusqlite::Result<()> {
    let run = CLEAVAGE_RUN;
    let rows: [(i64, &str, f64, i64, i64); 3] = [
        (2, "K.PEPTIDEA.R", -5.0, 1, 2),
        (2, "K.PEPTIDEA.R", -5.0, 1, 1),
        (4, "R.PEPTIDEB.K", -3.0, 2, 2),
    ];
    for i in scrambled(rows.len()) {
        let (scan, peptide, score, uid, state) = rows[i];
        conn.execute(
            "INSERT INTO xt_results VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![run, scan, 2, peptide, score, 1000.5, 0.0, uid, state],
        )?;
    }
    Ok(())
}

/// In-memory store holding the legacy, PHRP and cleavage fixture runs.
pub fn fixture_store() -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    store.connection().execute_batch(SCHEMA).unwrap();
    insert_legacy_run(store.connection()).unwrap();
    insert_phrp_run(store.connection()).unwrap();
    insert_cleavage_run(store.connection()).unwrap();
    store
}

/// Fails every query whose text contains `pattern`.
pub struct FailingStore {
    pub inner: SqliteStore,
    pub pattern: &'static str,
    staged: String,
}

impl FailingStore {
    pub fn new(inner: SqliteStore, pattern: &'static str) -> Self {
        Self {
            inner,
            pattern,
            staged: String::new(),
        }
    }

    fn check(&self) -> Result<(), DataAccessError> {
        if self.staged.contains(self.pattern) {
            return Err(DataAccessError::Backend(format!(
                "injected failure for `{}`",
                self.pattern
            )));
        }
        Ok(())
    }
}

impl DataAccess for FailingStore {
    fn set_query(&mut self, sql: &str) {
        self.staged = sql.to_string();
        self.inner.set_query(sql);
    }

    fn init_reader(&mut self) -> Result<(), DataAccessError> {
        self.check()?;
        self.inner.init_reader()
    }

    fn read_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        self.inner.read_row(columns)
    }

    fn read_single_row(&mut self, columns: &[&str]) -> Result<Option<RowMap>, DataAccessError> {
        self.check()?;
        self.inner.read_single_row(columns)
    }
}
