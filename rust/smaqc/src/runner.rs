//! Runs an ordered list of metrics over one dataset at a time.
//!
//! Every configured name gets exactly one outcome. Metrics that fail, that
//! are unknown, or that have no qualifying rows are reported as [`NULL_VALUE`]
//! and the batch carries on.

use crate::data_access::DataAccess;
use crate::dispatch::Dispatcher;
use crate::models::RunContext;
use serde::Serialize;
use std::time::{
    Duration,
    Instant,
};
use tracing::{
    info,
    instrument,
    warn,
};

/// Value recorded for a metric that produced nothing.
pub const NULL_VALUE: &str = "Null";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub name: String,
    pub value: String,
    pub elapsed: Duration,
}

impl MetricOutcome {
    pub fn is_null(&self) -> bool {
        self.value == NULL_VALUE
    }
}

/// Outcomes of one dataset, in configured order.
#[derive(Debug, Clone)]
pub struct DatasetResults {
    pub run: RunContext,
    pub outcomes: Vec<MetricOutcome>,
}

impl DatasetResults {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|x| x.name == name)
            .map(|x| x.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.outcomes.iter().filter(|x| x.is_null()).count()
    }

    pub fn elapsed(&self) -> Duration {
        self.outcomes.iter().map(|x| x.elapsed).sum()
    }
}

/// `name: value` pairs serialized as a map that keeps the configured order.
struct OrderedMetrics<'a>(&'a [MetricOutcome]);

impl Serialize for OrderedMetrics<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for outcome in self.0 {
            map.serialize_entry(&outcome.name, &outcome.value)?;
        }
        map.end()
    }
}

impl Serialize for DatasetResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DatasetResults", 3)?;
        state.serialize_field("run_id", &self.run.run_id)?;
        state.serialize_field("mode", &self.run.mode)?;
        state.serialize_field("metrics", &OrderedMetrics(&self.outcomes))?;
        state.end()
    }
}

pub struct MetricRunner<D: DataAccess> {
    dispatcher: Dispatcher<D>,
}

impl<D: DataAccess> MetricRunner<D> {
    pub fn new(dispatcher: Dispatcher<D>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<D> {
        &self.dispatcher
    }

    pub fn into_inner(self) -> Dispatcher<D> {
        self.dispatcher
    }

    pub fn run_dataset(&mut self, run: RunContext, names: &[&str]) -> DatasetResults {
        self.run_dataset_with_progress(run, names, |_, _, _| {})
    }

    /// Like [`MetricRunner::run_dataset`], calling `on_metric(outcome, done, total)`
    /// after every metric.
    #[instrument(skip_all, fields(run_id = run.run_id, mode = %run.mode))]
    pub fn run_dataset_with_progress<F>(
        &mut self,
        run: RunContext,
        names: &[&str],
        mut on_metric: F,
    ) -> DatasetResults
    where
        F: FnMut(&MetricOutcome, usize, usize),
    {
        self.dispatcher.reset(run);
        let total = names.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, name) in names.iter().enumerate() {
            let start = Instant::now();
            let value = match self.dispatcher.invoke(name) {
                Ok(x) if x.is_empty() => NULL_VALUE.to_string(),
                Ok(x) => x,
                Err(e) => {
                    warn!("Metric {} failed: {}", name, e);
                    NULL_VALUE.to_string()
                }
            };
            let outcome = MetricOutcome {
                name: name.to_string(),
                value,
                elapsed: start.elapsed(),
            };
            let done = i + 1;
            info!(
                "{}: complete in {:.2}s; {:.1}% complete",
                outcome.name,
                outcome.elapsed.as_secs_f64(),
                100.0 * done as f64 / total as f64,
            );
            on_metric(&outcome, done, total);
            outcomes.push(outcome);
        }

        let results = DatasetResults { run, outcomes };
        info!(
            "Computed {} metrics ({} Null) in {:.2}s",
            results.len(),
            results.null_count(),
            results.elapsed().as_secs_f64(),
        );
        results
    }

    /// Processes `runs` strictly one after the other.
    pub fn run_all(&mut self, runs: &[RunContext], names: &[&str]) -> Vec<DatasetResults> {
        runs.iter()
            .map(|run| self.run_dataset(*run, names))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::SqliteStore;
    use crate::models::Mode;

    fn runner() -> MetricRunner<SqliteStore> {
        let store = SqliteStore::in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE xt_results (random_id INTEGER, scan INTEGER, charge INTEGER, \
                 peptide TEXT, peptide_expectation_value_log REAL, peptide_mh REAL, \
                 delta_mass REAL, unique_seq_id INTEGER, cleavage_state INTEGER);
                 INSERT INTO xt_results VALUES (3, 10, 2, 'PEPTIDE', -4.0, 800.0, 0.0, 1, 2);",
            )
            .unwrap();
        let run = RunContext::new(3, Mode::Legacy);
        MetricRunner::new(Dispatcher::new(store, run))
    }

    #[test]
    fn test_every_name_gets_an_outcome() {
        let mut runner = runner();
        let run = runner.dispatcher().run();
        // IS_1A reads scan_stats, which does not exist here.
        let names = ["P_2A", "NOPE", "IS_1A", "P_1A"];
        let results = runner.run_dataset(run, &names);
        let got: Vec<(&str, &str)> = results
            .outcomes
            .iter()
            .map(|x| (x.name.as_str(), x.value.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("P_2A", "1"),
                ("NOPE", "Null"),
                ("IS_1A", "Null"),
                ("P_1A", "4.000"),
            ]
        );
        assert_eq!(results.null_count(), 2);
    }

    #[test]
    fn test_serializes_in_configured_order() {
        let mut runner = runner();
        let run = runner.dispatcher().run();
        let results = runner.run_dataset(run, &["P_2C", "P_2A"]);
        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(
            json,
            r#"{"run_id":3,"mode":"legacy","metrics":{"P_2C":"1","P_2A":"1"}}"#
        );
    }

    #[test]
    fn test_progress_callback() {
        let mut runner = runner();
        let run = runner.dispatcher().run();
        let mut seen = Vec::new();
        runner.run_dataset_with_progress(run, &["P_2A", "P_2B"], |outcome, done, total| {
            seen.push((outcome.name.clone(), done, total));
        });
        assert_eq!(
            seen,
            vec![("P_2A".to_string(), 1, 2), ("P_2B".to_string(), 2, 2)]
        );
    }

    #[test]
    fn test_run_all_resets_between_runs() {
        let mut runner = runner();
        let runs = [
            RunContext::new(3, Mode::Legacy),
            RunContext::new(4, Mode::Legacy),
        ];
        let results = runner.run_all(&runs, &["P_2A", "P_1A"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].get("P_2A"), Some("1"));
        assert_eq!(results[1].get("P_2A"), Some("0"));
        assert_eq!(results[1].get("P_1A"), Some(NULL_VALUE));
        assert_eq!(results[1].run.run_id, 4);
    }
}
