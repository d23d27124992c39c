//! Name to computation resolution.

use crate::data_access::DataAccess;
use crate::errors::{
    Result,
    SmaqcError,
};
use crate::metrics::{
    Measurements,
    MetricEntry,
    catalog,
};
use crate::models::RunContext;
use std::collections::BTreeMap;
use tracing::debug;

/// Explicit name to metric mapping, built once from the catalog.
#[derive(Debug)]
pub struct MetricRegistry<D: DataAccess> {
    entries: BTreeMap<&'static str, MetricEntry<D>>,
    order: Vec<&'static str>,
}

impl<D: DataAccess> MetricRegistry<D> {
    pub fn new() -> Self {
        let listed = catalog::<D>();
        let order = listed.iter().map(|x| x.name).collect();
        let entries = listed.into_iter().map(|x| (x.name, x)).collect();
        Self { entries, order }
    }

    pub fn get(&self, name: &str) -> Option<&MetricEntry<D>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Metric names in catalog order.
    pub fn catalog_names(&self) -> &[&'static str] {
        &self.order
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = &MetricEntry<D>> {
        self.order.iter().filter_map(|x| self.entries.get(x))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: DataAccess> Default for MetricRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Invokes metrics by name against one dataset's [`Measurements`].
pub struct Dispatcher<D: DataAccess> {
    measurements: Measurements<D>,
    registry: MetricRegistry<D>,
}

impl<D: DataAccess> Dispatcher<D> {
    pub fn new(db: D, run: RunContext) -> Self {
        Self {
            measurements: Measurements::new(db, run),
            registry: MetricRegistry::new(),
        }
    }

    pub fn registry(&self) -> &MetricRegistry<D> {
        &self.registry
    }

    pub fn measurements(&self) -> &Measurements<D> {
        &self.measurements
    }

    pub fn run(&self) -> RunContext {
        self.measurements.run()
    }

    /// Clear every per-dataset value and switch to `run`.
    pub fn reset(&mut self, run: RunContext) {
        self.measurements.reset(run);
    }

    pub fn invoke(&mut self, name: &str) -> Result<String> {
        let Some(entry) = self.registry.get(name) else {
            return Err(SmaqcError::UnknownMetric {
                name: name.to_string(),
            });
        };
        debug!("Invoking {} ({})", entry.name, entry.description);
        (entry.compute)(&mut self.measurements)
    }

    pub fn into_inner(self) -> D {
        self.measurements.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::SqliteStore;
    use crate::models::Mode;

    fn dispatcher() -> Dispatcher<SqliteStore> {
        let store = SqliteStore::in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE xt_results (random_id INTEGER, scan INTEGER, charge INTEGER, \
                 peptide TEXT, peptide_expectation_value_log REAL, peptide_mh REAL, \
                 delta_mass REAL, unique_seq_id INTEGER, cleavage_state INTEGER);
                 INSERT INTO xt_results VALUES (1, 10, 2, 'PEPTIDE', -4.0, 800.0, 0.0, 1, 2);
                 INSERT INTO xt_results VALUES (1, 11, 1, 'PEPTIDEK', -3.0, 900.0, 0.0, 2, 2);
                 INSERT INTO xt_results VALUES (2, 10, 2, 'PEPTIDE', -4.0, 800.0, 0.0, 1, 2);",
            )
            .unwrap();
        Dispatcher::new(store, RunContext::new(1, Mode::Legacy))
    }

    #[test]
    fn test_registry_follows_catalog_order() {
        let registry = MetricRegistry::<SqliteStore>::new();
        assert_eq!(registry.len(), 44);
        assert_eq!(&registry.catalog_names()[..3], &["C_1A", "C_1B", "C_2A"]);
        let names: Vec<&str> = registry.entries().map(|x| x.name).collect();
        assert_eq!(names, registry.catalog_names());
        assert!(registry.contains("MS1_5D"));
        assert!(!registry.contains("MS1_4"));
    }

    #[test]
    fn test_invoke_by_name() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.invoke("IS_3A").unwrap(), "1.000000");
        assert_eq!(dispatcher.invoke("P_2A").unwrap(), "2");
    }

    #[test]
    fn test_unknown_metric() {
        let mut dispatcher = dispatcher();
        let err = dispatcher.invoke("NOT_A_METRIC").unwrap_err();
        assert!(matches!(err, SmaqcError::UnknownMetric { ref name } if name == "NOT_A_METRIC"));
    }

    #[test]
    fn test_reset_switches_run() {
        let mut dispatcher = dispatcher();
        dispatcher.reset(RunContext::new(2, Mode::Legacy));
        assert_eq!(dispatcher.run().run_id, 2);
        assert_eq!(dispatcher.invoke("P_2A").unwrap(), "1");
        assert_eq!(dispatcher.invoke("IS_3A").unwrap(), "0.000000");
    }
}
