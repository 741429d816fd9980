//! Saved scenario collection, persisted as a single JSON document.
//!
//! The document is an array of [`Scenario`] records and is rewritten whole on
//! every change. Rankings are derived from the canonical list on demand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::{Scenario, ScenarioInput, SimulationError, run_simulation};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scenario document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize scenarios: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("no saved scenario with id {0}")]
    NotFound(u64),
}

#[derive(Debug)]
pub struct ScenarioStore {
    path: PathBuf,
    scenarios: Vec<Scenario>,
}

impl ScenarioStore {
    /// A missing or blank file is an empty collection.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let scenarios = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => from_json(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::info!(
            path = %path.display(),
            count = scenarios.len(),
            "loaded saved scenarios"
        );
        Ok(Self { path, scenarios })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, id: u64) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn add(&mut self, name: &str, input: ScenarioInput) -> Result<&Scenario, StoreError> {
        let result = run_simulation(&input)?;
        let id = self.next_id();
        self.scenarios.push(Scenario {
            id,
            name: name.to_string(),
            input,
            result,
        });
        if let Err(e) = self.save() {
            self.scenarios.pop();
            return Err(e);
        }
        tracing::info!(id, name, "saved scenario");
        Ok(&self.scenarios[self.scenarios.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<Scenario, StoreError> {
        let idx = self
            .scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.scenarios.remove(idx);
        if let Err(e) = self.save() {
            self.scenarios.insert(idx, removed);
            return Err(e);
        }
        tracing::info!(id, "removed scenario");
        Ok(removed)
    }

    /// Best return ratio first; equal ratios keep insertion order.
    pub fn ranked(&self) -> Vec<&Scenario> {
        rank(&self.scenarios)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let contents = to_json(&self.scenarios).map_err(StoreError::Serialize)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, contents).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(
            path = %self.path.display(),
            count = self.scenarios.len(),
            "wrote scenarios"
        );
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.scenarios.iter().map(|s| s.id).max().map_or(1, |id| id + 1)
    }
}

pub fn rank(scenarios: &[Scenario]) -> Vec<&Scenario> {
    let mut ranked: Vec<&Scenario> = scenarios.iter().collect();
    ranked.sort_by(|a, b| {
        b.result
            .return_ratio_percent
            .total_cmp(&a.result.return_ratio_percent)
    });
    ranked
}

pub fn to_json(scenarios: &[Scenario]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(scenarios)
}

pub fn from_json(json: &str) -> Result<Vec<Scenario>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Strategy;
    use tempfile::tempdir;

    fn input(strategy: Strategy, extra: f64) -> ScenarioInput {
        ScenarioInput {
            house_value: 215_500.0,
            principal: 140_000.0,
            mortgage_rate_annual: 2.2,
            term_years: 20,
            investment_rate_annual: 5.0,
            strategy,
            extra_contribution: extra,
        }
    }

    #[test]
    fn open_missing_file_yields_empty_collection() {
        let dir = tempdir().expect("tempdir");
        let store = ScenarioStore::open(dir.path().join("scenarios.json")).expect("open");
        assert!(store.scenarios().is_empty());
        assert!(store.ranked().is_empty());
    }

    #[test]
    fn open_rejects_malformed_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");
        fs::write(&path, "{ not json").expect("write");

        let err = ScenarioStore::open(&path).expect_err("must reject garbage");
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn open_blank_file_yields_empty_collection() {
        let dir = tempdir().expect("tempdir");
        for (name, contents) in [("empty.json", ""), ("blank.json", " \n\t\n")] {
            let path = dir.path().join(name);
            fs::write(&path, contents).expect("write");

            let mut store = ScenarioStore::open(&path).expect("open");
            assert!(store.scenarios().is_empty());
            let id = store.add("first", input(Strategy::DoNothing, 0.0)).expect("add").id;
            assert_eq!(id, 1);
        }
    }

    #[test]
    fn add_assigns_sequential_ids_and_persists() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");

        let mut store = ScenarioStore::open(&path).expect("open");
        let first = store
            .add("pay down", input(Strategy::PayDownExtra, 6_000.0))
            .expect("add")
            .id;
        let second = store
            .add("invest", input(Strategy::Invest, 6_000.0))
            .expect("add")
            .id;
        assert_eq!((first, second), (1, 2));
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = ScenarioStore::open(&path).expect("reopen");
        assert_eq!(reopened.scenarios(), store.scenarios());
    }

    #[test]
    fn add_rejects_invalid_input_without_saving() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");
        let mut store = ScenarioStore::open(&path).expect("open");

        let mut bad = input(Strategy::Invest, 6_000.0);
        bad.principal = -1.0;
        let err = store.add("bad", bad).expect_err("must reject");
        assert!(matches!(err, StoreError::Simulation(_)));
        assert!(store.scenarios().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn round_trip_preserves_values_exactly() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");
        let mut store = ScenarioStore::open(&path).expect("open");
        store.add("a", input(Strategy::PayDownExtra, 6_000.0)).expect("add");
        store.add("b", input(Strategy::Invest, 1_234.56)).expect("add");
        store.add("c", input(Strategy::DoNothing, 0.0)).expect("add");

        let json = to_json(store.scenarios()).expect("serialize");
        let parsed = from_json(&json).expect("parse");
        assert_eq!(parsed.as_slice(), store.scenarios());
        for (a, b) in parsed.iter().zip(store.scenarios()) {
            assert_eq!(
                a.result.accumulated_value.to_bits(),
                b.result.accumulated_value.to_bits()
            );
        }
    }

    #[test]
    fn remove_deletes_by_id_and_keeps_next_id_monotonic() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");
        let mut store = ScenarioStore::open(&path).expect("open");
        store.add("a", input(Strategy::PayDownExtra, 6_000.0)).expect("add");
        store.add("b", input(Strategy::Invest, 6_000.0)).expect("add");

        let removed = store.remove(1).expect("remove");
        assert_eq!(removed.name, "a");
        assert!(matches!(store.remove(1), Err(StoreError::NotFound(1))));

        let next = store.add("c", input(Strategy::DoNothing, 0.0)).expect("add").id;
        assert_eq!(next, 3);

        let reopened = ScenarioStore::open(&path).expect("reopen");
        let names: Vec<&str> = reopened.scenarios().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn remove_keeps_scenario_when_save_fails() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scenarios.json");
        let mut store = ScenarioStore::open(&path).expect("open");
        store.add("a", input(Strategy::PayDownExtra, 6_000.0)).expect("add");
        store.add("b", input(Strategy::Invest, 6_000.0)).expect("add");
        fs::remove_dir_all(dir.path()).expect("remove store directory");

        let err = store.remove(1).expect_err("save must fail");
        assert!(matches!(err, StoreError::Io { .. }));
        let names: Vec<&str> = store.scenarios().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.get(1).map(|s| s.name.as_str()), Some("a"));
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let dir = tempdir().expect("tempdir");
        let mut store = ScenarioStore::open(dir.path().join("scenarios.json")).expect("open");
        store.add("nothing-1", input(Strategy::DoNothing, 0.0)).expect("add");
        store.add("pay-down", input(Strategy::PayDownExtra, 6_000.0)).expect("add");
        store.add("nothing-2", input(Strategy::DoNothing, 0.0)).expect("add");
        store.add("invest", input(Strategy::Invest, 6_000.0)).expect("add");

        let ranked = store.ranked();
        for pair in ranked.windows(2) {
            assert!(pair[0].result.return_ratio_percent >= pair[1].result.return_ratio_percent);
        }
        let tail: Vec<&str> = ranked[2..].iter().map(|s| s.name.as_str()).collect();
        assert_eq!(tail, vec!["nothing-1", "nothing-2"]);

        // The canonical order is untouched.
        assert_eq!(store.scenarios()[0].name, "nothing-1");
    }

    #[test]
    fn strategy_serializes_as_kebab_case() {
        let json = serde_json::to_string(&input(Strategy::PayDownExtra, 1.0)).expect("serialize");
        assert!(json.contains("\"strategy\":\"pay-down-extra\""));
        assert!(json.contains("\"mortgageRateAnnual\":2.2"));
    }
}
