//! Main miner entry point
//!
//! Bundles configuration, the chosen algorithm and rule generation into a
//! single run. This is the layer that validates thresholds.

use crate::rust_apriori::AprioriMiner;
use crate::rust_datatypes::{ItemsetTable, Rule, Transaction};
use crate::rust_eclat::EclatMiner;
use crate::rust_rules::RuleGenerator;
use crate::ItemsetMiner;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

#[cfg(feature = "python")]
use crate::rust_datatypes::FrequentItemset;
#[cfg(feature = "python")]
use pyo3::prelude::*;

#[derive(Debug, Error)]
pub enum MinerError {
    #[error("{name} must be in (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("max_len must be at least 1")]
    InvalidMaxLen,

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(feature = "python")]
impl From<MinerError> for PyErr {
    fn from(err: MinerError) -> PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Apriori,
    Eclat,
}

impl FromStr for Algorithm {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apriori" => Ok(Algorithm::Apriori),
            "eclat" => Ok(Algorithm::Eclat),
            _ => Err(MinerError::UnknownAlgorithm(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub algorithm: Algorithm,
    /// Largest itemset size to mine (`None` = unbounded).
    pub max_len: Option<usize>,
    /// Worker threads for a dedicated pool (`None` = rayon's global pool).
    pub num_threads: Option<usize>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            min_support: 0.2,
            min_confidence: 0.5,
            algorithm: Algorithm::Apriori,
            max_len: None,
            num_threads: None,
        }
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), MinerError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(MinerError::InvalidThreshold { name, value })
    }
}

impl MinerConfig {
    pub fn validate(&self) -> Result<(), MinerError> {
        check_threshold("min_support", self.min_support)?;
        check_threshold("min_confidence", self.min_confidence)?;
        if self.max_len == Some(0) {
            return Err(MinerError::InvalidMaxLen);
        }
        Ok(())
    }
}

/// Everything one run produces.
#[derive(Clone, Debug)]
pub struct MiningOutcome {
    pub table: ItemsetTable,
    pub rules: Vec<Rule>,
    pub elapsed: Duration,
}

/// Both algorithms run on the same transactions with the same thresholds.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub apriori: MiningOutcome,
    pub eclat: MiningOutcome,
}

/// Configured miner over a loaded transaction collection.
pub struct AssociationMiner {
    config: MinerConfig,
    pool: Option<rayon::ThreadPool>,
    transactions: Vec<Transaction>,
}

impl AssociationMiner {
    pub fn new(config: MinerConfig) -> Result<Self, MinerError> {
        config.validate()?;
        let pool = match config.num_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?,
            ),
            None => None,
        };
        Ok(AssociationMiner {
            config,
            pool,
            transactions: Vec::new(),
        })
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Replace the transaction collection used by [`mine`](Self::mine).
    pub fn load_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    pub fn num_transactions(&self) -> usize {
        self.transactions.len()
    }

    /// Mine frequent itemsets, then rules. An empty collection gives an empty outcome.
    pub fn mine(&self) -> MiningOutcome {
        self.in_pool(|| self.run(self.config.algorithm))
    }

    /// Run Apriori then Eclat, ignoring the configured algorithm.
    ///
    /// The runs are sequential so their `elapsed` times are comparable.
    pub fn mine_both(&self) -> Comparison {
        self.in_pool(|| Comparison {
            apriori: self.run(Algorithm::Apriori),
            eclat: self.run(Algorithm::Eclat),
        })
    }

    fn in_pool<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn run(&self, algorithm: Algorithm) -> MiningOutcome {
        let start = Instant::now();

        let table = match algorithm {
            Algorithm::Apriori => AprioriMiner::new(self.config.min_support)
                .with_max_len(self.config.max_len)
                .mine(&self.transactions),
            Algorithm::Eclat => EclatMiner::new(self.config.min_support)
                .with_max_len(self.config.max_len)
                .mine(&self.transactions),
        };
        let rules = RuleGenerator::new(self.config.min_confidence)
            .generate(&table, self.transactions.len());
        let elapsed = start.elapsed();

        info!(
            algorithm = ?algorithm,
            transactions = self.transactions.len(),
            itemsets = table.len(),
            rules = rules.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "mining complete"
        );

        MiningOutcome {
            table,
            rules,
            elapsed,
        }
    }
}

/// Python handle over [`AssociationMiner`]
#[cfg(feature = "python")]
#[pyclass(name = "AssociationMiner")]
pub struct PyAssociationMiner {
    inner: AssociationMiner,
}

#[cfg(feature = "python")]
fn outcome_to_py(outcome: MiningOutcome) -> (Vec<FrequentItemset>, Vec<Rule>, f64) {
    (
        outcome.table.to_records(),
        outcome.rules,
        outcome.elapsed.as_secs_f64() * 1000.0,
    )
}

#[cfg(feature = "python")]
#[pymethods]
impl PyAssociationMiner {
    #[new]
    #[pyo3(signature = (
        min_support=0.2,
        min_confidence=0.5,
        algorithm="apriori",
        max_len=None,
        num_threads=None
    ))]
    fn new(
        min_support: f64,
        min_confidence: f64,
        algorithm: &str,
        max_len: Option<usize>,
        num_threads: Option<usize>,
    ) -> PyResult<Self> {
        let config = MinerConfig {
            min_support,
            min_confidence,
            algorithm: algorithm.parse()?,
            max_len,
            num_threads,
        };
        Ok(PyAssociationMiner {
            inner: AssociationMiner::new(config)?,
        })
    }

    /// Load transactions given as lists of item names
    fn load_transactions(&mut self, transactions: Vec<Vec<String>>) {
        self.inner
            .load_transactions(transactions.into_iter().map(Transaction::new).collect());
    }

    /// (itemsets, rules, runtime_ms) for the configured algorithm
    fn mine(&self, py: Python<'_>) -> (Vec<FrequentItemset>, Vec<Rule>, f64) {
        outcome_to_py(py.allow_threads(|| self.inner.mine()))
    }

    /// ((apriori itemsets, rules, runtime_ms), (eclat itemsets, rules, runtime_ms))
    #[allow(clippy::type_complexity)]
    fn mine_both(
        &self,
        py: Python<'_>,
    ) -> (
        (Vec<FrequentItemset>, Vec<Rule>, f64),
        (Vec<FrequentItemset>, Vec<Rule>, f64),
    ) {
        let comparison = py.allow_threads(|| self.inner.mine_both());
        (outcome_to_py(comparison.apriori), outcome_to_py(comparison.eclat))
    }

    fn get_num_transactions(&self) -> usize {
        self.inner.num_transactions()
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "AssociationMiner(min_support={}, min_confidence={}, algorithm={:?}, num_transactions={})",
            config.min_support,
            config.min_confidence,
            config.algorithm,
            self.inner.num_transactions()
        )
    }
}
