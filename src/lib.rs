//! Frequent itemset mining and association rule generation
//!
//! This crate provides:
//! - Breadth-first candidate-generation mining (Apriori)
//! - Depth-first tid-set intersection mining (Eclat)
//! - Rule generation shared by both miners
//! - In-memory transaction cleaning for raw basket rows
//!
//! Uses rayon for parallel processing when beneficial.

#[cfg(feature = "python")]
use pyo3::prelude::*;

mod rust_apriori;
mod rust_cleaning;
mod rust_datatypes;
mod rust_eclat;
mod rust_miner;
mod rust_rules;
mod rust_support;

pub use rust_apriori::{generate_candidates, mine_apriori, AprioriMiner};
pub use rust_cleaning::{clean_transactions, normalize_item, CleanedTransactions, CleaningReport};
pub use rust_datatypes::{FrequentItemset, Item, Itemset, ItemsetTable, Rule, Transaction};
pub use rust_eclat::{build_vertical_index, mine_eclat, EclatMiner};
pub use rust_miner::{
    Algorithm, AssociationMiner, Comparison, MinerConfig, MinerError, MiningOutcome,
};
pub use rust_rules::{
    compare_rules, generate_rules, recommendations_for, Recommendation, RuleGenerator, Strength,
};
pub use rust_support::{count_support, support};

/// Below this many independent work units the miners stay sequential.
pub const PARALLEL_THRESHOLD: usize = 50;

/// A frequent itemset mining algorithm.
///
/// Implementations hold their own thresholds and keep no state between calls.
pub trait ItemsetMiner {
    fn mine(&self, transactions: &[Transaction]) -> ItemsetTable;
}

/// Bit-packed set of transaction ids used by the vertical representation.
#[derive(Clone, Debug, Default)]
pub struct TidSet {
    words: Vec<u64>,
}

impl TidSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set with room for tids `0..capacity` without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        TidSet {
            words: Vec::with_capacity(capacity.div_ceil(64)),
        }
    }

    pub fn insert(&mut self, tid: usize) {
        let word = tid / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (tid % 64);
    }

    /// Number of tids in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Intersection (returns new set)
    pub fn bitwise_and(&self, other: &TidSet) -> TidSet {
        TidSet {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }
}

impl PartialEq for TidSet {
    fn eq(&self, other: &TidSet) -> bool {
        let (short, long) = if self.words.len() <= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        short[..] == long[..short.len()] && long[short.len()..].iter().all(|&w| w == 0)
    }
}

impl Eq for TidSet {}

impl FromIterator<usize> for TidSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = TidSet::new();
        for tid in iter {
            set.insert(tid);
        }
        set
    }
}

#[cfg(feature = "python")]
fn to_transactions(transactions: Vec<Vec<String>>) -> Vec<Transaction> {
    transactions.into_iter().map(Transaction::new).collect()
}

/// Apriori over Python lists of item names
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "mine_apriori", signature = (transactions, min_support=0.2, max_len=None))]
fn py_mine_apriori(
    py: Python<'_>,
    transactions: Vec<Vec<String>>,
    min_support: f64,
    max_len: Option<usize>,
) -> Vec<FrequentItemset> {
    let transactions = to_transactions(transactions);
    py.allow_threads(|| {
        AprioriMiner::new(min_support)
            .with_max_len(max_len)
            .mine(&transactions)
            .to_records()
    })
}

/// Eclat over Python lists of item names
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "mine_eclat", signature = (transactions, min_support=0.2, max_len=None))]
fn py_mine_eclat(
    py: Python<'_>,
    transactions: Vec<Vec<String>>,
    min_support: f64,
    max_len: Option<usize>,
) -> Vec<FrequentItemset> {
    let transactions = to_transactions(transactions);
    py.allow_threads(|| {
        EclatMiner::new(min_support)
            .with_max_len(max_len)
            .mine(&transactions)
            .to_records()
    })
}

/// Rules from a list of frequent itemsets
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "generate_rules", signature = (itemsets, min_confidence=0.5, n_tx=1))]
fn py_generate_rules(
    itemsets: Vec<FrequentItemset>,
    min_confidence: f64,
    n_tx: usize,
) -> Vec<Rule> {
    let table = ItemsetTable::from_records(itemsets);
    generate_rules(&table, min_confidence, n_tx)
}

/// Clean raw basket rows, returning (transactions, report as dict-like tuple list)
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "clean_transactions", signature = (rows, catalog=None))]
fn py_clean_transactions(
    rows: Vec<String>,
    catalog: Option<Vec<String>>,
) -> (Vec<Vec<String>>, Vec<(&'static str, usize)>) {
    let catalog: Option<std::collections::HashSet<String>> =
        catalog.map(|names| names.iter().map(|n| normalize_item(n)).collect());
    let cleaned = clean_transactions(rows.iter().map(String::as_str), catalog.as_ref());
    let transactions = cleaned
        .transactions
        .into_iter()
        .map(|tx| tx.items().to_vec())
        .collect();
    (transactions, cleaned.report.entries())
}

/// Recommended companions of `item` given a rule list
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "recommendations_for")]
fn py_recommendations_for(item: &str, rules: Vec<Rule>) -> Vec<Recommendation> {
    recommendations_for(&normalize_item(item), &rules)
}

/// Python module for association rule mining
#[cfg(feature = "python")]
#[pymodule]
fn basket_miner(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FrequentItemset>()?;
    m.add_class::<Rule>()?;
    m.add_class::<Recommendation>()?;
    m.add_class::<Strength>()?;
    m.add_class::<rust_miner::PyAssociationMiner>()?;
    m.add_function(wrap_pyfunction!(py_mine_apriori, m)?)?;
    m.add_function(wrap_pyfunction!(py_mine_eclat, m)?)?;
    m.add_function(wrap_pyfunction!(py_generate_rules, m)?)?;
    m.add_function(wrap_pyfunction!(py_clean_transactions, m)?)?;
    m.add_function(wrap_pyfunction!(py_recommendations_for, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidset_insert_and_count() {
        let mut tids = TidSet::new();
        assert_eq!(tids.count(), 0);
        tids.insert(3);
        tids.insert(70);
        tids.insert(3);
        assert_eq!(tids.count(), 2);
        assert_eq!(tids, [70, 3].into_iter().collect::<TidSet>());
    }

    #[test]
    fn test_tidset_intersection() {
        let a: TidSet = [0, 1, 65, 130].into_iter().collect();
        let b: TidSet = [1, 65, 66].into_iter().collect();

        let both = a.bitwise_and(&b);
        assert_eq!(both.count(), 2);
        assert_eq!(both, [1, 65].into_iter().collect::<TidSet>());

        // Trailing zero words do not affect equality.
        let disjoint: TidSet = [2].into_iter().collect();
        assert_eq!(a.bitwise_and(&disjoint), TidSet::new());
        assert_eq!(TidSet::with_capacity(512), TidSet::new());
    }
}
