//! Breadth-first (level-wise) frequent itemset mining
//!
//! Candidates of size k are built by joining frequent (k-1)-itemsets and
//! pruned with the anti-monotone property before any support is counted.

use crate::rust_datatypes::{Itemset, ItemsetTable, Transaction};
use crate::rust_support::support;
use crate::{ItemsetMiner, PARALLEL_THRESHOLD};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Candidate-generation miner.
#[derive(Clone, Debug, PartialEq)]
pub struct AprioriMiner {
    pub min_support: f64,
    /// Largest itemset size to produce (`None` = unbounded).
    pub max_len: Option<usize>,
}

impl AprioriMiner {
    pub fn new(min_support: f64) -> Self {
        AprioriMiner {
            min_support,
            max_len: None,
        }
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    fn within_len(&self, k: usize) -> bool {
        self.max_len.map_or(true, |max| k <= max)
    }
}

impl ItemsetMiner for AprioriMiner {
    fn mine(&self, transactions: &[Transaction]) -> ItemsetTable {
        let mut table = ItemsetTable::new();
        if !self.within_len(1) {
            return table;
        }

        let mut current = frequent_items(transactions, self.min_support);
        debug!(
            transactions = transactions.len(),
            frequent = current.len(),
            "apriori level 1"
        );
        if current.is_empty() {
            return table;
        }

        let mut k = 2;
        loop {
            let next = if self.within_len(k) {
                let candidates = generate_candidates(&current, k);
                let candidate_count = candidates.len();
                let survivors = count_candidates(candidates, transactions, self.min_support);
                debug!(
                    level = k,
                    candidates = candidate_count,
                    frequent = survivors.len(),
                    "apriori level"
                );
                survivors
            } else {
                HashMap::new()
            };

            table.insert_level(k - 1, current);
            if next.is_empty() {
                break;
            }
            current = next;
            k += 1;
        }

        table
    }
}

/// Level 1: every item whose relative frequency reaches `min_support`.
fn frequent_items(transactions: &[Transaction], min_support: f64) -> HashMap<Itemset, f64> {
    if transactions.is_empty() {
        return HashMap::new();
    }
    let n = transactions.len() as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tx in transactions {
        for item in tx.items() {
            *counts.entry(item.as_str()).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(item, count)| (Itemset::singleton(item), count as f64 / n))
        .filter(|&(_, sup)| sup >= min_support)
        .collect()
}

/// Self-join of the previous level, keeping only unions of exactly `k` items
/// whose every (k-1)-subset is itself frequent.
///
/// Candidates come back deduplicated and in ascending order.
pub fn generate_candidates(previous: &HashMap<Itemset, f64>, k: usize) -> Vec<Itemset> {
    let mut keys: Vec<&Itemset> = previous.keys().collect();
    keys.sort_unstable();

    let mut candidates = BTreeSet::new();
    for (i, left) in keys.iter().enumerate() {
        for right in &keys[i + 1..] {
            let union = left.union(right);
            if union.len() != k || candidates.contains(&union) {
                continue;
            }
            let all_subsets_frequent =
                (0..union.len()).all(|idx| previous.contains_key(&union.without(idx)));
            if all_subsets_frequent {
                candidates.insert(union);
            }
        }
    }

    candidates.into_iter().collect()
}

/// Full support count per candidate; a candidate is only judged once its
/// count over every transaction is complete.
fn count_candidates(
    candidates: Vec<Itemset>,
    transactions: &[Transaction],
    min_support: f64,
) -> HashMap<Itemset, f64> {
    if candidates.len() < PARALLEL_THRESHOLD {
        return candidates
            .into_iter()
            .map(|candidate| {
                let sup = support(&candidate, transactions);
                (candidate, sup)
            })
            .filter(|&(_, sup)| sup >= min_support)
            .collect();
    }

    candidates
        .into_par_iter()
        .map(|candidate| {
            let sup = support(&candidate, transactions);
            (candidate, sup)
        })
        .filter(|&(_, sup)| sup >= min_support)
        .collect()
}

/// Apriori with no length cap.
pub fn mine_apriori(transactions: &[Transaction], min_support: f64) -> ItemsetTable {
    AprioriMiner::new(min_support).mine(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baskets() -> Vec<Transaction> {
        vec![
            Transaction::new(["milk", "bread"]),
            Transaction::new(["milk", "bread", "eggs"]),
            Transaction::new(["bread", "eggs"]),
            Transaction::new(["milk", "eggs"]),
        ]
    }

    #[test]
    fn test_levels_for_basket_example() {
        let table = mine_apriori(&baskets(), 0.5);

        assert_eq!(table.max_level(), 2);
        assert_eq!(table.level(1).map(HashMap::len), Some(3));
        assert_eq!(table.level(2).map(HashMap::len), Some(3));
        assert_eq!(table.support(&Itemset::singleton("milk")), Some(0.75));
        assert_eq!(table.support(&Itemset::new(["bread", "eggs"])), Some(0.5));
        assert!(table.level(3).is_none());
    }

    #[test]
    fn test_candidate_pruning() {
        // {a,b}, {a,c} frequent but {b,c} is not: {a,b,c} must be pruned.
        let previous: HashMap<Itemset, f64> = [
            (Itemset::new(["a", "b"]), 0.5),
            (Itemset::new(["a", "c"]), 0.5),
        ]
        .into_iter()
        .collect();
        assert!(generate_candidates(&previous, 3).is_empty());

        let mut complete = previous.clone();
        complete.insert(Itemset::new(["b", "c"]), 0.5);
        assert_eq!(
            generate_candidates(&complete, 3),
            vec![Itemset::new(["a", "b", "c"])]
        );
    }

    #[test]
    fn test_candidates_deduplicated() {
        // Every pair of the three 2-itemsets unions to the same 3-itemset.
        let previous: HashMap<Itemset, f64> = [
            (Itemset::new(["x", "y"]), 1.0),
            (Itemset::new(["x", "z"]), 1.0),
            (Itemset::new(["y", "z"]), 1.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(generate_candidates(&previous, 3).len(), 1);
    }

    #[test]
    fn test_empty_and_infrequent_input() {
        assert!(mine_apriori(&[], 0.1).is_empty());
        assert!(mine_apriori(&baskets(), 0.9).is_empty());
    }

    #[test]
    fn test_max_len_caps_levels() {
        let txs = vec![Transaction::new(["a", "b", "c"]); 3];
        let full = mine_apriori(&txs, 0.5);
        assert_eq!(full.max_level(), 3);

        let capped = AprioriMiner::new(0.5).with_max_len(Some(2)).mine(&txs);
        assert_eq!(capped.max_level(), 2);
        assert_eq!(capped.len(), 6);

        assert!(AprioriMiner::new(0.5).with_max_len(Some(0)).mine(&txs).is_empty());
    }

    #[test]
    fn test_parallel_candidate_counting() {
        // 12 items -> 66 level-2 candidates, above the parallel threshold.
        let items: Vec<String> = (0..12).map(|i| format!("item{i:02}")).collect();
        let txs: Vec<Transaction> = (0..12)
            .map(|skip| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, item)| item.clone())
                    .collect()
            })
            .collect();
        let table = mine_apriori(&txs, 0.8);
        let pair = Itemset::new(["item00", "item01"]);
        assert_eq!(table.support(&pair), Some(10.0 / 12.0));
        assert_eq!(table.level(2).map(HashMap::len), Some(66));
    }
}
