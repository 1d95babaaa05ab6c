//! Depth-first frequent itemset mining over a vertical (item -> tid-set) index
//!
//! Each branch of the search tree owns the tail of the candidate list that
//! follows its own item, so every unordered combination is visited once.

use crate::rust_datatypes::{Item, Itemset, ItemsetTable, Transaction};
use crate::{ItemsetMiner, TidSet, PARALLEL_THRESHOLD};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Tid-set intersection miner.
#[derive(Clone, Debug, PartialEq)]
pub struct EclatMiner {
    pub min_support: f64,
    /// Largest itemset size to produce (`None` = unbounded).
    pub max_len: Option<usize>,
}

/// Read-only state shared by every recursive call.
struct SearchContext {
    num_transactions: usize,
    min_support: f64,
    max_len: Option<usize>,
}

impl SearchContext {
    fn support_of(&self, tids: &TidSet) -> f64 {
        if self.num_transactions == 0 {
            return 0.0;
        }
        tids.count() as f64 / self.num_transactions as f64
    }

    fn can_grow_past(&self, len: usize) -> bool {
        self.max_len.map_or(true, |max| len < max)
    }
}

impl EclatMiner {
    pub fn new(min_support: f64) -> Self {
        EclatMiner {
            min_support,
            max_len: None,
        }
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }
}

impl ItemsetMiner for EclatMiner {
    fn mine(&self, transactions: &[Transaction]) -> ItemsetTable {
        let mut table = ItemsetTable::new();
        if self.max_len == Some(0) {
            return table;
        }

        let candidates: Vec<(Item, TidSet)> =
            build_vertical_index(transactions).into_iter().collect();
        let context = SearchContext {
            num_transactions: transactions.len(),
            min_support: self.min_support,
            max_len: self.max_len,
        };

        let root = Itemset::default();
        if candidates.len() < PARALLEL_THRESHOLD {
            let mut found = Vec::new();
            for index in 0..candidates.len() {
                extend_branch(&root, &candidates, index, &context, &mut found);
            }
            table.extend(found);
        } else {
            let branches: Vec<Vec<(Itemset, f64)>> = (0..candidates.len())
                .into_par_iter()
                .map(|index| {
                    let mut found = Vec::new();
                    extend_branch(&root, &candidates, index, &context, &mut found);
                    found
                })
                .collect();
            table.extend(branches.into_iter().flatten());
        }

        debug!(
            transactions = transactions.len(),
            items = candidates.len(),
            frequent = table.len(),
            "eclat finished"
        );
        table
    }
}

/// Vertical format: each distinct item with the ids of the transactions holding it.
pub fn build_vertical_index(transactions: &[Transaction]) -> BTreeMap<Item, TidSet> {
    let mut index: BTreeMap<Item, TidSet> = BTreeMap::new();
    for (tid, tx) in transactions.iter().enumerate() {
        for item in tx.items() {
            index
                .entry(item.clone())
                .or_insert_with(|| TidSet::with_capacity(transactions.len()))
                .insert(tid);
        }
    }
    index
}

/// Explore `prefix + candidates[index]` and, if frequent, every extension of it
/// by the candidates that come after `index`.
///
/// `candidates[index].1` already holds the tid-set of `prefix + item`.
fn extend_branch(
    prefix: &Itemset,
    candidates: &[(Item, TidSet)],
    index: usize,
    context: &SearchContext,
    found: &mut Vec<(Itemset, f64)>,
) {
    let (item, tids) = &candidates[index];
    let support = context.support_of(tids);
    if support < context.min_support {
        return;
    }

    let itemset = prefix.with_item(item);
    let grow = context.can_grow_past(itemset.len());

    if grow {
        let tail: Vec<(Item, TidSet)> = candidates[index + 1..]
            .iter()
            .map(|(other, other_tids)| (other.clone(), tids.bitwise_and(other_tids)))
            .collect();
        for next in 0..tail.len() {
            extend_branch(&itemset, &tail, next, context, found);
        }
    }

    found.push((itemset, support));
}

/// Eclat with no length cap.
pub fn mine_eclat(transactions: &[Transaction], min_support: f64) -> ItemsetTable {
    EclatMiner::new(min_support).mine(transactions)
}
