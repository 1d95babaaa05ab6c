//! Support counting by linear scan over transactions.

use crate::rust_datatypes::{Itemset, Transaction};

/// Number of transactions that are supersets of `itemset`.
pub fn count_support(itemset: &Itemset, transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter(|tx| tx.contains_all(itemset))
        .count()
}

/// Fraction of transactions that are supersets of `itemset`.
///
/// Returns 0.0 for an empty transaction collection.
pub fn support(itemset: &Itemset, transactions: &[Transaction]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    count_support(itemset, transactions) as f64 / transactions.len() as f64
}
