//! Conversion of raw basket rows into mining-ready transactions
//!
//! Rows are free text: comma separated when a comma is present, otherwise
//! split on single spaces only (a tab stays inside its item). Item names are
//! normalized before anything else.

use crate::rust_datatypes::{Item, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Trim, lowercase and collapse internal whitespace.
pub fn normalize_item(raw: &str) -> Item {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Counters describing what cleaning removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub before_total_tx: usize,
    pub empty_tx_removed: usize,
    pub single_item_tx_removed: usize,
    pub duplicate_items_removed: usize,
    pub invalid_items_removed: usize,
    pub after_valid_tx: usize,
    pub total_items: usize,
    pub unique_products: usize,
}

impl CleaningReport {
    /// Counter names paired with their values, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("before_total_tx", self.before_total_tx),
            ("empty_tx_removed", self.empty_tx_removed),
            ("single_item_tx_removed", self.single_item_tx_removed),
            ("duplicate_items_removed", self.duplicate_items_removed),
            ("invalid_items_removed", self.invalid_items_removed),
            ("after_valid_tx", self.after_valid_tx),
            ("total_items", self.total_items),
            ("unique_products", self.unique_products),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanedTransactions {
    pub transactions: Vec<Transaction>,
    pub report: CleaningReport,
}

fn split_row(raw: &str) -> Vec<Item> {
    let tokens: Box<dyn Iterator<Item = &str> + '_> = if raw.contains(',') {
        Box::new(raw.split(','))
    } else {
        Box::new(raw.split(' '))
    };
    tokens
        .map(normalize_item)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Clean raw rows into transactions of at least two distinct items.
///
/// `catalog`, when given, holds the normalized names of valid items; anything
/// else is dropped and rows left with fewer than two items are removed.
pub fn clean_transactions<'a, I>(rows: I, catalog: Option<&HashSet<Item>>) -> CleanedTransactions
where
    I: IntoIterator<Item = &'a str>,
{
    let mut report = CleaningReport::default();
    let mut kept: Vec<Vec<Item>> = Vec::new();

    for raw in rows {
        report.before_total_tx += 1;

        let tokens = split_row(raw);
        if tokens.is_empty() {
            report.empty_tx_removed += 1;
            continue;
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(tokens.len());
        for item in tokens {
            if seen.insert(item.clone()) {
                unique.push(item);
            } else {
                report.duplicate_items_removed += 1;
            }
        }

        if unique.len() == 1 {
            report.single_item_tx_removed += 1;
            continue;
        }

        if let Some(valid) = catalog {
            let before = unique.len();
            unique.retain(|item| valid.contains(item));
            report.invalid_items_removed += before - unique.len();
            if unique.len() < 2 {
                continue;
            }
        }

        kept.push(unique);
    }

    report.after_valid_tx = kept.len();
    report.total_items = kept.iter().map(Vec::len).sum();
    report.unique_products = kept.iter().flatten().collect::<HashSet<_>>().len();

    debug!(
        before = report.before_total_tx,
        after = report.after_valid_tx,
        unique_products = report.unique_products,
        "cleaned transactions"
    );

    CleanedTransactions {
        transactions: kept.into_iter().map(Transaction::new).collect(),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_item() {
        assert_eq!(normalize_item("  Whole   MILK "), "whole milk");
        assert_eq!(normalize_item("\t"), "");
    }

    #[test]
    fn test_split_modes() {
        assert_eq!(split_row("Milk, Peanut Butter ,"), vec!["milk", "peanut butter"]);
        assert_eq!(split_row("milk  bread"), vec!["milk", "bread"]);
        assert_eq!(split_row("Milk\tBread"), vec!["milk bread"]);
        assert_eq!(split_row("milk\tbread eggs"), vec!["milk bread", "eggs"]);
    }

    #[test]
    fn test_clean_counts() {
        let rows = [
            "milk, bread, milk",
            "",
            "eggs",
            "tea coffee",
            "  ,  ",
            "milk,bread,eggs",
        ];
        let cleaned = clean_transactions(rows, None);

        assert_eq!(cleaned.transactions.len(), 3);
        assert_eq!(
            cleaned.report,
            CleaningReport {
                before_total_tx: 6,
                empty_tx_removed: 2,
                single_item_tx_removed: 1,
                duplicate_items_removed: 1,
                invalid_items_removed: 0,
                after_valid_tx: 3,
                total_items: 7,
                unique_products: 5,
            }
        );
    }

    #[test]
    fn test_catalog_filter() {
        let catalog: HashSet<Item> = ["milk", "bread"].iter().map(|s| s.to_string()).collect();
        let rows = ["milk, bread, caviar", "milk, caviar", "truffle, caviar"];
        let cleaned = clean_transactions(rows, Some(&catalog));

        assert_eq!(cleaned.transactions, vec![Transaction::new(["bread", "milk"])]);
        assert_eq!(cleaned.report.invalid_items_removed, 4);
        assert_eq!(cleaned.report.after_valid_tx, 1);
        assert_eq!(cleaned.report.unique_products, 2);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(CleaningReport::default()).unwrap();
        assert_eq!(json["after_valid_tx"], 0);
        assert_eq!(CleaningReport::default().entries().len(), 8);
    }
}
