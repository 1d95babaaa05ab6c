//! Core data structures for frequent itemset mining
//!
//! Itemsets are stored as sorted, de-duplicated item vectors so that two
//! structurally equal sets always hash and compare equal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Opaque item identifier (a normalized product name in the basket domain).
pub type Item = String;

/// Immutable set of items in canonical (sorted, unique) order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itemset(Vec<Item>);

impl Itemset {
    /// Build an itemset from any collection of items; order and duplicates are irrelevant.
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        let mut items: Vec<Item> = items.into_iter().map(Into::into).collect();
        items.sort_unstable();
        items.dedup();
        Itemset(items)
    }

    pub fn singleton(item: impl Into<Item>) -> Self {
        Itemset(vec![item.into()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in ascending order.
    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn into_items(self) -> Vec<Item> {
        self.0
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(item)).is_ok()
    }

    /// Sorted merge of two itemsets.
    pub fn union(&self, other: &Itemset) -> Itemset {
        let mut merged = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(self.0[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(other.0[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(self.0[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.0[i..]);
        merged.extend_from_slice(&other.0[j..]);
        Itemset(merged)
    }

    /// Copy of this itemset with `item` added.
    pub fn with_item(&self, item: &str) -> Itemset {
        match self.0.binary_search_by(|probe| probe.as_str().cmp(item)) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut items = self.0.clone();
                items.insert(pos, item.to_string());
                Itemset(items)
            }
        }
    }

    /// Copy of this itemset with the member at `index` removed.
    pub fn without(&self, index: usize) -> Itemset {
        let mut items = self.0.clone();
        items.remove(index);
        Itemset(items)
    }

    /// Members of `self` not present in `other`.
    pub fn difference(&self, other: &Itemset) -> Itemset {
        Itemset(
            self.0
                .iter()
                .filter(|item| !other.contains(item))
                .cloned()
                .collect(),
        )
    }

    /// True when every member also appears in the sorted slice `superset`.
    pub fn is_subset_of(&self, superset: &[Item]) -> bool {
        if self.0.len() > superset.len() {
            return false;
        }
        let mut rest = superset.iter();
        'outer: for needle in &self.0 {
            for candidate in rest.by_ref() {
                match candidate.cmp(needle) {
                    std::cmp::Ordering::Less => continue,
                    std::cmp::Ordering::Equal => continue 'outer,
                    std::cmp::Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }
}

impl<T: Into<Item>> FromIterator<T> for Itemset {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Itemset::new(iter)
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// One basket. Its position in the input slice is its transaction id (tid).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Itemset);

impl Transaction {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        Transaction(Itemset::new(items))
    }

    /// Distinct items, sorted.
    pub fn items(&self) -> &[Item] {
        self.0.items()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if this transaction is a superset of `itemset`.
    pub fn contains_all(&self, itemset: &Itemset) -> bool {
        itemset.is_subset_of(self.0.items())
    }
}

impl<T: Into<Item>> FromIterator<T> for Transaction {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Transaction::new(iter)
    }
}

/// Frequent itemsets grouped by size: `k -> (itemset -> support)`.
///
/// Levels are only stored when non-empty, so an empty table has no levels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemsetTable {
    levels: BTreeMap<usize, HashMap<Itemset, f64>>,
}

impl ItemsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `itemset` at level `itemset.len()`. Empty itemsets are ignored.
    pub fn insert(&mut self, itemset: Itemset, support: f64) -> Option<f64> {
        if itemset.is_empty() {
            return None;
        }
        self.levels
            .entry(itemset.len())
            .or_default()
            .insert(itemset, support)
    }

    /// Replace level `k` wholesale; an empty level is not stored.
    pub fn insert_level(&mut self, k: usize, level: HashMap<Itemset, f64>) {
        if level.is_empty() {
            self.levels.remove(&k);
        } else {
            self.levels.insert(k, level);
        }
    }

    pub fn level(&self, k: usize) -> Option<&HashMap<Itemset, f64>> {
        self.levels.get(&k)
    }

    pub fn support(&self, itemset: &Itemset) -> Option<f64> {
        self.levels
            .get(&itemset.len())
            .and_then(|level| level.get(itemset))
            .copied()
    }

    /// Total number of itemsets over all levels.
    pub fn len(&self) -> usize {
        self.levels.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Size of the largest frequent itemset, 0 when empty.
    pub fn max_level(&self) -> usize {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    pub fn levels(&self) -> impl Iterator<Item = (usize, &HashMap<Itemset, f64>)> {
        self.levels.iter().map(|(&k, level)| (k, level))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Itemset, f64)> {
        self.levels
            .values()
            .flat_map(|level| level.iter().map(|(itemset, &support)| (itemset, support)))
    }

    /// Flat itemset -> support lookup over every level.
    pub fn support_index(&self) -> HashMap<&Itemset, f64> {
        self.iter().collect()
    }

    /// Owned records sorted by (size, items).
    pub fn to_records(&self) -> Vec<FrequentItemset> {
        let mut records: Vec<FrequentItemset> = self
            .iter()
            .map(|(itemset, support)| FrequentItemset {
                items: itemset.items().to_vec(),
                support,
            })
            .collect();
        records.sort_by(|a, b| {
            a.items
                .len()
                .cmp(&b.items.len())
                .then_with(|| a.items.cmp(&b.items))
        });
        records
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FrequentItemset>,
    {
        let mut table = ItemsetTable::new();
        for record in records {
            table.insert(Itemset::new(record.items), record.support);
        }
        table
    }
}

impl Extend<(Itemset, f64)> for ItemsetTable {
    fn extend<I: IntoIterator<Item = (Itemset, f64)>>(&mut self, iter: I) {
        for (itemset, support) in iter {
            self.insert(itemset, support);
        }
    }
}

/// Flat, serializable view of one table entry.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemset {
    pub items: Vec<Item>,
    pub support: f64,
}

#[cfg(feature = "python")]
#[pymethods]
impl FrequentItemset {
    #[new]
    fn py_new(items: Vec<Item>, support: f64) -> Self {
        FrequentItemset { items, support }
    }

    fn __repr__(&self) -> String {
        format!("{{{}}}, sup={:.4}", self.items.join(", "), self.support)
    }
}

/// Association rule `antecedent -> consequent`.
///
/// `lift` is NaN when the consequent has zero support; treat it as undefined.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: Vec<Item>,
    pub consequent: Vec<Item>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl Rule {
    pub fn has_lift(&self) -> bool {
        !self.lift.is_nan()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {} (support={:.4}, confidence={:.4}, lift={:.4})",
            self.antecedent.join(" "),
            self.consequent.join(" "),
            self.support,
            self.confidence,
            self.lift
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Rule {
    fn __repr__(&self) -> String {
        self.to_string()
    }
}
