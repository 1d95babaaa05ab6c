//! Association rule generation from a completed itemset table
//!
//! Works on the output of either miner; only the table is consulted.

use crate::rust_datatypes::{Item, Itemset, ItemsetTable, Rule};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Derives `A -> B` rules whose confidence reaches `min_confidence`.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleGenerator {
    pub min_confidence: f64,
}

impl RuleGenerator {
    pub fn new(min_confidence: f64) -> Self {
        RuleGenerator { min_confidence }
    }

    /// Every rule obtainable by splitting a frequent itemset of size >= 2 into
    /// a non-empty antecedent and consequent, sorted with [`compare_rules`].
    ///
    /// `n_tx` is the transaction count the supports were computed against.
    pub fn generate(&self, table: &ItemsetTable, n_tx: usize) -> Vec<Rule> {
        let supports = table.support_index();
        let mut rules = Vec::new();
        let mut considered = 0usize;

        for (k, level) in table.levels() {
            if k < 2 {
                continue;
            }
            for (itemset, &support_ab) in level {
                let items = itemset.items();
                for size in 1..k {
                    for chosen in (0..k).combinations(size) {
                        considered += 1;
                        let antecedent: Itemset =
                            chosen.iter().map(|&i| items[i].clone()).collect();
                        let consequent = itemset.difference(&antecedent);

                        let support_a = supports.get(&antecedent).copied().unwrap_or(0.0);
                        let support_b = supports.get(&consequent).copied().unwrap_or(0.0);
                        if support_a == 0.0 || consequent.is_empty() {
                            continue;
                        }

                        let confidence = support_ab / support_a;
                        if confidence < self.min_confidence {
                            continue;
                        }
                        let lift = if support_b > 0.0 {
                            confidence / support_b
                        } else {
                            f64::NAN
                        };

                        rules.push(Rule {
                            antecedent: antecedent.into_items(),
                            consequent: consequent.into_items(),
                            support: support_ab,
                            confidence,
                            lift,
                        });
                    }
                }
            }
        }

        rules.sort_by(compare_rules);
        debug!(
            n_tx,
            itemsets = table.len(),
            considered,
            rules = rules.len(),
            min_confidence = self.min_confidence,
            "generated rules"
        );
        rules
    }
}

/// Rule ranking: confidence descending, then lift descending with undefined
/// (NaN) lift after every defined lift, then antecedent and consequent ascending.
pub fn compare_rules(a: &Rule, b: &Rule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| compare_lift_desc(a.lift, b.lift))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

fn compare_lift_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Confidence band of a recommendation.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    /// confidence <= 0.4
    Weak,
    /// 0.4 < confidence <= 0.7
    Moderate,
    /// confidence > 0.7
    Strong,
}

impl Strength {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence <= 0.4 {
            Strength::Weak
        } else if confidence <= 0.7 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }
}

/// An item worth pairing with a queried item, backed by its best rule.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item: Item,
    pub confidence: f64,
    pub support: f64,
    pub lift: f64,
    pub strength: Strength,
}

/// Items that follow `item`: every consequent item of a rule whose antecedent
/// holds `item`, scored by the highest-confidence such rule.
///
/// Sorted by confidence, then lift (NaN last), both descending, then by item.
pub fn recommendations_for(item: &str, rules: &[Rule]) -> Vec<Recommendation> {
    let mut best: HashMap<&str, &Rule> = HashMap::new();
    for rule in rules {
        if !rule.antecedent.iter().any(|a| a == item) {
            continue;
        }
        for consequent in &rule.consequent {
            let slot = best.entry(consequent.as_str()).or_insert(rule);
            if rule.confidence > slot.confidence {
                *slot = rule;
            }
        }
    }

    let mut recommendations: Vec<Recommendation> = best
        .into_iter()
        .map(|(consequent, rule)| Recommendation {
            item: consequent.to_string(),
            confidence: rule.confidence,
            support: rule.support,
            lift: rule.lift,
            strength: Strength::from_confidence(rule.confidence),
        })
        .collect();
    recommendations.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| compare_lift_desc(a.lift, b.lift))
            .then_with(|| a.item.cmp(&b.item))
    });
    recommendations
}

/// Rules from `table` at `min_confidence`.
pub fn generate_rules(table: &ItemsetTable, min_confidence: f64, n_tx: usize) -> Vec<Rule> {
    RuleGenerator::new(min_confidence).generate(table, n_tx)
}
