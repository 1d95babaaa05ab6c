//! Worked end-to-end scenarios over the public API.

use basket_miner::{
    clean_transactions, generate_rules, mine_apriori, mine_eclat, Algorithm, AssociationMiner,
    Itemset, ItemsetTable, MinerConfig, Rule, Transaction,
};

fn baskets() -> Vec<Transaction> {
    vec![
        Transaction::new(["milk", "bread"]),
        Transaction::new(["milk", "bread", "eggs"]),
        Transaction::new(["bread", "eggs"]),
        Transaction::new(["milk", "eggs"]),
    ]
}

#[test]
fn basket_example_levels() {
    for table in [mine_apriori(&baskets(), 0.5), mine_eclat(&baskets(), 0.5)] {
        let level1 = table.level(1).expect("level 1");
        assert_eq!(level1.len(), 3);
        for item in ["milk", "bread", "eggs"] {
            assert_eq!(level1[&Itemset::singleton(item)], 0.75);
        }

        let level2 = table.level(2).expect("level 2");
        assert_eq!(level2.len(), 3);
        for pair in [["milk", "bread"], ["bread", "eggs"], ["milk", "eggs"]] {
            assert_eq!(level2[&Itemset::new(pair)], 0.5);
        }

        assert!(table.level(3).is_none());
        assert_eq!(table.max_level(), 2);
    }
}

fn find_rule<'a>(rules: &'a [Rule], antecedent: &str, consequent: &str) -> &'a Rule {
    rules
        .iter()
        .find(|r| r.antecedent == [antecedent] && r.consequent == [consequent])
        .expect("rule present")
}

#[test]
fn basket_example_rules() {
    let table = mine_apriori(&baskets(), 0.5);
    let rules = generate_rules(&table, 0.5, 4);
    assert_eq!(rules.len(), 6);

    let milk_bread = find_rule(&rules, "milk", "bread");
    let bread_milk = find_rule(&rules, "bread", "milk");
    assert!((milk_bread.confidence - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(milk_bread.confidence, bread_milk.confidence);
    assert_eq!(milk_bread.support, 0.5);
    assert!((milk_bread.lift - (2.0 / 3.0) / 0.75).abs() < 1e-12);
}

#[test]
fn empty_collection() {
    let empty: Vec<Transaction> = Vec::new();
    assert!(mine_apriori(&empty, 0.2).is_empty());
    assert!(mine_eclat(&empty, 0.2).is_empty());
    assert!(generate_rules(&ItemsetTable::new(), 0.5, 0).is_empty());
}

#[test]
fn single_item_transactions_give_no_pairs() {
    let txs = vec![
        Transaction::new(["milk"]),
        Transaction::new(["bread"]),
        Transaction::new(["milk"]),
    ];
    for table in [mine_apriori(&txs, 0.3), mine_eclat(&txs, 0.3)] {
        assert_eq!(table.max_level(), 1);
        assert!(generate_rules(&table, 0.1, txs.len()).is_empty());
    }
}

#[test]
fn wide_alphabet_uses_parallel_paths() {
    // 63 distinct items: every sku appears once, alongside common staples.
    let txs: Vec<Transaction> = (0..60)
        .map(|i| {
            let mut items = vec![format!("sku{i:03}"), "bread".to_string(), "milk".to_string()];
            if i % 2 == 1 {
                items.push("eggs".to_string());
            }
            Transaction::new(items)
        })
        .collect();

    let apriori = mine_apriori(&txs, 0.01);
    let eclat = mine_eclat(&txs, 0.01);
    assert_eq!(apriori, eclat);

    let sizes: Vec<(usize, usize)> = apriori
        .levels()
        .map(|(k, level)| (k, level.len()))
        .collect();
    assert_eq!(sizes, vec![(1, 63), (2, 153), (3, 121), (4, 30)]);
    assert_eq!(apriori.support(&Itemset::new(["bread", "eggs", "milk"])), Some(0.5));
}

#[test]
fn rules_serialize_with_undefined_lift() {
    let mut table = ItemsetTable::new();
    table.insert(Itemset::singleton("a"), 0.5);
    table.insert(Itemset::new(["a", "b"]), 0.5);

    let rules = generate_rules(&table, 0.5, 2);
    let json = serde_json::to_value(&rules).unwrap();
    assert_eq!(json[0]["antecedent"], serde_json::json!(["a"]));
    assert_eq!(json[0]["consequent"], serde_json::json!(["b"]));
    assert!(json[0]["lift"].is_null());
}

#[test]
fn raw_rows_to_rules() {
    let rows = [
        "Milk, Bread",
        "milk, bread, eggs",
        "Bread Eggs",
        "milk eggs",
        "butter",
        "",
    ];
    let cleaned = clean_transactions(rows, None);
    assert_eq!(cleaned.transactions, baskets());
    assert_eq!(cleaned.report.single_item_tx_removed, 1);
    assert_eq!(cleaned.report.empty_tx_removed, 1);

    let mut miner = AssociationMiner::new(MinerConfig {
        min_support: 0.5,
        min_confidence: 0.6,
        algorithm: Algorithm::Eclat,
        ..MinerConfig::default()
    })
    .unwrap();
    miner.load_transactions(cleaned.transactions);
    let outcome = miner.mine();

    assert_eq!(outcome.table.len(), 6);
    assert_eq!(outcome.rules.len(), 6);
    assert!(outcome.rules.iter().all(|r| r.confidence >= 0.6));
}
