//! Apriori frequent-itemset mining and association rule generation

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds and size bounds for a mining run
#[derive(Debug, Clone, PartialEq)]
pub struct MinerParams {
    /// Minimum fraction of transactions an itemset must appear in
    pub min_support: f64,
    /// Minimum confidence a rule must reach to be reported
    pub min_confidence: f64,
    /// Minimum lift a rule must reach to be reported
    pub min_lift: f64,
    /// Smallest itemset size to report
    pub min_length: usize,
    /// Largest itemset size to grow to, unbounded when `None`
    pub max_length: Option<usize>,
}

impl Default for MinerParams {
    fn default() -> Self {
        MinerParams {
            min_support: 0.0005,
            min_confidence: 0.6,
            min_lift: 1.0,
            min_length: 2,
            max_length: None,
        }
    }
}

/// One directional rule derived from a frequent itemset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStat {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub confidence: f64,
    pub lift: f64,
}

/// A frequent itemset, its support, and the rules that survived filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsetRecord {
    pub items: Vec<String>,
    pub support: f64,
    pub rules: Vec<RuleStat>,
}

/// A candidate itemset with the ids of the transactions containing it.
///
/// `items` is held ascending by interned id and `tids` ascending by
/// transaction index so levels can be joined and intersected in order.
struct Itemset {
    items: Vec<u32>,
    tids: Vec<u32>,
}

/// Mine frequent itemsets and association rules from baskets.
///
/// Runs a level-wise apriori search: length-1 itemsets are counted directly,
/// each longer level joins the previous one and prunes candidates whose
/// subsets are infrequent, and every reported itemset carries the rules
/// (one consequent item each) that meet the confidence and lift thresholds.
/// Itemsets whose rules are all filtered out are omitted entirely.
///
/// # Arguments
/// * `baskets` - One list of product names per transaction
/// * `params` - Support, confidence, lift, and length bounds
///
/// # Returns
/// * Itemset records in deterministic order, smallest itemsets first
pub fn mine_association_rules(
    baskets: &[Vec<String>],
    params: &MinerParams,
) -> crate::Result<Vec<ItemsetRecord>> {
    validate_params(params)?;
    if baskets.is_empty() {
        anyhow::bail!("Cannot mine association rules from an empty basket list");
    }

    let total = baskets.len();

    // Intern item names into dense ids and collect each basket as a sorted
    // id set plus per-item transaction-id lists.
    let mut names: Vec<String> = Vec::new();
    let mut ids: HashMap<String, u32> = HashMap::new();
    let mut tidsets: Vec<Vec<u32>> = Vec::new();
    let mut tx_items: Vec<Vec<u32>> = Vec::with_capacity(total);
    for (tid, basket) in baskets.iter().enumerate() {
        let mut item_set: Vec<u32> = Vec::with_capacity(basket.len());
        for name in basket {
            let id = match ids.get(name) {
                Some(&id) => id,
                None => {
                    let id = names.len() as u32;
                    ids.insert(name.clone(), id);
                    names.push(name.clone());
                    tidsets.push(Vec::new());
                    id
                }
            };
            item_set.push(id);
        }
        // A repeated scan of the same product counts once per transaction.
        item_set.sort_unstable();
        item_set.dedup();
        for &id in &item_set {
            tidsets[id as usize].push(tid as u32);
        }
        tx_items.push(item_set);
    }

    let mut current: Vec<Itemset> = (0..names.len() as u32)
        .filter(|&id| meets_support(tidsets[id as usize].len(), total, params.min_support))
        .map(|id| Itemset {
            items: vec![id],
            tids: tidsets[id as usize].clone(),
        })
        .collect();

    let mut supports: HashMap<Vec<u32>, usize> = HashMap::new();
    let mut records: Vec<ItemsetRecord> = Vec::new();
    let mut length = 1usize;

    while !current.is_empty() {
        debug!(length, itemsets = current.len(), "frequent itemsets found");

        for set in &current {
            supports.insert(set.items.clone(), set.tids.len());
        }
        if length >= params.min_length {
            for set in &current {
                let record = build_record(set, total, &names, &supports, params);
                if !record.rules.is_empty() {
                    records.push(record);
                }
            }
        }
        if params.max_length == Some(length) {
            break;
        }

        current = if length == 1 {
            frequent_pairs(&tx_items, &tidsets, &current, total, params.min_support)
        } else {
            next_level(&current, length + 1, total, params.min_support)
        };
        length += 1;
    }

    Ok(records)
}

fn validate_params(params: &MinerParams) -> crate::Result<()> {
    if !(params.min_support > 0.0 && params.min_support <= 1.0) {
        anyhow::bail!(
            "min_support must be in (0, 1], got {}",
            params.min_support
        );
    }
    if !(0.0..=1.0).contains(&params.min_confidence) {
        anyhow::bail!(
            "min_confidence must be in [0, 1], got {}",
            params.min_confidence
        );
    }
    if params.min_lift < 0.0 {
        anyhow::bail!("min_lift must be non-negative, got {}", params.min_lift);
    }
    if params.min_length == 0 {
        anyhow::bail!("min_length must be at least 1");
    }
    if let Some(max) = params.max_length {
        if max < params.min_length {
            anyhow::bail!(
                "max_length ({}) must not be below min_length ({})",
                max,
                params.min_length
            );
        }
    }
    Ok(())
}

fn meets_support(count: usize, total: usize, min_support: f64) -> bool {
    count as f64 / total as f64 >= min_support
}

/// Count frequent pairs with a single pass over the baskets.
///
/// Counting co-occurrences directly avoids materializing every pair of
/// frequent items up front; transaction-id lists are only intersected for
/// the pairs that survive the support threshold.
fn frequent_pairs(
    tx_items: &[Vec<u32>],
    tidsets: &[Vec<u32>],
    frequent_items: &[Itemset],
    total: usize,
    min_support: f64,
) -> Vec<Itemset> {
    let keep: HashSet<u32> = frequent_items.iter().map(|set| set.items[0]).collect();

    let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
    for items in tx_items {
        let present: Vec<u32> = items
            .iter()
            .copied()
            .filter(|id| keep.contains(id))
            .collect();
        for i in 0..present.len() {
            for j in (i + 1)..present.len() {
                *counts.entry((present[i], present[j])).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<(u32, u32)> = counts
        .iter()
        .filter(|&(_, &count)| meets_support(count, total, min_support))
        .map(|(&pair, _)| pair)
        .collect();
    pairs.sort_unstable();

    pairs
        .into_iter()
        .map(|(a, b)| Itemset {
            items: vec![a, b],
            tids: intersect(&tidsets[a as usize], &tidsets[b as usize]),
        })
        .collect()
}

/// Grow length-`length` candidates by joining the previous level.
///
/// `previous` is sorted lexicographically; itemsets sharing their first
/// `length - 2` items are joined pairwise, candidates with an infrequent
/// subset are pruned, and supports come from intersecting the parents'
/// transaction-id lists.
fn next_level(previous: &[Itemset], length: usize, total: usize, min_support: f64) -> Vec<Itemset> {
    let known: HashSet<&[u32]> = previous.iter().map(|set| set.items.as_slice()).collect();

    let mut next = Vec::new();
    let mut start = 0;
    while start < previous.len() {
        let prefix = &previous[start].items[..length - 2];
        let mut end = start;
        while end < previous.len() && previous[end].items[..length - 2] == *prefix {
            end += 1;
        }

        for i in start..end {
            for j in (i + 1)..end {
                let mut items = previous[i].items.clone();
                items.push(previous[j].items[length - 2]);

                if !all_subsets_frequent(&items, &known) {
                    continue;
                }
                let tids = intersect(&previous[i].tids, &previous[j].tids);
                if meets_support(tids.len(), total, min_support) {
                    next.push(Itemset { items, tids });
                }
            }
        }
        start = end;
    }
    next
}

fn all_subsets_frequent(items: &[u32], known: &HashSet<&[u32]>) -> bool {
    let mut subset = Vec::with_capacity(items.len() - 1);
    for skip in 0..items.len() {
        subset.clear();
        subset.extend(
            items
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &id)| id),
        );
        if !known.contains(subset.as_slice()) {
            return false;
        }
    }
    true
}

/// Intersect two ascending transaction-id lists.
fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Build the reportable record for one frequent itemset.
///
/// Item names are listed alphabetically. Each item in turn is taken as the
/// single consequent with the rest as antecedent, ordered by ascending
/// antecedent; a length-1 itemset yields the empty-antecedent rule whose
/// confidence equals the support and whose lift is 1.
fn build_record(
    set: &Itemset,
    total: usize,
    names: &[String],
    supports: &HashMap<Vec<u32>, usize>,
    params: &MinerParams,
) -> ItemsetRecord {
    let count = set.tids.len();
    let support = count as f64 / total as f64;

    let mut by_name: Vec<u32> = set.items.clone();
    by_name.sort_by(|&a, &b| names[a as usize].cmp(&names[b as usize]));

    let count_of = |ids: &[u32]| -> Option<usize> {
        if ids.is_empty() {
            return Some(total);
        }
        let mut key = ids.to_vec();
        key.sort_unstable();
        supports.get(&key).copied()
    };

    let mut rules = Vec::new();
    for skip in (0..by_name.len()).rev() {
        let antecedent: Vec<u32> = by_name
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &id)| id)
            .collect();
        let consequent = by_name[skip];

        let (base_count, add_count) = match (count_of(&antecedent), count_of(&[consequent])) {
            (Some(base), Some(add)) if base > 0 && add > 0 => (base, add),
            _ => continue,
        };

        let confidence = count as f64 / base_count as f64;
        let lift = confidence / (add_count as f64 / total as f64);
        if confidence < params.min_confidence || lift < params.min_lift {
            continue;
        }

        rules.push(RuleStat {
            antecedent: antecedent
                .iter()
                .map(|&id| names[id as usize].clone())
                .collect(),
            consequent: vec![names[consequent as usize].clone()],
            confidence,
            lift,
        });
    }

    ItemsetRecord {
        items: by_name
            .iter()
            .map(|&id| names[id as usize].clone())
            .collect(),
        support,
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn baskets(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|basket| basket.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    /// Five baskets with known supports: milk 0.6, bread 0.8, butter 0.4,
    /// {milk, bread} 0.4, {bread, butter} 0.4, {milk, bread, butter} 0.2.
    fn sample_baskets() -> Vec<Vec<String>> {
        baskets(&[
            &["milk", "bread"],
            &["milk", "bread", "butter"],
            &["bread", "butter"],
            &["milk"],
            &["bread"],
        ])
    }

    fn permissive(min_support: f64) -> MinerParams {
        MinerParams {
            min_support,
            min_confidence: 0.0,
            min_lift: 0.0,
            min_length: 1,
            max_length: None,
        }
    }

    fn find<'a>(records: &'a [ItemsetRecord], items: &[&str]) -> &'a ItemsetRecord {
        records
            .iter()
            .find(|r| r.items == items)
            .unwrap_or_else(|| panic!("no record for {:?}", items))
    }

    #[test]
    fn test_single_item_records() {
        let records = mine_association_rules(&sample_baskets(), &permissive(0.3)).unwrap();

        let milk = find(&records, &["milk"]);
        assert!(approx(milk.support, 0.6));
        assert_eq!(milk.rules.len(), 1);
        assert!(milk.rules[0].antecedent.is_empty());
        assert_eq!(milk.rules[0].consequent, vec!["milk"]);
        assert!(approx(milk.rules[0].confidence, 0.6));
        assert!(approx(milk.rules[0].lift, 1.0));

        let bread = find(&records, &["bread"]);
        assert!(approx(bread.support, 0.8));
    }

    #[test]
    fn test_pair_statistics() {
        let records = mine_association_rules(&sample_baskets(), &permissive(0.3)).unwrap();

        // Three singles and two pairs clear the 0.3 support bar; the triple
        // sits at 0.2 and does not.
        assert_eq!(records.len(), 5);

        let pair = find(&records, &["bread", "milk"]);
        assert!(approx(pair.support, 0.4));
        assert_eq!(pair.rules.len(), 2);

        // Rules come back ordered by antecedent: {bread} -> milk first.
        assert_eq!(pair.rules[0].antecedent, vec!["bread"]);
        assert_eq!(pair.rules[0].consequent, vec!["milk"]);
        assert!(approx(pair.rules[0].confidence, 0.5));
        assert!(approx(pair.rules[0].lift, 0.5 / 0.6));

        assert_eq!(pair.rules[1].antecedent, vec!["milk"]);
        assert_eq!(pair.rules[1].consequent, vec!["bread"]);
        assert!(approx(pair.rules[1].confidence, 2.0 / 3.0));
        assert!(approx(pair.rules[1].lift, (2.0 / 3.0) / 0.8));
    }

    #[test]
    fn test_triple_found_at_low_support() {
        let records = mine_association_rules(&sample_baskets(), &permissive(0.1)).unwrap();

        let triple = find(&records, &["bread", "butter", "milk"]);
        assert!(approx(triple.support, 0.2));
        // {butter, milk} -> bread has confidence 1.0.
        let rule = triple
            .rules
            .iter()
            .find(|r| r.consequent == vec!["bread"])
            .unwrap();
        assert_eq!(rule.antecedent, vec!["butter", "milk"]);
        assert!(approx(rule.confidence, 1.0));
        assert!(approx(rule.lift, 1.0 / 0.8));
    }

    #[test]
    fn test_min_length_excludes_small_itemsets() {
        let mut params = permissive(0.3);
        params.min_length = 2;

        let records = mine_association_rules(&sample_baskets(), &params).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.items.len() >= 2));
    }

    #[test]
    fn test_max_length_caps_growth() {
        let mut params = permissive(0.1);
        params.max_length = Some(1);

        let records = mine_association_rules(&sample_baskets(), &params).unwrap();
        assert!(records.iter().all(|r| r.items.len() == 1));
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_confidence_threshold_filters_rules() {
        let params = MinerParams {
            min_support: 0.3,
            min_confidence: 0.6,
            min_lift: 0.0,
            min_length: 2,
            max_length: None,
        };

        let records = mine_association_rules(&sample_baskets(), &params).unwrap();
        assert_eq!(records.len(), 2);

        // bread -> milk (0.5) and bread -> butter (0.5) fall below the bar.
        let milk_pair = find(&records, &["bread", "milk"]);
        assert_eq!(milk_pair.rules.len(), 1);
        assert_eq!(milk_pair.rules[0].antecedent, vec!["milk"]);

        let butter_pair = find(&records, &["bread", "butter"]);
        assert_eq!(butter_pair.rules.len(), 1);
        assert_eq!(butter_pair.rules[0].antecedent, vec!["butter"]);
        assert!(approx(butter_pair.rules[0].confidence, 1.0));
    }

    #[test]
    fn test_lift_threshold_drops_whole_record() {
        let params = MinerParams {
            min_support: 0.3,
            min_confidence: 0.0,
            min_lift: 1.0,
            min_length: 2,
            max_length: None,
        };

        let records = mine_association_rules(&sample_baskets(), &params).unwrap();

        // Both {bread, milk} rules sit at lift 5/6, so that record vanishes;
        // both {bread, butter} rules sit at lift 1.25.
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.items, vec!["bread", "butter"]);
        assert_eq!(record.rules.len(), 2);
        assert!(record.rules.iter().all(|r| r.lift >= 1.0));
    }

    #[test]
    fn test_duplicate_scans_count_once() {
        let data = baskets(&[&["apple", "apple", "pear"], &["apple"]]);
        let records = mine_association_rules(&data, &permissive(0.1)).unwrap();

        let apple = find(&records, &["apple"]);
        assert!(approx(apple.support, 1.0));
        let pair = find(&records, &["apple", "pear"]);
        assert!(approx(pair.support, 0.5));
    }

    #[test]
    fn test_deterministic_output() {
        let first = mine_association_rules(&sample_baskets(), &permissive(0.1)).unwrap();
        let second = mine_association_rules(&sample_baskets(), &permissive(0.1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_baskets_rejected() {
        let result = mine_association_rules(&[], &MinerParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let baskets = sample_baskets();
        let bad = [
            MinerParams {
                min_support: 0.0,
                ..MinerParams::default()
            },
            MinerParams {
                min_support: 1.5,
                ..MinerParams::default()
            },
            MinerParams {
                min_confidence: -0.1,
                ..MinerParams::default()
            },
            MinerParams {
                min_lift: -1.0,
                ..MinerParams::default()
            },
            MinerParams {
                min_length: 0,
                ..MinerParams::default()
            },
            MinerParams {
                min_length: 3,
                max_length: Some(2),
                ..MinerParams::default()
            },
        ];

        for params in bad {
            assert!(mine_association_rules(&baskets, &params).is_err());
        }
    }

    #[test]
    fn test_default_params() {
        let params = MinerParams::default();
        assert!(approx(params.min_support, 0.0005));
        assert!(approx(params.min_confidence, 0.6));
        assert!(approx(params.min_lift, 1.0));
        assert_eq!(params.min_length, 2);
        assert_eq!(params.max_length, None);
    }
}
