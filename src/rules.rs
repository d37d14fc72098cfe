//! Rule record output and flattening into a ranked table

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use tracing::debug;

use crate::miner::ItemsetRecord;

/// One flattened rule with its parent itemset's support attached
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub confidence: f64,
    pub lift: f64,
    pub support: f64,
}

/// Write itemset records to a file, one JSON object per line.
pub fn write_records(records: &[ItemsetRecord], path: &str) -> crate::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create rule output file {}", path))?;
    let mut out = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut out, record)
            .with_context(|| format!("Failed to serialize rule record to {}", path))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    debug!(records = records.len(), path, "rule records written");
    Ok(())
}

/// Flatten itemset records into one row per rule, strongest lift first.
///
/// Every rule inherits its record's support. Rows are ordered by descending
/// lift, then descending support, then antecedent and consequent so equal
/// scores still land in a stable order.
pub fn flatten_records(records: &[ItemsetRecord]) -> Vec<RuleRow> {
    let mut rows: Vec<RuleRow> = records
        .iter()
        .flat_map(|record| {
            record.rules.iter().map(move |stat| RuleRow {
                antecedent: stat.antecedent.clone(),
                consequent: stat.consequent.clone(),
                confidence: stat.confidence,
                lift: stat.lift,
                support: record.support,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.lift
            .total_cmp(&a.lift)
            .then_with(|| b.support.total_cmp(&a.support))
            .then_with(|| a.antecedent.cmp(&b.antecedent))
            .then_with(|| a.consequent.cmp(&b.consequent))
    });
    rows
}

/// Print the top rules as an aligned table.
pub fn print_rule_table(rows: &[RuleRow], limit: usize) {
    if rows.is_empty() {
        println!("No rules met the configured thresholds.");
        return;
    }

    println!(
        "  {:<40} | {:<28} | {:>10} | {:>8} | {:>9}",
        "Antecedent", "Consequent", "Confidence", "Lift", "Support"
    );
    println!("  {}", "-".repeat(108));

    for row in rows.iter().take(limit) {
        println!(
            "  {:<40} | {:<28} | {:>10.4} | {:>8.4} | {:>9.5}",
            truncate_label(&row.antecedent.join(", "), 40),
            truncate_label(&row.consequent.join(", "), 28),
            row.confidence,
            row.lift,
            row.support
        );
    }
    if rows.len() > limit {
        println!("  ... and {} more rules", rows.len() - limit);
    }
}

pub(crate) fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
