//! Data loading, catalog joining, and basket construction using Polars

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;

use anyhow::Context;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use tracing::debug;

const COL_UPC: &str = "upc";
const COL_STATUS: &str = "product_status";
const COL_PRODUCT: &str = "product_name";
const COL_CLASS: &str = "class_name";
const COL_DEPARTMENT: &str = "department_code";
const COL_TRX: &str = "transaction_id";

// 0-based field positions in the pipe-delimited source extracts.
const CATALOG_FIELDS: [(usize, &str); 5] = [
    (0, COL_UPC),
    (2, COL_STATUS),
    (4, COL_PRODUCT),
    (6, COL_CLASS),
    (11, COL_DEPARTMENT),
];
const TRANSACTION_FIELDS: [(usize, &str); 2] = [(2, COL_TRX), (6, COL_UPC)];

const DIGITS_ONLY: &str = r"^[0-9]+$";

/// One row of the joined transaction/catalog data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketEntry {
    pub transaction_id: i64,
    pub upc: String,
    pub product_name: String,
}

/// Per-item transaction frequency and support
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFrequency {
    pub product_name: String,
    pub count: u64,
    pub support: f64,
}

/// Deduplicated basket entries with corpus totals
#[derive(Debug)]
pub struct BasketData {
    pub entries: Vec<BasketEntry>,
    pub total_transactions: usize,
    pub total_products: usize,
}

/// Read a headerless pipe-delimited file, decoding it from Latin-1.
///
/// Columns are named `column_1` through `column_N` in file order.
fn read_pipe_delimited(path: &str) -> crate::Result<DataFrame> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path))?;

    // The source extracts are Latin-1 encoded; every byte maps directly to
    // the Unicode codepoint of the same value.
    let text: String = bytes.iter().map(|&b| b as char).collect();

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(b'|'))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .with_context(|| format!("Failed to parse {} as pipe-delimited data", path))?;

    Ok(df)
}

/// Select the named fields out of a headerless frame by position.
fn select_fields(df: DataFrame, fields: &[(usize, &str)]) -> LazyFrame {
    let exprs: Vec<Expr> = fields
        .iter()
        .map(|&(idx, name)| col(&format!("column_{}", idx + 1)).alias(name))
        .collect();
    df.lazy().select(exprs)
}

/// Load the product catalog and reduce it to sellable products.
///
/// Keeps rows whose status flag is `1` and whose department code is purely
/// numeric, then casts the department code to an integer. The returned frame
/// has columns `upc`, `product_name`, `class_name`, and `department_code`.
pub fn load_catalog(path: &str) -> crate::Result<DataFrame> {
    let raw = read_pipe_delimited(path)?;

    let df = select_fields(raw, &CATALOG_FIELDS)
        .filter(col(COL_STATUS).eq(lit("1")))
        .filter(col(COL_DEPARTMENT).str().contains(lit(DIGITS_ONLY), false))
        .with_columns([col(COL_DEPARTMENT).cast(DataType::Int64)])
        .select([
            col(COL_UPC),
            col(COL_PRODUCT),
            col(COL_CLASS),
            col(COL_DEPARTMENT),
        ])
        .collect()
        .with_context(|| format!("Failed to process catalog file {}", path))?;

    if df.height() == 0 {
        anyhow::bail!("No active products with a numeric department code in {}", path);
    }

    debug!(rows = df.height(), "catalog loaded");
    Ok(df)
}

/// Load the sales log as `transaction_id`/`upc` pairs.
///
/// Rows missing either field or carrying a non-numeric transaction id are
/// dropped before the id is cast to an integer.
pub fn load_transactions(path: &str) -> crate::Result<DataFrame> {
    let raw = read_pipe_delimited(path)?;

    let df = select_fields(raw, &TRANSACTION_FIELDS)
        .drop_nulls(None)
        .filter(col(COL_TRX).str().contains(lit(DIGITS_ONLY), false))
        .with_columns([col(COL_TRX).cast(DataType::Int64)])
        .collect()
        .with_context(|| format!("Failed to process transaction file {}", path))?;

    if df.height() == 0 {
        anyhow::bail!("No usable transaction rows in {}", path);
    }

    debug!(rows = df.height(), "transactions loaded");
    Ok(df)
}

/// Inner-join the sales log against the catalog on UPC.
///
/// Transactions referencing products absent from the filtered catalog fall
/// out of the result.
pub fn join_transactions(transactions: &DataFrame, catalog: &DataFrame) -> crate::Result<DataFrame> {
    let joined = transactions
        .clone()
        .lazy()
        .inner_join(catalog.clone().lazy(), col(COL_UPC), col(COL_UPC))
        .collect()
        .context("Failed to join transactions against the catalog")?;

    debug!(rows = joined.height(), "transactions joined to catalog");
    Ok(joined)
}

/// Count catalog products per department code, ascending by department.
pub fn department_counts(catalog: &DataFrame) -> crate::Result<Vec<(i64, u64)>> {
    let departments = catalog.column(COL_DEPARTMENT)?.i64()?;

    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for dept in departments.into_no_null_iter() {
        *counts.entry(dept).or_insert(0) += 1;
    }

    Ok(counts.into_iter().collect())
}

impl BasketData {
    /// Extract deduplicated basket entries from the joined frame.
    ///
    /// A product counts once per transaction no matter how many times it was
    /// scanned; the first occurrence of each (transaction, upc, name) row wins.
    pub fn from_frame(joined: &DataFrame) -> crate::Result<Self> {
        let trx = joined.column(COL_TRX)?.i64()?;
        let upc = joined.column(COL_UPC)?.str()?;
        let name = joined.column(COL_PRODUCT)?.str()?;

        let mut entries = Vec::with_capacity(joined.height());
        let mut seen = HashSet::with_capacity(joined.height());
        for ((t, u), n) in trx.into_iter().zip(upc.into_iter()).zip(name.into_iter()) {
            if let (Some(t), Some(u), Some(n)) = (t, u, n) {
                if seen.insert((t, u, n)) {
                    entries.push(BasketEntry {
                        transaction_id: t,
                        upc: u.to_string(),
                        product_name: n.to_string(),
                    });
                }
            }
        }

        if entries.is_empty() {
            anyhow::bail!("No transactions matched any catalog product");
        }

        let total_transactions = entries
            .iter()
            .map(|e| e.transaction_id)
            .collect::<HashSet<_>>()
            .len();
        let total_products = entries
            .iter()
            .map(|e| e.upc.as_str())
            .collect::<HashSet<_>>()
            .len();

        Ok(BasketData {
            entries,
            total_transactions,
            total_products,
        })
    }

    /// Per-item transaction counts and supports, most frequent first.
    ///
    /// Ties are broken by product name so the ordering is stable run to run.
    pub fn item_frequencies(&self) -> Vec<ItemFrequency> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.product_name.as_str()).or_insert(0) += 1;
        }

        let total = self.total_transactions as f64;
        let mut frequencies: Vec<ItemFrequency> = counts
            .into_iter()
            .map(|(name, count)| ItemFrequency {
                product_name: name.to_string(),
                count,
                support: count as f64 / total,
            })
            .collect();

        frequencies.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        frequencies
    }

    /// Group entries into per-transaction baskets of product names.
    ///
    /// Baskets come back in ascending transaction-id order.
    pub fn baskets(&self) -> Vec<Vec<String>> {
        let mut grouped: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for entry in &self.entries {
            grouped
                .entry(entry.transaction_id)
                .or_default()
                .push(entry.product_name.clone());
        }
        grouped.into_values().collect()
    }
}
