//! BasketForge: A Rust CLI application for market basket analysis using apriori
//! association rule mining
//!
//! This library provides functionality for joining retail point-of-sale
//! transactions against a product catalog, mining frequent itemsets and
//! association rules from the resulting baskets, and reporting the results
//! as newline-delimited JSON, a printed rule table, and a frequency chart.

pub mod cli;
pub mod data;
pub mod miner;
pub mod rules;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{
    department_counts, join_transactions, load_catalog, load_transactions, BasketData,
    BasketEntry, ItemFrequency,
};
pub use miner::{mine_association_rules, ItemsetRecord, MinerParams, RuleStat};
pub use rules::{flatten_records, print_rule_table, write_records, RuleRow};
pub use viz::{create_frequency_chart, print_item_statistics};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
