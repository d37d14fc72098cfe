//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::miner::MinerParams;

/// Market basket analysis CLI mining association rules from retail transactions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the pipe-delimited product catalog file
    #[arg(short, long)]
    pub catalog: String,

    /// Path to the pipe-delimited sales transaction file
    #[arg(short, long)]
    pub transactions: String,

    /// Output path for the mined rule records (one JSON object per line)
    #[arg(short, long, default_value = "json_rules.txt")]
    pub output: String,

    /// Output path for the item frequency chart
    #[arg(short, long, default_value = "item_frequency.png")]
    pub plot: String,

    /// Minimum fraction of transactions an itemset must appear in
    #[arg(long, default_value = "0.0005")]
    pub min_support: f64,

    /// Minimum confidence a rule must reach to be reported
    #[arg(long, default_value = "0.6")]
    pub min_confidence: f64,

    /// Minimum lift a rule must reach to be reported
    #[arg(long, default_value = "1.0")]
    pub min_lift: f64,

    /// Smallest itemset size to report
    #[arg(long, default_value = "2")]
    pub min_length: usize,

    /// Largest itemset size to grow to (unbounded when omitted)
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Number of most frequent items to include in the chart
    #[arg(long, default_value = "200")]
    pub top_items: usize,

    /// Number of rules to print in the summary table
    #[arg(long, default_value = "15")]
    pub top_rules: usize,

    /// Log level for diagnostic output (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Mining parameters assembled from the threshold flags
    pub fn miner_params(&self) -> MinerParams {
        MinerParams {
            min_support: self.min_support,
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            min_length: self.min_length,
            max_length: self.max_length,
        }
    }
}
