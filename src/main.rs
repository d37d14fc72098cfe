//! BasketForge: Market basket analysis CLI mining association rules from
//! retail point-of-sale data
//!
//! This is the main entrypoint that orchestrates data loading, frequency
//! reporting, rule mining, and output generation.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use basketforge::{
    create_frequency_chart, department_counts, flatten_records, join_transactions, load_catalog,
    load_transactions, mine_association_rules, print_item_statistics, print_rule_table,
    write_records, Args, BasketData,
};

const TOP_ITEM_PREVIEW: usize = 20;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.verbose {
        println!("BasketForge - Market Basket Analysis");
        println!("====================================\n");
    }

    run_pipeline(&args)
}

/// Initialize the tracing subscriber, honoring RUST_LOG when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the full market basket pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Market Basket Pipeline ===\n");

    let start_time = Instant::now();
    info!(catalog = %args.catalog, transactions = %args.transactions, "starting pipeline");

    // Step 1: Load the product catalog
    if args.verbose {
        println!("Step 1: Loading product catalog");
        println!("  Input file: {}", args.catalog);
    }

    let catalog_start = Instant::now();
    let catalog = load_catalog(&args.catalog)?;

    println!("✓ Catalog loaded: {} active products", catalog.height());
    if args.verbose {
        println!("  Processing time: {:.2}s", catalog_start.elapsed().as_secs_f64());
        println!("  Products per department:");
        for (dept, count) in department_counts(&catalog)? {
            println!("    Department {:>4}: {} products", dept, count);
        }
    }

    // Step 2: Load the sales log
    if args.verbose {
        println!("\nStep 2: Loading transactions");
        println!("  Input file: {}", args.transactions);
    }

    let trx_start = Instant::now();
    let transactions = load_transactions(&args.transactions)?;

    println!("✓ Transactions loaded: {} rows", transactions.height());
    if args.verbose {
        println!("  Processing time: {:.2}s", trx_start.elapsed().as_secs_f64());
    }

    // Step 3: Join against the catalog and build baskets
    if args.verbose {
        println!("\nStep 3: Joining transactions to catalog");
    }

    let joined = join_transactions(&transactions, &catalog)?;
    let data = BasketData::from_frame(&joined)?;

    println!(
        "✓ Baskets built: {} entries across {} transactions ({} distinct products)",
        data.entries.len(),
        data.total_transactions,
        data.total_products
    );

    // Step 4: Item frequencies and chart
    let frequencies = data.item_frequencies();
    print_item_statistics(&data, &frequencies, TOP_ITEM_PREVIEW);

    if args.verbose {
        println!("\nStep 4: Rendering item frequency chart");
        println!("  Output file: {}", args.plot);
    }

    let chart_start = Instant::now();
    create_frequency_chart(&frequencies, args.top_items, &args.plot)?;
    if args.verbose {
        println!("  Rendering time: {:.2}s", chart_start.elapsed().as_secs_f64());
    }

    // Step 5: Mine association rules
    let params = args.miner_params();
    if args.verbose {
        println!("\nStep 5: Mining association rules");
        println!("  Min support: {}", params.min_support);
        println!("  Min confidence: {}", params.min_confidence);
        println!("  Min lift: {}", params.min_lift);
        println!("  Min length: {}", params.min_length);
        match params.max_length {
            Some(max) => println!("  Max length: {}", max),
            None => println!("  Max length: unbounded"),
        }
    }

    let mine_start = Instant::now();
    let baskets = data.baskets();
    let records = mine_association_rules(&baskets, &params)?;

    println!("✓ Mined {} frequent itemset records", records.len());
    if args.verbose {
        println!("  Mining time: {:.2}s", mine_start.elapsed().as_secs_f64());
    }

    // Step 6: Write records and print the ranked rule table
    write_records(&records, &args.output)?;
    println!("✓ Rule records written to: {}", args.output);

    let rows = flatten_records(&records);
    println!("\n=== Top Association Rules ===");
    print_rule_table(&rows, args.top_rules);

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
