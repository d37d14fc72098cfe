//! Visualization functions using Plotters for item frequency reporting

use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::data::{BasketData, ItemFrequency};
use crate::rules::truncate_label;

// Shading endpoints for the ranked bars, darkest blue down to pale blue.
const BAR_DARK: RGBColor = RGBColor(8, 48, 107);
const BAR_LIGHT: RGBColor = RGBColor(198, 219, 239);

const PANEL_ROWS: usize = 2;
const PANEL_COLS: usize = 2;

/// Bar fill for the item at `rank` out of `total` charted items.
fn bar_color(rank: usize, total: usize) -> RGBColor {
    let t = if total <= 1 {
        0.0
    } else {
        rank as f64 / (total - 1) as f64
    };
    let channel = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
    RGBColor(
        channel(BAR_DARK.0, BAR_LIGHT.0),
        channel(BAR_DARK.1, BAR_LIGHT.1),
        channel(BAR_DARK.2, BAR_LIGHT.2),
    )
}

/// Create the item frequency bar chart.
///
/// The `top_items` most frequent items are split across a 2x2 grid of
/// panels in rank order. All panels share the same y scale, bars fade from
/// dark to light with rank, and item names run vertically under each bar.
///
/// # Arguments
/// * `frequencies` - Item frequencies, most frequent first
/// * `top_items` - Number of leading items to chart
/// * `output_path` - Path to save the PNG chart
///
/// # Returns
/// * Result indicating success or failure
pub fn create_frequency_chart(
    frequencies: &[ItemFrequency],
    top_items: usize,
    output_path: &str,
) -> crate::Result<()> {
    let shown = frequencies.len().min(top_items);
    if shown == 0 {
        anyhow::bail!("No item frequencies available to chart");
    }
    let top = &frequencies[..shown];

    let y_max = top.iter().map(|f| f.count).max().unwrap_or(1) as f64 * 1.05;
    let per_panel = (shown + PANEL_ROWS * PANEL_COLS - 1) / (PANEL_ROWS * PANEL_COLS);

    let root = BitMapBackend::new(output_path, (1600, 1200)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Item Frequency Visualization", ("sans-serif", 30))?;
    let panels = root.split_evenly((PANEL_ROWS, PANEL_COLS));

    for (panel_idx, panel) in panels.iter().enumerate() {
        let start = panel_idx * per_panel;
        if start >= shown {
            break;
        }
        let slice = &top[start..(start + per_panel).min(shown)];
        let names: Vec<String> = slice.iter().map(|f| f.product_name.clone()).collect();

        let mut chart = ChartBuilder::on(panel)
            .margin(10)
            .x_label_area_size(150)
            .y_label_area_size(60)
            .build_cartesian_2d(0usize..slice.len(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slice.len() + 1)
            .x_label_formatter(&|idx: &usize| names.get(*idx).cloned().unwrap_or_default())
            .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
            .y_desc("Item Frequency")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        for (i, freq) in slice.iter().enumerate() {
            let color = bar_color(start + i, shown);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(i, 0.0), (i + 1, freq.count as f64)],
                color.filled(),
            )))?;
        }
    }

    root.present()?;
    println!("Item frequency chart saved to: {}", output_path);

    Ok(())
}

/// Print corpus totals and the most frequent items to console
pub fn print_item_statistics(data: &BasketData, frequencies: &[ItemFrequency], limit: usize) {
    println!("\n=== Item Statistics ===");
    println!("Total transactions: {}", data.total_transactions);
    println!("Distinct products sold: {}", data.total_products);
    println!("Basket entries: {}", data.entries.len());

    println!("\nTop items by transaction frequency:");
    println!("  {:<44} | {:>9} | {:>8}", "Product", "Count", "Support");
    println!("  {}", "-".repeat(67));
    for freq in frequencies.iter().take(limit) {
        println!(
            "  {:<44} | {:>9} | {:>8.5}",
            truncate_label(&freq.product_name, 44),
            freq.count,
            freq.support
        );
    }
    if frequencies.len() > limit {
        println!("  ... and {} more products", frequencies.len() - limit);
    }
}
