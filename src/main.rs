use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use chain_strategist::io::dataset::SalesDataset;
use chain_strategist::io::reporting::{print_report, write_procurement_plan};
use chain_strategist::io::synthetic::{demo_catalog, generate_sales_history};
use chain_strategist::{run_analysis, AnalysisParams, ProductFilter};

const DEFAULT_SEED: u64 = 2024;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Supply-Chain Strategy Engine ===");

    // 1. LOAD DATA
    // First argument: a sales CSV (date, product_id, price, quantity_sold,
    // and optionally channel, region, ad_spend). Without one, a seeded
    // synthetic two-year history stands in so the pipeline can be explored.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);

    let dataset = match args.first() {
        Some(path) => SalesDataset::from_path(path, &mut rng)
            .with_context(|| format!("loading sales data from '{path}'"))?,
        None => {
            println!("No dataset supplied; generating a synthetic demo history.");
            SalesDataset::from_records(generate_sales_history(730, &demo_catalog(), &mut rng))
        }
    };

    if let Some((from, to)) = dataset.date_range() {
        println!(
            "Loaded {} records from {} to {} ({} products).",
            dataset.len(),
            from,
            to,
            dataset.product_ids().len()
        );
    }

    // 2. CONFIGURE THE RUN
    // Second argument narrows the analysis to one product id.
    let product = match args.get(1) {
        Some(id) => ProductFilter::Product(id.clone()),
        None => ProductFilter::All,
    };
    let params = AnalysisParams { product, ..AnalysisParams::default() };

    // 3. RUN THE PIPELINE
    let report = run_analysis(&dataset, &params);

    // 4. PRESENT RESULTS
    print_report(&report);

    let output_file = "procurement_plan.csv";
    if let Err(e) = write_procurement_plan(output_file, &report.inventory) {
        eprintln!("Error writing procurement plan: {e}");
    }

    println!("\nAnalysis complete.");
    Ok(())
}
