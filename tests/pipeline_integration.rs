use rand::rngs::StdRng;
use rand::SeedableRng;

use chain_strategist::analysis::allocation::SolveOutcome;
use chain_strategist::io::synthetic::{demo_catalog, generate_sales_history};
use chain_strategist::model::config::ChannelProfile;
use chain_strategist::model::record::Channel;
use chain_strategist::{run_analysis, AnalysisParams, ProductFilter, SalesDataset};

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

/// Two seeded years of multi-product history, enough for a full train/test
/// split plus a forecast horizon.
fn sample_dataset(seed: u64) -> SalesDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    SalesDataset::from_records(generate_sales_history(730, &demo_catalog(), &mut rng))
}

/// A CSV slice missing the channel and region columns entirely.
fn bare_csv() -> String {
    let mut csv = String::from("date,product_id,price,quantity_sold,ad_spend\n");
    for day in 1..=28 {
        csv.push_str(&format!("2024-02-{day:02},WIDGET,1500.0,{},75.0\n", 10 + day % 4));
    }
    csv
}

// ---------------------------------------------------------------------------
// End-to-end pipeline
// ---------------------------------------------------------------------------

#[test]
fn full_run_reconciles_volumes_and_money() {
    let dataset = sample_dataset(7);
    let report = run_analysis(&dataset, &AnalysisParams::default());

    // Forecast published a full-year curve and a positive demand signal.
    assert_eq!(report.forecast.future_curve.len(), 365);
    assert!(report.forecast.annual_demand > 0);
    let curve_sum: u64 = report.forecast.future_curve.iter().map(|&v| u64::from(v)).sum();
    assert_eq!(curve_sum, report.forecast.annual_demand);

    // The winner's holdout error is the tournament minimum.
    let winner_err = report.forecast.errors[report.forecast.winner];
    assert!(report.forecast.errors.values().all(|e| winner_err <= *e));

    // Committed allocation covers the historical volume exactly (volume
    // matching defaults on) and respects every traffic cap.
    assert_eq!(report.projection.profit_plan.outcome, SolveOutcome::Optimal);
    let volume = report.historical.total_volume();
    let allocated: u64 = report.projection.profit_plan.allocation.values().sum();
    assert_eq!(allocated, volume);
    for (&ch, &qty) in &report.projection.profit_plan.allocation {
        let cap = ChannelProfile::for_channel(ch).traffic_score;
        assert!(qty as f64 <= volume as f64 * cap + 0.5, "{ch:?} exceeds its traffic cap");
    }

    // Channel financials obey the accounting identity in both eras.
    for metrics in report
        .historical
        .channel_metrics
        .values()
        .chain(report.projection.channel_financials.values())
    {
        let recomputed =
            metrics.revenue - (metrics.cogs + metrics.fees + metrics.logistics + metrics.marketing);
        assert!((metrics.net_profit - recomputed).abs() < 1e-6);
    }

    // Network offers exactly the 1/2/3-hub menu and recommends the cheapest.
    assert_eq!(report.network.scenarios.len(), 3);
    let best = report.network.best_scenario().expect("best scenario present");
    for s in &report.network.scenarios {
        assert!(best.total_cost <= s.total_cost + 1e-9);
    }

    // War games stress the projected baseline in both directions.
    assert_eq!(report.war_games.len(), 3);
    assert!(report.war_games.iter().any(|w| w.delta > 0.0));
    assert!(report.war_games.iter().any(|w| w.delta < 0.0));
}

#[test]
fn pipeline_is_bit_for_bit_reproducible() {
    let a = run_analysis(&sample_dataset(21), &AnalysisParams::default());
    let b = run_analysis(&sample_dataset(21), &AnalysisParams::default());

    assert_eq!(a.forecast.winner, b.forecast.winner);
    assert_eq!(a.forecast.future_curve, b.forecast.future_curve);
    assert_eq!(a.projection.profit_plan.allocation, b.projection.profit_plan.allocation);
    assert_eq!(a.projection.total_profit.to_bits(), b.projection.total_profit.to_bits());
    assert_eq!(a.historical.total_profit.to_bits(), b.historical.total_profit.to_bits());
    assert_eq!(a.inventory.eoq, b.inventory.eoq);
}

#[test]
fn repaired_dataset_flags_flow_into_the_report() {
    let mut rng = StdRng::seed_from_u64(3);
    let dataset = SalesDataset::from_reader(bare_csv().as_bytes(), &mut rng)
        .expect("bare dataset should load with repair");
    assert_eq!(dataset.repaired_channels, 28);
    assert_eq!(dataset.repaired_regions, 28);

    let report = run_analysis(&dataset, &AnalysisParams::default());
    assert_eq!(report.repaired_channels, 28);
    assert_eq!(report.repaired_regions, 28);
    // 28 days is below the holdout window, so every forecaster disqualifies
    // and downstream stages degrade without failing.
    assert_eq!(report.forecast.annual_demand, 0);
    assert!(report.projection.total_profit.is_finite());
}

#[test]
fn single_product_run_matches_its_slice_of_history() {
    let dataset = sample_dataset(5);
    let params = AnalysisParams {
        product: ProductFilter::Product("SMART_WATCH".to_owned()),
        ..AnalysisParams::default()
    };
    let report = run_analysis(&dataset, &params);
    assert_eq!(report.product, "SMART_WATCH");
    assert!(report.historical.total_volume() > 0);

    let full = run_analysis(&dataset, &AnalysisParams::default());
    assert!(report.historical.total_volume() < full.historical.total_volume());
    assert!(report.forecast.annual_demand < full.forecast.annual_demand);
}

#[test]
fn marketplace_brand_channels_all_receive_stock() {
    let dataset = sample_dataset(9);
    let report = run_analysis(&dataset, &AnalysisParams::default());
    // Profit-strategy business floors keep every channel present.
    for ch in Channel::ALL {
        assert!(
            report.projection.profit_plan.allocation[&ch] > 0,
            "{ch:?} was starved despite its floor"
        );
    }
}
