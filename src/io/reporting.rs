// src/io/reporting.rs

use std::error::Error;
use std::path::Path;

use crate::analysis::allocation::SolveOutcome;
use crate::analysis::engine::StrategyReport;
use crate::analysis::inventory::{InventoryPlan, Seasonality};

/// Formats a rupee amount with thousands separators, e.g. `₹1,234,567`.
pub fn fmt_currency(value: f64) -> String {
    let negative = value < 0.0;
    let mut digits = format!("{}", value.abs() as i64);
    let mut grouped = String::new();
    while digits.len() > 3 {
        let tail = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            tail
        } else {
            format!("{tail},{grouped}")
        };
    }
    grouped = if grouped.is_empty() {
        digits
    } else {
        format!("{digits},{grouped}")
    };
    if negative {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

pub fn fmt_pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// Writes the quarterly procurement plan to a CSV file, one row per quarter.
pub fn write_procurement_plan(file_path: &str, plan: &InventoryPlan) -> Result<(), Box<dyn Error>> {
    let path = Path::new(file_path);
    let mut wtr = csv::Writer::from_path(path)?;

    for quarter in &plan.quarters {
        wtr.serialize(quarter)?;
    }

    wtr.flush()?;
    println!(
        "Procurement plan ({} quarters) written to '{}'",
        plan.quarters.len(),
        file_path
    );
    Ok(())
}

/// Renders the full strategy report to the console.
pub fn print_report(report: &StrategyReport) {
    println!("\n=== Strategy Report: {} ===", report.product);

    if report.repaired_channels > 0 || report.repaired_regions > 0 {
        println!(
            "NOTE: {} channel and {} region values were missing and assigned at random;",
            report.repaired_channels, report.repaired_regions
        );
        println!("      per-channel and per-region splits below are indicative only.");
    }

    println!("\n--- 1. Historical Performance Audit ---");
    for (channel, m) in &report.historical.channel_metrics {
        println!(
            "{:<12} vol {:>8}  revenue {:>14}  net {:>14}  margin {:>6}",
            channel.name(),
            m.volume,
            fmt_currency(m.revenue),
            fmt_currency(m.net_profit),
            fmt_pct(m.margin_pct),
        );
    }
    println!(
        "Historical profit: {}   lost to stockouts: {}   logistics spend: {}",
        fmt_currency(report.historical.total_profit),
        fmt_currency(report.historical.total_lost_opportunity),
        fmt_currency(report.historical.total_logistics),
    );

    println!("\n--- 2. Demand Forecast ---");
    for (model, err) in &report.forecast.errors {
        let marker = if *model == report.forecast.winner { "  <- winner" } else { "" };
        println!("{model:<20} sMAPE {err:>7.2}{marker}");
    }
    println!(
        "Forecast annual demand (next 365 days): {} units",
        report.forecast.annual_demand
    );

    println!("\n--- 3. Fulfilment Network ---");
    for s in &report.network.scenarios {
        let marker = if s.hub_count == report.network.best_hub_count {
            "  <- recommended"
        } else {
            ""
        };
        println!(
            "{} hub(s): {:<45} rent {:>13} shipping {:>13} total {:>13}{}",
            s.hub_count,
            s.hubs.join(", "),
            fmt_currency(s.annual_rent),
            fmt_currency(s.annual_shipping),
            fmt_currency(s.total_cost),
            marker,
        );
    }
    println!("Location advice: {}", report.relocation.advice);

    println!("\n--- 4. Inventory Procurement Plan ---");
    println!(
        "EOQ {} units/batch   holding {}   ordering {}   total {}   capital tied up {}",
        report.inventory.eoq,
        fmt_currency(report.inventory.annual_holding_cost),
        fmt_currency(report.inventory.annual_ordering_cost),
        fmt_currency(report.inventory.total_annual_cost),
        fmt_currency(report.inventory.avg_capital),
    );
    for q in &report.inventory.quarters {
        let season = match q.seasonality {
            Seasonality::Peak => "Peak",
            Seasonality::Standard => "Standard",
        };
        let risk = if q.stockout_probability < 0.05 { "Low" } else { "Moderate" };
        println!(
            "{:<14} {:<9} demand {:>8}  batches {:>3}  capital {:>14}  stockout risk {:>5.2}% ({})",
            q.label,
            season,
            q.demand,
            q.batches,
            fmt_currency(q.capital),
            q.stockout_probability * 100.0,
            risk,
        );
    }

    println!("\n--- 5. Optimized Channel Plan ---");
    if let SolveOutcome::Fallback { reason } = &report.projection.profit_plan.outcome {
        println!("WARNING: allocation solver fell back to the fixed split ({reason})");
    }
    println!(
        "Allocated volume: {} units at blended shipping {}/unit",
        report.projection.effective_inventory,
        fmt_currency(report.projection.unit_shipping_cost),
    );
    for (channel, f) in &report.projection.channel_financials {
        println!(
            "{:<12} vol {:>8}  revenue {:>14}  net {:>14}  margin {:>6}",
            channel.name(),
            f.volume,
            fmt_currency(f.revenue),
            fmt_currency(f.net_profit),
            fmt_pct(f.margin_pct),
        );
    }
    println!(
        "Recaptured stockout profit: {}",
        fmt_currency(report.projection.recaptured_profit)
    );
    println!(
        "Projected profit: {}   vs historical {}   lift {}",
        fmt_currency(report.projection.total_profit),
        fmt_currency(report.historical.total_profit),
        fmt_currency(report.profit_lift()),
    );

    println!("\n--- 6. War Gaming ---");
    for w in &report.war_games {
        println!(
            "{:<28} profit {:>14}  impact {:>14}  risk {}",
            w.name,
            fmt_currency(w.projected_profit),
            fmt_currency(w.delta),
            w.risk.label(),
        );
    }
}
