use tracing::info;

use crate::analysis::history::{reconstruct_history, regional_demand_shares, HistoricalAudit};
use crate::analysis::inventory::{plan_inventory, InventoryPlan};
use crate::analysis::network::{optimize_network, relocation_strategy, NetworkPlan, RelocationAdvice};
use crate::analysis::scenario::{project, war_games, Projection, WarGameScenario};
use crate::forecast::tournament::{run_tournament, ForecastOutcome};
use crate::io::dataset::SalesDataset;
use crate::model::config::AnalysisParams;

/// Everything one analysis run produced, in the shape the reporting layer
/// consumes. Constructed fresh per run; nothing in here is shared or cached
/// across runs.
#[derive(Debug)]
pub struct StrategyReport {
    pub product: String,
    /// Mean unit price across the analysed rows.
    pub average_price: f64,
    pub historical: HistoricalAudit,
    pub relocation: RelocationAdvice,
    pub forecast: ForecastOutcome,
    pub network: NetworkPlan,
    pub inventory: InventoryPlan,
    pub projection: Projection,
    pub war_games: Vec<WarGameScenario>,
    /// Carried through from ingestion so reports can caveat fabricated
    /// channel/region splits.
    pub repaired_channels: usize,
    pub repaired_regions: usize,
}

impl StrategyReport {
    /// Projected profit lift over the reconstructed historical baseline.
    pub fn profit_lift(&self) -> f64 {
        self.projection.total_profit - self.historical.total_profit
    }
}

/// Runs the full decision pipeline over one dataset.
///
/// Stages run in dependency order: historical audit and forecast off the
/// raw rows, then the hub network off forecast demand and regional mix,
/// then inventory sizing, then the allocation-and-projection pass, then
/// stress scenarios against the projected profit. Degenerate inputs flow
/// through as degenerate (but well-formed) outputs; this function does not
/// fail.
pub fn run_analysis(dataset: &SalesDataset, params: &AnalysisParams) -> StrategyReport {
    let rows = dataset.select(&params.product);
    info!(
        product = params.product.label(),
        rows = rows.len(),
        "starting analysis run"
    );

    let historical = reconstruct_history(&rows);
    let region_shares = regional_demand_shares(&rows);
    let relocation = relocation_strategy(&region_shares);

    let average_price = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.price).sum::<f64>() / rows.len() as f64
    };

    let forecast = run_tournament(&rows, params.growth_rate_pct);
    info!(
        winner = forecast.winner,
        annual_demand = forecast.annual_demand,
        "forecast tournament complete"
    );

    let network = optimize_network(&region_shares, forecast.annual_demand);
    info!(best_hubs = network.best_hub_count, "network optimization complete");

    let inventory = plan_inventory(
        forecast.annual_demand,
        average_price,
        params.holding_pct,
        params.ordering_cost,
    );

    let historical_volume = historical.total_volume();
    let volume_override = if params.match_historical_volume && historical_volume > 0 {
        Some(historical_volume)
    } else {
        None
    };

    let projection = project(forecast.annual_demand, average_price, &network, volume_override);
    let war_games = war_games(projection.total_profit, forecast.annual_demand, average_price);
    info!(
        projected_profit = projection.total_profit,
        historical_profit = historical.total_profit,
        "analysis run complete"
    );

    StrategyReport {
        product: params.product.label().to_owned(),
        average_price,
        historical,
        relocation,
        forecast,
        network,
        inventory,
        projection,
        war_games,
        repaired_channels: dataset.repaired_channels,
        repaired_regions: dataset.repaired_regions,
    }
}
