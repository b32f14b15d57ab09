use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::allocation::{solve_channel_mix, AllocationPlan, AllocationStrategy};
use crate::analysis::network::NetworkPlan;
use crate::model::config::{ChannelKind, ChannelProfile, COGS_RATE};
use crate::model::metrics::ChannelFinancials;
use crate::model::record::Channel;

/// Per-unit shipping assumed when the network gives no usable figure.
const FALLBACK_UNIT_SHIPPING: f64 = 35.0;
/// Marketplace volume ships in bulk to fulfilment centres at a discount to
/// the network's blended per-unit cost.
const MARKETPLACE_BULK_FACTOR: f64 = 0.75;
/// Retargeting and lookalike audiences cut acquisition cost by a quarter.
const MARKETING_EFFICIENCY_FACTOR: f64 = 0.75;
/// Negotiated platform-fee discount at committed volume.
const FEE_NEGOTIATION_FACTOR: f64 = 0.95;
/// Disciplined replenishment recaptures the historical stockout losses:
/// 10% extra sales at a 30% margin.
const RECAPTURE_SALES_RATE: f64 = 0.10;
const RECAPTURE_MARGIN: f64 = 0.30;

/// Financial projection of the optimized plan.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Units the committed (profit-strategy) allocation was solved over.
    pub effective_inventory: u64,
    /// Blended per-unit shipping from the chosen hub network.
    pub unit_shipping_cost: f64,
    pub profit_plan: AllocationPlan,
    pub brand_plan: AllocationPlan,
    pub balanced_plan: AllocationPlan,
    /// Channel-level financials of the committed plan.
    pub channel_financials: BTreeMap<Channel, ChannelFinancials>,
    /// Stockout-recapture bonus folded into the total.
    pub recaptured_profit: f64,
    pub total_profit: f64,
}

/// Qualitative exposure tag for a war-game scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Opportunity,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Opportunity => "Opportunity",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WarGameScenario {
    pub name: &'static str,
    /// Profit under the stress, i.e. baseline plus delta.
    pub projected_profit: f64,
    /// Absolute profit impact; negative for threats.
    pub delta: f64,
    pub risk: RiskLevel,
}

/// Projects profit under the optimized network, allocation and inventory
/// discipline.
///
/// When `historical_volume_override` is set, the committed allocation is
/// solved over that volume so the projection compares with the historical
/// baseline on identical units; the brand and balanced solves always run on
/// the forecast, since they exist to show strategy shape, not to reconcile.
pub fn project(
    forecast_demand: u64,
    price: f64,
    network: &NetworkPlan,
    historical_volume_override: Option<u64>,
) -> Projection {
    let effective_inventory = match historical_volume_override {
        Some(v) if v > 0 => v,
        _ => forecast_demand,
    };

    let unit_shipping_cost = match network.best_scenario() {
        Some(best) if effective_inventory > 0 => {
            best.annual_shipping / effective_inventory as f64
        }
        _ => {
            debug!(
                effective_inventory,
                "no usable network figure; using fallback per-unit shipping"
            );
            FALLBACK_UNIT_SHIPPING
        }
    };

    let profit_plan = solve_channel_mix(effective_inventory, price, AllocationStrategy::Profit);
    let brand_plan = solve_channel_mix(forecast_demand, price, AllocationStrategy::Brand);
    let balanced_plan = solve_channel_mix(forecast_demand, price, AllocationStrategy::Balanced);

    let mut channel_financials = BTreeMap::new();
    let mut total_revenue = 0.0;
    let mut operating_profit = 0.0;

    for (&channel, &qty) in &profit_plan.allocation {
        if qty == 0 {
            continue;
        }
        let profile = ChannelProfile::for_channel(channel);
        let revenue = qty as f64 * price;
        let cogs = revenue * COGS_RATE;
        let logistics = match profile.kind {
            ChannelKind::D2C => qty as f64 * unit_shipping_cost,
            ChannelKind::Marketplace => qty as f64 * unit_shipping_cost * MARKETPLACE_BULK_FACTOR,
        };
        let marketing = revenue * profile.marketing_cac * MARKETING_EFFICIENCY_FACTOR;
        let fees = (revenue * profile.referral_fee + qty as f64 * profile.closing_fee)
            * FEE_NEGOTIATION_FACTOR;

        let financials =
            ChannelFinancials::from_components(qty, revenue, cogs, fees, logistics, marketing);
        total_revenue += revenue;
        operating_profit += financials.net_profit;
        channel_financials.insert(channel, financials);
    }

    let recaptured_profit = total_revenue * RECAPTURE_SALES_RATE * RECAPTURE_MARGIN;

    Projection {
        effective_inventory,
        unit_shipping_cost,
        profit_plan,
        brand_plan,
        balanced_plan,
        channel_financials,
        recaptured_profit,
        total_profit: operating_profit + recaptured_profit,
    }
}

/// Stress-tests the projected profit against external market shifts. Each
/// scenario reports the absolute impact against the baseline.
pub fn war_games(base_profit: f64, annual_demand: u64, price: f64) -> Vec<WarGameScenario> {
    let demand = annual_demand as f64;

    // A 2-point platform fee hike hitting half the volume.
    let fee_hike = price * demand * 0.5 * 0.02;
    // An 8% across-the-board markdown to match a price war.
    let price_war = price * 0.08 * demand;
    // A 30% logistics saving on the legacy 50/unit baseline.
    let logistics_gain = demand * 50.0 * 0.30;

    vec![
        WarGameScenario {
            name: "Amazon Fee Hike (+2%)",
            projected_profit: base_profit - fee_hike,
            delta: -fee_hike,
            risk: RiskLevel::Medium,
        },
        WarGameScenario {
            name: "Price War (-8%)",
            projected_profit: base_profit - price_war,
            delta: -price_war,
            risk: RiskLevel::High,
        },
        WarGameScenario {
            name: "Multi-Hub Optimization",
            projected_profit: base_profit + logistics_gain,
            delta: logistics_gain,
            risk: RiskLevel::Opportunity,
        },
    ]
}
