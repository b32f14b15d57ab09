use std::collections::BTreeMap;

use crate::model::config::{ChannelKind, ChannelProfile, COGS_RATE};
use crate::model::metrics::ChannelFinancials;
use crate::model::record::{Channel, Region, SalesRecord};

/// Per-unit shipping under the legacy single-warehouse network. Marketplace
/// volume moves in bulk to fulfilment centres but with suboptimal routing;
/// direct orders pay long-haul last mile from one warehouse.
const LEGACY_UNIT_SHIPPING_MARKETPLACE: f64 = 50.0;
const LEGACY_UNIT_SHIPPING_D2C: f64 = 70.0;

/// Share of realized volume assumed lost to stockouts under naive inventory
/// planning, and the net margin those lost sales would have carried.
const LOST_SALES_RATE: f64 = 0.10;
const LOST_SALES_MARGIN: f64 = 0.30;

/// Reconstructed cost structure and profit of the historical business.
#[derive(Debug, Clone)]
pub struct HistoricalAudit {
    pub channel_metrics: BTreeMap<Channel, ChannelFinancials>,
    /// Estimated profit foregone to stockouts, per channel.
    pub lost_opportunity: BTreeMap<Channel, f64>,
    pub total_profit: f64,
    pub total_lost_opportunity: f64,
    pub total_logistics: f64,
}

impl HistoricalAudit {
    /// Realized units across all channels.
    pub fn total_volume(&self) -> u64 {
        self.channel_metrics.values().map(|m| m.volume).sum()
    }
}

/// Estimates what the historical book actually earned per channel.
///
/// The input schema carries revenue-side facts only, so the cost side is
/// reconstructed: COGS at the fixed rate, platform fees from the channel
/// profile, shipping at the legacy per-unit assumptions, marketing from
/// observed ad spend. Degenerate inputs (no rows, one channel) produce a
/// correspondingly thin audit rather than an error.
pub fn reconstruct_history(records: &[SalesRecord]) -> HistoricalAudit {
    let mut channel_metrics = BTreeMap::new();
    let mut lost_opportunity = BTreeMap::new();
    let mut total_profit = 0.0;
    let mut total_lost = 0.0;
    let mut total_logistics = 0.0;

    for channel in Channel::ALL {
        let rows: Vec<&SalesRecord> = records.iter().filter(|r| r.channel == channel).collect();
        if rows.is_empty() {
            continue;
        }

        let volume: u64 = rows.iter().map(|r| u64::from(r.quantity_sold)).sum();
        let avg_price = rows.iter().map(|r| r.price).sum::<f64>() / rows.len() as f64;
        let revenue = volume as f64 * avg_price;

        let profile = ChannelProfile::for_channel(channel);
        let cogs = revenue * COGS_RATE;
        let fees = revenue * profile.referral_fee + volume as f64 * profile.closing_fee;
        let unit_shipping = match profile.kind {
            ChannelKind::Marketplace => LEGACY_UNIT_SHIPPING_MARKETPLACE,
            ChannelKind::D2C => LEGACY_UNIT_SHIPPING_D2C,
        };
        let logistics = volume as f64 * unit_shipping;
        let marketing: f64 = rows.iter().map(|r| r.ad_spend).sum();

        let financials =
            ChannelFinancials::from_components(volume, revenue, cogs, fees, logistics, marketing);

        let lost_volume = (volume as f64 * LOST_SALES_RATE) as u64;
        let lost_profit = lost_volume as f64 * avg_price * LOST_SALES_MARGIN;

        total_profit += financials.net_profit;
        total_logistics += logistics;
        total_lost += lost_profit;
        channel_metrics.insert(channel, financials);
        lost_opportunity.insert(channel, lost_profit);
    }

    HistoricalAudit {
        channel_metrics,
        lost_opportunity,
        total_profit,
        total_lost_opportunity: total_lost,
        total_logistics,
    }
}

/// Fraction of historical volume shipped into each region. Empty when there
/// are no rows; callers fall back to a nominal national mix.
pub fn regional_demand_shares(records: &[SalesRecord]) -> BTreeMap<Region, f64> {
    let mut volumes: BTreeMap<Region, u64> = BTreeMap::new();
    for r in records {
        *volumes.entry(r.region).or_insert(0) += u64::from(r.quantity_sold);
    }
    let total: u64 = volumes.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    volumes
        .into_iter()
        .map(|(region, v)| (region, v as f64 / total as f64))
        .collect()
}
