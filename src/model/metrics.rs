use serde::Serialize;

/// Full financial breakdown for one channel over one period. Both the
/// historical audit and the forward projection report in this shape, so the
/// two are directly comparable line by line.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelFinancials {
    pub volume: u64,
    pub revenue: f64,
    pub cogs: f64,
    pub fees: f64,
    pub logistics: f64,
    pub marketing: f64,
    pub net_profit: f64,
    pub margin_pct: f64,
}

impl ChannelFinancials {
    /// Builds the breakdown from its cost components. Net profit and margin
    /// are always derived here, never assigned independently, so
    /// `net_profit == revenue - (cogs + fees + logistics + marketing)`
    /// holds for every instance.
    pub fn from_components(
        volume: u64,
        revenue: f64,
        cogs: f64,
        fees: f64,
        logistics: f64,
        marketing: f64,
    ) -> Self {
        let net_profit = revenue - (cogs + fees + logistics + marketing);
        let margin_pct = if revenue > 0.0 {
            net_profit / revenue * 100.0
        } else {
            0.0
        };
        Self {
            volume,
            revenue,
            cogs,
            fees,
            logistics,
            marketing,
            net_profit,
            margin_pct,
        }
    }
}
