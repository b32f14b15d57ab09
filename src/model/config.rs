use crate::model::record::{Channel, Region};

/// Cost of goods sold, as a fraction of revenue. Bulk-sourcing margin at
/// e-commerce scale; the input schema carries no row-level cost data.
pub const COGS_RATE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Third-party marketplace: referral fees, bulk shipping to fulfilment centres.
    Marketplace,
    /// Direct-to-consumer: gateway fees only, last-mile shipping, paid acquisition.
    D2C,
}

/// Per-channel fee, logistics and marketing economics.
#[derive(Debug, Clone, Copy)]
pub struct ChannelProfile {
    pub kind: ChannelKind,
    /// Platform commission as a fraction of revenue. In [0, 1].
    pub referral_fee: f64,
    /// Fixed fee per unit sold.
    pub closing_fee: f64,
    /// Maximum fraction of inventory this channel can absorb. In [0, 1].
    pub traffic_score: f64,
    /// Customer-acquisition spend as a fraction of revenue.
    pub marketing_cac: f64,
}

const AMAZON: ChannelProfile = ChannelProfile {
    kind: ChannelKind::Marketplace,
    referral_fee: 0.15,
    closing_fee: 30.0,
    traffic_score: 0.50,
    marketing_cac: 0.05,
};

const FLIPKART: ChannelProfile = ChannelProfile {
    kind: ChannelKind::Marketplace,
    referral_fee: 0.13,
    closing_fee: 20.0,
    traffic_score: 0.40,
    marketing_cac: 0.06,
};

const OWN_WEBSITE: ChannelProfile = ChannelProfile {
    kind: ChannelKind::D2C,
    referral_fee: 0.03,
    closing_fee: 0.0,
    traffic_score: 0.35,
    marketing_cac: 0.20,
};

impl ChannelProfile {
    /// Economics for a channel. Total over the enum, so there is no
    /// unknown-channel case to default away.
    pub fn for_channel(channel: Channel) -> &'static ChannelProfile {
        match channel {
            Channel::Amazon => &AMAZON,
            Channel::Flipkart => &FLIPKART,
            Channel::OwnWebsite => &OWN_WEBSITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityTier {
    Main,
    Regional,
}

/// A warehouse location the network optimizer may open.
#[derive(Debug, Clone, Copy)]
pub struct FacilityCandidate {
    pub name: &'static str,
    /// Rent proxy, rupees per sqft per month.
    pub rent: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub tier: FacilityTier,
}

/// The hub the business currently fulfils everything from.
pub const CURRENT_MAIN_HUB: &str = "North_Delhi";

pub const FACILITY_CANDIDATES: [FacilityCandidate; 5] = [
    FacilityCandidate { name: "North_Delhi", rent: 35.0, latitude: 28.61, longitude: 77.23, tier: FacilityTier::Main },
    FacilityCandidate { name: "West_Mumbai", rent: 45.0, latitude: 19.07, longitude: 72.87, tier: FacilityTier::Main },
    FacilityCandidate { name: "South_Bangalore", rent: 40.0, latitude: 12.97, longitude: 77.59, tier: FacilityTier::Regional },
    FacilityCandidate { name: "East_Kolkata", rent: 25.0, latitude: 22.57, longitude: 88.36, tier: FacilityTier::Regional },
    FacilityCandidate { name: "Central_Hyderabad", rent: 30.0, latitude: 17.38, longitude: 78.48, tier: FacilityTier::Regional },
];

/// Centroid of a regional demand zone, for shipping-distance estimates.
#[derive(Debug, Clone, Copy)]
pub struct DemandZone {
    pub latitude: f64,
    pub longitude: f64,
}

/// Zone for a region. Total over the enum.
pub fn zone_for(region: Region) -> DemandZone {
    match region {
        Region::North => DemandZone { latitude: 28.7, longitude: 77.1 },
        Region::West => DemandZone { latitude: 19.0, longitude: 72.8 },
        Region::South => DemandZone { latitude: 12.9, longitude: 77.5 },
        Region::East => DemandZone { latitude: 22.5, longitude: 88.3 },
    }
}

/// Which product slice an analysis run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    All,
    Product(String),
}

impl ProductFilter {
    pub fn matches(&self, product_id: &str) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Product(id) => id == product_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ProductFilter::All => "ALL_PRODUCTS",
            ProductFilter::Product(id) => id,
        }
    }
}

/// User-facing knobs for one analysis run. Passed explicitly into the
/// engine; runs share no state.
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub product: ProductFilter,
    /// Annual holding cost as a percentage of unit price.
    pub holding_pct: f64,
    /// Fixed cost of placing one replenishment order.
    pub ordering_cost: f64,
    /// Expected demand growth over the forecast year, in percent.
    pub growth_rate_pct: f64,
    /// Allocate the optimized plan over the historical total volume instead
    /// of the forecast, so the two profit figures compare on equal units.
    pub match_historical_volume: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            product: ProductFilter::All,
            holding_pct: 20.0,
            ordering_cost: 1500.0,
            growth_rate_pct: 15.0,
            match_historical_volume: true,
        }
    }
}
