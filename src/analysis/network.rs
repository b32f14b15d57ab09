use std::collections::BTreeMap;

use serde::Serialize;

use crate::geo::haversine_km;
use crate::model::config::{zone_for, FacilityCandidate, CURRENT_MAIN_HUB, FACILITY_CANDIDATES};
use crate::model::record::Region;

// Candidate score weights: rent dominates, distance breaks ties between
// comparable leases.
const RENT_SCORE_WEIGHT: f64 = 1000.0;
const DISTANCE_SCORE_WEIGHT: f64 = 50.0;

// Annual rent per hub: rent proxy x 2000 sqft x 12 months.
const HUB_FLOOR_SQFT: f64 = 2000.0;

/// Per-unit shipping by hub count. More hubs put stock closer to demand;
/// the tiers approximate that saturating benefit without re-deriving
/// per-hub distances for every split of the volume.
const UNIT_SHIPPING_BY_HUB_COUNT: [f64; 3] = [50.0, 32.0, 28.0];

/// Cost picture of operating `hub_count` fulfilment hubs for a year.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkScenario {
    pub hub_count: usize,
    pub hubs: Vec<&'static str>,
    pub annual_rent: f64,
    pub annual_shipping: f64,
    pub total_cost: f64,
}

/// Advisory output of the demand-gravity analysis. Narrative only; the cost
/// math never consumes it.
#[derive(Debug, Clone)]
pub struct RelocationAdvice {
    pub best_city: &'static str,
    pub distance_km: f64,
    pub advice: String,
}

#[derive(Debug, Clone)]
pub struct NetworkPlan {
    /// One scenario per hub count, 1 through 3.
    pub scenarios: Vec<NetworkScenario>,
    pub best_hub_count: usize,
}

impl NetworkPlan {
    pub fn best_scenario(&self) -> Option<&NetworkScenario> {
        self.scenarios
            .iter()
            .find(|s| s.hub_count == self.best_hub_count)
    }
}

/// Nominal national demand mix used when the dataset carries no regional
/// signal at all.
fn default_region_shares() -> BTreeMap<Region, f64> {
    BTreeMap::from([
        (Region::North, 0.3),
        (Region::West, 0.3),
        (Region::South, 0.2),
        (Region::East, 0.2),
    ])
}

/// Demand-weighted average distance from a candidate to the regional zones.
fn weighted_distance_km(candidate: &FacilityCandidate, shares: &BTreeMap<Region, f64>) -> f64 {
    shares
        .iter()
        .map(|(&region, &share)| {
            let zone = zone_for(region);
            haversine_km(candidate.latitude, candidate.longitude, zone.latitude, zone.longitude)
                * share
        })
        .sum()
}

/// Scores every candidate (lower is better) and returns them ranked.
/// Raising a candidate's rent with distance held fixed can only worsen its
/// score, so ranking is monotonic in rent.
pub fn rank_candidates(
    region_shares: &BTreeMap<Region, f64>,
) -> Vec<(&'static FacilityCandidate, f64)> {
    let shares = if region_shares.is_empty() {
        default_region_shares()
    } else {
        region_shares.clone()
    };

    let mut scored: Vec<(&'static FacilityCandidate, f64)> = FACILITY_CANDIDATES
        .iter()
        .map(|c| {
            let score = c.rent * RENT_SCORE_WEIGHT
                + weighted_distance_km(c, &shares) * DISTANCE_SCORE_WEIGHT;
            (c, score)
        })
        .collect();
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Evaluates 1-, 2- and 3-hub networks over the ranked candidates and picks
/// the cheapest total of rent plus forecast-volume shipping.
pub fn optimize_network(
    region_shares: &BTreeMap<Region, f64>,
    annual_demand: u64,
) -> NetworkPlan {
    let ranked = rank_candidates(region_shares);

    let scenarios: Vec<NetworkScenario> = (1..=3)
        .map(|n| {
            let hubs: Vec<&'static str> = ranked.iter().take(n).map(|(c, _)| c.name).collect();
            let annual_rent: f64 = ranked
                .iter()
                .take(n)
                .map(|(c, _)| c.rent * HUB_FLOOR_SQFT * 12.0)
                .sum();
            let annual_shipping = annual_demand as f64 * UNIT_SHIPPING_BY_HUB_COUNT[n - 1];
            NetworkScenario {
                hub_count: n,
                hubs,
                annual_rent,
                annual_shipping,
                total_cost: annual_rent + annual_shipping,
            }
        })
        .collect();

    let best_hub_count = pick_best(&scenarios);
    NetworkPlan { scenarios, best_hub_count }
}

/// Hub count of the scenario with the lowest total cost. Ties go to the
/// smaller network.
pub fn pick_best(scenarios: &[NetworkScenario]) -> usize {
    scenarios
        .iter()
        .min_by(|a, b| {
            a.total_cost
                .partial_cmp(&b.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|s| s.hub_count)
        .unwrap_or(1)
}

/// Finds the candidate nearest the demand-weighted centre of gravity and
/// phrases a relocation recommendation against the current main hub.
pub fn relocation_strategy(region_shares: &BTreeMap<Region, f64>) -> RelocationAdvice {
    let shares = if region_shares.is_empty() {
        default_region_shares()
    } else {
        region_shares.clone()
    };

    let mut lat = 0.0;
    let mut lon = 0.0;
    for (&region, &share) in &shares {
        let zone = zone_for(region);
        lat += zone.latitude * share;
        lon += zone.longitude * share;
    }

    let (best_city, distance_km) = FACILITY_CANDIDATES
        .iter()
        .map(|c| (c.name, haversine_km(lat, lon, c.latitude, c.longitude)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((CURRENT_MAIN_HUB, 0.0));

    let advice = if best_city == CURRENT_MAIN_HUB {
        "Retain the main hub in Delhi NCR; it aligns with demand gravity.".to_owned()
    } else {
        format!(
            "Consider expanding to {best_city}; it sits ~{:.0} km from the centre of demand gravity.",
            distance_km
        )
    };

    RelocationAdvice { best_city, distance_km, advice }
}
