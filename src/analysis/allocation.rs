use std::collections::BTreeMap;

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::model::config::{ChannelKind, ChannelProfile};
use crate::model::record::Channel;

/// Flat per-unit logistics assumed inside the allocation objective: bulk
/// shipping into marketplace fulfilment centres versus direct last mile.
const UNIT_LOGISTICS_MARKETPLACE: f64 = 32.0;
const UNIT_LOGISTICS_D2C: f64 = 40.0;

/// A non-positive inventory input is floored to this token volume so the
/// solve still produces a shaped (if tiny) allocation.
const MIN_SOLVE_VOLUME: u64 = 100;

/// Split used when the solver cannot find a feasible plan.
const FALLBACK_SPLIT: [(Channel, f64); 3] = [
    (Channel::Amazon, 0.45),
    (Channel::Flipkart, 0.35),
    (Channel::OwnWebsite, 0.20),
];

/// Objective flavour for one allocation solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Pure contribution maximization, bounded by business floor/cap rules.
    Profit,
    /// Direct-channel contribution weighted 1.3x for lifetime value.
    Brand,
    /// Milder 1.1x direct weighting.
    Balanced,
}

impl AllocationStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AllocationStrategy::Profit => "profit",
            AllocationStrategy::Brand => "brand",
            AllocationStrategy::Balanced => "balanced",
        }
    }

    fn direct_weight(&self) -> f64 {
        match self {
            AllocationStrategy::Profit => 1.0,
            AllocationStrategy::Brand => 1.3,
            AllocationStrategy::Balanced => 1.1,
        }
    }
}

/// Per-unit economics of selling through one channel at a given price.
#[derive(Debug, Clone, Copy)]
pub struct ChannelEconomics {
    pub unit_fees: f64,
    pub unit_logistics: f64,
    pub unit_marketing: f64,
    pub unit_contribution: f64,
}

impl ChannelEconomics {
    pub fn at_price(channel: Channel, price: f64) -> Self {
        let profile = ChannelProfile::for_channel(channel);
        let unit_fees = price * profile.referral_fee + profile.closing_fee;
        let unit_logistics = match profile.kind {
            ChannelKind::Marketplace => UNIT_LOGISTICS_MARKETPLACE,
            ChannelKind::D2C => UNIT_LOGISTICS_D2C,
        };
        let unit_marketing = price * profile.marketing_cac;
        Self {
            unit_fees,
            unit_logistics,
            unit_marketing,
            unit_contribution: price - (unit_fees + unit_logistics + unit_marketing),
        }
    }
}

/// Whether an allocation came out of the solver or the degraded fallback.
/// Callers can (and tests do) branch on this; a fallback is never silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Optimal,
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub strategy: AllocationStrategy,
    pub outcome: SolveOutcome,
    /// Units per channel. Sums to the solve volume for optimal outcomes;
    /// the truncating fallback may leave a few units unallocated.
    pub allocation: BTreeMap<Channel, u64>,
    pub economics: BTreeMap<Channel, ChannelEconomics>,
    /// Objective value: contribution, with the strategy's direct-channel
    /// weighting applied.
    pub total_contribution: f64,
}

/// Per-channel volume bounds for one solve, as fractions of total volume.
fn channel_bounds(channel: Channel, strategy: AllocationStrategy) -> (f64, f64) {
    let traffic_cap = ChannelProfile::for_channel(channel).traffic_score;
    if strategy != AllocationStrategy::Profit {
        return (0.0, traffic_cap);
    }
    // Business rules for the committed plan: every marketplace keeps a
    // minimum presence, the direct channel stays between 18% and 40%, and
    // no marketplace concentrates more than its negotiated ceiling.
    let (floor, business_cap): (f64, f64) = match channel {
        Channel::Amazon => (0.10, 0.55),
        Channel::Flipkart => (0.10, 0.45),
        Channel::OwnWebsite => (0.18, 0.40),
    };
    (floor, business_cap.min(traffic_cap))
}

fn fallback_plan(
    volume: u64,
    strategy: AllocationStrategy,
    economics: BTreeMap<Channel, ChannelEconomics>,
    reason: String,
) -> AllocationPlan {
    warn!(
        strategy = strategy.label(),
        volume,
        reason = reason.as_str(),
        "channel allocation infeasible; applying fixed fallback split"
    );
    let allocation: BTreeMap<Channel, u64> = FALLBACK_SPLIT
        .iter()
        .map(|&(ch, share)| (ch, (volume as f64 * share) as u64))
        .collect();
    let total_contribution = allocation
        .iter()
        .map(|(ch, &qty)| qty as f64 * economics[ch].unit_contribution)
        .sum();
    AllocationPlan {
        strategy,
        outcome: SolveOutcome::Fallback { reason },
        allocation,
        economics,
        total_contribution,
    }
}

/// Allocates `inventory` units across the channels to maximize weighted
/// contribution, subject to the strategy's bounds. Decision variables are
/// non-negative integers; the solve is exact, not a heuristic rounding.
pub fn solve_channel_mix(
    inventory: u64,
    price: f64,
    strategy: AllocationStrategy,
) -> AllocationPlan {
    let volume = if inventory == 0 {
        debug!("allocation requested for zero inventory; using token volume");
        MIN_SOLVE_VOLUME
    } else {
        inventory
    };

    let economics: BTreeMap<Channel, ChannelEconomics> = Channel::ALL
        .iter()
        .map(|&ch| (ch, ChannelEconomics::at_price(ch, price)))
        .collect();

    let mut pb = RowProblem::new();
    let cols: Vec<_> = Channel::ALL
        .iter()
        .map(|&ch| {
            let weight = if ch == Channel::OwnWebsite {
                strategy.direct_weight()
            } else {
                1.0
            };
            let (floor, cap) = channel_bounds(ch, strategy);
            pb.add_integer_column(
                economics[&ch].unit_contribution * weight,
                (volume as f64 * floor)..=(volume as f64 * cap),
            )
        })
        .collect();

    // Every unit of inventory is placed somewhere.
    let terms: Vec<_> = cols.iter().map(|&c| (c, 1.0)).collect();
    pb.add_row((volume as f64)..=(volume as f64), terms);

    let mut model = pb.optimise(Sense::Maximise);
    model.set_option("output_flag", false);
    let solved = model.solve();
    match solved.status() {
        HighsModelStatus::Optimal => {
            let solution = solved.get_solution();
            let allocation: BTreeMap<Channel, u64> = Channel::ALL
                .iter()
                .zip(&cols)
                .map(|(&ch, &col)| (ch, solution[col].round() as u64))
                .collect();
            AllocationPlan {
                strategy,
                outcome: SolveOutcome::Optimal,
                allocation,
                economics,
                total_contribution: solved.objective_value(),
            }
        }
        status => fallback_plan(
            volume,
            strategy,
            economics,
            format!("solver status {status:?}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_sum_exactly_to_the_inventory() {
        for strategy in [
            AllocationStrategy::Profit,
            AllocationStrategy::Brand,
            AllocationStrategy::Balanced,
        ] {
            let plan = solve_channel_mix(10_000, 2000.0, strategy);
            assert_eq!(plan.outcome, SolveOutcome::Optimal, "{strategy:?}");
            let total: u64 = plan.allocation.values().sum();
            assert_eq!(total, 10_000, "{strategy:?}");
        }
    }

    #[test]
    fn profit_strategy_respects_caps_and_floors() {
        let volume = 10_000u64;
        let plan = solve_channel_mix(volume, 2000.0, AllocationStrategy::Profit);
        for (&ch, &qty) in &plan.allocation {
            let (floor, cap) = channel_bounds(ch, AllocationStrategy::Profit);
            let traffic_cap = ChannelProfile::for_channel(ch).traffic_score;
            assert!(qty as f64 >= (volume as f64 * floor).floor(), "{ch:?} under floor");
            assert!(qty as f64 <= volume as f64 * cap + 0.5, "{ch:?} over cap");
            assert!(qty as f64 <= volume as f64 * traffic_cap + 0.5, "{ch:?} over traffic cap");
        }
    }

    #[test]
    fn traffic_caps_bind_every_strategy() {
        let volume = 5_000u64;
        for strategy in [AllocationStrategy::Brand, AllocationStrategy::Balanced] {
            let plan = solve_channel_mix(volume, 1500.0, strategy);
            for (&ch, &qty) in &plan.allocation {
                let cap = ChannelProfile::for_channel(ch).traffic_score;
                assert!(qty as f64 <= volume as f64 * cap + 0.5);
            }
        }
    }

    #[test]
    fn contribution_margins_follow_the_fee_structure() {
        let econ = ChannelEconomics::at_price(Channel::Amazon, 1000.0);
        // 1000*0.15 + 30 fees, 32 logistics, 1000*0.05 marketing.
        assert!((econ.unit_fees - 180.0).abs() < 1e-9);
        assert!((econ.unit_logistics - 32.0).abs() < 1e-9);
        assert!((econ.unit_marketing - 50.0).abs() < 1e-9);
        assert!((econ.unit_contribution - (1000.0 - 262.0)).abs() < 1e-9);

        let d2c = ChannelEconomics::at_price(Channel::OwnWebsite, 1000.0);
        assert!((d2c.unit_logistics - 40.0).abs() < 1e-9);
        assert!((d2c.unit_fees - 30.0).abs() < 1e-9);
    }

    #[test]
    fn brand_weighting_never_shrinks_the_direct_channel() {
        let profit = solve_channel_mix(10_000, 2000.0, AllocationStrategy::Profit);
        let brand = solve_channel_mix(10_000, 2000.0, AllocationStrategy::Brand);
        assert!(
            brand.allocation[&Channel::OwnWebsite] >= profit.allocation[&Channel::OwnWebsite]
                || brand.allocation[&Channel::OwnWebsite]
                    >= (10_000f64 * 0.35) as u64
        );
    }

    #[test]
    fn zero_inventory_is_floored_to_a_token_volume() {
        let plan = solve_channel_mix(0, 1000.0, AllocationStrategy::Balanced);
        let total: u64 = plan.allocation.values().sum();
        assert_eq!(total, MIN_SOLVE_VOLUME);
    }

    #[test]
    fn fallback_is_tagged_and_split_45_35_20() {
        let economics: BTreeMap<Channel, ChannelEconomics> = Channel::ALL
            .iter()
            .map(|&ch| (ch, ChannelEconomics::at_price(ch, 1000.0)))
            .collect();
        let plan = fallback_plan(
            1_000,
            AllocationStrategy::Profit,
            economics,
            "forced for test".to_owned(),
        );
        assert!(matches!(plan.outcome, SolveOutcome::Fallback { .. }));
        assert_eq!(plan.allocation[&Channel::Amazon], 450);
        assert_eq!(plan.allocation[&Channel::Flipkart], 350);
        assert_eq!(plan.allocation[&Channel::OwnWebsite], 200);
    }
}
