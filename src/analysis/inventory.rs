use serde::Serialize;

/// Annual demand at or below zero is floored to this epsilon: the EOQ
/// formulas stay defined and the resulting plan is visibly degenerate
/// (EOQ of 1, near-zero costs) rather than a crash.
const DEMAND_EPSILON: f64 = 1e-9;
/// Floor for holding cost per unit per year when the inputs produce zero.
const MIN_UNIT_HOLDING_COST: f64 = 0.01;

/// Fixed quarterly demand shares. Q4 carries the festive peak.
const QUARTER_SHARES: [f64; 4] = [0.15, 0.25, 0.20, 0.40];
const QUARTER_LABELS: [&str; 4] = ["Q1 (Jan-Mar)", "Q2 (Apr-Jun)", "Q3 (Jul-Sep)", "Q4 (Oct-Dec)"];
/// A quarter is a peak when it carries more than its even share by this bound.
const PEAK_SHARE_THRESHOLD: f64 = 0.25;

/// Service level z-score (95%) and demand dispersion used by the risk audit.
const SERVICE_LEVEL_Z: f64 = 1.645;
const DEMAND_CV: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Seasonality {
    Standard,
    Peak,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuarterPlan {
    pub label: &'static str,
    pub seasonality: Seasonality,
    pub demand: u64,
    /// Replenishment batches of EOQ size needed to cover the quarter.
    pub batches: u64,
    /// Purchase capital committed across those batches.
    pub capital: f64,
    /// Probability of demand breaching mean plus safety stock at the
    /// assumed service level.
    pub stockout_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryPlan {
    /// Economic order quantity, units per batch.
    pub eoq: u64,
    pub annual_holding_cost: f64,
    pub annual_ordering_cost: f64,
    pub total_annual_cost: f64,
    /// Average capital tied up in stock (half a batch at unit price).
    pub avg_capital: f64,
    pub quarters: Vec<QuarterPlan>,
}

/// Standard normal upper-tail probability.
///
/// Abramowitz and Stegun 26.2.17 polynomial approximation of the CDF;
/// absolute error below 7.5e-8, far tighter than the planning use here.
fn normal_upper_tail(z: f64) -> f64 {
    if z < 0.0 {
        return 1.0 - normal_upper_tail(-z);
    }
    let t = 1.0 / (1.0 + 0.2316419 * z);
    let poly = t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();
    pdf * poly
}

/// Chance of a quarter's demand exceeding mean plus safety stock, with
/// safety stock sized at the target service level.
fn quarter_stockout_probability(mean_demand: f64) -> f64 {
    let std_dev = mean_demand * DEMAND_CV;
    if std_dev <= 0.0 {
        return 0.0;
    }
    let safety_stock = SERVICE_LEVEL_Z * std_dev;
    normal_upper_tail(safety_stock / std_dev)
}

/// Sizes replenishment batches by the classic EOQ trade-off and lays out a
/// seasonally skewed quarterly procurement plan.
///
/// `holding_pct` is the annual holding cost as a percentage of unit price;
/// `ordering_cost` is the fixed cost per replenishment order.
pub fn plan_inventory(
    annual_demand: u64,
    price: f64,
    holding_pct: f64,
    ordering_cost: f64,
) -> InventoryPlan {
    let demand = if annual_demand == 0 {
        DEMAND_EPSILON
    } else {
        annual_demand as f64
    };

    let mut unit_holding = price * (holding_pct / 100.0);
    if unit_holding <= 0.0 {
        unit_holding = MIN_UNIT_HOLDING_COST;
    }

    let eoq = ((2.0 * demand * ordering_cost / unit_holding).sqrt() as u64).max(1);

    let avg_inventory = eoq as f64 / 2.0;
    let annual_holding_cost = avg_inventory * unit_holding;
    let annual_ordering_cost = demand / eoq as f64 * ordering_cost;

    let quarters = QUARTER_SHARES
        .iter()
        .zip(QUARTER_LABELS)
        .map(|(&share, label)| {
            let q_demand = (demand * share) as u64;
            let batches = q_demand.div_ceil(eoq);
            QuarterPlan {
                label,
                seasonality: if share > PEAK_SHARE_THRESHOLD {
                    Seasonality::Peak
                } else {
                    Seasonality::Standard
                },
                demand: q_demand,
                batches,
                capital: batches as f64 * eoq as f64 * price,
                stockout_probability: quarter_stockout_probability(q_demand as f64),
            }
        })
        .collect();

    InventoryPlan {
        eoq,
        annual_holding_cost,
        annual_ordering_cost,
        total_annual_cost: annual_holding_cost + annual_ordering_cost,
        avg_capital: avg_inventory * price,
        quarters,
    }
}
