// src/forecast/tournament.rs

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::forecast::models::{AutoArima, GradientBoostedTrees, SeasonalRegression};
use crate::forecast::traits::{ForecastContext, Forecaster};
use crate::model::record::{DailyObservation, SalesRecord};

pub const HOLDOUT_DAYS: usize = 60;
pub const FORECAST_HORIZON_DAYS: usize = 365;
/// Error assigned to a model that failed to fit. Effectively disqualifying,
/// since any model that produces a usable fit scores below this.
pub const DISQUALIFIED_ERROR: f64 = 100.0;

const SMAPE_EPSILON: f64 = 1e-9;

/// Symmetric mean absolute percentage error, in percent.
///
/// `100 * mean(2|p - a| / (|a| + |p| + eps))`. The epsilon keeps days where
/// both sides are zero from dividing by zero.
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return DISQUALIFIED_ERROR;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| 2.0 * (p - a).abs() / (a.abs() + p.abs() + SMAPE_EPSILON))
        .sum();
    100.0 * total / actual.len() as f64
}

/// Collapses order lines into one observation per day: quantities sum, ad
/// spend averages. Output is sorted by date.
pub fn aggregate_daily(records: &[SalesRecord]) -> Vec<DailyObservation> {
    let mut by_day: BTreeMap<chrono::NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = by_day.entry(r.date).or_insert((0.0, 0.0, 0));
        entry.0 += f64::from(r.quantity_sold);
        entry.1 += r.ad_spend;
        entry.2 += 1;
    }
    by_day
        .into_iter()
        .map(|(date, (quantity, spend_sum, n))| DailyObservation {
            date,
            quantity,
            ad_spend: spend_sum / n as f64,
        })
        .collect()
}

/// Per-model scores plus the published future demand curve.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    /// Held-out actuals the models were scored against.
    pub holdout_actuals: Vec<f64>,
    /// Held-out predictions, keyed by model name.
    pub holdout_predictions: BTreeMap<&'static str, Vec<f64>>,
    /// sMAPE per model, `DISQUALIFIED_ERROR` for failed fits.
    pub errors: BTreeMap<&'static str, f64>,
    pub winner: &'static str,
    /// 365 daily demand points published from the winning model, scaled by
    /// the growth input and clipped to non-negative integers.
    pub future_curve: Vec<u32>,
    /// Sum of the future curve, the demand signal everything downstream uses.
    pub annual_demand: u64,
}

fn contenders() -> Vec<Box<dyn Forecaster>> {
    vec![
        Box::<SeasonalRegression>::default(),
        Box::<GradientBoostedTrees>::default(),
        Box::<AutoArima>::default(),
    ]
}

fn fresh_contender(name: &str) -> Box<dyn Forecaster> {
    contenders()
        .into_iter()
        .find(|m| m.name() == name)
        .unwrap_or_else(|| Box::<SeasonalRegression>::default())
}

/// Fits the three forecasters on everything before the last 60 days, scores
/// them on those 60 days by sMAPE, then refits the winner on the full
/// series to publish its 365-day extrapolation. A model that fails to fit
/// is scored at `DISQUALIFIED_ERROR` and predicts zeros; the tournament
/// itself never fails.
pub fn run_tournament(records: &[SalesRecord], growth_rate_pct: f64) -> ForecastOutcome {
    let series = aggregate_daily(records);
    let growth_multiplier = 1.0 + growth_rate_pct / 100.0;

    let (train, holdout): (&[DailyObservation], &[DailyObservation]) =
        if series.len() > HOLDOUT_DAYS {
            series.split_at(series.len() - HOLDOUT_DAYS)
        } else {
            (&[], &series[..])
        };
    let holdout_actuals: Vec<f64> = holdout.iter().map(|o| o.quantity).collect();

    let mut errors = BTreeMap::new();
    let mut holdout_predictions = BTreeMap::new();

    for mut model in contenders() {
        let name = model.name();
        let prediction = model
            .fit(train)
            .and_then(|()| model.predict_holdout(holdout));
        match prediction {
            Ok(pred) => {
                let err = smape(&holdout_actuals, &pred);
                debug!(model = name, smape = err, "forecaster scored");
                errors.insert(name, err);
                holdout_predictions.insert(name, pred);
            }
            Err(reason) => {
                warn!(model = name, %reason, "forecaster disqualified");
                errors.insert(name, DISQUALIFIED_ERROR);
                holdout_predictions.insert(name, vec![0.0; holdout.len()]);
            }
        }
    }

    let winner = errors
        .iter()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| *name)
        .unwrap_or("SeasonalRegression");

    // The published curve always comes from the model that won the holdout,
    // refitted on the full series.
    let ctx = ForecastContext {
        growth_multiplier,
        mean_ad_spend: if series.is_empty() {
            0.0
        } else {
            series.iter().map(|o| o.ad_spend).sum::<f64>() / series.len() as f64
        },
    };
    let mut champion = fresh_contender(winner);
    let future = champion
        .fit(&series)
        .and_then(|()| champion.forecast_future(&series, FORECAST_HORIZON_DAYS, &ctx));

    let future_curve: Vec<u32> = match future {
        Ok(curve) => curve
            .into_iter()
            .map(|v| (v.max(0.0) * growth_multiplier) as u32)
            .collect(),
        Err(reason) => {
            warn!(model = winner, %reason, "future extrapolation failed; publishing a zero curve");
            vec![0; FORECAST_HORIZON_DAYS]
        }
    };
    let annual_demand = future_curve.iter().map(|&v| u64::from(v)).sum();

    ForecastOutcome {
        holdout_actuals,
        holdout_predictions,
        errors,
        winner,
        future_curve,
        annual_demand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::{Channel, Region};
    use chrono::{Duration, NaiveDate};

    fn record(day: i64, qty: u32, ad: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(day),
            product_id: "P".to_owned(),
            price: 1000.0,
            quantity_sold: qty,
            channel: Channel::Amazon,
            region: Region::North,
            ad_spend: ad,
        }
    }

    #[test]
    fn smape_of_a_perfect_forecast_is_zero() {
        let y = vec![3.0, 7.0, 11.0, 42.0];
        assert!(smape(&y, &y) < 1e-9);
    }

    #[test]
    fn smape_matches_the_exact_formula() {
        // Single point: actual 100, predicted 50.
        // 100 * (2 * 50) / (100 + 50 + eps) = 66.666...
        let err = smape(&[100.0], &[50.0]);
        assert!((err - 200.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn smape_is_symmetric_under_swap() {
        let a = vec![10.0, 20.0, 30.0];
        let b = vec![12.0, 18.0, 33.0];
        assert!((smape(&a, &b) - smape(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn daily_aggregation_sums_quantity_and_averages_spend() {
        let records = vec![record(0, 5, 100.0), record(0, 3, 300.0), record(1, 2, 50.0)];
        let daily = aggregate_daily(&records);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].quantity, 8.0);
        assert_eq!(daily[0].ad_spend, 200.0);
        assert_eq!(daily[1].quantity, 2.0);
    }

    #[test]
    fn tiny_datasets_disqualify_every_model_without_panicking() {
        let records: Vec<SalesRecord> = (0..10).map(|d| record(d, 5, 10.0)).collect();
        let outcome = run_tournament(&records, 15.0);
        for (_, err) in &outcome.errors {
            assert_eq!(*err, DISQUALIFIED_ERROR);
        }
        assert_eq!(outcome.future_curve.len(), FORECAST_HORIZON_DAYS);
        assert_eq!(outcome.annual_demand, 0);
    }

    #[test]
    fn future_curve_is_non_negative_and_sums_to_annual_demand() {
        let records: Vec<SalesRecord> = (0..200)
            .map(|d| record(d, 20 + (d % 7) as u32, 100.0))
            .collect();
        let outcome = run_tournament(&records, 15.0);
        assert_eq!(outcome.future_curve.len(), FORECAST_HORIZON_DAYS);
        let sum: u64 = outcome.future_curve.iter().map(|&v| u64::from(v)).sum();
        assert_eq!(sum, outcome.annual_demand);
        assert!(outcome.annual_demand > 0);
    }

    #[test]
    fn winner_has_the_lowest_error() {
        let records: Vec<SalesRecord> = (0..200)
            .map(|d| record(d, 20 + (d % 7) as u32, 100.0))
            .collect();
        let outcome = run_tournament(&records, 0.0);
        let winner_err = outcome.errors[outcome.winner];
        for err in outcome.errors.values() {
            assert!(winner_err <= *err + 1e-12);
        }
    }

    #[test]
    fn growth_input_scales_the_published_curve() {
        let records: Vec<SalesRecord> = (0..200).map(|d| record(d, 50, 100.0)).collect();
        let flat = run_tournament(&records, 0.0);
        let grown = run_tournament(&records, 50.0);
        assert!(
            grown.annual_demand > flat.annual_demand,
            "grown {} vs flat {}",
            grown.annual_demand,
            flat.annual_demand
        );
    }

    #[test]
    fn published_curve_comes_from_the_winning_model() {
        // The tournament must not publish one model's extrapolation while
        // crowning another: the curve is recomputed here from a fresh
        // instance of the winner and must match exactly.
        let records: Vec<SalesRecord> = (0..200)
            .map(|d| record(d, 30 + (d % 7) as u32, 120.0))
            .collect();
        let growth = 15.0;
        let outcome = run_tournament(&records, growth);

        let series = aggregate_daily(&records);
        let ctx = ForecastContext {
            growth_multiplier: 1.0 + growth / 100.0,
            mean_ad_spend: series.iter().map(|o| o.ad_spend).sum::<f64>() / series.len() as f64,
        };
        let mut champion = fresh_contender(outcome.winner);
        champion.fit(&series).unwrap();
        let raw = champion
            .forecast_future(&series, FORECAST_HORIZON_DAYS, &ctx)
            .unwrap();
        let expected: Vec<u32> = raw
            .into_iter()
            .map(|v| (v.max(0.0) * ctx.growth_multiplier) as u32)
            .collect();
        assert_eq!(outcome.future_curve, expected);
    }

    #[test]
    fn tournament_is_deterministic() {
        let records: Vec<SalesRecord> = (0..150)
            .map(|d| record(d, 10 + (d % 5) as u32, 80.0))
            .collect();
        let a = run_tournament(&records, 15.0);
        let b = run_tournament(&records, 15.0);
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.future_curve, b.future_curve);
        assert_eq!(a.errors, b.errors);
    }
}
