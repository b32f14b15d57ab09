// src/forecast/models.rs

use chrono::{Datelike, Duration, NaiveDate};

use crate::forecast::traits::{FitError, ForecastContext, Forecaster};
use crate::model::record::DailyObservation;

// =========================================================================
// Shared numeric helpers
// =========================================================================

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Ordinary least squares via the normal equations, solved by Gaussian
/// elimination with partial pivoting. A small ridge term keeps nearly
/// collinear designs (constant regressors, sparse dummies) solvable.
fn solve_least_squares(rows: &[Vec<f64>], targets: &[f64]) -> Option<Vec<f64>> {
    let n = rows.len();
    if n == 0 || n != targets.len() {
        return None;
    }
    let k = rows[0].len();

    let mut xtx = vec![vec![0.0f64; k]; k];
    let mut xty = vec![0.0f64; k];
    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, diag) in xtx.iter_mut().enumerate() {
        diag[i] += 1e-8;
    }

    // Forward elimination with row pivoting.
    for col in 0..k {
        let pivot_row = (col..k)
            .max_by(|&a, &b| xtx[a][col].abs().partial_cmp(&xtx[b][col].abs()).unwrap_or(std::cmp::Ordering::Equal))?;
        if xtx[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        xtx.swap(col, pivot_row);
        xty.swap(col, pivot_row);
        for row in (col + 1)..k {
            let factor = xtx[row][col] / xtx[col][col];
            for j in col..k {
                xtx[row][j] -= factor * xtx[col][j];
            }
            xty[row] -= factor * xty[col];
        }
    }

    // Back substitution.
    let mut beta = vec![0.0f64; k];
    for col in (0..k).rev() {
        let mut acc = xty[col];
        for j in (col + 1)..k {
            acc -= xtx[col][j] * beta[j];
        }
        beta[col] = acc / xtx[col][col];
    }
    Some(beta)
}

// =========================================================================
// 1. Seasonal regression (trend + weekly/yearly seasonality + ad spend)
// =========================================================================

/// Least-squares decomposition of daily demand into a linear trend, weekday
/// effects, yearly Fourier seasonality and an ad-spend regressor. The only
/// model whose future path responds to the ad-spend growth assumption
/// through its regressor as well as the overall growth scaling.
#[derive(Debug, Default)]
pub struct SeasonalRegression {
    coeffs: Vec<f64>,
    origin: Option<NaiveDate>,
}

const YEARLY_HARMONICS: usize = 3;
const SEASONAL_MIN_OBSERVATIONS: usize = 30;

impl SeasonalRegression {
    fn feature_row(date: NaiveDate, t: f64, ad_spend: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(2 + 6 + 2 * YEARLY_HARMONICS + 1);
        row.push(1.0);
        row.push(t);
        // Weekday dummies, Monday as the baseline.
        let weekday = date.weekday().num_days_from_monday();
        for d in 1u32..7 {
            row.push(if weekday == d { 1.0 } else { 0.0 });
        }
        let doy = date.ordinal() as f64;
        for k in 1..=YEARLY_HARMONICS {
            let angle = 2.0 * std::f64::consts::PI * k as f64 * doy / 365.25;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row.push(ad_spend);
        row
    }

    fn predict_one(&self, date: NaiveDate, origin: NaiveDate, ad_spend: f64) -> f64 {
        let t = (date - origin).num_days() as f64;
        dot(&self.coeffs, &Self::feature_row(date, t, ad_spend))
    }
}

impl Forecaster for SeasonalRegression {
    fn name(&self) -> &'static str {
        "SeasonalRegression"
    }

    fn fit(&mut self, series: &[DailyObservation]) -> Result<(), FitError> {
        if series.len() < SEASONAL_MIN_OBSERVATIONS {
            return Err(FitError::TooFewObservations {
                needed: SEASONAL_MIN_OBSERVATIONS,
                got: series.len(),
            });
        }
        let origin = series[0].date;
        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|obs| {
                let t = (obs.date - origin).num_days() as f64;
                Self::feature_row(obs.date, t, obs.ad_spend)
            })
            .collect();
        let targets: Vec<f64> = series.iter().map(|obs| obs.quantity).collect();

        self.coeffs = solve_least_squares(&rows, &targets)
            .ok_or(FitError::Degenerate("singular design matrix"))?;
        self.origin = Some(origin);
        Ok(())
    }

    fn predict_holdout(&self, holdout: &[DailyObservation]) -> Result<Vec<f64>, FitError> {
        let origin = self.origin.ok_or(FitError::NotFitted)?;
        Ok(holdout
            .iter()
            .map(|obs| self.predict_one(obs.date, origin, obs.ad_spend))
            .collect())
    }

    fn forecast_future(
        &self,
        series: &[DailyObservation],
        horizon: usize,
        ctx: &ForecastContext,
    ) -> Result<Vec<f64>, FitError> {
        let origin = self.origin.ok_or(FitError::NotFitted)?;
        let last = series.last().ok_or(FitError::NotFitted)?.date;
        let future_ad_spend = ctx.mean_ad_spend * ctx.growth_multiplier;
        Ok((1..=horizon as i64)
            .map(|h| self.predict_one(last + Duration::days(h), origin, future_ad_spend))
            .collect())
    }
}

// =========================================================================
// 2. Gradient-boosted regression trees on calendar features
// =========================================================================

const LAG_DAYS: usize = 30;
const GBT_MIN_OBSERVATIONS: usize = 30;
const GBT_MIN_LEAF: usize = 4;
const GBT_SPLIT_CANDIDATES: usize = 16;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, x: &[f64; 4]) -> f64 {
        match self {
            TreeNode::Leaf(v) => *v,
            TreeNode::Split { feature, threshold, left, right } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }
}

fn leaf_mean(residuals: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| residuals[i]).sum::<f64>() / indices.len() as f64
}

/// Best axis-aligned split of `indices` by squared-error reduction, or None
/// when no split improves on the parent.
fn best_split(
    xs: &[[f64; 4]],
    residuals: &[f64],
    indices: &[usize],
) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
    let parent_mean = leaf_mean(residuals, indices);
    let parent_sse: f64 = indices.iter().map(|&i| (residuals[i] - parent_mean).powi(2)).sum();

    let mut best: Option<(f64, usize, f64)> = None;
    for feature in 0..4 {
        let mut values: Vec<f64> = indices.iter().map(|&i| xs[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            continue;
        }
        let step = (values.len() - 1).max(1) as f64 / GBT_SPLIT_CANDIDATES as f64;
        for c in 0..GBT_SPLIT_CANDIDATES {
            let idx = ((c as f64 * step) as usize).min(values.len() - 2);
            let threshold = (values[idx] + values[idx + 1]) / 2.0;

            let (mut ln, mut ls, mut rn, mut rs) = (0usize, 0.0f64, 0usize, 0.0f64);
            for &i in indices {
                if xs[i][feature] <= threshold {
                    ln += 1;
                    ls += residuals[i];
                } else {
                    rn += 1;
                    rs += residuals[i];
                }
            }
            if ln < GBT_MIN_LEAF || rn < GBT_MIN_LEAF {
                continue;
            }
            let (lm, rm) = (ls / ln as f64, rs / rn as f64);
            let sse: f64 = indices
                .iter()
                .map(|&i| {
                    let m = if xs[i][feature] <= threshold { lm } else { rm };
                    (residuals[i] - m).powi(2)
                })
                .sum();
            let gain = parent_sse - sse;
            if gain > 1e-12 && best.map_or(true, |(g, _, _)| gain > g) {
                best = Some((gain, feature, threshold));
            }
        }
    }

    let (_, feature, threshold) = best?;
    let (mut left, mut right) = (Vec::new(), Vec::new());
    for &i in indices {
        if xs[i][feature] <= threshold {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    Some((feature, threshold, left, right))
}

fn grow_tree(xs: &[[f64; 4]], residuals: &[f64], indices: &[usize], depth: usize) -> TreeNode {
    if depth == 0 || indices.len() < 2 * GBT_MIN_LEAF {
        return TreeNode::Leaf(leaf_mean(residuals, indices));
    }
    match best_split(xs, residuals, indices) {
        Some((feature, threshold, left, right)) => TreeNode::Split {
            feature,
            threshold,
            left: Box::new(grow_tree(xs, residuals, &left, depth - 1)),
            right: Box::new(grow_tree(xs, residuals, &right, depth - 1)),
        },
        None => TreeNode::Leaf(leaf_mean(residuals, indices)),
    }
}

/// Boosted shallow regression trees over {weekday, month, 30-day lag,
/// ad spend}. Greedy exact splits on quantile candidates; fully
/// deterministic, no subsampling.
#[derive(Debug)]
pub struct GradientBoostedTrees {
    rounds: usize,
    learning_rate: f64,
    max_depth: usize,
    base: f64,
    trees: Vec<TreeNode>,
}

impl Default for GradientBoostedTrees {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            base: 0.0,
            trees: Vec::new(),
        }
    }
}

impl GradientBoostedTrees {
    /// Lag features are taken within the window itself; days without a
    /// 30-day predecessor get a zero lag.
    fn window_features(window: &[DailyObservation]) -> Vec<[f64; 4]> {
        window
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let lag = if i >= LAG_DAYS { window[i - LAG_DAYS].quantity } else { 0.0 };
                [
                    obs.date.weekday().num_days_from_monday() as f64,
                    obs.date.month() as f64,
                    lag,
                    obs.ad_spend,
                ]
            })
            .collect()
    }

    fn predict_row(&self, x: &[f64; 4]) -> f64 {
        self.base
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(x))
                .sum::<f64>()
    }
}

impl Forecaster for GradientBoostedTrees {
    fn name(&self) -> &'static str {
        "GradientBoost"
    }

    fn fit(&mut self, series: &[DailyObservation]) -> Result<(), FitError> {
        if series.len() < GBT_MIN_OBSERVATIONS {
            return Err(FitError::TooFewObservations {
                needed: GBT_MIN_OBSERVATIONS,
                got: series.len(),
            });
        }
        let xs = Self::window_features(series);
        let targets: Vec<f64> = series.iter().map(|o| o.quantity).collect();
        let indices: Vec<usize> = (0..xs.len()).collect();

        self.base = mean(&targets);
        self.trees.clear();
        let mut predictions = vec![self.base; targets.len()];

        for _ in 0..self.rounds {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();
            let tree = grow_tree(&xs, &residuals, &indices, self.max_depth);
            for (i, x) in xs.iter().enumerate() {
                predictions[i] += self.learning_rate * tree.predict(x);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict_holdout(&self, holdout: &[DailyObservation]) -> Result<Vec<f64>, FitError> {
        if self.trees.is_empty() {
            return Err(FitError::NotFitted);
        }
        let xs = Self::window_features(holdout);
        Ok(xs.iter().map(|x| self.predict_row(x)).collect())
    }

    fn forecast_future(
        &self,
        series: &[DailyObservation],
        horizon: usize,
        ctx: &ForecastContext,
    ) -> Result<Vec<f64>, FitError> {
        if self.trees.is_empty() {
            return Err(FitError::NotFitted);
        }
        let last = series.last().ok_or(FitError::NotFitted)?.date;
        let future_ad_spend = ctx.mean_ad_spend * ctx.growth_multiplier;

        // Lags beyond the observed tail come from the model's own earlier
        // forecasts, extending the series recursively.
        let mut extended: Vec<f64> = series.iter().map(|o| o.quantity).collect();
        let mut out = Vec::with_capacity(horizon);
        for h in 0..horizon {
            let date = last + Duration::days(h as i64 + 1);
            let idx = extended.len();
            let lag = if idx >= LAG_DAYS { extended[idx - LAG_DAYS] } else { 0.0 };
            let x = [
                date.weekday().num_days_from_monday() as f64,
                date.month() as f64,
                lag,
                future_ad_spend,
            ];
            let pred = self.predict_row(&x);
            extended.push(pred);
            out.push(pred);
        }
        Ok(out)
    }
}

// =========================================================================
// 3. Auto-selected autoregressive model (ARIMA family)
// =========================================================================

const ARIMA_MIN_OBSERVATIONS: usize = 20;
const ARIMA_MAX_ORDER: usize = 6;

/// AR model on the (optionally differenced) demand series. The differencing
/// order d in {0, 1} is chosen by variance reduction and the AR order p by
/// AIC over a small grid, which is the usual automatic-order heuristic.
#[derive(Debug, Default)]
pub struct AutoArima {
    coeffs: Vec<f64>,
    order_p: usize,
    diff_d: usize,
    tail: Vec<f64>,
    last_level: f64,
}

impl AutoArima {
    fn forecast_steps(&self, steps: usize) -> Vec<f64> {
        let mut window = self.tail.clone();
        let mut diffs = Vec::with_capacity(steps);
        for _ in 0..steps {
            let mut next = self.coeffs[0];
            for j in 1..=self.order_p {
                next += self.coeffs[j] * window[window.len() - j];
            }
            window.push(next);
            diffs.push(next);
        }

        if self.diff_d == 0 {
            diffs
        } else {
            let mut level = self.last_level;
            diffs
                .into_iter()
                .map(|d| {
                    level += d;
                    level
                })
                .collect()
        }
    }
}

impl Forecaster for AutoArima {
    fn name(&self) -> &'static str {
        "AutoArima"
    }

    fn fit(&mut self, series: &[DailyObservation]) -> Result<(), FitError> {
        if series.len() < ARIMA_MIN_OBSERVATIONS {
            return Err(FitError::TooFewObservations {
                needed: ARIMA_MIN_OBSERVATIONS,
                got: series.len(),
            });
        }
        let levels: Vec<f64> = series.iter().map(|o| o.quantity).collect();
        let first_diff: Vec<f64> = levels.windows(2).map(|w| w[1] - w[0]).collect();

        let diff_d = if variance(&first_diff) < variance(&levels) { 1 } else { 0 };
        let working = if diff_d == 1 { first_diff } else { levels.clone() };

        let mut best: Option<(f64, usize, Vec<f64>)> = None;
        let max_p = ARIMA_MAX_ORDER.min(working.len() / 3);
        for p in 1..=max_p {
            let mut rows = Vec::new();
            let mut targets = Vec::new();
            for i in p..working.len() {
                let mut row = Vec::with_capacity(p + 1);
                row.push(1.0);
                for j in 1..=p {
                    row.push(working[i - j]);
                }
                rows.push(row);
                targets.push(working[i]);
            }
            let Some(beta) = solve_least_squares(&rows, &targets) else {
                continue;
            };
            let sse: f64 = rows
                .iter()
                .zip(&targets)
                .map(|(row, &y)| (y - dot(&beta, row)).powi(2))
                .sum();
            let n_eff = targets.len() as f64;
            let aic = n_eff * (sse / n_eff + 1e-12).ln() + 2.0 * (p as f64 + 1.0);
            if best.as_ref().map_or(true, |(a, _, _)| aic < *a) {
                best = Some((aic, p, beta));
            }
        }

        let (_, order_p, coeffs) =
            best.ok_or(FitError::Degenerate("no autoregressive order converged"))?;
        self.tail = working[working.len() - order_p..].to_vec();
        self.order_p = order_p;
        self.diff_d = diff_d;
        self.coeffs = coeffs;
        self.last_level = *levels.last().unwrap_or(&0.0);
        Ok(())
    }

    fn predict_holdout(&self, holdout: &[DailyObservation]) -> Result<Vec<f64>, FitError> {
        if self.coeffs.is_empty() {
            return Err(FitError::NotFitted);
        }
        Ok(self.forecast_steps(holdout.len()))
    }

    fn forecast_future(
        &self,
        _series: &[DailyObservation],
        horizon: usize,
        _ctx: &ForecastContext,
    ) -> Result<Vec<f64>, FitError> {
        if self.coeffs.is_empty() {
            return Err(FitError::NotFitted);
        }
        Ok(self.forecast_steps(horizon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(n)
    }

    fn linear_series(n: usize, slope: f64, intercept: f64) -> Vec<DailyObservation> {
        (0..n)
            .map(|i| DailyObservation {
                date: day(i as i64),
                quantity: intercept + slope * i as f64,
                ad_spend: 100.0,
            })
            .collect()
    }

    #[test]
    fn least_squares_recovers_plane_coefficients() {
        let rows: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![1.0, i as f64, (i * i) as f64 % 7.0])
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 2.0 + 3.0 * r[1] - 0.5 * r[2]).collect();
        let beta = solve_least_squares(&rows, &targets).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-4);
        assert!((beta[1] - 3.0).abs() < 1e-4);
        assert!((beta[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn seasonal_regression_tracks_a_linear_trend() {
        let series = linear_series(120, 2.0, 10.0);
        let mut model = SeasonalRegression::default();
        model.fit(&series).unwrap();

        let holdout = linear_series(130, 2.0, 10.0).split_off(120);
        let preds = model.predict_holdout(&holdout).unwrap();
        for (pred, obs) in preds.iter().zip(&holdout) {
            assert!((pred - obs.quantity).abs() < 5.0, "pred {pred} vs {}", obs.quantity);
        }
    }

    #[test]
    fn seasonal_regression_rejects_short_series() {
        let series = linear_series(10, 1.0, 5.0);
        let mut model = SeasonalRegression::default();
        assert!(matches!(
            model.fit(&series),
            Err(FitError::TooFewObservations { .. })
        ));
    }

    #[test]
    fn gradient_boost_learns_a_weekday_pattern() {
        // Weekends sell 60, weekdays 20.
        let series: Vec<DailyObservation> = (0..140)
            .map(|i| {
                let date = day(i);
                let weekend = date.weekday().num_days_from_monday() >= 5;
                DailyObservation {
                    date,
                    quantity: if weekend { 60.0 } else { 20.0 },
                    ad_spend: 50.0,
                }
            })
            .collect();
        let mut model = GradientBoostedTrees::default();
        model.fit(&series).unwrap();

        let holdout: Vec<DailyObservation> = (140..170)
            .map(|i| {
                let date = day(i);
                let weekend = date.weekday().num_days_from_monday() >= 5;
                DailyObservation {
                    date,
                    quantity: if weekend { 60.0 } else { 20.0 },
                    ad_spend: 50.0,
                }
            })
            .collect();
        let preds = model.predict_holdout(&holdout).unwrap();
        for (pred, obs) in preds.iter().zip(&holdout) {
            assert!((pred - obs.quantity).abs() < 10.0, "pred {pred} vs {}", obs.quantity);
        }
    }

    #[test]
    fn auto_arima_follows_an_ar1_process() {
        // y_t = 5 + 0.8 y_{t-1}, converging to 25.
        let mut y = 10.0;
        let series: Vec<DailyObservation> = (0..100)
            .map(|i| {
                y = 5.0 + 0.8 * y;
                DailyObservation { date: day(i), quantity: y, ad_spend: 0.0 }
            })
            .collect();
        let mut model = AutoArima::default();
        model.fit(&series).unwrap();
        let future = model
            .forecast_future(&series, 10, &ForecastContext { growth_multiplier: 1.0, mean_ad_spend: 0.0 })
            .unwrap();
        for f in future {
            assert!((f - 25.0).abs() < 2.0, "forecast {f} should be near the fixed point");
        }
    }

    #[test]
    fn unfitted_models_report_not_fitted() {
        let holdout = linear_series(10, 1.0, 1.0);
        assert_eq!(
            SeasonalRegression::default().predict_holdout(&holdout),
            Err(FitError::NotFitted)
        );
        assert_eq!(
            GradientBoostedTrees::default().predict_holdout(&holdout),
            Err(FitError::NotFitted)
        );
        assert_eq!(
            AutoArima::default().predict_holdout(&holdout),
            Err(FitError::NotFitted)
        );
    }
}
