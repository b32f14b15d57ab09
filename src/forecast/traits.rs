// src/forecast/traits.rs

use std::fmt::Debug;

use thiserror::Error;

use crate::model::record::DailyObservation;

/// Why a forecaster could not produce a usable fit. A failed fit
/// disqualifies the model from the tournament; it never aborts the run.
#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("series too short: need at least {needed} daily observations, got {got}")]
    TooFewObservations { needed: usize, got: usize },
    #[error("series is degenerate: {0}")]
    Degenerate(&'static str),
    #[error("model has not been fitted")]
    NotFitted,
}

/// Context for extending a fitted model past the end of the observed series.
#[derive(Debug, Clone, Copy)]
pub struct ForecastContext {
    /// `1 + growth_rate / 100`, the user's demand-growth assumption.
    pub growth_multiplier: f64,
    /// Mean daily ad spend over the observed series; models with an
    /// ad-spend regressor assume spend scales with the growth input.
    pub mean_ad_spend: f64,
}

/// A demand forecasting method competing in the tournament.
///
/// Lifecycle: `fit` on a training window, `predict_holdout` on the held-out
/// window for scoring; the tournament winner is refitted on the full series
/// and asked for `forecast_future`.
pub trait Forecaster: Debug {
    fn name(&self) -> &'static str;

    /// Fits the model to the given daily series.
    fn fit(&mut self, series: &[DailyObservation]) -> Result<(), FitError>;

    /// Predicts demand for each day of the held-out window. Exogenous
    /// features (dates, ad spend) come from the window itself; the target
    /// values in it are never consulted except as lag features within the
    /// window, mirroring how the model would see a fresh period.
    fn predict_holdout(&self, holdout: &[DailyObservation]) -> Result<Vec<f64>, FitError>;

    /// Extends the fitted series `horizon` days past its end. `series` must
    /// be the same data the model was fitted on.
    fn forecast_future(
        &self,
        series: &[DailyObservation],
        horizon: usize,
        ctx: &ForecastContext,
    ) -> Result<Vec<f64>, FitError>;
}
