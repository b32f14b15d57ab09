//! Supply-chain decision engine: forecasts demand from historical order
//! data, sizes the fulfilment network, allocates inventory across sales
//! channels under business constraints, derives an EOQ replenishment plan
//! and projects the financial outcome against a reconstructed historical
//! baseline.

pub mod analysis;
pub mod forecast;
pub mod geo;
pub mod io;
pub mod model;

pub use analysis::engine::{run_analysis, StrategyReport};
pub use io::dataset::{DatasetError, SalesDataset};
pub use model::config::{AnalysisParams, ProductFilter};
