// src/io/dataset.rs

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::model::config::ProductFilter;
use crate::model::record::{Channel, Region, SalesRecord};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dataset row: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("dataset contains no rows")]
    Empty,
}

const REQUIRED_COLUMNS: [&str; 4] = ["date", "product_id", "price", "quantity_sold"];

/// Raw CSV row. Channel and region are optional in the wild; absent values
/// are repaired during ingestion.
#[derive(Debug, Deserialize)]
struct RawSalesRow {
    date: NaiveDate,
    product_id: String,
    price: f64,
    quantity_sold: u32,
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    region: Option<Region>,
    #[serde(default)]
    ad_spend: f64,
}

/// An ingested, validated sales history. Owned by a single analysis run.
///
/// When the source file lacks channel or region columns, those values are
/// drawn uniformly at random so the rest of the pipeline can run. That is a
/// data repair, not an observation: the repair counters here are the
/// caller's signal that channel/region splits in the output are fabricated.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    records: Vec<SalesRecord>,
    pub repaired_channels: usize,
    pub repaired_regions: usize,
}

impl SalesDataset {
    pub fn from_path<P: AsRef<Path>>(path: P, rng: &mut impl Rng) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, rng)
    }

    pub fn from_reader<R: Read>(reader: R, rng: &mut impl Rng) -> Result<Self, DatasetError> {
        let mut rdr = csv::Reader::from_reader(reader);

        let headers = rdr.headers()?.clone();
        for col in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == col) {
                return Err(DatasetError::MissingColumn(col));
            }
        }

        let mut records = Vec::new();
        let mut repaired_channels = 0usize;
        let mut repaired_regions = 0usize;

        for row in rdr.deserialize::<RawSalesRow>() {
            let row = row?;
            let channel = row.channel.unwrap_or_else(|| {
                repaired_channels += 1;
                Channel::ALL[rng.gen_range(0..Channel::ALL.len())]
            });
            let region = row.region.unwrap_or_else(|| {
                repaired_regions += 1;
                Region::ALL[rng.gen_range(0..Region::ALL.len())]
            });
            records.push(SalesRecord {
                date: row.date,
                product_id: row.product_id,
                price: row.price,
                quantity_sold: row.quantity_sold,
                channel,
                region,
                ad_spend: row.ad_spend,
            });
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        if repaired_channels > 0 || repaired_regions > 0 {
            warn!(
                repaired_channels,
                repaired_regions,
                total_rows = records.len(),
                "dataset missing channel/region values; assigned uniformly at random"
            );
        }

        Ok(Self {
            records,
            repaired_channels,
            repaired_regions,
        })
    }

    /// Wraps already-constructed records, e.g. synthetic data. No repair.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Self {
            records,
            repaired_channels: 0,
            repaired_regions: 0,
        }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product ids, sorted.
    pub fn product_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.records.iter().map(|r| r.product_id.as_str()).collect();
        ids.into_iter().map(str::to_owned).collect()
    }

    /// Rows matching the product filter, in file order.
    pub fn select(&self, filter: &ProductFilter) -> Vec<SalesRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(&r.product_id))
            .cloned()
            .collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}
