use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sales venues the business operates on. The set is closed: every record
/// carries exactly one of these, and per-channel economics are total over
/// the enum (no stringly-typed lookups with silent defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Amazon,
    Flipkart,
    #[serde(rename = "Own_Website")]
    OwnWebsite,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Amazon, Channel::Flipkart, Channel::OwnWebsite];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Amazon => "Amazon",
            Channel::Flipkart => "Flipkart",
            Channel::OwnWebsite => "Own_Website",
        }
    }
}

/// Coarse demand geography. Every record resolves to one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    West,
    South,
    East,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::West, Region::South, Region::East];

    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::West => "West",
            Region::South => "South",
            Region::East => "East",
        }
    }
}

/// One historical order line. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product_id: String,
    pub price: f64,
    pub quantity_sold: u32,
    pub channel: Channel,
    pub region: Region,
    pub ad_spend: f64,
}

/// One day of demand after aggregation, the unit the forecasters consume.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// Total units sold that day.
    pub quantity: f64,
    /// Mean ad spend across that day's order lines.
    pub ad_spend: f64,
}
