// src/io/synthetic.rs

use chrono::{Datelike, Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::Normal;

use crate::model::record::{Channel, Region, SalesRecord};

/// Demand shape of a synthetic product over the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonProfile {
    /// Consistent year-round.
    Flat,
    /// Peaks April through June.
    Summer,
    /// Peaks October through December.
    Festive,
    /// Peaks late January through May.
    Cricket,
}

#[derive(Debug, Clone)]
pub struct SyntheticProduct {
    pub id: &'static str,
    /// Baseline units per day before any multiplier.
    pub base_volume: f64,
    pub price: f64,
    pub season: SeasonProfile,
}

/// The demo catalogue used by the CLI when no dataset is supplied.
pub fn demo_catalog() -> Vec<SyntheticProduct> {
    vec![
        SyntheticProduct { id: "PRO_RUN_SHOES", base_volume: 50.0, price: 2500.0, season: SeasonProfile::Summer },
        SyntheticProduct { id: "CRICKET_JERSEY", base_volume: 25.0, price: 1200.0, season: SeasonProfile::Cricket },
        SyntheticProduct { id: "SMART_WATCH", base_volume: 35.0, price: 4500.0, season: SeasonProfile::Festive },
        SyntheticProduct { id: "YOGA_MAT", base_volume: 40.0, price: 1500.0, season: SeasonProfile::Flat },
        SyntheticProduct { id: "FITNESS_BAND", base_volume: 45.0, price: 3000.0, season: SeasonProfile::Festive },
    ]
}

// Historical channel mix is marketplace-heavy with a thin direct channel.
const CHANNEL_WEIGHTS: [f64; 3] = [0.55, 0.35, 0.10];
// North-heavy regional split, consistent with a single Delhi warehouse.
const REGION_WEIGHTS: [f64; 4] = [0.35, 0.30, 0.20, 0.15];

fn seasonal_multiplier(day_of_year: u32) -> f64 {
    match day_of_year {
        274..=366 => 2.8, // festive quarter
        90..=180 => 1.4,  // summer
        181..=273 => 0.9, // monsoon dip
        _ => 1.0,
    }
}

fn product_season_multiplier(season: SeasonProfile, day_of_year: u32) -> f64 {
    match season {
        SeasonProfile::Summer if (90..=180).contains(&day_of_year) => 1.5,
        SeasonProfile::Festive if (274..=366).contains(&day_of_year) => 2.0,
        SeasonProfile::Cricket if (30..=150).contains(&day_of_year) => 1.8,
        _ => 1.0,
    }
}

fn ad_spend_rate(channel: Channel, rng: &mut impl Rng) -> f64 {
    match channel {
        Channel::OwnWebsite => rng.gen_range(0.20..0.25),
        Channel::Amazon => rng.gen_range(0.05..0.08),
        Channel::Flipkart => rng.gen_range(0.06..0.09),
    }
}

/// Generates a seasonal multi-product sales history starting 2023-01-01.
///
/// Daily volume = base x growth trend x seasonality x weekend boost x
/// product season x normal noise, split across channels by the historical
/// mix and assigned a weighted random region. All draws come from the
/// caller's RNG, so a fixed seed reproduces the dataset exactly.
pub fn generate_sales_history(
    days: usize,
    products: &[SyntheticProduct],
    rng: &mut impl Rng,
) -> Vec<SalesRecord> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("static date");
    let noise = Normal::new(1.0, 0.25).expect("valid distribution");
    let channel_pick = WeightedIndex::new(CHANNEL_WEIGHTS).expect("static weights");
    let region_pick = WeightedIndex::new(REGION_WEIGHTS).expect("static weights");

    let mut records = Vec::new();

    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        let day_of_year = date.ordinal();
        let weekend_boost = if date.weekday().number_from_monday() >= 6 { 1.3 } else { 1.0 };
        let growth_trend = 1.0 + (offset as f64 / 365.0) * 0.18;
        let season = seasonal_multiplier(day_of_year);

        for product in products {
            let product_season = product_season_multiplier(product.season, day_of_year);
            let daily_noise: f64 = noise.sample(rng);
            let demand = product.base_volume * growth_trend * season * weekend_boost
                * product_season
                * daily_noise;
            let demand = demand.max(0.0) as u32;
            if demand == 0 {
                continue;
            }

            // Split the day's demand across channels unit by unit.
            let mut per_channel = [0u32; 3];
            for _ in 0..demand {
                per_channel[channel_pick.sample(rng)] += 1;
            }

            for (idx, qty) in per_channel.into_iter().enumerate() {
                if qty == 0 {
                    continue;
                }
                let channel = Channel::ALL[idx];
                let price = product.price * rng.gen_range(0.95..1.05);
                let ad_spend = qty as f64 * product.price * ad_spend_rate(channel, rng);
                let region = Region::ALL[region_pick.sample(rng)];

                records.push(SalesRecord {
                    date,
                    product_id: product.id.to_owned(),
                    price: (price * 100.0).round() / 100.0,
                    quantity_sold: qty,
                    channel,
                    region,
                    ad_spend: (ad_spend * 100.0).round() / 100.0,
                });
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generates_plausible_rows() {
        let mut rng = StdRng::seed_from_u64(1);
        let records = generate_sales_history(90, &demo_catalog(), &mut rng);
        assert!(!records.is_empty());
        for r in &records {
            assert!(r.quantity_sold > 0);
            assert!(r.price > 0.0);
            assert!(r.ad_spend >= 0.0);
        }
    }

    #[test]
    fn fixed_seed_reproduces_the_dataset() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let ra = generate_sales_history(30, &demo_catalog(), &mut a);
        let rb = generate_sales_history(30, &demo_catalog(), &mut b);
        assert_eq!(ra.len(), rb.len());
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.quantity_sold, y.quantity_sold);
            assert_eq!(x.channel, y.channel);
            assert_eq!(x.region, y.region);
        }
    }

    #[test]
    fn festive_quarter_outsells_monsoon_quarter() {
        let mut rng = StdRng::seed_from_u64(5);
        let records = generate_sales_history(365, &demo_catalog(), &mut rng);
        let vol_in = |lo: u32, hi: u32| -> u64 {
            records
                .iter()
                .filter(|r| (lo..=hi).contains(&r.date.ordinal()))
                .map(|r| u64::from(r.quantity_sold))
                .sum()
        };
        assert!(vol_in(274, 365) > vol_in(181, 273));
    }
}
