// Gold: budget-derived columns and per-location aggregates

use super::{Lakehouse, Layer};
use crate::error::Result;
use crate::record::{to_csv_bytes, Affordability, ConcertRecord, GoldRecord, LocationStats};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GoldOutput {
    pub records: Vec<GoldRecord>,

    /// One row per non-null location, sorted by location
    pub location_stats: Vec<LocationStats>,
}

impl GoldOutput {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row count per affordability bucket, every bucket listed
    pub fn affordability_counts(&self) -> Vec<(Affordability, usize)> {
        Affordability::ALL
            .iter()
            .map(|bucket| {
                let count = self
                    .records
                    .iter()
                    .filter(|r| r.affordability == *bucket)
                    .count();
                (*bucket, count)
            })
            .collect()
    }
}

/// Add `efficiency_score` and `affordability` to every Silver row.
/// An empty input gives an empty output.
pub fn derive_gold(silver: &[ConcertRecord], budget: f64) -> GoldOutput {
    if silver.is_empty() {
        return GoldOutput::default();
    }

    let max_total = silver.iter().map(|r| r.total).fold(0.0, f64::max);
    let records: Vec<GoldRecord> = silver
        .iter()
        .cloned()
        .map(|record| {
            let efficiency = record.total / (max_total + 1.0);
            let affordability = Affordability::classify(record.total, budget);
            GoldRecord::from_record(record, efficiency, affordability)
        })
        .collect();

    let location_stats = location_stats(&records);
    GoldOutput {
        records,
        location_stats,
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, total: f64) {
        if self.count == 0 {
            self.min = total;
            self.max = total;
        } else {
            self.min = self.min.min(total);
            self.max = self.max.max(total);
        }
        self.sum += total;
        self.count += 1;
    }
}

/// mean/min/max/count of total per location, rounded half-to-even
pub fn location_stats(records: &[GoldRecord]) -> Vec<LocationStats> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        if let Some(location) = record.location.as_deref() {
            groups.entry(location).or_default().push(record.total);
        }
    }

    groups
        .into_iter()
        .map(|(location, acc)| LocationStats {
            location: location.to_string(),
            mean: (acc.sum / acc.count as f64).round_ties_even(),
            min: acc.min.round_ties_even(),
            max: acc.max.round_ties_even(),
            count: acc.count,
        })
        .collect()
}

impl Lakehouse {
    /// Derive the Gold table and persist it to the gold folder
    pub fn aggregate_gold(&self, silver: &[ConcertRecord], budget: f64) -> Result<GoldOutput> {
        let gold = derive_gold(silver, budget);
        if gold.is_empty() {
            tracing::warn!("no rows left after cleaning, gold table is empty");
        }

        for (bucket, count) in gold.affordability_counts() {
            tracing::debug!(affordability = %bucket, count, "gold bucket");
        }

        self.save(Layer::Gold, &to_csv_bytes(&gold.records)?, gold.records.len())?;
        Ok(gold)
    }
}
