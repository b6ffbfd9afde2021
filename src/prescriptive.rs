// Prescriptive Engine
// Ranks budget-feasible concerts by a weighted mix of three normalized scores:
// cheapness, budget left over, and merchandise (experience) value.

use crate::error::ConfigError;
use crate::record::{to_csv_bytes, GoldRecord, ScoredRecord};
use serde::{Deserialize, Serialize};

// ============================================================================
// WEIGHTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub cost: f64,
    pub remaining: f64,
    pub experience: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            cost: 0.4,
            remaining: 0.3,
            experience: 0.3,
        }
    }
}

impl Weights {
    pub fn new(cost: f64, remaining: f64, experience: f64) -> Self {
        Weights {
            cost,
            remaining,
            experience,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("cost", self.cost),
            ("remaining", self.remaining),
            ("experience", self.experience),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.cost + self.remaining + self.experience
    }

    pub fn sums_to_one(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-9
    }

    fn combine(&self, cost: f64, remaining: f64, experience: f64) -> f64 {
        self.cost * cost + self.remaining * remaining + self.experience * experience
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// First row (in input order) with the highest score
    pub optimal: ScoredRecord,

    /// Whole feasible set, best first; ties keep input order
    pub ranked: Vec<ScoredRecord>,
}

impl Recommendation {
    pub fn top(&self, n: usize) -> &[ScoredRecord] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    pub fn ranked_csv(&self) -> Result<Vec<u8>, csv::Error> {
        to_csv_bytes(&self.ranked)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct PrescriptiveEngine<'a> {
    records: &'a [GoldRecord],
    budget: f64,
    weights: Weights,
}

impl<'a> PrescriptiveEngine<'a> {
    /// `budget` should be the one the Gold table was built with; it is not re-checked
    pub fn new(records: &'a [GoldRecord], budget: f64) -> Self {
        PrescriptiveEngine {
            records,
            budget,
            weights: Weights::default(),
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    /// Rows whose total does not exceed the budget, in input order
    pub fn feasible(&self) -> impl Iterator<Item = &'a GoldRecord> + '_ {
        self.records.iter().filter(move |r| r.total <= self.budget)
    }

    /// `None` when no concert fits the budget
    pub fn calc_scores(&self) -> Option<Recommendation> {
        let feasible: Vec<&GoldRecord> = self.feasible().collect();
        if feasible.is_empty() {
            tracing::debug!(budget = self.budget, "no feasible concerts");
            return None;
        }

        let max_total = feasible.iter().map(|r| r.total).fold(f64::NEG_INFINITY, f64::max);
        let min_total = feasible.iter().map(|r| r.total).fold(f64::INFINITY, f64::min);
        // Largest leftover belongs to the cheapest row
        let max_remaining = self.budget - min_total;
        // Silver nulls negative costs; rows built elsewhere are floored at zero
        let max_merchandise = feasible
            .iter()
            .filter_map(|r| r.merchandise)
            .map(|m| m.max(0.0))
            .fold(f64::NEG_INFINITY, f64::max);

        // A criterion with no spread (or a zero denominator) ranks everyone equal at 1
        let cost_spread = max_total > min_total && max_total > 0.0;

        let scored: Vec<ScoredRecord> = feasible
            .iter()
            .map(|record| {
                let mut row = ScoredRecord::unscored(record);

                row.score_cost = if cost_spread {
                    1.0 - record.total / max_total
                } else {
                    1.0
                };

                row.sisa_budget = self.budget - record.total;
                row.score_remaining = if max_remaining > 0.0 {
                    row.sisa_budget / max_remaining
                } else {
                    1.0
                };

                row.score_experience = match record.merchandise {
                    None => 0.0,
                    Some(_) if max_merchandise <= 0.0 => 1.0,
                    Some(merchandise) => merchandise.max(0.0) / max_merchandise,
                };

                row.prescriptive_score = self.weights.combine(
                    row.score_cost,
                    row.score_remaining,
                    row.score_experience,
                );
                row
            })
            .collect();

        let mut best = 0;
        for (i, row) in scored.iter().enumerate() {
            if row.prescriptive_score > scored[best].prescriptive_score {
                best = i;
            }
        }
        let optimal = scored[best].clone();

        let mut ranked = scored;
        ranked.sort_by(|a, b| b.prescriptive_score.total_cmp(&a.prescriptive_score));

        tracing::debug!(
            feasible = ranked.len(),
            optimal = %optimal.name,
            score = optimal.prescriptive_score,
            "prescriptive scores computed"
        );

        Some(Recommendation { optimal, ranked })
    }
}
