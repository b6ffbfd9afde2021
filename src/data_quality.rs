// Data quality accounting for the Silver stage
//
// Silver never fails on bad values: it coerces them to null or drops the row.
// This report keeps count of what was coerced and what was dropped so the
// caller can tell a clean file from one that lost half its rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Row was dropped
    Warning,  // Value was coerced to null, row kept
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
    pub count: usize,
}

/// What Silver did to one Bronze table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped_missing_name: usize,
    pub dropped_missing_total: usize,
    pub dropped_negative_total: usize,

    /// Non-null cells that did not parse, per column
    pub coerced_to_null: BTreeMap<String, usize>,

    /// Negative cost components set to null, per column
    #[serde(default)]
    pub negative_to_null: BTreeMap<String, usize>,
}

impl CleaningReport {
    pub fn new(rows_in: usize) -> Self {
        CleaningReport {
            rows_in,
            ..Default::default()
        }
    }

    pub fn record_coercion(&mut self, column: &str) {
        *self.coerced_to_null.entry(column.to_string()).or_insert(0) += 1;
    }

    pub fn record_negative(&mut self, column: &str) {
        *self.negative_to_null.entry(column.to_string()).or_insert(0) += 1;
    }

    pub fn rows_dropped(&self) -> usize {
        self.dropped_missing_name + self.dropped_missing_total + self.dropped_negative_total
    }

    pub fn coerced_total(&self) -> usize {
        self.coerced_to_null.values().sum()
    }

    pub fn negative_total(&self) -> usize {
        self.negative_to_null.values().sum()
    }

    /// Share of input rows that survived, 1.0 for an empty input
    pub fn retention(&self) -> f64 {
        if self.rows_in == 0 {
            1.0
        } else {
            self.rows_out as f64 / self.rows_in as f64
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rows_dropped() == 0 && self.coerced_total() == 0 && self.negative_total() == 0
    }

    pub fn issues(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        let dropped = [
            ("nama_konser", "missing concert name", self.dropped_missing_name),
            ("total_pengeluaran", "missing or non-numeric total", self.dropped_missing_total),
            ("total_pengeluaran", "negative total", self.dropped_negative_total),
        ];
        for (field, issue, count) in dropped {
            if count > 0 {
                issues.push(QualityIssue {
                    severity: Severity::Critical,
                    field: field.to_string(),
                    issue: format!("{} row(s) dropped: {}", count, issue),
                    count,
                });
            }
        }

        for (column, count) in &self.coerced_to_null {
            issues.push(QualityIssue {
                severity: Severity::Warning,
                field: column.clone(),
                issue: format!("{} value(s) could not be parsed and were set to null", count),
                count: *count,
            });
        }

        for (column, count) in &self.negative_to_null {
            issues.push(QualityIssue {
                severity: Severity::Warning,
                field: column.clone(),
                issue: format!("{} negative value(s) set to null", count),
                count: *count,
            });
        }

        issues
    }

    pub fn summary(&self) -> String {
        format!(
            "Rows: {} in, {} out ({:.1}% kept), {} dropped, {} value(s) nulled",
            self.rows_in,
            self.rows_out,
            self.retention() * 100.0,
            self.rows_dropped(),
            self.coerced_total() + self.negative_total()
        )
    }
}
