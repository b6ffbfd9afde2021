// Silver: schema check, type coercion and row filtering
//
// Bad cells become null instead of failing the run, and so do negative cost
// components. Rows without a name or a total, or with a negative total, are
// dropped. Surviving rows keep their
// input order.

use super::{Lakehouse, Layer};
use crate::data_quality::CleaningReport;
use crate::error::{PipelineError, Result};
use crate::record::{
    is_null_token, parse_date, parse_number, to_csv_bytes, ConcertRecord, RawTable, COL_ACCOMMODATION,
    COL_DATE, COL_LOCATION, COL_MERCHANDISE, COL_NAME, COL_TICKET, COL_TOTAL, COL_TRANSPORT,
    REQUIRED_COLUMNS,
};

/// Positions of the required columns in the Bronze header
struct Columns {
    name: usize,
    location: usize,
    date: usize,
    ticket: usize,
    transport: usize,
    accommodation: usize,
    merchandise: usize,
    total: usize,
}

impl Columns {
    fn locate(raw: &RawTable) -> Result<Self> {
        let missing = raw.missing_columns(&REQUIRED_COLUMNS);
        if !missing.is_empty() {
            return Err(PipelineError::Schema { missing });
        }

        // Every lookup below succeeds after the check above
        let find = |col: &str| raw.column_index(col).unwrap_or_default();
        Ok(Columns {
            name: find(COL_NAME),
            location: find(COL_LOCATION),
            date: find(COL_DATE),
            ticket: find(COL_TICKET),
            transport: find(COL_TRANSPORT),
            accommodation: find(COL_ACCOMMODATION),
            merchandise: find(COL_MERCHANDISE),
            total: find(COL_TOTAL),
        })
    }
}

fn coerce_number(raw: &str, column: &str, report: &mut CleaningReport) -> Option<f64> {
    let value = parse_number(raw);
    if value.is_none() && !is_null_token(raw) {
        report.record_coercion(column);
    }
    value
}

/// A cost component: unparsable or negative values become null
fn coerce_cost(raw: &str, column: &str, report: &mut CleaningReport) -> Option<f64> {
    match coerce_number(raw, column, report) {
        Some(value) if value < 0.0 => {
            report.record_negative(column);
            None
        }
        value => value,
    }
}

/// Validate and clean a Bronze table
pub fn clean_records(raw: &RawTable) -> Result<(Vec<ConcertRecord>, CleaningReport)> {
    let cols = Columns::locate(raw)?;
    let mut report = CleaningReport::new(raw.len());
    let mut records = Vec::with_capacity(raw.len());

    for row in raw.rows() {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        let date_raw = cell(cols.date);
        let date = parse_date(date_raw);
        if date.is_none() && !is_null_token(date_raw) {
            report.record_coercion(COL_DATE);
        }

        let ticket_price = coerce_cost(cell(cols.ticket), COL_TICKET, &mut report);
        let transport_cost = coerce_cost(cell(cols.transport), COL_TRANSPORT, &mut report);
        let accommodation_cost =
            coerce_cost(cell(cols.accommodation), COL_ACCOMMODATION, &mut report);
        let merchandise = coerce_cost(cell(cols.merchandise), COL_MERCHANDISE, &mut report);
        let total = coerce_number(cell(cols.total), COL_TOTAL, &mut report);

        let name = cell(cols.name);
        if is_null_token(name) {
            report.dropped_missing_name += 1;
            continue;
        }
        let total = match total {
            Some(total) => total,
            None => {
                report.dropped_missing_total += 1;
                continue;
            }
        };
        if total < 0.0 {
            report.dropped_negative_total += 1;
            continue;
        }

        let location = cell(cols.location);
        records.push(ConcertRecord {
            name: name.to_string(),
            location: (!is_null_token(location)).then(|| location.to_string()),
            date,
            ticket_price,
            transport_cost,
            accommodation_cost,
            merchandise,
            total,
        });
    }

    report.rows_out = records.len();
    Ok((records, report))
}

impl Lakehouse {
    /// Clean the Bronze table and persist the result to the silver folder
    pub fn transform_silver(&self, bronze: &RawTable) -> Result<Vec<ConcertRecord>> {
        let (records, report) = clean_records(bronze)?;

        if report.is_clean() {
            tracing::debug!("{}", report.summary());
        } else {
            tracing::warn!("{}", report.summary());
            for issue in report.issues() {
                tracing::debug!(field = %issue.field, severity = ?issue.severity, "{}", issue.issue);
            }
        }

        self.save(Layer::Silver, &to_csv_bytes(&records)?, records.len())?;
        Ok(records)
    }
}
