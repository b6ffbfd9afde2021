// Record tables flowing between the lakehouse layers
//
// Bronze keeps the source file as untyped text (`RawTable`). From Silver on,
// every row is a typed struct whose serde names are the CSV column names, so
// the persisted files keep the exact schema the downstream tools expect.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const COL_NAME: &str = "nama_konser";
pub const COL_LOCATION: &str = "lokasi";
pub const COL_DATE: &str = "tanggal";
pub const COL_TICKET: &str = "harga_tiket";
pub const COL_TRANSPORT: &str = "biaya_transport";
pub const COL_ACCOMMODATION: &str = "biaya_akomodasi";
pub const COL_MERCHANDISE: &str = "merchandise";
pub const COL_TOTAL: &str = "total_pengeluaran";

/// Columns Silver requires, in output order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_NAME,
    COL_LOCATION,
    COL_DATE,
    COL_TICKET,
    COL_TRANSPORT,
    COL_ACCOMMODATION,
    COL_MERCHANDISE,
    COL_TOTAL,
];

/// Tokens read as missing values (the usual dataframe NA spellings)
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Lenient numeric coercion: anything unparseable (or non-finite) is null
pub fn parse_number(raw: &str) -> Option<f64> {
    if is_null_token(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient date coercion: anything unparseable is null
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d %B %Y", "%d %b %Y",
        "%B %d, %Y", "%b %d, %Y",
    ];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M",
    ];

    if is_null_token(raw) {
        return None;
    }
    let s = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

// ============================================================================
// BRONZE: RAW TABLE
// ============================================================================

/// The source file exactly as read: header plus text cells, no coercion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Read CSV text with a header line. Short rows are padded with empty
    /// cells; a row wider than the header is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.len() > width {
                let line = record.position().map_or(0, |p| p.line());
                return Err(csv::Error::from(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "line {}: {} fields but the header has {}",
                        line,
                        record.len(),
                        width
                    ),
                )));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required columns that are not in the header, in `required` order
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|col| self.column_index(col).is_none())
            .map(|col| col.to_string())
            .collect()
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
    }
}

// ============================================================================
// SILVER: CLEANED RECORD
// ============================================================================

/// Column set of a typed table, written as the CSV header
pub trait CsvTable {
    const COLUMNS: &'static [&'static str];
}

/// One concert-expense entry after type coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcertRecord {
    #[serde(rename = "nama_konser")]
    pub name: String,

    #[serde(rename = "lokasi")]
    pub location: Option<String>,

    #[serde(rename = "tanggal")]
    pub date: Option<NaiveDate>,

    #[serde(rename = "harga_tiket")]
    pub ticket_price: Option<f64>,

    #[serde(rename = "biaya_transport")]
    pub transport_cost: Option<f64>,

    #[serde(rename = "biaya_akomodasi")]
    pub accommodation_cost: Option<f64>,

    #[serde(rename = "merchandise")]
    pub merchandise: Option<f64>,

    /// Never null and never negative once a row reaches Silver
    #[serde(rename = "total_pengeluaran")]
    pub total: f64,
}

impl CsvTable for ConcertRecord {
    const COLUMNS: &'static [&'static str] = &REQUIRED_COLUMNS;
}

// ============================================================================
// GOLD: ANALYTICS RECORD
// ============================================================================

/// Budget bucket of a concert's total expenditure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affordability {
    #[serde(rename = "Very Affordable")]
    VeryAffordable,
    #[serde(rename = "Affordable")]
    Affordable,
    #[serde(rename = "At Limit")]
    AtLimit,
    #[serde(rename = "Not Affordable")]
    NotAffordable,
}

impl Affordability {
    pub const ALL: [Affordability; 4] = [
        Affordability::VeryAffordable,
        Affordability::Affordable,
        Affordability::AtLimit,
        Affordability::NotAffordable,
    ];

    /// Thresholds are fixed fractions of the budget, inclusive on the upper bound
    pub fn classify(total: f64, budget: f64) -> Self {
        if total <= budget * 0.5 {
            Affordability::VeryAffordable
        } else if total <= budget * 0.8 {
            Affordability::Affordable
        } else if total <= budget {
            Affordability::AtLimit
        } else {
            Affordability::NotAffordable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Affordability::VeryAffordable => "Very Affordable",
            Affordability::Affordable => "Affordable",
            Affordability::AtLimit => "At Limit",
            Affordability::NotAffordable => "Not Affordable",
        }
    }
}

impl std::fmt::Display for Affordability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Silver row plus the budget-derived columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldRecord {
    #[serde(rename = "nama_konser")]
    pub name: String,

    #[serde(rename = "lokasi")]
    pub location: Option<String>,

    #[serde(rename = "tanggal")]
    pub date: Option<NaiveDate>,

    #[serde(rename = "harga_tiket")]
    pub ticket_price: Option<f64>,

    #[serde(rename = "biaya_transport")]
    pub transport_cost: Option<f64>,

    #[serde(rename = "biaya_akomodasi")]
    pub accommodation_cost: Option<f64>,

    #[serde(rename = "merchandise")]
    pub merchandise: Option<f64>,

    #[serde(rename = "total_pengeluaran")]
    pub total: f64,

    /// total / (max total + 1), in [0, 1)
    pub efficiency_score: f64,

    pub affordability: Affordability,
}

impl GoldRecord {
    pub fn from_record(
        record: ConcertRecord,
        efficiency_score: f64,
        affordability: Affordability,
    ) -> Self {
        GoldRecord {
            name: record.name,
            location: record.location,
            date: record.date,
            ticket_price: record.ticket_price,
            transport_cost: record.transport_cost,
            accommodation_cost: record.accommodation_cost,
            merchandise: record.merchandise,
            total: record.total,
            efficiency_score,
            affordability,
        }
    }
}

impl CsvTable for GoldRecord {
    const COLUMNS: &'static [&'static str] = &[
        COL_NAME,
        COL_LOCATION,
        COL_DATE,
        COL_TICKET,
        COL_TRANSPORT,
        COL_ACCOMMODATION,
        COL_MERCHANDISE,
        COL_TOTAL,
        "efficiency_score",
        "affordability",
    ];
}

/// Per-location aggregate of total expenditure, rounded to whole units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    #[serde(rename = "lokasi")]
    pub location: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl CsvTable for LocationStats {
    const COLUMNS: &'static [&'static str] = &[COL_LOCATION, "mean", "min", "max", "count"];
}

// ============================================================================
// PRESCRIPTIVE: SCORED RECORD
// ============================================================================

/// Feasible Gold row with its recommendation sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(rename = "nama_konser")]
    pub name: String,

    #[serde(rename = "lokasi")]
    pub location: Option<String>,

    #[serde(rename = "tanggal")]
    pub date: Option<NaiveDate>,

    #[serde(rename = "harga_tiket")]
    pub ticket_price: Option<f64>,

    #[serde(rename = "biaya_transport")]
    pub transport_cost: Option<f64>,

    #[serde(rename = "biaya_akomodasi")]
    pub accommodation_cost: Option<f64>,

    #[serde(rename = "merchandise")]
    pub merchandise: Option<f64>,

    #[serde(rename = "total_pengeluaran")]
    pub total: f64,

    pub efficiency_score: f64,
    pub affordability: Affordability,

    pub score_cost: f64,

    /// Budget left after this concert
    pub sisa_budget: f64,

    pub score_remaining: f64,
    pub score_experience: f64,
    pub prescriptive_score: f64,
}

impl ScoredRecord {
    /// Gold row with all scores zeroed; the engine fills them in
    pub fn unscored(record: &GoldRecord) -> Self {
        ScoredRecord {
            name: record.name.clone(),
            location: record.location.clone(),
            date: record.date,
            ticket_price: record.ticket_price,
            transport_cost: record.transport_cost,
            accommodation_cost: record.accommodation_cost,
            merchandise: record.merchandise,
            total: record.total,
            efficiency_score: record.efficiency_score,
            affordability: record.affordability,
            score_cost: 0.0,
            sisa_budget: 0.0,
            score_remaining: 0.0,
            score_experience: 0.0,
            prescriptive_score: 0.0,
        }
    }
}

impl CsvTable for ScoredRecord {
    const COLUMNS: &'static [&'static str] = &[
        COL_NAME,
        COL_LOCATION,
        COL_DATE,
        COL_TICKET,
        COL_TRANSPORT,
        COL_ACCOMMODATION,
        COL_MERCHANDISE,
        COL_TOTAL,
        "efficiency_score",
        "affordability",
        "score_cost",
        "sisa_budget",
        "score_remaining",
        "score_experience",
        "prescriptive_score",
    ];
}

// ============================================================================
// CSV HELPERS
// ============================================================================

/// Serialize a typed table. The header is always written, even for zero rows.
pub fn to_csv_bytes<T: Serialize + CsvTable>(rows: &[T]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Read back a typed table written by `to_csv_bytes`
pub fn from_csv_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(bytes);
    rdr.deserialize().collect()
}
