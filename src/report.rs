// Plain-text rendering of pipeline results for the CLI

use crate::lakehouse::GoldOutput;
use crate::prescriptive::Recommendation;
use crate::record::{LocationStats, ScoredRecord};
use std::fmt::Write;

/// `1500000.4` -> `Rp1,500,000`
pub fn format_rupiah(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-Rp{}", grouped)
    } else {
        format!("Rp{}", grouped)
    }
}

pub fn format_optional_rupiah(amount: Option<f64>) -> String {
    amount.map(format_rupiah).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

pub fn gold_summary(gold: &GoldOutput, budget: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Gold table: {} concert(s) | Budget: {}",
        gold.records.len(),
        format_rupiah(budget)
    );
    for (bucket, count) in gold.affordability_counts() {
        let _ = writeln!(out, "  {:<16} {:>5}", bucket.label(), count);
    }
    out
}

pub fn location_table(stats: &[LocationStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>16} {:>16} {:>16} {:>6}",
        "Location", "Mean", "Min", "Max", "Count"
    );
    for row in stats {
        let _ = writeln!(
            out,
            "{:<20} {:>16} {:>16} {:>16} {:>6}",
            truncate(&row.location, 20),
            format_rupiah(row.mean),
            format_rupiah(row.min),
            format_rupiah(row.max),
            row.count
        );
    }
    out
}

pub fn ranking_table(rows: &[ScoredRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:<16} {:>16} {:<16} {:>6}",
        "#", "Concert", "Location", "Total", "Affordability", "Score"
    );
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:<16} {:>16} {:<16} {:>6.3}",
            i + 1,
            truncate(&row.name, 28),
            truncate(row.location.as_deref().unwrap_or("-"), 16),
            format_rupiah(row.total),
            row.affordability.label(),
            row.prescriptive_score
        );
    }
    out
}

/// Breakdown of the optimal concert, or the "nothing fits" notice
pub fn recommendation_summary(recommendation: Option<&Recommendation>) -> String {
    let optimal = match recommendation {
        Some(rec) => &rec.optimal,
        None => return "No concert fits the budget.\n".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "OPTIMAL RECOMMENDATION (score: {:.3})",
        optimal.prescriptive_score
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Concert:      {}", optimal.name);
    let _ = writeln!(out, "Location:     {}", optimal.location.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "Date:         {}",
        optimal
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "Total cost:   {}", format_rupiah(optimal.total));
    let _ = writeln!(out, "Budget left:  {}", format_rupiah(optimal.sisa_budget));
    let _ = writeln!(out, "Merchandise:  {}", format_optional_rupiah(optimal.merchandise));
    let _ = writeln!(out);
    let _ = writeln!(out, "Score breakdown:");
    let _ = writeln!(out, "  Cost efficiency:   {:.2}", optimal.score_cost);
    let _ = writeln!(out, "  Budget remaining:  {:.2}", optimal.score_remaining);
    let _ = writeln!(out, "  Experience value:  {:.2}", optimal.score_experience);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Affordability, GoldRecord};
    use crate::prescriptive::PrescriptiveEngine;

    fn gold(name: &str, total: f64, merchandise: Option<f64>) -> GoldRecord {
        GoldRecord {
            name: name.to_string(),
            location: Some("Jakarta".to_string()),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15),
            ticket_price: None,
            transport_cost: None,
            accommodation_cost: None,
            merchandise,
            total,
            efficiency_score: 0.0,
            affordability: Affordability::classify(total, 3_000_000.0),
        }
    }

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(0.0), "Rp0");
        assert_eq!(format_rupiah(999.0), "Rp999");
        assert_eq!(format_rupiah(1000.0), "Rp1,000");
        assert_eq!(format_rupiah(1_500_000.4), "Rp1,500,000");
        assert_eq!(format_rupiah(123_456_789.0), "Rp123,456,789");
        assert_eq!(format_rupiah(-2500.0), "-Rp2,500");
        assert_eq!(format_optional_rupiah(None), "-");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("BTS", 10), "BTS");
        assert_eq!(truncate("Seventeen World Tour", 10), "Sevente...");
        assert_eq!(truncate("ソウルコンサート", 5), "ソウ...");
    }

    #[test]
    fn test_recommendation_summary() {
        let rows = vec![gold("BTS", 2_500_000.0, Some(300_000.0)), gold("IU", 1_000_000.0, None)];
        let rec = PrescriptiveEngine::new(&rows, 3_000_000.0).calc_scores();
        let text = recommendation_summary(rec.as_ref());

        assert!(text.starts_with("OPTIMAL RECOMMENDATION"));
        assert!(text.contains("Total cost:   Rp"));
        assert!(text.contains("Score breakdown:"));

        assert_eq!(recommendation_summary(None), "No concert fits the budget.\n");
    }

    #[test]
    fn test_ranking_table_rows() {
        let rows = vec![gold("BTS", 2_500_000.0, Some(300_000.0)), gold("IU", 1_000_000.0, None)];
        let rec = PrescriptiveEngine::new(&rows, 3_000_000.0).calc_scores().unwrap();
        let text = ranking_table(rec.top(10));

        assert_eq!(text.lines().count(), 3, "header plus two rows");
        assert!(text.contains("Rp2,500,000"));
    }

    #[test]
    fn test_location_table() {
        let stats = vec![LocationStats {
            location: "Jakarta".to_string(),
            mean: 1_250_000.0,
            min: 1_000_000.0,
            max: 1_500_000.0,
            count: 2,
        }];
        let text = location_table(&stats);

        assert!(text.contains("Jakarta"));
        assert!(text.contains("Rp1,250,000"));
        assert!(text.trim_end().ends_with('2'));
    }
}
