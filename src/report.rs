//! Headless rendering of a snapshot for `--report`.

use color_eyre::Result;
use serde::Serialize;

use crate::category::CategoryPerformance;
use crate::dashboard::DashboardSnapshot;
use crate::filter::DateBounds;
use crate::format::{
    format_count, format_delta, format_percent, format_score, format_thousands,
};
use crate::ReportFormat;

#[derive(Serialize)]
struct JsonReport<'a> {
    available: Option<DateBounds>,
    #[serde(flatten)]
    snapshot: &'a DashboardSnapshot,
}

pub fn render_report(
    snapshot: &DashboardSnapshot,
    bounds: Option<DateBounds>,
    format: ReportFormat,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(snapshot, bounds)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport {
            available: bounds,
            snapshot,
        })?),
    }
}

/// Sentence describing how much scores drop when deliveries are late.
pub fn delay_narrative(snapshot: &DashboardSnapshot) -> String {
    let delay = &snapshot.delay;
    match (delay.delta, delay.late.mean_score) {
        (Some(delta), Some(late)) if delta > 0.0 => format!(
            "Review scores drop by {:.2} points when a delivery is late; late orders average {:.2}.",
            delta, late
        ),
        (Some(delta), Some(late)) => format!(
            "Late deliveries do not lower review scores here (difference {:+.2}); late orders average {:.2}.",
            -delta, late
        ),
        _ => "Not enough delivered orders with reviews in both groups to compare.".to_string(),
    }
}

/// Short observations about the current range, shown by the insights view.
pub fn insight_notes(snapshot: &DashboardSnapshot) -> Vec<String> {
    let mut notes = Vec::new();
    let cats = &snapshot.categories;

    if let Some(top) = cats.first() {
        notes.push(format!(
            "{} brings in the most revenue ({}).",
            top.category,
            format_thousands(top.revenue)
        ));
    }
    if cats.len() > 1 {
        let by_rate = |a: &&CategoryPerformance, b: &&CategoryPerformance| {
            a.cancellation_rate.total_cmp(&b.cancellation_rate)
        };
        if let (Some(high), Some(low)) = (cats.iter().max_by(by_rate), cats.iter().min_by(by_rate)) {
            if high.cancellation_rate > low.cancellation_rate {
                notes.push(format!(
                    "{} has the highest cancellation rate among the top categories ({}).",
                    high.category,
                    format_percent(high.cancellation_rate)
                ));
                notes.push(format!(
                    "{} has the lowest cancellation rate ({}).",
                    low.category,
                    format_percent(low.cancellation_rate)
                ));
            }
        }
    }
    notes.push(delay_narrative(snapshot));
    notes
}

pub fn render_text(snapshot: &DashboardSnapshot, bounds: Option<DateBounds>) -> String {
    let mut out = String::from("E-Commerce Business Insights\n");
    let k = &snapshot.kpis;

    if let Some(b) = bounds {
        out.push_str(&format!("Data available: {} to {}\n", b.min(), b.max()));
    }
    out.push_str(&format!(
        "Range: {} to {} ({} order lines)\n\n",
        snapshot.range.start(),
        snapshot.range.end(),
        format_count(snapshot.rows as u64)
    ));
    out.push_str(&format!(
        "Total Revenue        {}\n",
        format_thousands(k.total_revenue)
    ));
    out.push_str(&format!(
        "Total Orders         {}\n",
        format_count(k.total_orders)
    ));
    out.push_str(&format!(
        "Average Review Score {} / 5.0\n\n",
        format_score(k.avg_review_score)
    ));

    out.push_str("Top categories by revenue\n");
    if snapshot.categories.is_empty() {
        out.push_str("  (no delivered orders in range)\n");
    } else {
        let width = snapshot
            .categories
            .iter()
            .map(|c| c.category.chars().count())
            .max()
            .unwrap_or(0)
            .max("Category".len());
        out.push_str(&format!(
            "  {:<width$}  {:>14}  {:>8}  {:>8}  {:>8}\n",
            "Category", "Revenue", "Orders", "Canceled", "Rate"
        ));
        for c in &snapshot.categories {
            out.push_str(&format!(
                "  {:<width$}  {:>14}  {:>8}  {:>8}  {:>8}\n",
                c.category,
                format_thousands(c.revenue),
                format_count(c.total_orders),
                format_count(c.canceled_orders),
                format_percent(c.cancellation_rate)
            ));
        }
    }
    out.push('\n');

    let d = &snapshot.delay;
    out.push_str("Delivery delay vs. review score\n");
    out.push_str(&format!(
        "  On Time  {} ({} lines)\n",
        format_score(d.on_time.mean_score),
        format_count(d.on_time.orders)
    ));
    out.push_str(&format!(
        "  Late     {} ({} lines)\n",
        format_score(d.late.mean_score),
        format_count(d.late.orders)
    ));
    out.push_str(&format!(
        "  Difference (on time - late) {}\n\n",
        format_delta(d.delta)
    ));

    out.push_str("Insights\n");
    for note in insight_notes(snapshot) {
        out.push_str(&format!("  * {}\n", note));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::compute_snapshot;
    use crate::fixtures::{table, OrderRow};

    fn snapshot() -> (DashboardSnapshot, Option<DateBounds>) {
        let t = table(&[
            OrderRow::delivered("o1", "Toys", 1500.0)
                .purchased("2022-01-02 10:00:00")
                .delivery("2022-01-12 00:00:00", "2022-01-10 00:00:00")
                .review(2.0),
            OrderRow::delivered("o2", "Books", 30.0)
                .purchased("2022-01-20 10:00:00")
                .delivery("2022-01-25 00:00:00", "2022-01-30 00:00:00")
                .review(5.0),
        ]);
        let b = t.date_bounds().unwrap();
        (compute_snapshot(&t, b.min(), b.max(), 10).unwrap(), Some(b))
    }

    #[test]
    fn text_report_contains_cards() {
        let (s, b) = snapshot();
        let text = render_text(&s, b);
        assert!(text.contains("Data available: 2022-01-02 to 2022-01-20"));
        assert!(text.contains("Total Revenue        1,530"));
        assert!(text.contains("Average Review Score 3.50 / 5.0"));
        assert!(text.contains("Toys"));
        assert!(text.contains("Difference (on time - late) +3.00"));
        assert!(text.contains("drop by 3.00 points"));
        assert!(text.contains("* Toys brings in the most revenue (1,500)."));
    }

    #[test]
    fn text_report_section_layout() {
        let (s, b) = snapshot();
        let text = render_text(&s, b);
        let lines: Vec<&str> = text.lines().take(9).collect();
        assert_eq!(
            lines,
            [
                "E-Commerce Business Insights",
                "Data available: 2022-01-02 to 2022-01-20",
                "Range: 2022-01-02 to 2022-01-20 (2 order lines)",
                "",
                "Total Revenue        1,530",
                "Total Orders         2",
                "Average Review Score 3.50 / 5.0",
                "",
                "Top categories by revenue",
            ]
        );
        assert!(text.ends_with(".\n"));

        let without_bounds = render_text(&s, None);
        assert!(!without_bounds.contains("Data available"));
    }

    #[test]
    fn insight_notes_name_extremes() {
        let t = table(&[
            OrderRow::delivered("o1", "Toys", 100.0),
            OrderRow::canceled("o2", "Toys", 5.0),
            OrderRow::delivered("o3", "Books", 50.0),
        ]);
        let b = t.date_bounds().unwrap();
        let s = compute_snapshot(&t, b.min(), b.max(), 10).unwrap();
        let notes = insight_notes(&s);
        assert_eq!(notes[0], "Toys brings in the most revenue (100).");
        assert!(notes[1].starts_with("Toys has the highest cancellation rate"));
        assert!(notes[1].contains("50.0%"));
        assert!(notes[2].starts_with("Books has the lowest"));
        assert!(notes[3].starts_with("Not enough"));
    }

    #[test]
    fn json_report_parses_back() {
        let (s, b) = snapshot();
        let json = render_report(&s, b, ReportFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["kpis"]["total_revenue"], 1530.0);
        assert_eq!(v["kpis"]["total_orders"], 2);
        assert_eq!(v["categories"][0]["category"], "Toys");
        assert_eq!(v["delay"]["delta"], 3.0);
        assert_eq!(v["range"]["start"], "2022-01-02");
        assert_eq!(v["available"]["max"], "2022-01-20");
    }

    #[test]
    fn undefined_score_is_shown_as_such() {
        let t = table(&[OrderRow::canceled("o1", "Toys", 5.0)]);
        let b = t.date_bounds().unwrap();
        let s = compute_snapshot(&t, b.min(), b.max(), 10).unwrap();
        let text = render_text(&s, Some(b));
        assert!(text.contains("Average Review Score n/a / 5.0"));
        assert!(text.contains("(no delivered orders in range)"));
        assert!(delay_narrative(&s).starts_with("Not enough"));
        let json = render_report(&s, Some(b), ReportFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(v["kpis"]["avg_review_score"].is_null());
    }
}
