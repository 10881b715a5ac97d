//! Headline KPIs over the filtered order lines.

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::loader::{ORDER_ID, ORDER_STATUS, PRICE, REVIEW_SCORE};

pub const STATUS_DELIVERED: &str = "delivered";
pub const CANCELED_STATUSES: [&str; 2] = ["canceled", "unavailable"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Sum of price over delivered lines; 0 when there are none.
    pub total_revenue: f64,
    /// Distinct order ids, any status.
    pub total_orders: u64,
    /// Mean review score ignoring nulls; `None` when no line has a score.
    pub avg_review_score: Option<f64>,
}

pub(crate) fn is_delivered() -> Expr {
    col(ORDER_STATUS).eq(lit(STATUS_DELIVERED))
}

pub(crate) fn is_canceled() -> Expr {
    CANCELED_STATUSES
        .iter()
        .map(|s| col(ORDER_STATUS).eq(lit(*s)))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false))
}

/// Distinct non-null order ids as u64.
pub(crate) fn distinct_orders() -> Expr {
    col(ORDER_ID)
        .drop_nulls()
        .n_unique()
        .cast(DataType::UInt64)
}

pub fn compute_kpis(lf: LazyFrame) -> Result<KpiSummary> {
    let df = lf
        .select([
            col(PRICE)
                .filter(is_delivered())
                .sum()
                .cast(DataType::Float64)
                .alias("total_revenue"),
            distinct_orders().alias("total_orders"),
            col(REVIEW_SCORE).mean().alias("avg_review_score"),
        ])
        .collect()?;

    let total_revenue = df.column("total_revenue")?.f64()?.get(0).unwrap_or(0.0);
    let total_orders = df.column("total_orders")?.u64()?.get(0).unwrap_or(0);
    let avg_review_score = df
        .column("avg_review_score")?
        .cast(&DataType::Float64)?
        .f64()?
        .get(0)
        .filter(|v| v.is_finite());

    Ok(KpiSummary {
        total_revenue,
        total_orders,
        avg_review_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{table, OrderRow};

    #[test]
    fn revenue_counts_only_delivered() {
        let t = table(&[
            OrderRow::delivered("a", "toys", 10.0).review(5.0),
            OrderRow::delivered("b", "toys", 20.5).review(3.0),
            OrderRow::canceled("c", "toys", 99.0),
            OrderRow::new("d", "shipped", "toys", 7.0).review(4.0),
        ]);
        let k = compute_kpis(t.lazy()).unwrap();
        assert_eq!(k.total_revenue, 30.5);
        assert_eq!(k.total_orders, 4);
        assert_eq!(k.avg_review_score, Some(4.0));
    }

    #[test]
    fn orders_counted_once_per_id() {
        let t = table(&[
            OrderRow::delivered("a", "toys", 10.0),
            OrderRow::delivered("a", "toys", 10.0),
            OrderRow::delivered("a", "garden", 5.0),
            OrderRow::delivered("b", "toys", 1.0),
        ]);
        let k = compute_kpis(t.lazy()).unwrap();
        assert_eq!(k.total_orders, 2);
        assert_eq!(k.total_revenue, 26.0);
    }

    #[test]
    fn all_null_scores_are_undefined() {
        let t = table(&[OrderRow::delivered("a", "toys", 10.0)]);
        let k = compute_kpis(t.lazy()).unwrap();
        assert_eq!(k.avg_review_score, None);
    }

    #[test]
    fn empty_input_is_total() {
        let t = table(&[OrderRow::canceled("a", "toys", 10.0)]);
        let empty = t.lazy().filter(lit(false));
        let k = compute_kpis(empty).unwrap();
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.total_orders, 0);
        assert_eq!(k.avg_review_score, None);
    }

    #[test]
    fn no_delivered_rows_gives_zero_revenue() {
        let t = table(&[OrderRow::canceled("a", "toys", 10.0).review(1.0)]);
        let k = compute_kpis(t.lazy()).unwrap();
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.total_orders, 1);
        assert_eq!(k.avg_review_score, Some(1.0));
    }
}
