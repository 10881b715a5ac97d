//! One full recomputation of every dashboard figure for a date range.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::category::{category_performance, CategoryPerformance};
use crate::delay::{delivery_delay, DelayAnalysis};
use crate::error::Result;
use crate::filter::{filter_by_purchase_date, DateRange};
use crate::loader::OrderTable;
use crate::metrics::{compute_kpis, KpiSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub range: DateRange,
    /// Order lines inside the range.
    pub rows: usize,
    pub kpis: KpiSummary,
    pub categories: Vec<CategoryPerformance>,
    pub delay: DelayAnalysis,
}

/// Validate `start..=end`, filter the base table and run every aggregate.
///
/// The range is checked before any aggregate runs; an inverted range yields
/// `InvalidRange` and nothing else.
pub fn compute_snapshot(
    table: &OrderTable,
    start: NaiveDate,
    end: NaiveDate,
    top_n: usize,
) -> Result<DashboardSnapshot> {
    let range = DateRange::new(start, end)?;
    let filtered = filter_by_purchase_date(table.lazy(), &range).collect()?;

    let rows = filtered.height();
    let kpis = compute_kpis(filtered.clone().lazy())?;
    let categories = category_performance(filtered.clone().lazy(), top_n)?;
    let delay = delivery_delay(filtered.lazy())?;

    info!(%start, %end, rows, "dashboard recomputed");
    Ok(DashboardSnapshot {
        range,
        rows,
        kpis,
        categories,
        delay,
    })
}
