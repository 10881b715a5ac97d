//! Revenue vs. cancellation rate per product category.

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::loader::{CATEGORY, PRICE};
use crate::metrics::{distinct_orders, is_canceled, is_delivered};

pub const DEFAULT_TOP_CATEGORIES: usize = 10;

const REVENUE: &str = "revenue";
const TOTAL_ORDERS: &str = "total_orders";
const CANCELED_ORDERS: &str = "canceled_orders";
const CANCELLATION_RATE: &str = "cancellation_rate";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub revenue: f64,
    /// Distinct orders in the category, all statuses.
    pub total_orders: u64,
    /// Distinct canceled or unavailable orders.
    pub canceled_orders: u64,
    /// `canceled_orders / total_orders * 100`.
    pub cancellation_rate: f64,
}

/// Top `top_n` categories by delivered revenue with their cancellation rate.
///
/// Only categories with at least one delivered line appear. Lines with no
/// category are ignored.
pub fn category_performance(lf: LazyFrame, top_n: usize) -> Result<Vec<CategoryPerformance>> {
    let lf = lf.filter(col(CATEGORY).is_not_null());

    let revenue = lf
        .clone()
        .filter(is_delivered())
        .group_by([col(CATEGORY)])
        .agg([col(PRICE).sum().cast(DataType::Float64).alias(REVENUE)]);
    let totals = lf
        .clone()
        .group_by([col(CATEGORY)])
        .agg([distinct_orders().alias(TOTAL_ORDERS)]);
    let canceled = lf
        .filter(is_canceled())
        .group_by([col(CATEGORY)])
        .agg([distinct_orders().alias(CANCELED_ORDERS)]);

    let total = col(TOTAL_ORDERS).cast(DataType::Float64);
    let df = revenue
        .left_join(totals, col(CATEGORY), col(CATEGORY))
        .left_join(canceled, col(CATEGORY), col(CATEGORY))
        .with_columns([
            col(TOTAL_ORDERS).fill_null(lit(0u64)),
            col(CANCELED_ORDERS).fill_null(lit(0u64)),
        ])
        .with_column(
            when(total.clone().gt(lit(0.0)))
                .then(col(CANCELED_ORDERS).cast(DataType::Float64) / total * lit(100.0))
                .otherwise(lit(0.0))
                .alias(CANCELLATION_RATE),
        )
        .sort_by_exprs(
            [col(REVENUE), col(CATEGORY)],
            SortMultipleOptions {
                descending: vec![true, false],
                ..Default::default()
            },
        )
        .slice(0, IdxSize::try_from(top_n).unwrap_or(IdxSize::MAX))
        .collect()?;

    let categories = df.column(CATEGORY)?.str()?;
    let revenues = df.column(REVENUE)?.f64()?;
    let totals = df.column(TOTAL_ORDERS)?.u64()?;
    let canceled = df.column(CANCELED_ORDERS)?.u64()?;
    let rates = df.column(CANCELLATION_RATE)?.f64()?;

    Ok((0..df.height())
        .map(|i| CategoryPerformance {
            category: categories.get(i).unwrap_or_default().to_string(),
            revenue: revenues.get(i).unwrap_or(0.0),
            total_orders: totals.get(i).unwrap_or(0),
            canceled_orders: canceled.get(i).unwrap_or(0),
            cancellation_rate: rates.get(i).unwrap_or(0.0),
        })
        .collect())
}
