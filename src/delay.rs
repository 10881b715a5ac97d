//! Delivery delay vs. review score.

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::loader::{DELIVERED_TS, ESTIMATED_TS, ORDER_ID, REVIEW_SCORE};
use crate::metrics::is_delivered;

pub const DELAY_DAYS: &str = "delay_days";
pub const DELIVERY_STATUS: &str = "delivery_status";

const MICROS_PER_DAY: i64 = 86_400_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryBucket {
    Late,
    #[serde(rename = "On Time")]
    OnTime,
}

impl DeliveryBucket {
    pub const ALL: [Self; 2] = [Self::Late, Self::OnTime];

    pub fn label(self) -> &'static str {
        match self {
            Self::Late => "Late",
            Self::OnTime => "On Time",
        }
    }

    fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketStats {
    /// Order lines in the bucket.
    pub orders: u64,
    /// Mean review score, `None` when no line in the bucket has one.
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DelayAnalysis {
    pub late: BucketStats,
    pub on_time: BucketStats,
    /// On-time mean minus late mean.
    pub delta: Option<f64>,
}

impl DelayAnalysis {
    pub fn bucket(&self, bucket: DeliveryBucket) -> &BucketStats {
        match bucket {
            DeliveryBucket::Late => &self.late,
            DeliveryBucket::OnTime => &self.on_time,
        }
    }
}

/// Per-line delay for delivered lines that have both delivery timestamps.
///
/// Columns: order id, `delay_days` (whole days, floored, negative when
/// early), `delivery_status` ("Late" / "On Time") and review score.
pub fn delay_breakdown(lf: LazyFrame) -> LazyFrame {
    let late_label = DeliveryBucket::Late.label();
    let on_time_label = DeliveryBucket::OnTime.label();
    lf.filter(
        is_delivered()
            .and(col(DELIVERED_TS).is_not_null())
            .and(col(ESTIMATED_TS).is_not_null()),
    )
    .select([
        col(ORDER_ID),
        (col(DELIVERED_TS) - col(ESTIMATED_TS))
            .cast(DataType::Int64)
            .floor_div(lit(MICROS_PER_DAY))
            .alias(DELAY_DAYS),
        col(REVIEW_SCORE),
    ])
    // Only a positive whole-day delay is late.
    .with_column(
        when(col(DELAY_DAYS).gt(lit(0i64)))
            .then(lit(late_label))
            .otherwise(lit(on_time_label))
            .alias(DELIVERY_STATUS),
    )
}

pub fn delivery_delay(lf: LazyFrame) -> Result<DelayAnalysis> {
    let df = delay_breakdown(lf)
        .group_by([col(DELIVERY_STATUS)])
        .agg([
            len().cast(DataType::UInt64).alias("orders"),
            col(REVIEW_SCORE).mean().alias("mean_score"),
        ])
        .collect()?;

    let labels = df.column(DELIVERY_STATUS)?.str()?;
    let orders = df.column("orders")?.u64()?;
    let scores = df.column("mean_score")?.cast(&DataType::Float64)?;
    let scores = scores.f64()?;

    let mut analysis = DelayAnalysis::default();
    for i in 0..df.height() {
        let Some(bucket) = labels.get(i).and_then(DeliveryBucket::from_label) else {
            continue;
        };
        let stats = BucketStats {
            orders: orders.get(i).unwrap_or(0),
            mean_score: scores.get(i).filter(|v| v.is_finite()),
        };
        match bucket {
            DeliveryBucket::Late => analysis.late = stats,
            DeliveryBucket::OnTime => analysis.on_time = stats,
        }
    }
    analysis.delta = analysis
        .on_time
        .mean_score
        .zip(analysis.late.mean_score)
        .map(|(on_time, late)| on_time - late);

    debug!(?analysis, "delivery delay computed");
    Ok(analysis)
}
