//! Purchase-date range selection.

use chrono::{Days, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::loader::{epoch_days, PURCHASE_TS};

/// Observed [min, max] purchase dates of the base table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    min: NaiveDate,
    max: NaiveDate,
}

impl DateBounds {
    /// Swaps the arguments if given in the wrong order.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> NaiveDate {
        self.min
    }

    pub fn max(&self) -> NaiveDate {
        self.max
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }

    /// Move `date` by `delta` days, staying inside the bounds.
    pub fn step(&self, date: NaiveDate, delta: i64) -> NaiveDate {
        let moved = if delta >= 0 {
            date.checked_add_days(Days::new(delta.unsigned_abs()))
        } else {
            date.checked_sub_days(Days::new(delta.unsigned_abs()))
        };
        self.clamp(moved.unwrap_or(date))
    }

    /// The full observed range.
    pub fn full_range(&self) -> DateRange {
        DateRange {
            start: self.min,
            end: self.max,
        }
    }
}

/// Inclusive calendar-date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Keep rows whose purchase date (time of day ignored) lies in `range`.
/// Rows with a null purchase timestamp never match.
pub fn filter_by_purchase_date(lf: LazyFrame, range: &DateRange) -> LazyFrame {
    debug!(start = %range.start, end = %range.end, "filtering by purchase date");
    let day = col(PURCHASE_TS).dt().date().cast(DataType::Int32);
    lf.filter(
        day.clone()
            .gt_eq(lit(epoch_days(range.start)))
            .and(day.lt_eq(lit(epoch_days(range.end)))),
    )
}

/// Parse a `YYYY-MM-DD` date as typed by the user.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{orders_frame, table, OrderRow};
    use crate::loader::{LoadOptions, OrderTable};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn invalid_range_rejected() {
        let err = DateRange::new(date(2022, 2, 1), date(2022, 1, 1)).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
        assert!(DateRange::new(date(2022, 1, 1), date(2022, 1, 1)).is_ok());
    }

    #[test]
    fn bounds_step_and_clamp() {
        let bounds = DateBounds::new(date(2018, 1, 31), date(2018, 1, 1));
        assert_eq!(bounds.min(), date(2018, 1, 1));
        assert_eq!(bounds.step(date(2018, 1, 10), 7), date(2018, 1, 17));
        assert_eq!(bounds.step(date(2018, 1, 10), -30), date(2018, 1, 1));
        assert_eq!(bounds.step(date(2018, 1, 30), 30), date(2018, 1, 31));
        assert_eq!(bounds.clamp(date(2019, 5, 5)), date(2018, 1, 31));
        assert_eq!(bounds.clamp(date(2018, 1, 15)), date(2018, 1, 15));
        assert_eq!(bounds.clamp(date(2017, 12, 31)), date(2018, 1, 1));
    }

    #[test]
    fn filter_is_inclusive_and_ignores_time_of_day() {
        let t = table(&[
            OrderRow::delivered("a", "toys", 1.0).purchased("2022-01-01 00:00:00"),
            OrderRow::delivered("b", "toys", 1.0).purchased("2022-01-10 23:59:59"),
            OrderRow::delivered("c", "toys", 1.0).purchased("2022-01-11 00:00:00"),
            OrderRow::delivered("d", "toys", 1.0).purchased("2021-12-31 23:59:59"),
            OrderRow::delivered("e", "toys", 1.0).no_purchase(),
        ]);
        let range = DateRange::new(date(2022, 1, 1), date(2022, 1, 10)).unwrap();
        let out = filter_by_purchase_date(t.lazy(), &range).collect().unwrap();
        let ids: Vec<_> = out
            .column("order_id")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn full_range_keeps_every_dated_row() {
        let t = OrderTable::from_raw(
            orders_frame(&[
                OrderRow::delivered("a", "toys", 1.0).purchased("2022-01-01 08:00:00"),
                OrderRow::delivered("b", "toys", 1.0).purchased("2022-03-01 08:00:00"),
                OrderRow::canceled("c", "toys", 1.0).purchased("2022-02-01 08:00:00"),
            ])
            .lazy(),
            &LoadOptions::default(),
        )
        .unwrap();
        let range = t.date_bounds().unwrap().full_range();
        let out = filter_by_purchase_date(t.lazy(), &range).collect().unwrap();
        assert_eq!(out.height(), t.height());
    }

    #[test]
    fn parse_user_date() {
        assert_eq!(parse_date(" 2022-01-05 "), Some(date(2022, 1, 5)));
        assert_eq!(parse_date("2022-13-05"), None);
        assert_eq!(parse_date("05/01/2022"), None);
    }
}
