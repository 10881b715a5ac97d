//! Load the pre-joined order dataset into an in-memory table.
//!
//! Every CSV column is read as text and only the columns the dashboard uses
//! are typed afterwards, so a malformed value nulls out a single cell instead
//! of failing the whole load.

use polars::prelude::*;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};
use crate::filter::DateBounds;

pub const ORDER_ID: &str = "order_id";
pub const ORDER_STATUS: &str = "order_status";
pub const PRICE: &str = "price";
pub const CATEGORY: &str = "product_category_name_english";
pub const REVIEW_SCORE: &str = "review_score";
pub const PURCHASE_TS: &str = "order_purchase_timestamp";
pub const DELIVERED_TS: &str = "order_delivered_customer_date";
pub const ESTIMATED_TS: &str = "order_estimated_delivery_date";

/// Columns the dashboard reads; anything else in the file is dropped.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    ORDER_ID,
    ORDER_STATUS,
    PRICE,
    CATEGORY,
    REVIEW_SCORE,
    PURCHASE_TS,
    DELIVERED_TS,
    ESTIMATED_TS,
];

pub const TIMESTAMP_COLUMNS: [&str; 3] = [PURCHASE_TS, DELIVERED_TS, ESTIMATED_TS];

pub const DEFAULT_DATA_PATH: &str = "all_data.csv";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub timestamp_format: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }
}

/// The loaded, typed order table. Read-only once built.
#[derive(Debug, Clone)]
pub struct OrderTable {
    df: DataFrame,
    bounds: Option<DateBounds>,
}

impl OrderTable {
    /// Type an all-text frame (as read from CSV) and compute its date bounds.
    pub fn from_raw(raw: LazyFrame, options: &LoadOptions) -> Result<Self> {
        let schema = raw.clone().collect_schema()?;
        for name in REQUIRED_COLUMNS {
            if !schema.contains(name) {
                return Err(DashboardError::MissingColumn(name.to_string()));
            }
        }

        let ts_opts = StrptimeOptions {
            format: Some(options.timestamp_format.as_str().into()),
            strict: false,
            ..Default::default()
        };
        let parse_ts = |name: &str| {
            col(name).cast(DataType::String).str().to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                ts_opts.clone(),
                lit("raise"),
            )
        };

        let df = raw
            .select([
                col(ORDER_ID).cast(DataType::String),
                col(ORDER_STATUS).cast(DataType::String),
                col(PRICE).cast(DataType::Float64),
                col(CATEGORY).cast(DataType::String),
                col(REVIEW_SCORE).cast(DataType::Float64),
                parse_ts(PURCHASE_TS),
                parse_ts(DELIVERED_TS),
                parse_ts(ESTIMATED_TS),
            ])
            .collect()?;

        let bounds = purchase_date_bounds(&df)?;
        debug!(rows = df.height(), ?bounds, "typed order table");
        Ok(Self { df, bounds })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Fresh lazy view over the base table; the base itself is never modified.
    pub fn lazy(&self) -> LazyFrame {
        self.df.clone().lazy()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Earliest and latest purchase date; `None` if no purchase timestamp parsed.
    pub fn date_bounds(&self) -> Option<DateBounds> {
        self.bounds
    }
}

/// Read the dataset at `path`.
pub fn load_orders(path: &Path, options: &LoadOptions) -> Result<OrderTable> {
    if !path.exists() {
        warn!(path = %path.display(), "dataset not found");
        return Err(DashboardError::DataNotFound {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "loading orders");
    let pl_path = PlPath::Local(Arc::from(path));
    let raw = LazyCsvReader::new(pl_path)
        .with_separator(options.delimiter)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?;

    let table = OrderTable::from_raw(raw, options)?;
    info!(rows = table.height(), "orders loaded");
    Ok(table)
}

/// Load-once holder for the session's base table.
pub struct SessionData {
    path: PathBuf,
    options: LoadOptions,
    table: OnceCell<Arc<OrderTable>>,
}

impl SessionData {
    pub fn new(path: PathBuf, options: LoadOptions) -> Self {
        Self {
            path,
            options,
            table: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The memoized table, loading it on first use. Failed loads are not cached.
    pub fn table(&self) -> Result<Arc<OrderTable>> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_orders(&self.path, &self.options)?);
        Ok(Arc::clone(self.table.get_or_init(|| table)))
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

/// Days since 1970-01-01, the physical representation of a polars Date.
pub fn epoch_days(date: chrono::NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn date_from_epoch_days(days: i32) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

fn purchase_date_bounds(df: &DataFrame) -> Result<Option<DateBounds>> {
    let day = || col(PURCHASE_TS).dt().date().cast(DataType::Int32);
    let out = df
        .clone()
        .lazy()
        .select([day().min().alias("min"), day().max().alias("max")])
        .collect()?;

    let min = out.column("min")?.i32()?.get(0);
    let max = out.column("max")?.i32()?.get(0);
    Ok(match (min, max) {
        (Some(min), Some(max)) => date_from_epoch_days(min)
            .zip(date_from_epoch_days(max))
            .map(|(min, max)| DateBounds::new(min, max)),
        _ => None,
    })
}
