//! Small order tables for unit tests.

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::loader::*;

#[derive(Clone)]
pub struct OrderRow {
    order_id: String,
    status: String,
    price: Option<f64>,
    category: Option<String>,
    review: Option<f64>,
    purchase: Option<String>,
    delivered: Option<String>,
    estimated: Option<String>,
}

impl OrderRow {
    pub fn new(order_id: &str, status: &str, category: &str, price: f64) -> Self {
        Self {
            order_id: order_id.to_string(),
            status: status.to_string(),
            price: Some(price),
            category: Some(category.to_string()),
            review: None,
            purchase: Some("2022-01-05 12:00:00".to_string()),
            delivered: None,
            estimated: None,
        }
    }

    pub fn delivered(order_id: &str, category: &str, price: f64) -> Self {
        Self::new(order_id, "delivered", category, price)
    }

    pub fn canceled(order_id: &str, category: &str, price: f64) -> Self {
        Self::new(order_id, "canceled", category, price)
    }

    pub fn purchased(mut self, ts: &str) -> Self {
        self.purchase = Some(ts.to_string());
        self
    }

    pub fn no_purchase(mut self) -> Self {
        self.purchase = None;
        self
    }

    pub fn no_category(mut self) -> Self {
        self.category = None;
        self
    }

    pub fn review(mut self, score: f64) -> Self {
        self.review = Some(score);
        self
    }

    /// Actual and estimated delivery timestamps.
    pub fn delivery(mut self, actual: &str, estimated: &str) -> Self {
        self.delivered = Some(actual.to_string());
        self.estimated = Some(estimated.to_string());
        self
    }

    pub fn estimated_only(mut self, estimated: &str) -> Self {
        self.delivered = None;
        self.estimated = Some(estimated.to_string());
        self
    }
}

/// All-text frame shaped like the CSV file.
pub fn orders_frame(rows: &[OrderRow]) -> DataFrame {
    let text = |f: fn(&OrderRow) -> Option<String>| rows.iter().map(f).collect::<Vec<_>>();
    df!(
        ORDER_ID => text(|r| Some(r.order_id.clone())),
        ORDER_STATUS => text(|r| Some(r.status.clone())),
        PRICE => text(|r| r.price.map(|p| p.to_string())),
        CATEGORY => text(|r| r.category.clone()),
        REVIEW_SCORE => text(|r| r.review.map(|s| s.to_string())),
        PURCHASE_TS => text(|r| r.purchase.clone()),
        DELIVERED_TS => text(|r| r.delivered.clone()),
        ESTIMATED_TS => text(|r| r.estimated.clone())
    )
    .unwrap()
}

pub fn table(rows: &[OrderRow]) -> OrderTable {
    OrderTable::from_raw(orders_frame(rows).lazy(), &LoadOptions::default()).unwrap()
}

/// Write `rows` as `orders.csv` inside `dir`.
pub fn write_csv(dir: &Path, rows: &[OrderRow]) -> PathBuf {
    let path = dir.join("orders.csv");
    let mut df = orders_frame(rows);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}
