use std::fs;
use std::path::{Path, PathBuf};

/// Header of the merged order table, including columns the dashboard ignores.
pub const HEADER: &str = "order_id,customer_id,order_status,order_purchase_timestamp,\
order_delivered_customer_date,order_estimated_delivery_date,product_id,price,\
product_category_name_english,review_score";

/// A small merged dataset covering January and February 2022.
///
/// * o1: two delivered Toys lines, 2 days late, review 2
/// * o2: delivered Books, 5 days early, review 5
/// * o3: canceled Toys
/// * o4: unavailable Toys, no category on a second line
/// * o5: delivered line with a malformed purchase timestamp
/// * o6: delivered Garden line in February, on time to the day, review 4
pub const ORDERS_CSV: &str = "\
o1,c1,delivered,2022-01-02 10:00:00,2022-01-12 08:00:00,2022-01-10 00:00:00,p1,10.0,toys,2
o1,c1,delivered,2022-01-02 10:00:00,2022-01-12 08:00:00,2022-01-10 00:00:00,p2,15.0,toys,2
o2,c2,delivered,2022-01-20 09:30:00,2022-01-25 00:00:00,2022-01-30 00:00:00,p3,30.0,books,5
o3,c3,canceled,2022-01-21 12:00:00,,2022-02-01 00:00:00,p1,12.0,toys,1
o4,c4,unavailable,2022-01-22 12:00:00,,2022-02-02 00:00:00,p1,12.0,toys,
o4,c4,unavailable,2022-01-22 12:00:00,,2022-02-02 00:00:00,p9,3.0,,
o5,c5,delivered,not a date,2022-01-25 00:00:00,2022-01-30 00:00:00,p3,99.0,books,3
o6,c6,delivered,2022-02-15 18:00:00,2022-02-20 23:00:00,2022-02-20 00:00:00,p7,40.0,garden,4
";

pub fn write_orders_csv(dir: &Path) -> PathBuf {
    write_csv(dir, "all_data.csv", HEADER, ORDERS_CSV)
}

pub fn write_csv(dir: &Path, name: &str, header: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{}\n{}", header, body)).expect("Failed to write test CSV");
    path
}
