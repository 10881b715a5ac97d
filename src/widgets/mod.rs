pub mod category;
pub mod controls;
pub mod date_range;
pub mod delay;
pub mod kpi;
