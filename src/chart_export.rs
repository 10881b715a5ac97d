//! PNG export of the two dashboard charts (plotters bitmap backend).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::category::CategoryPerformance;
use crate::dashboard::DashboardSnapshot;
use crate::delay::{DelayAnalysis, DeliveryBucket};
use crate::format::{format_axis_label, format_thousands};

pub const CATEGORY_CHART_FILE: &str = "category_revenue.png";
pub const DELAY_CHART_FILE: &str = "delivery_delay.png";

/// Upper bound of the review score axis.
const SCORE_AXIS_MAX: f64 = 5.5;

const REVENUE_COLOR: RGBColor = RGBColor(135, 206, 235);
const RATE_COLOR: RGBColor = RED;
const LATE_COLOR: RGBColor = RGBColor(231, 76, 60);
const ON_TIME_COLOR: RGBColor = RGBColor(46, 204, 113);

/// Pixel size of exported images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ExportSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

fn segment_label(names: &[&str], v: &SegmentValue<i32>) -> String {
    match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| names.get(i))
            .map(|s| s.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Revenue bars per category with the cancellation rate as a line on a
/// secondary axis. The rate axis tops out at 1.5x the largest rate.
pub fn write_category_chart_png(
    path: &Path,
    categories: &[CategoryPerformance],
    size: ExportSize,
) -> Result<()> {
    if categories.is_empty() {
        return Err(eyre!("No data to export"));
    }

    let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
    let n = categories.len() as i32;
    let max_revenue = categories.iter().map(|c| c.revenue).fold(0.0, f64::max);
    let max_rate = categories
        .iter()
        .map(|c| c.cancellation_rate)
        .fold(0.0, f64::max);
    let revenue_top = if max_revenue > 0.0 {
        max_revenue * 1.1
    } else {
        1.0
    };
    let rate_top = if max_rate > 0.0 { max_rate * 1.5 } else { 1.0 };

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Revenue and Cancellation Rate by Category", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .right_y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..revenue_top)?
        .set_secondary_coord((0..n).into_segmented(), 0.0..rate_top);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len())
        .x_label_formatter(&|v| segment_label(&names, v))
        .y_label_formatter(&|v| format_thousands(*v))
        .x_desc("Product Category")
        .y_desc("Total Revenue")
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_label_formatter(&|v| format!("{:.1}", v))
        .y_desc("Cancellation Rate (%)")
        .draw()?;

    chart
        .draw_series(categories.iter().enumerate().map(|(i, c)| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), c.revenue),
                ],
                REVENUE_COLOR.filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))?
        .label("Revenue")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], REVENUE_COLOR.filled()));

    let rate_points: Vec<(SegmentValue<i32>, f64)> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (SegmentValue::CenterOf(i as i32), c.cancellation_rate))
        .collect();
    chart
        .draw_secondary_series(LineSeries::new(
            rate_points.iter().cloned(),
            RATE_COLOR.stroke_width(3),
        ))?
        .label("Cancel Rate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RATE_COLOR.stroke_width(3)));
    chart.draw_secondary_series(
        rate_points
            .iter()
            .map(|p| Circle::new(p.clone(), 4, RATE_COLOR.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Mean review score per delivery bucket, labelled with the value above each bar.
pub fn write_delay_chart_png(path: &Path, delay: &DelayAnalysis, size: ExportSize) -> Result<()> {
    let bars: Vec<(DeliveryBucket, f64)> = DeliveryBucket::ALL
        .into_iter()
        .filter_map(|b| delay.bucket(b).mean_score.map(|s| (b, s)))
        .collect();
    if bars.is_empty() {
        return Err(eyre!("No data to export"));
    }

    let names: Vec<&str> = DeliveryBucket::ALL.iter().map(|b| b.label()).collect();
    let n = names.len() as i32;

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Review Score by Delivery Status", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..SCORE_AXIS_MAX)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len())
        .x_label_formatter(&|v| segment_label(&names, v))
        .y_label_formatter(&|v| format_axis_label(*v))
        .x_desc("Delivery Status")
        .y_desc("Average Review Score (1-5)")
        .draw()?;

    let index_of = |bucket: DeliveryBucket| {
        DeliveryBucket::ALL
            .iter()
            .position(|b| *b == bucket)
            .unwrap_or(0) as i32
    };

    chart.draw_series(bars.iter().map(|&(bucket, score)| {
        let i = index_of(bucket);
        let color = match bucket {
            DeliveryBucket::Late => LATE_COLOR,
            DeliveryBucket::OnTime => ON_TIME_COLOR,
        };
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), score),
            ],
            color.filled(),
        );
        bar.set_margin(0, 0, 40, 40);
        bar
    }))?;

    chart.draw_series(bars.iter().map(|&(bucket, score)| {
        Text::new(
            format!("{:.2}", score),
            (SegmentValue::CenterOf(index_of(bucket)), score + 0.15),
            ("sans-serif", 18).into_font().color(&BLACK),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Write both charts for `snapshot` into `dir`, creating it if needed.
///
/// Fails with "No data to export" when neither chart has anything to draw;
/// otherwise writes whichever charts have data and returns their paths.
pub fn export_charts(
    dir: &Path,
    snapshot: &DashboardSnapshot,
    size: ExportSize,
) -> Result<Vec<PathBuf>> {
    let has_categories = !snapshot.categories.is_empty();
    let has_scores = DeliveryBucket::ALL
        .into_iter()
        .any(|b| snapshot.delay.bucket(b).mean_score.is_some());
    if !has_categories && !has_scores {
        return Err(eyre!("No data to export"));
    }

    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if has_categories {
        let path = dir.join(CATEGORY_CHART_FILE);
        write_category_chart_png(&path, &snapshot.categories, size)?;
        written.push(path);
    }
    if has_scores {
        let path = dir.join(DELAY_CHART_FILE);
        write_delay_chart_png(&path, &snapshot.delay, size)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "charts exported");
    Ok(written)
}
