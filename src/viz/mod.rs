//! Presentation adapter: render dashboard payloads to **SVG** charts.
//!
//! - Boxplot of a metric's distribution per site
//! - Ranking bar chart of per-site means
//! - Scatter of two metrics (e.g. GHI vs ambient temperature)
//! - Monthly mean lines per site
//!
//! Each site keeps one palette color across all charts (by its position in the
//! payload). The data layer never calls into this module.

pub mod text;
pub mod util;

use crate::dashboard::{DashboardView, MonthlyView, Panel, RankingView, ScatterView};
use crate::series::BoxSummary;
use anyhow::{Result, anyhow};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters_svg::SVGBackend;

use std::path::{Path, PathBuf};

use text::truncate_to_width;
use util::{
    category_label, compute_left_label_area_px, draw_err, format_tick, month_label, office_color,
    padded_range,
};

const MARGIN: u32 = 16;
const LABEL_FONT_PX: u32 = 13;
const Y_TICKS: usize = 8;

fn svg_root(
    out_path: &Path,
    width: u32,
    height: u32,
) -> Result<DrawingArea<SVGBackend<'_>, Shift>> {
    let root = SVGBackend::new(out_path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    Ok(root)
}

/// Category labels trimmed to the width available per category.
fn site_labels<'a>(sites: impl Iterator<Item = &'a str>, width: u32, n: usize) -> Vec<String> {
    let per_slot = width.saturating_sub(2 * MARGIN + 80) / (n.max(1) as u32);
    sites
        .map(|s| truncate_to_width(s, LABEL_FONT_PX, per_slot.max(24)))
        .collect()
}

/// Distribution of one metric per site as a boxplot.
pub fn plot_boxplot<P: AsRef<Path>>(
    boxes: &[BoxSummary],
    metric: &str,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if boxes.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let lo = boxes
        .iter()
        .flat_map(|b| b.outliers.iter().copied().chain([b.lower_whisker]))
        .fold(f64::INFINITY, f64::min);
    let hi = boxes
        .iter()
        .flat_map(|b| b.outliers.iter().copied().chain([b.upper_whisker]))
        .fold(f64::NEG_INFINITY, f64::max);
    let (ymin, ymax) = padded_range(lo, hi);
    let n = boxes.len();
    let labels = site_labels(boxes.iter().map(|b| b.site.as_str()), width, n);

    let root = svg_root(out_path.as_ref(), width, height)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(format!("{metric} Distribution by Site"), ("sans-serif", 22))
        .set_label_area_size(
            LabelAreaPosition::Left,
            compute_left_label_area_px(ymin, ymax, Y_TICKS, LABEL_FONT_PX),
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), ymin..ymax)
        .map_err(draw_err)?;

    let x_fmt = |x: &f64| category_label(&labels, *x);
    let y_fmt = |v: &f64| format_tick(*v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Site")
        .y_desc(metric)
        .x_labels(n + 1)
        .y_labels(Y_TICKS)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(draw_err)?;

    for (idx, b) in boxes.iter().enumerate() {
        let color = office_color(idx);
        let x = idx as f64;
        let half = 0.3;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half, b.q1), (x + half, b.q3)],
                color.mix(0.35).filled(),
            )))
            .map_err(draw_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half, b.q1), (x + half, b.q3)],
                color.stroke_width(2),
            )))
            .map_err(draw_err)?;
        let strokes = [
            // median
            vec![(x - half, b.median), (x + half, b.median)],
            // whiskers + caps
            vec![(x, b.q3), (x, b.upper_whisker)],
            vec![(x, b.q1), (x, b.lower_whisker)],
            vec![(x - half / 2.0, b.upper_whisker), (x + half / 2.0, b.upper_whisker)],
            vec![(x - half / 2.0, b.lower_whisker), (x + half / 2.0, b.lower_whisker)],
        ];
        chart
            .draw_series(
                strokes
                    .into_iter()
                    .map(|pts| PathElement::new(pts, BLACK.stroke_width(2))),
            )
            .map_err(draw_err)?;
        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|v| Circle::new((x, *v), 3, color.mix(0.7).filled())),
            )
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Sites ranked by mean as a bar chart (highest first).
pub fn plot_ranking<P: AsRef<Path>>(
    ranking: &RankingView,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let ranks = &ranking.ranks;
    if ranks.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let lo = ranks.iter().map(|r| r.mean).fold(0.0, f64::min);
    let hi = ranks.iter().map(|r| r.mean).fold(0.0, f64::max);
    let (ymin, ymax) = padded_range(lo, hi);
    let (ymin, ymax) = (if lo >= 0.0 { 0.0 } else { ymin }, ymax);
    let n = ranks.len();
    let labels = site_labels(ranks.iter().map(|r| r.site.as_str()), width, n);

    let root = svg_root(out_path.as_ref(), width, height)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(format!("Site Ranking by Average {}", ranking.metric), ("sans-serif", 22))
        .set_label_area_size(
            LabelAreaPosition::Left,
            compute_left_label_area_px(ymin, ymax, Y_TICKS, LABEL_FONT_PX),
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), ymin..ymax)
        .map_err(draw_err)?;

    let x_fmt = |x: &f64| category_label(&labels, *x);
    let y_fmt = |v: &f64| format_tick(*v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Site")
        .y_desc(format!("Average {}", ranking.metric))
        .x_labels(n + 1)
        .y_labels(Y_TICKS)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(ranks.iter().enumerate().map(|(idx, r)| {
            let x = idx as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, r.mean)], office_color(idx).filled())
        }))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Scatter of `view.y` against `view.x`, one colored series per site.
pub fn plot_scatter<P: AsRef<Path>>(
    view: &ScatterView,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let all = || view.series.iter().flat_map(|s| s.points.iter());
    if all().next().is_none() {
        return Err(anyhow!("no data to plot"));
    }
    let (xmin, xmax) = padded_range(
        all().map(|p| p.0).fold(f64::INFINITY, f64::min),
        all().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max),
    );
    let (ymin, ymax) = padded_range(
        all().map(|p| p.1).fold(f64::INFINITY, f64::min),
        all().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max),
    );

    let root = svg_root(out_path.as_ref(), width, height)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(format!("{} vs {}", view.y, view.x), ("sans-serif", 22))
        .set_label_area_size(
            LabelAreaPosition::Left,
            compute_left_label_area_px(ymin, ymax, Y_TICKS, LABEL_FONT_PX),
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(xmin..xmax, ymin..ymax)
        .map_err(draw_err)?;

    let x_fmt = |v: &f64| format_tick(*v);
    let y_fmt = |v: &f64| format_tick(*v);
    chart
        .configure_mesh()
        .x_desc(view.x.as_str())
        .y_desc(view.y.as_str())
        .x_labels(10)
        .y_labels(Y_TICKS)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(draw_err)?;

    for (idx, s) in view.series.iter().enumerate() {
        let color = office_color(idx);
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, color.mix(0.6).filled())),
            )
            .map_err(draw_err)?
            .label(s.site.clone())
            .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .label_font(("sans-serif", 13))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Monthly mean of a metric per site as lines with markers.
pub fn plot_monthly<P: AsRef<Path>>(
    view: &MonthlyView,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let values = || view.series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
    if values().next().is_none() {
        return Err(anyhow!("no data to plot"));
    }
    let (ymin, ymax) = padded_range(
        values().fold(f64::INFINITY, f64::min),
        values().fold(f64::NEG_INFINITY, f64::max),
    );

    let root = svg_root(out_path.as_ref(), width, height)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(format!("Monthly Average {}", view.metric), ("sans-serif", 22))
        .set_label_area_size(
            LabelAreaPosition::Left,
            compute_left_label_area_px(ymin, ymax, Y_TICKS, LABEL_FONT_PX),
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(0.5f64..12.5f64, ymin..ymax)
        .map_err(draw_err)?;

    let x_fmt = |x: &f64| month_label(*x);
    let y_fmt = |v: &f64| format_tick(*v);
    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc(view.metric.as_str())
        .x_labels(12)
        .y_labels(Y_TICKS)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(draw_err)?;

    for (idx, s) in view.series.iter().enumerate() {
        let color = office_color(idx);
        let pts: Vec<(f64, f64)> = s.points.iter().map(|&(m, v)| (m as f64, v)).collect();
        chart
            .draw_series(LineSeries::new(pts.clone(), color.stroke_width(2)))
            .map_err(draw_err)?
            .label(s.site.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(2))
            });
        chart
            .draw_series(pts.into_iter().map(|p| Circle::new(p, 3, color.filled())))
            .map_err(draw_err)?;
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .label_font(("sans-serif", 13))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Render every panel of `view` that holds data into `dir`; returns the written files.
pub fn write_charts<P: AsRef<Path>>(
    view: &DashboardView,
    dir: P,
    width: u32,
    height: u32,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if let Panel::Ready(boxes) = &view.distribution {
        let p = dir.join("distribution.svg");
        plot_boxplot(boxes, &view.metric, &p, width, height)?;
        written.push(p);
    }
    if let Panel::Ready(ranking) = &view.ranking {
        let p = dir.join("ranking.svg");
        plot_ranking(ranking, &p, width, height)?;
        written.push(p);
    }
    if let Panel::Ready(scatter) = &view.scatter {
        let p = dir.join("scatter.svg");
        plot_scatter(scatter, &p, width, height)?;
        written.push(p);
    }
    if let Panel::Ready(monthly) = &view.monthly {
        let p = dir.join("monthly.svg");
        plot_monthly(monthly, &p, width, height)?;
        written.push(p);
    }
    Ok(written)
}
