//! Inline SVG for chart views.
//!
//! Deliberately small: a value axis starting at zero with rounded ticks, a
//! legend row, and native `<title>` tooltips. Absent values are never drawn
//! as zero. Lines break at a gap and bars are simply omitted.

use std::f64::consts::PI;
use std::fmt::Write;

use super::{ChartKind, ChartView, escape};
use crate::dataset::summary::format_number;

const WIDTH: f64 = 600.0;
const LEGEND_HEIGHT: f64 = 28.0;
const TICKS: usize = 5;
const AXIS_COLOR: &str = "#64748b";
const GRID_COLOR: &str = "#e0e0e0";

/// Plot area inside the SVG canvas.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Render `view` as a standalone `<svg>` element.
pub fn render(view: &ChartView) -> String {
    let height = f64::from(view.height);
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {height}" role="img" aria-label="{}" xmlns="http://www.w3.org/2000/svg">"#,
        escape(&view.title)
    );

    match view.max_value() {
        None => {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" fill="{AXIS_COLOR}">No data</text>"#,
                WIDTH / 2.0,
                height / 2.0
            );
        }
        Some(max) => {
            let _ = match view.kind {
                ChartKind::Line => draw_line(&mut out, view, max),
                ChartKind::StackedBar => draw_stacked(&mut out, view),
                ChartKind::GroupedBar => draw_grouped(&mut out, view, max),
                ChartKind::Pie => draw_pie(&mut out, view),
                ChartKind::HorizontalBar => draw_horizontal(&mut out, view, max),
            };
        }
    }

    out.push_str("</svg>");
    out
}

// ---------------------------------------------------------------------------
// Axes and legend
// ---------------------------------------------------------------------------

/// Round `max` up to a 1/2/5 multiple so ticks land on readable values.
pub fn nice_ceiling(max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    let raw_step = max / TICKS as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude);
    step * TICKS as f64
}

fn frame_for(view: &ChartView, rotated_labels: bool) -> Frame {
    let bottom_margin = if rotated_labels { 80.0 } else { 30.0 };
    let top = LEGEND_HEIGHT + 8.0;
    Frame {
        left: 64.0,
        top,
        width: WIDTH - 64.0 - 20.0,
        height: f64::from(view.height) - top - bottom_margin,
    }
}

fn draw_legend(out: &mut String, entries: &[(&str, &str)]) -> std::fmt::Result {
    let mut x = 64.0;
    for (name, color) in entries {
        write!(
            out,
            r#"<rect x="{x:.1}" y="8" width="12" height="12" fill="{color}"/><text x="{:.1}" y="18" font-size="12" fill="{AXIS_COLOR}">{}</text>"#,
            x + 16.0,
            escape(name)
        )?;
        x += 16.0 + 7.0 * name.chars().count() as f64 + 18.0;
    }
    Ok(())
}

fn series_legend(view: &ChartView) -> Vec<(&str, &str)> {
    view.series
        .iter()
        .map(|s| (s.name.as_str(), s.color))
        .collect()
}

/// Horizontal grid lines with value labels on the left.
fn draw_value_axis(out: &mut String, frame: Frame, top_value: f64) -> std::fmt::Result {
    for i in 0..=TICKS {
        let value = top_value * i as f64 / TICKS as f64;
        let y = frame.bottom() - frame.height * i as f64 / TICKS as f64;
        write!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-dasharray="3 3"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" fill="{AXIS_COLOR}">{}</text>"#,
            frame.left,
            frame.right(),
            frame.left - 6.0,
            y + 4.0,
            format_number(value)
        )?;
    }
    Ok(())
}

/// Category labels centred under each band.
fn draw_category_axis(
    out: &mut String,
    frame: Frame,
    categories: &[String],
    rotated: bool,
) -> std::fmt::Result {
    let band = frame.width / categories.len().max(1) as f64;
    for (i, category) in categories.iter().enumerate() {
        let x = frame.left + band * (i as f64 + 0.5);
        let y = frame.bottom() + 16.0;
        if rotated {
            write!(
                out,
                r#"<text x="{x:.1}" y="{y:.1}" font-size="11" text-anchor="end" fill="{AXIS_COLOR}" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
                escape(category)
            )?;
        } else {
            write!(
                out,
                r#"<text x="{x:.1}" y="{y:.1}" font-size="11" text-anchor="middle" fill="{AXIS_COLOR}">{}</text>"#,
                escape(category)
            )?;
        }
    }
    Ok(())
}

fn scale(value: f64, top_value: f64, frame: Frame) -> f64 {
    frame.bottom() - frame.height * (value / top_value)
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

/// The `d` attribute of a polyline that restarts with `M` after every gap.
pub fn line_path(points: &[Option<(f64, f64)>]) -> String {
    let mut d = String::new();
    let mut pen_down = false;
    for point in points {
        match point {
            Some((x, y)) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                if !d.is_empty() {
                    d.push(' ');
                }
                let _ = write!(d, "{cmd}{x:.1},{y:.1}");
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    d
}

fn draw_line(out: &mut String, view: &ChartView, max: f64) -> std::fmt::Result {
    let frame = frame_for(view, false);
    let top_value = nice_ceiling(max);
    draw_legend(out, &series_legend(view))?;
    draw_value_axis(out, frame, top_value)?;
    draw_category_axis(out, frame, &view.categories, false)?;

    let band = frame.width / view.categories.len().max(1) as f64;
    for series in &view.series {
        let points: Vec<Option<(f64, f64)>> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(|v| (frame.left + band * (i as f64 + 0.5), scale(v, top_value, frame)))
            })
            .collect();

        write!(
            out,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            line_path(&points),
            series.color
        )?;

        for (i, point) in points.iter().enumerate() {
            if let (Some((x, y)), Some(value)) = (point, series.values[i]) {
                write!(
                    out,
                    r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{}"><title>{} {}: {}</title></circle>"#,
                    series.color,
                    escape(&series.name),
                    escape(&view.categories[i]),
                    format_number(value)
                )?;
            }
        }
    }
    Ok(())
}

fn draw_stacked(out: &mut String, view: &ChartView) -> std::fmt::Result {
    let totals: Vec<f64> = (0..view.categories.len())
        .map(|i| {
            view.series
                .iter()
                .filter_map(|s| s.values.get(i).copied().flatten())
                .sum()
        })
        .collect();
    let top_value = nice_ceiling(totals.iter().copied().fold(0.0, f64::max));

    let frame = frame_for(view, false);
    draw_legend(out, &series_legend(view))?;
    draw_value_axis(out, frame, top_value)?;
    draw_category_axis(out, frame, &view.categories, false)?;

    let band = frame.width / view.categories.len().max(1) as f64;
    let bar_width = band * 0.6;
    for i in 0..view.categories.len() {
        let x = frame.left + band * i as f64 + (band - bar_width) / 2.0;
        let mut base = 0.0;
        for series in &view.series {
            let Some(value) = series.values.get(i).copied().flatten() else {
                continue;
            };
            let y_top = scale(base + value, top_value, frame);
            let y_base = scale(base, top_value, frame);
            write!(
                out,
                r#"<rect x="{x:.1}" y="{y_top:.1}" width="{bar_width:.1}" height="{:.1}" fill="{}"><title>{} {}: {}</title></rect>"#,
                y_base - y_top,
                series.color,
                escape(&series.name),
                escape(&view.categories[i]),
                format_number(value)
            )?;
            base += value;
        }
    }
    Ok(())
}

fn draw_grouped(out: &mut String, view: &ChartView, max: f64) -> std::fmt::Result {
    let rotated = view.categories.len() > 6;
    let frame = frame_for(view, rotated);
    let top_value = nice_ceiling(max);
    draw_legend(out, &series_legend(view))?;
    draw_value_axis(out, frame, top_value)?;
    draw_category_axis(out, frame, &view.categories, rotated)?;

    let band = frame.width / view.categories.len().max(1) as f64;
    let group_width = band * 0.8;
    let bar_width = group_width / view.series.len().max(1) as f64;
    for (s, series) in view.series.iter().enumerate() {
        for (i, value) in series.values.iter().enumerate() {
            let Some(value) = *value else { continue };
            let x = frame.left + band * i as f64 + (band - group_width) / 2.0 + bar_width * s as f64;
            let y = scale(value, top_value, frame);
            write!(
                out,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{:.1}" fill="{}"><title>{} {}: {}</title></rect>"#,
                frame.bottom() - y,
                series.color,
                escape(&view.categories[i]),
                escape(&series.name),
                format_number(value)
            )?;
        }
    }
    Ok(())
}

fn draw_horizontal(out: &mut String, view: &ChartView, max: f64) -> std::fmt::Result {
    let label_width = 110.0;
    let top = LEGEND_HEIGHT + 8.0;
    let frame = Frame {
        left: label_width,
        top,
        width: WIDTH - label_width - 40.0,
        height: f64::from(view.height) - top - 30.0,
    };
    let top_value = nice_ceiling(max);
    draw_legend(out, &series_legend(view))?;

    for i in 0..=TICKS {
        let value = top_value * i as f64 / TICKS as f64;
        let x = frame.left + frame.width * i as f64 / TICKS as f64;
        write!(
            out,
            r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{GRID_COLOR}" stroke-dasharray="3 3"/><text x="{x:.1}" y="{:.1}" font-size="11" text-anchor="middle" fill="{AXIS_COLOR}">{}</text>"#,
            frame.top,
            frame.bottom(),
            frame.bottom() + 16.0,
            format_number(value)
        )?;
    }

    let band = frame.height / view.categories.len().max(1) as f64;
    let bar_height = band * 0.7;
    for (i, category) in view.categories.iter().enumerate() {
        let y = frame.top + band * i as f64 + (band - bar_height) / 2.0;
        write!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" fill="{AXIS_COLOR}">{}</text>"#,
            frame.left - 6.0,
            y + bar_height / 2.0 + 4.0,
            escape(category)
        )?;
        for series in &view.series {
            let Some(value) = series.values.get(i).copied().flatten() else {
                continue;
            };
            write!(
                out,
                r#"<rect x="{:.1}" y="{y:.1}" width="{:.1}" height="{bar_height:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                frame.left,
                frame.width * value / top_value,
                series.color,
                escape(category),
                format_number(value)
            )?;
        }
    }
    Ok(())
}

fn draw_pie(out: &mut String, view: &ChartView) -> std::fmt::Result {
    let Some(series) = view.series.first() else {
        return Ok(());
    };
    let total: f64 = series.values.iter().flatten().sum();
    if total <= 0.0 {
        return Ok(());
    }

    let legend: Vec<(&str, &str)> = view
        .categories
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), slice_color(series, i)))
        .collect();
    draw_legend(out, &legend)?;

    let cx = WIDTH / 2.0;
    let cy = LEGEND_HEIGHT + (f64::from(view.height) - LEGEND_HEIGHT) / 2.0;
    let radius = 100.0;
    // Clockwise from twelve o'clock
    let mut angle = -PI / 2.0;

    for (i, value) in series.values.iter().enumerate() {
        let Some(value) = *value else { continue };
        let sweep = 2.0 * PI * value / total;
        let name = view.categories.get(i).map(String::as_str).unwrap_or("");

        // An arc whose ends coincide draws nothing.
        if sweep >= 2.0 * PI - f64::EPSILON {
            write!(
                out,
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{radius}" fill="{}"><title>{}: {}%</title></circle><text x="{cx:.1}" y="{cy:.1}" font-size="12" fill="white" text-anchor="middle" dominant-baseline="central">100%</text>"#,
                slice_color(series, i),
                escape(name),
                format_number(value)
            )?;
            continue;
        }

        let (x0, y0) = (cx + radius * angle.cos(), cy + radius * angle.sin());
        let end = angle + sweep;
        let (x1, y1) = (cx + radius * end.cos(), cy + radius * end.sin());
        let large_arc = u8::from(sweep > PI);

        write!(
            out,
            r#"<path d="M{cx:.1},{cy:.1} L{x0:.1},{y0:.1} A{radius},{radius} 0 {large_arc} 1 {x1:.1},{y1:.1} Z" fill="{}"><title>{}: {}%</title></path>"#,
            slice_color(series, i),
            escape(name),
            format_number(value)
        )?;

        let mid = angle + sweep / 2.0;
        write!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" fill="white" text-anchor="middle" dominant-baseline="central">{:.0}%</text>"#,
            cx + radius * 0.6 * mid.cos(),
            cy + radius * 0.6 * mid.sin(),
            value / total * 100.0
        )?;

        angle = end;
    }
    Ok(())
}

fn slice_color(series: &super::SeriesView, i: usize) -> &'static str {
    series.point_colors.get(i).copied().unwrap_or(series.color)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
