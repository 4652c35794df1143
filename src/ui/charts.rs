//! Inline SVG charts for the dashboard page. Geometry is computed here; the
//! markup comes from `templates/chart.svg`, which escapes every label.

use askama::Template;

use crate::types::models::{ComparisonRow, HistogramBin};
use crate::ui::format::{format_count, format_with_commas};

pub const TOTAL_COLOR: &str = "#636EFA";
pub const ACTIVE_COLOR: &str = "#00CC96";

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn baseline() -> f64 {
    HEIGHT - MARGIN_BOTTOM
}

fn px(value: f64) -> String {
    format!("{value:.1}")
}

struct Line {
    x1: String,
    y1: String,
    x2: String,
    y2: String,
    stroke: &'static str,
}

struct Bar {
    x: String,
    y: String,
    width: String,
    height: String,
    fill: String,
    stroke: Option<&'static str>,
    tooltip: Option<String>,
}

struct Polyline {
    points: String,
    stroke: String,
}

struct Marker {
    cx: String,
    cy: String,
    fill: String,
    tooltip: String,
}

struct Label {
    x: String,
    y: String,
    anchor: &'static str,
    class: &'static str,
    transform: Option<String>,
    text: String,
}

#[derive(Template)]
#[template(path = "chart.svg", escape = "html")]
struct Chart {
    width: f64,
    height: f64,
    title_x: String,
    title: String,
    lines: Vec<Line>,
    bars: Vec<Bar>,
    polyline: Option<Polyline>,
    markers: Vec<Marker>,
    labels: Vec<Label>,
}

impl Chart {
    /// Empty plot with title, a few horizontal gridlines with labels, the
    /// two axis lines and their titles.
    fn with_axes(title: &str, y_max: f64, x_label: &str, y_label: &str) -> Self {
        let mut chart = Chart {
            width: WIDTH,
            height: HEIGHT,
            title_x: px(WIDTH / 2.0),
            title: title.to_string(),
            lines: Vec::new(),
            bars: Vec::new(),
            polyline: None,
            markers: Vec::new(),
            labels: Vec::new(),
        };

        let ticks = 4;
        for i in 0..=ticks {
            let value = y_max * i as f64 / ticks as f64;
            let y = baseline() - plot_height() * i as f64 / ticks as f64;
            chart.line(MARGIN_LEFT, y, WIDTH - MARGIN_RIGHT, y, "#e5e5e5");
            chart.label(
                MARGIN_LEFT - 6.0,
                y + 4.0,
                "end",
                "tick",
                format_with_commas(value, if y_max < 10.0 { 1 } else { 0 }),
            );
        }
        chart.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, baseline(), "#444");
        chart.line(MARGIN_LEFT, baseline(), WIDTH - MARGIN_RIGHT, baseline(), "#444");

        chart.label(
            MARGIN_LEFT + plot_width() / 2.0,
            HEIGHT - 12.0,
            "middle",
            "axis-label",
            x_label,
        );
        let mid = MARGIN_TOP + plot_height() / 2.0;
        chart.labels.push(Label {
            x: px(16.0),
            y: px(mid),
            anchor: "middle",
            class: "axis-label",
            transform: Some(format!("rotate(-90 16 {})", px(mid))),
            text: y_label.to_string(),
        });
        chart
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &'static str) {
        self.lines.push(Line {
            x1: px(x1),
            y1: px(y1),
            x2: px(x2),
            y2: px(y2),
            stroke,
        });
    }

    fn label(&mut self, x: f64, y: f64, anchor: &'static str, class: &'static str, text: impl Into<String>) {
        self.labels.push(Label {
            x: px(x),
            y: px(y),
            anchor,
            class,
            transform: None,
            text: text.into(),
        });
    }

    fn bar(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) -> &mut Bar {
        self.bars.push(Bar {
            x: px(x),
            y: px(y),
            width: px(width),
            height: px(height),
            fill: fill.to_string(),
            stroke: None,
            tooltip: None,
        });
        let last = self.bars.len() - 1;
        &mut self.bars[last]
    }
}

/// Total and active holders side by side for every token, with the values
/// printed on the bars.
pub fn comparison_bar_chart(rows: &[ComparisonRow]) -> Result<String, askama::Error> {
    let y_max = rows
        .iter()
        .map(|r| r.total_holders.max(r.active_holders))
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let mut chart = Chart::with_axes("Total vs active holders", y_max, "Token", "Holders");

    let group_width = plot_width() / rows.len().max(1) as f64;
    let bar_width = group_width * 0.3;

    for (i, row) in rows.iter().enumerate() {
        let group_x = MARGIN_LEFT + group_width * i as f64;
        let series = [(row.total_holders, TOTAL_COLOR), (row.active_holders, ACTIVE_COLOR)];
        for (j, (value, color)) in series.into_iter().enumerate() {
            let height = plot_height() * value as f64 / y_max;
            let x = group_x + group_width * 0.2 + bar_width * j as f64;
            let y = baseline() - height;
            chart.bar(x, y, bar_width, height, color);
            chart.label(x + bar_width / 2.0, y - 4.0, "middle", "bar-value", format_count(value));
        }
        chart.label(
            group_x + group_width / 2.0,
            baseline() + 18.0,
            "middle",
            "tick",
            row.token.as_str(),
        );
    }

    let legend = [("Total Holders", TOTAL_COLOR), ("Active Holders", ACTIVE_COLOR)];
    for (i, (text, color)) in legend.into_iter().enumerate() {
        let x = WIDTH - MARGIN_RIGHT - 260.0 + 130.0 * i as f64;
        chart.bar(x, 32.0, 12.0, 12.0, color);
        chart.label(x + 16.0, 42.0, "start", "legend", text);
    }

    chart.render()
}

/// Contiguous bars over normalized balances.
pub fn histogram_chart(bins: &[HistogramBin], title: &str, color: &str) -> Result<String, askama::Error> {
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let mut chart = Chart::with_axes(title, y_max, "Balance (tokens)", "Number of holders");

    let bar_width = plot_width() / bins.len().max(1) as f64;
    for (i, bin) in bins.iter().enumerate() {
        let height = plot_height() * bin.count as f64 / y_max;
        let x = MARGIN_LEFT + bar_width * i as f64;
        let bar = chart.bar(x, baseline() - height, bar_width, height, color);
        bar.stroke = Some("#fff");
        bar.tooltip = Some(format!(
            "{} to {}: {}",
            format_with_commas(bin.lower, 2),
            format_with_commas(bin.upper, 2),
            bin.count
        ));
    }

    if let (Some(first), Some(last)) = (bins.first(), bins.last()) {
        chart.label(MARGIN_LEFT, baseline() + 18.0, "start", "tick", format_with_commas(first.lower, 2));
        chart.label(
            WIDTH - MARGIN_RIGHT,
            baseline() + 18.0,
            "end",
            "tick",
            format_with_commas(last.upper, 2),
        );
    }

    chart.render()
}

/// Polyline with markers. Points are spaced evenly along x in the order
/// given; the first and last x labels are printed under the axis.
pub fn line_chart(
    points: &[(String, f64)],
    title: &str,
    x_label: &str,
    y_label: &str,
    color: &str,
) -> Result<String, askama::Error> {
    let y_max = points
        .iter()
        .map(|(_, y)| *y)
        .fold(0.0, f64::max)
        .max(1.0);
    let mut chart = Chart::with_axes(title, y_max, x_label, y_label);

    let step = if points.len() > 1 {
        plot_width() / (points.len() - 1) as f64
    } else {
        0.0
    };
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, (_, y))| {
            let x = if points.len() > 1 {
                MARGIN_LEFT + step * i as f64
            } else {
                MARGIN_LEFT + plot_width() / 2.0
            };
            (x, baseline() - plot_height() * y / y_max)
        })
        .collect();

    if coords.len() > 1 {
        let path: Vec<String> = coords.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
        chart.polyline = Some(Polyline {
            points: path.join(" "),
            stroke: color.to_string(),
        });
    }
    for ((x, y), (label, value)) in coords.iter().zip(points) {
        chart.markers.push(Marker {
            cx: px(*x),
            cy: px(*y),
            fill: color.to_string(),
            tooltip: format!("{}: {}", label, format_with_commas(*value, 0)),
        });
    }

    if let (Some((first, _)), Some((last, _))) = (points.first(), points.last()) {
        chart.label(MARGIN_LEFT, baseline() + 18.0, "start", "tick", first.as_str());
        if points.len() > 1 {
            chart.label(WIDTH - MARGIN_RIGHT, baseline() + 18.0, "end", "tick", last.as_str());
        }
    }

    chart.render()
}
