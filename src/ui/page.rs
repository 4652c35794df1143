use askama::Template;

use crate::types::models::{DashboardSnapshot, TokenSnapshot};
use crate::ui::charts::{comparison_bar_chart, histogram_chart, line_chart};
use crate::ui::format::{format_count, format_with_commas};

const TOKEN_COLORS: [&str; 2] = ["#636EFA", "#EF553B"];

struct HolderRow {
    wallet_address: String,
    balance: String,
    has_initiated_transfer: bool,
    first_acquired: String,
}

struct Metric {
    label: String,
    value: String,
}

/// One column of the page. Empty holder tables leave `metrics` empty and
/// both charts `None`.
struct TokenPanel {
    label: String,
    holders: Vec<HolderRow>,
    metrics: Vec<Metric>,
    histogram: Option<String>,
    growth: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage {
    updated: String,
    tokens: Vec<TokenPanel>,
    comparison_chart: String,
    show_distribution: bool,
}

fn color_for(index: usize) -> &'static str {
    TOKEN_COLORS[index % TOKEN_COLORS.len()]
}

fn holder_rows(token: &TokenSnapshot) -> Vec<HolderRow> {
    token
        .holders
        .iter()
        .map(|record| HolderRow {
            wallet_address: record.wallet_address.clone(),
            balance: record.balance.to_string(),
            has_initiated_transfer: record.has_initiated_transfer,
            first_acquired: record
                .first_acquired
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        })
        .collect()
}

fn metrics(token: &TokenSnapshot) -> Vec<Metric> {
    if token.holders.is_empty() {
        return Vec::new();
    }

    let m = &token.metrics;
    let a = &token.aggregates;
    [
        ("Total holders", format_count(m.total_holders)),
        ("Active holders", format_count(m.active_holders)),
        ("Average balance", format_with_commas(m.average_balance, 2)),
        ("Total held", format_with_commas(a.sum, 2)),
        ("Largest balance", format_with_commas(a.max, 2)),
    ]
    .into_iter()
    .map(|(name, value)| Metric {
        label: format!("{} - {}", token.label, name),
        value,
    })
    .collect()
}

fn histogram_panel(token: &TokenSnapshot, index: usize) -> Result<Option<String>, askama::Error> {
    if token.histogram.is_empty() {
        return Ok(None);
    }
    histogram_chart(
        &token.histogram,
        &format!("{} - Balance distribution", token.label),
        color_for(index),
    )
    .map(Some)
}

fn growth_panel(token: &TokenSnapshot, index: usize) -> Result<Option<String>, askama::Error> {
    if token.growth.is_empty() {
        return Ok(None);
    }
    let points: Vec<(String, f64)> = token
        .growth
        .iter()
        .map(|p| (p.date.format("%Y-%m-%d").to_string(), p.cumulative as f64))
        .collect();
    line_chart(
        &points,
        &format!("{} - Cumulative holders", token.label),
        "Day",
        "Holders",
        color_for(index),
    )
    .map(Some)
}

/// Full dashboard page for one snapshot.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> Result<String, askama::Error> {
    let tokens = snapshot
        .tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            Ok(TokenPanel {
                label: token.label.clone(),
                holders: holder_rows(token),
                metrics: metrics(token),
                histogram: histogram_panel(token, i)?,
                growth: growth_panel(token, i)?,
            })
        })
        .collect::<Result<Vec<_>, askama::Error>>()?;

    DashboardPage {
        updated: snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        show_distribution: snapshot.tokens.iter().any(|t| !t.holders.is_empty()),
        comparison_chart: comparison_bar_chart(&snapshot.comparison)?,
        tokens,
    }
    .render()
}
