use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::models::{
    BalanceAggregates, ComparisonRow, GrowthPoint, HistogramBin, HolderTable, TokenMetrics,
};

pub fn to_token_units(raw: u128, decimals: u32) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Sets `balance_token` on every row from the raw balance. Any earlier
/// value is overwritten, so normalizing twice gives the same table.
pub fn normalize(table: HolderTable, decimals: u32) -> HolderTable {
    table.map_rows(|mut record| {
        record.balance_token = Some(to_token_units(record.balance, decimals));
        record
    })
}

pub fn safe_division(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        default
    } else {
        numerator / denominator
    }
}

pub fn calculate_metrics(table: &HolderTable) -> TokenMetrics {
    if table.is_empty() {
        return TokenMetrics::default();
    }

    let active_holders = table.iter().filter(|r| r.has_initiated_transfer).count();
    let balances = table.token_balances();
    let average_balance = safe_division(balances.iter().sum(), balances.len() as f64, 0.0);

    TokenMetrics {
        total_holders: table.len(),
        active_holders,
        average_balance,
    }
}

/// One row per token, in the order given.
pub fn build_comparison(entries: &[(&str, &TokenMetrics)]) -> Vec<ComparisonRow> {
    entries
        .iter()
        .map(|(label, metrics)| ComparisonRow {
            token: label.to_string(),
            total_holders: metrics.total_holders,
            active_holders: metrics.active_holders,
        })
        .collect()
}

pub fn aggregate_balances(values: &[f64]) -> BalanceAggregates {
    if values.is_empty() {
        return BalanceAggregates::default();
    }

    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    BalanceAggregates {
        sum,
        mean: sum / values.len() as f64,
        min,
        max,
    }
}

/// Equal-width bins spanning `[min, max]`. The last bin is closed on the
/// right so the maximum is counted.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Daily count of first acquisitions with a running total. Holders without
/// a `first_acquired` date are not counted.
pub fn holder_growth(table: &HolderTable) -> Vec<GrowthPoint> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in table {
        if let Some(ts) = record.first_acquired {
            *per_day.entry(ts.date_naive()).or_default() += 1;
        }
    }

    let mut cumulative = 0;
    per_day
        .into_iter()
        .map(|(date, new_holders)| {
            cumulative += new_holders;
            GrowthPoint {
                date,
                new_holders,
                cumulative,
            }
        })
        .collect()
}
