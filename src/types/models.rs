use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// One wallet holding a token, as returned by the token-holders endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderRecord {
    pub wallet_address: String,
    /// Raw balance in the token's smallest unit.
    #[serde(serialize_with = "serialize_u128_as_string")]
    pub balance: u128,
    pub has_initiated_transfer: bool,
    pub first_acquired: Option<DateTime<Utc>>,
    /// Human-readable balance; `None` until the table has been normalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_token: Option<f64>,
}

// Balances routinely exceed 2^53, so they leave the service as strings.
fn serialize_u128_as_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Holders of a single token ordered by raw balance, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HolderTable {
    rows: Vec<HolderRecord>,
}

impl HolderTable {
    pub fn new(mut rows: Vec<HolderRecord>) -> Self {
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[HolderRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HolderRecord> {
        self.rows.iter()
    }

    /// Rebuilds the table row by row without re-sorting.
    pub(crate) fn map_rows<F>(self, f: F) -> Self
    where
        F: FnMut(HolderRecord) -> HolderRecord,
    {
        Self {
            rows: self.rows.into_iter().map(f).collect(),
        }
    }

    /// Normalized balances of every row that has one.
    pub fn token_balances(&self) -> Vec<f64> {
        self.rows().iter().filter_map(|r| r.balance_token).collect()
    }
}

impl<'a> IntoIterator for &'a HolderTable {
    type Item = &'a HolderRecord;
    type IntoIter = std::slice::Iter<'a, HolderRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub total_holders: usize,
    pub active_holders: usize,
    pub average_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub token: String,
    pub total_holders: usize,
    pub active_holders: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceAggregates {
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub new_holders: usize,
    pub cumulative: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenSnapshot {
    pub label: String,
    pub chain_id: u64,
    pub address: String,
    pub holders: HolderTable,
    pub metrics: TokenMetrics,
    pub aggregates: BalanceAggregates,
    pub histogram: Vec<HistogramBin>,
    pub growth: Vec<GrowthPoint>,
}

/// Everything one refresh produced. Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub tokens: Vec<TokenSnapshot>,
    pub comparison: Vec<ComparisonRow>,
}
