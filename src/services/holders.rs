use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::TokenConfig;
use crate::services::sim_client::{ApiFlavor, FetchError, SimClient};
use crate::types::models::{HolderRecord, HolderTable};

#[derive(Debug, Default, Deserialize)]
struct HoldersResponse {
    #[serde(default)]
    holders: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawHolder {
    wallet_address: Option<String>,
    balance: Option<Value>,
    has_initiated_transfer: Option<Value>,
    first_acquired: Option<Value>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedHolder {
    #[error("entry is not a holder object: {0}")]
    Shape(String),
    #[error("missing wallet_address")]
    MissingWallet,
    #[error("wallet {wallet} has an unusable balance: {raw}")]
    InvalidBalance { wallet: String, raw: String },
}

impl TryFrom<RawHolder> for HolderRecord {
    type Error = MalformedHolder;

    fn try_from(raw: RawHolder) -> Result<Self, Self::Error> {
        let wallet_address = raw
            .wallet_address
            .filter(|w| !w.trim().is_empty())
            .ok_or(MalformedHolder::MissingWallet)?;

        let balance = match raw.balance.as_ref().and_then(parse_balance) {
            Some(balance) => balance,
            None => {
                return Err(MalformedHolder::InvalidBalance {
                    wallet: wallet_address,
                    raw: raw.balance.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string()),
                })
            }
        };

        Ok(HolderRecord {
            wallet_address,
            balance,
            has_initiated_transfer: raw
                .has_initiated_transfer
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false),
            first_acquired: raw
                .first_acquired
                .as_ref()
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            balance_token: None,
        })
    }
}

/// Balances arrive as decimal strings; plain JSON integers are accepted too.
fn parse_balance(value: &Value) -> Option<u128> {
    match value {
        Value::String(s) => s.trim().parse::<u128>().ok(),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Some(v as u128);
            }
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u128)
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Turns a token-holders response body into a sorted table. Entries that
/// cannot be read as holders are dropped with a warning.
pub fn parse_holders(body: Value) -> HolderTable {
    let response: HoldersResponse = serde_json::from_value(body).unwrap_or_else(|e| {
        tracing::warn!("Unexpected token-holders body, treating as empty: {}", e);
        HoldersResponse::default()
    });

    let entries = response.holders.unwrap_or_default();
    if entries.is_empty() {
        return HolderTable::empty();
    }
    let total = entries.len();

    let records: Vec<HolderRecord> = entries
        .into_iter()
        .filter_map(|entry| {
            let parsed = serde_json::from_value::<RawHolder>(entry)
                .map_err(|e| MalformedHolder::Shape(e.to_string()))
                .and_then(HolderRecord::try_from);
            match parsed {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping holder entry: {}", e);
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!("Kept {} of {} holder entries", records.len(), total);
    }

    HolderTable::new(records)
}

/// Thin wrapper over the SIM token-holders endpoint.
#[derive(Clone)]
pub struct HoldersApi {
    client: SimClient,
    sim_base_url: String,
}

impl HoldersApi {
    pub fn new(client: SimClient, sim_base_url: impl Into<String>) -> Self {
        Self {
            client,
            sim_base_url: sim_base_url.into(),
        }
    }

    pub fn holders_url(&self, chain_id: u64, token_address: &str) -> String {
        format!("{}/evm/token-holders/{}/{}", self.sim_base_url, chain_id, token_address)
    }

    pub async fn fetch_holders(&self, chain_id: u64, token_address: &str) -> Result<HolderTable, FetchError> {
        if chain_id == 0 {
            return Err(FetchError::InvalidRequest("chain id must be positive".to_string()));
        }
        if token_address.trim().is_empty() {
            return Err(FetchError::InvalidRequest("token address is empty".to_string()));
        }

        let url = self.holders_url(chain_id, token_address.trim());
        let body: Value = self.client.get_json(&url, ApiFlavor::Sim).await?;
        let table = parse_holders(body);
        tracing::info!("Found {} holders for {} on chain {}", table.len(), token_address, chain_id);
        Ok(table)
    }

    pub async fn fetch_token_holders(&self, token: &TokenConfig) -> Result<HolderTable, FetchError> {
        tracing::info!("Fetching {} holders", token.label);
        self.fetch_holders(token.chain_id, &token.address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nonzero_ext::nonzero;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_and_sorts_holders() {
        let table = parse_holders(json!({
            "holders": [
                {
                    "wallet_address": "0xsmall",
                    "balance": "1000",
                    "has_initiated_transfer": false,
                    "first_acquired": "2024-02-01T10:00:00+00:00"
                },
                {
                    "wallet_address": "0xbig",
                    "balance": "5000000000000000000",
                    "has_initiated_transfer": true,
                    "first_acquired": "2024-01-15 08:30:00"
                }
            ]
        }));

        assert_eq!(table.len(), 2);
        let top = &table.rows()[0];
        assert_eq!(top.wallet_address, "0xbig");
        assert_eq!(top.balance, 5_000_000_000_000_000_000);
        assert!(top.has_initiated_transfer);
        assert_eq!(
            top.first_acquired,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap())
        );
        assert_eq!(table.rows()[1].wallet_address, "0xsmall");
    }

    #[test]
    fn missing_or_empty_holders_is_an_empty_table() {
        assert!(parse_holders(json!({ "holders": [] })).is_empty());
        assert!(parse_holders(json!({})).is_empty());
        assert!(parse_holders(json!({ "holders": null })).is_empty());
        assert!(parse_holders(json!("unexpected")).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let table = parse_holders(json!({
            "holders": [
                { "wallet_address": "0xok", "balance": 42 },
                { "balance": "10" },
                { "wallet_address": "0xneg", "balance": "-3" },
                { "wallet_address": "0xtext", "balance": "lots" },
                "not an object"
            ]
        }));

        assert_eq!(table.len(), 1);
        let only = &table.rows()[0];
        assert_eq!(only.wallet_address, "0xok");
        assert_eq!(only.balance, 42);
        assert!(!only.has_initiated_transfer);
        assert_eq!(only.first_acquired, None);
    }

    #[test]
    fn odd_optional_fields_do_not_drop_the_holder() {
        let table = parse_holders(json!({
            "holders": [
                {
                    "wallet_address": "0xA",
                    "balance": "5000000000000000000",
                    "has_initiated_transfer": true,
                    "first_acquired": 1714521600
                },
                {
                    "wallet_address": "0xB",
                    "balance": "1",
                    "has_initiated_transfer": "true",
                    "first_acquired": "2024-05-01T00:00:00Z"
                }
            ]
        }));

        assert_eq!(table.len(), 2);
        let a = &table.rows()[0];
        assert_eq!(a.wallet_address, "0xA");
        assert!(a.has_initiated_transfer);
        assert_eq!(a.first_acquired, None);

        let b = &table.rows()[1];
        assert_eq!(b.wallet_address, "0xB");
        assert!(!b.has_initiated_transfer);
        assert_eq!(
            b.first_acquired,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_timestamp_becomes_none() {
        let table = parse_holders(json!({
            "holders": [{ "wallet_address": "0xA", "balance": "1", "first_acquired": "yesterday" }]
        }));
        assert_eq!(table.rows()[0].first_acquired, None);
    }

    #[test]
    fn invalid_balance_reports_wallet() {
        let raw = RawHolder {
            wallet_address: Some("0xA".to_string()),
            balance: Some(json!(true)),
            has_initiated_transfer: None,
            first_acquired: None,
        };
        assert_eq!(
            HolderRecord::try_from(raw).unwrap_err(),
            MalformedHolder::InvalidBalance {
                wallet: "0xA".to_string(),
                raw: "true".to_string()
            }
        );
    }

    #[tokio::test]
    async fn fetch_holders_hits_token_holders_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/evm/token-holders/137/0xc0pm"))
            .and(header("X-Sim-Api-Key", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "holders": [{ "wallet_address": "0xA", "balance": "7", "has_initiated_transfer": true }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HoldersApi::new(
            SimClient::new("key", nonzero!(50u32)),
            format!("{}/v1", server.uri()),
        );
        let table = api.fetch_holders(137, "0xc0pm").await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].balance, 7);
    }

    #[tokio::test]
    async fn rejects_invalid_arguments_without_calling_out() {
        let api = HoldersApi::new(SimClient::new("key", nonzero!(50u32)), "http://127.0.0.1:9");
        assert!(matches!(
            api.fetch_holders(0, "0xA").await,
            Err(FetchError::InvalidRequest(_))
        ));
        assert!(matches!(
            api.fetch_holders(1, "  ").await,
            Err(FetchError::InvalidRequest(_))
        ));
    }
}
