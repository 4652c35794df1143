use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join;

use crate::config::{DashboardConfig, TokenConfig};
use crate::services::holders::HoldersApi;
use crate::services::metrics::{
    aggregate_balances, build_comparison, calculate_metrics, histogram, holder_growth, normalize,
};
use crate::services::sim_client::{FetchError, SimClient};
use crate::types::models::{DashboardSnapshot, HolderTable, TokenSnapshot};

pub const HISTOGRAM_BINS: usize = 20;

pub fn build_token_snapshot(token: &TokenConfig, table: HolderTable) -> TokenSnapshot {
    let holders = normalize(table, token.decimals);
    let balances = holders.token_balances();

    TokenSnapshot {
        label: token.label.clone(),
        chain_id: token.chain_id,
        address: token.address.clone(),
        metrics: calculate_metrics(&holders),
        aggregates: aggregate_balances(&balances),
        histogram: histogram(&balances, HISTOGRAM_BINS),
        growth: holder_growth(&holders),
        holders,
    }
}

pub struct DashboardService {
    config: Arc<DashboardConfig>,
    api: HoldersApi,
}

impl DashboardService {
    pub fn new(config: Arc<DashboardConfig>) -> Self {
        let client = SimClient::new(config.api_key.clone(), config.requests_per_second);
        let api = HoldersApi::new(client, config.sim_base_url.clone());
        Self { config, api }
    }

    /// Fetches both tokens and recomputes everything from scratch.
    pub async fn refresh(&self) -> Result<DashboardSnapshot, FetchError> {
        let operation_start = std::time::Instant::now();
        let [copm, copw] = self.config.tokens();

        let (copm_table, copw_table) = try_join(
            self.api.fetch_token_holders(copm),
            self.api.fetch_token_holders(copw),
        )
        .await?;

        let tokens = vec![
            build_token_snapshot(copm, copm_table),
            build_token_snapshot(copw, copw_table),
        ];
        let entries: Vec<(&str, &_)> = tokens
            .iter()
            .map(|t| (t.label.as_str(), &t.metrics))
            .collect();
        let comparison = build_comparison(&entries);

        for token in &tokens {
            tracing::info!(
                "{}: {} holders, {} active, average balance {:.2}",
                token.label,
                token.metrics.total_holders,
                token.metrics.active_holders,
                token.metrics.average_balance
            );
        }
        tracing::info!("Refresh took: {:?}", operation_start.elapsed());

        Ok(DashboardSnapshot {
            fetched_at: Utc::now(),
            tokens,
            comparison,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{config_with, full_env};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_for(server: &MockServer) -> DashboardService {
        let mut vars = full_env();
        vars.insert("DUNE_SIM", format!("{}/v1", server.uri()));
        DashboardService::new(Arc::new(config_with(&vars).unwrap()))
    }

    #[tokio::test]
    async fn refresh_builds_snapshot_in_token_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/evm/token-holders/137/0xc0pm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "holders": [
                    { "wallet_address": "0xA", "balance": "1000000000000000000", "has_initiated_transfer": false },
                    { "wallet_address": "0xB", "balance": "5000000000000000000", "has_initiated_transfer": true,
                      "first_acquired": "2024-05-01T00:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/evm/token-holders/1/0xc0pw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "holders": [] })))
            .mount(&server)
            .await;

        let snapshot = service_for(&server).await.refresh().await.unwrap();

        assert_eq!(snapshot.tokens.len(), 2);
        let copm = &snapshot.tokens[0];
        assert_eq!(copm.label, "COPM");
        assert_eq!(copm.holders.rows()[0].wallet_address, "0xB");
        assert_eq!(copm.holders.rows()[0].balance_token, Some(5.0));
        assert_eq!(copm.metrics.total_holders, 2);
        assert_eq!(copm.metrics.active_holders, 1);
        assert_eq!(copm.metrics.average_balance, 3.0);
        assert_eq!(copm.growth.len(), 1);
        assert_eq!(copm.histogram.iter().map(|b| b.count).sum::<usize>(), 2);

        let copw = &snapshot.tokens[1];
        assert_eq!(copw.label, "COPW");
        assert!(copw.holders.is_empty());
        assert_eq!(copw.metrics, Default::default());
        assert!(copw.histogram.is_empty());

        assert_eq!(snapshot.comparison[0].token, "COPM");
        assert_eq!(snapshot.comparison[0].total_holders, 2);
        assert_eq!(snapshot.comparison[1].token, "COPW");
        assert_eq!(snapshot.comparison[1].total_holders, 0);
    }

    #[tokio::test]
    async fn refresh_fails_when_either_fetch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/evm/token-holders/137/0xc0pm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "holders": [] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/evm/token-holders/1/0xc0pw"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = service_for(&server).await.refresh().await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
