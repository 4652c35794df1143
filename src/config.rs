use std::env;
use std::num::NonZeroU32;

use nonzero_ext::nonzero;
use thiserror::Error;

pub const DEFAULT_SIM_BASE_URL: &str = "https://api.sim.dune.com/v1";

/// Both tokens are assumed to use 18 decimals. This is not checked against
/// the contracts' own `decimals()`.
pub const TOKEN_DECIMALS: u32 = 18;

const API_KEY_VAR: &str = "DUNE_API_KEY";
const COPM_CHAIN_VAR: &str = "DUNE_CHAIN_ID_POLYGON";
const COPM_ADDRESS_VAR: &str = "DUNE_COPM_TOKEN_ADDRESS";
const COPW_CHAIN_VAR: &str = "DUNE_CHAIN_ID_ETH";
const COPW_ADDRESS_VAR: &str = "DUNE_COPW_TOKEN_ADDRESS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// One tracked token: a display label plus where it lives on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub label: String,
    pub chain_id: u64,
    pub address: String,
    pub decimals: u32,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_key: String,
    pub sim_base_url: String,
    pub copm: TokenConfig,
    pub copw: TokenConfig,
    pub bind: String,
    pub port: u16,
    pub requests_per_second: NonZeroU32,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Every required variable
    /// is checked before failing so the error lists all of the missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let required = [
            API_KEY_VAR,
            COPM_CHAIN_VAR,
            COPM_ADDRESS_VAR,
            COPW_CHAIN_VAR,
            COPW_ADDRESS_VAR,
        ];
        let missing: Vec<String> = required
            .into_iter()
            .filter(|&name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let value = |name: &str| get(name).unwrap_or_default();

        let copm = TokenConfig {
            label: "COPM".to_string(),
            chain_id: parse_chain_id(COPM_CHAIN_VAR, &value(COPM_CHAIN_VAR))?,
            address: value(COPM_ADDRESS_VAR),
            decimals: TOKEN_DECIMALS,
        };
        let copw = TokenConfig {
            label: "COPW".to_string(),
            chain_id: parse_chain_id(COPW_CHAIN_VAR, &value(COPW_CHAIN_VAR))?,
            address: value(COPW_ADDRESS_VAR),
            decimals: TOKEN_DECIMALS,
        };

        let port = match get("DASHBOARD_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "DASHBOARD_PORT".to_string(),
                reason: format!("`{raw}` is not a port number"),
            })?,
            None => 8000,
        };

        let requests_per_second = match get("SIM_REQUESTS_PER_SECOND") {
            Some(raw) => raw
                .parse::<NonZeroU32>()
                .map_err(|_| ConfigError::Invalid {
                    name: "SIM_REQUESTS_PER_SECOND".to_string(),
                    reason: format!("`{raw}` is not a positive integer"),
                })?,
            None => nonzero!(5u32),
        };

        Ok(Self {
            api_key: value(API_KEY_VAR),
            sim_base_url: get("DUNE_SIM")
                .unwrap_or_else(|| DEFAULT_SIM_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            copm,
            copw,
            bind: get("DASHBOARD_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            requests_per_second,
        })
    }

    /// Tokens in display order.
    pub fn tokens(&self) -> [&TokenConfig; 2] {
        [&self.copm, &self.copw]
    }
}

fn parse_chain_id(name: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("`{raw}` is not a positive integer chain id"),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DUNE_API_KEY", "test-key".to_string()),
            ("DUNE_CHAIN_ID_POLYGON", "137".to_string()),
            ("DUNE_COPM_TOKEN_ADDRESS", "0xc0pm".to_string()),
            ("DUNE_CHAIN_ID_ETH", "1".to_string()),
            ("DUNE_COPW_TOKEN_ADDRESS", "0xc0pw".to_string()),
        ])
    }

    pub(crate) fn config_with(vars: &HashMap<&'static str, String>) -> Result<DashboardConfig, ConfigError> {
        DashboardConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn loads_required_and_defaults() {
        let cfg = config_with(&full_env()).unwrap();
        assert_eq!(cfg.api_key, "test-key");
        assert_eq!(cfg.copm.chain_id, 137);
        assert_eq!(cfg.copm.address, "0xc0pm");
        assert_eq!(cfg.copw.chain_id, 1);
        assert_eq!(cfg.copw.label, "COPW");
        assert_eq!(cfg.copm.decimals, 18);
        assert_eq!(cfg.sim_base_url, DEFAULT_SIM_BASE_URL);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.requests_per_second.get(), 5);
    }

    #[test]
    fn missing_variable_is_named_exactly() {
        let mut vars = full_env();
        vars.remove("DUNE_COPW_TOKEN_ADDRESS");
        let err = config_with(&vars).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["DUNE_COPW_TOKEN_ADDRESS".to_string()])
        );
        assert!(err.to_string().contains("DUNE_COPW_TOKEN_ADDRESS"));
    }

    #[test]
    fn lists_every_missing_variable() {
        let mut vars = full_env();
        vars.remove("DUNE_API_KEY");
        vars.insert("DUNE_CHAIN_ID_ETH", "   ".to_string());
        match config_with(&vars).unwrap_err() {
            ConfigError::Missing(names) => {
                assert_eq!(names, vec!["DUNE_API_KEY", "DUNE_CHAIN_ID_ETH"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_chain_id() {
        let mut vars = full_env();
        vars.insert("DUNE_CHAIN_ID_POLYGON", "0".to_string());
        match config_with(&vars).unwrap_err() {
            ConfigError::Invalid { name, .. } => assert_eq!(name, "DUNE_CHAIN_ID_POLYGON"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let mut vars = full_env();
        vars.insert("DUNE_SIM", "http://localhost:9000/v1/".to_string());
        let cfg = config_with(&vars).unwrap();
        assert_eq!(cfg.sim_base_url, "http://localhost:9000/v1");
    }
}
