use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BackendConfig, ListConfig, OraclesConfig, VotingConfig};

/// Networks with a known indexer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    /// Local node and indexer, for development
    Local,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Local => write!(f, "local"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "local" => Ok(Network::Local),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

impl OraclesConfig {
    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            preferences_path: None,
            log_level: "info".to_string(),
            backend: BackendConfig {
                url: "https://api.idena.io".to_string(),
                request_timeout_secs: 30,
            },
            list: ListConfig::default(),
            voting: VotingConfig::default(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            backend: BackendConfig {
                url: "https://testnet.api.idena.io".to_string(),
                request_timeout_secs: 30,
            },
            ..Self::mainnet()
        }
    }

    /// Short timeouts and fast polling against a local indexer
    pub fn local() -> Self {
        Self {
            network: Network::Local,
            log_level: "debug".to_string(),
            backend: BackendConfig {
                url: "http://localhost:1234".to_string(),
                request_timeout_secs: 5,
            },
            list: ListConfig {
                page_size: 20,
                late_after_ms: 150,
            },
            voting: VotingConfig {
                poll_interval_secs: 3,
            },
            ..Self::mainnet()
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Local => Self::local(),
        }
    }
}
