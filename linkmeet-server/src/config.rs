use linkmeet_core::IceServerConfig;
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    InvalidAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Relay settings. ICE servers are not used by the relay itself; they are
/// handed to every client in `connection:welcome`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_URL)],
        }
    }
}

impl RelayConfig {
    /// Reads `LINKMEET_ADDR`, `TURN_URL`, `TURN_USERNAME` and `TURN_CREDENTIAL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("LINKMEET_ADDR") {
            config.bind_addr = parse_addr(&addr)?;
        }

        if let Some(turn_url) = lookup("TURN_URL") {
            config.ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: lookup("TURN_USERNAME"),
                credential: lookup("TURN_CREDENTIAL"),
            });
        }

        Ok(config)
    }
}

pub fn parse_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|source| ConfigError::InvalidAddr {
        value: value.to_owned(),
        source,
    })
}
