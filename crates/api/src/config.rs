//! Process configuration read from the environment.

use std::net::SocketAddr;

use anyhow::bail;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process memory; everything is lost on restart (dev/test).
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Create the standard Level-1 heads on an empty chart at startup.
    pub seed_chart: bool,
    pub store: StoreBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            seed_chart: false,
            store: StoreBackend::InMemory,
        }
    }
}

impl ApiConfig {
    /// `MILLERP_BIND_ADDR`, `MILLERP_SEED_CHART`, `USE_PERSISTENT_STORES`,
    /// `DATABASE_URL`, `MILLERP_DB_MAX_CONNECTIONS`.
    ///
    /// Invalid values fall back to the defaults. Asking for persistent
    /// stores without a `DATABASE_URL` is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match lookup("MILLERP_BIND_ADDR") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid MILLERP_BIND_ADDR; using {DEFAULT_BIND_ADDR}");
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let seed_chart = flag(&lookup, "MILLERP_SEED_CHART", defaults.seed_chart);

        let store = if flag(&lookup, "USE_PERSISTENT_STORES", false) {
            let Some(database_url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) else {
                bail!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
            };
            let max_connections = match lookup("MILLERP_DB_MAX_CONNECTIONS") {
                Some(raw) => raw.trim().parse::<u32>().ok().filter(|n| *n > 0).unwrap_or_else(|| {
                    tracing::warn!(
                        value = %raw,
                        "invalid MILLERP_DB_MAX_CONNECTIONS; using {DEFAULT_DB_MAX_CONNECTIONS}"
                    );
                    DEFAULT_DB_MAX_CONNECTIONS
                }),
                None => DEFAULT_DB_MAX_CONNECTIONS,
            };
            StoreBackend::Postgres {
                database_url: database_url.trim().to_string(),
                max_connections,
            }
        } else {
            StoreBackend::InMemory
        };

        Ok(Self {
            bind_addr,
            seed_chart,
            store,
        })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key) {
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "invalid {key}; using {default}");
            default
        }),
        None => default,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
