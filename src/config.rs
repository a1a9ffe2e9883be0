use std::time::Duration;

use anyhow::Context;

use crate::logging::LogFormat;
use crate::models::{Address, ObjectId};
use crate::providers::move_call::{MoveCallBuilder, DEFAULT_WITHDRAW_FUNCTION};
use crate::tracker::aggregator::{CapabilityPolicy, VaultLayout};

pub const DEFAULT_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
pub const DEFAULT_CHAIN: &str = "sui:mainnet";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_METADATA_STALE_MS: u64 = 30_000;

/// Runtime settings, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub owner_address: Option<Address>,
    pub package_id: String,
    pub layout: VaultLayout,
    pub withdraw_function: String,
    pub chain: String,
    pub settle_delay: Duration,
    pub metadata_stale_after: Duration,
    /// `None` disables background polling.
    pub tick_interval: Option<Duration>,
    pub capability_policy: CapabilityPolicy,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests need not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let package_id = get("PACKAGE_ID").context("PACKAGE_ID must be set to the vault package")?;

        let defaults = VaultLayout::default();
        let layout = VaultLayout {
            module: get("VAULT_MODULE").unwrap_or(defaults.module),
            cap_struct: get("CAP_STRUCT").unwrap_or(defaults.cap_struct),
        };

        let tick_ms = parse_ms(&get, "TICK_INTERVAL_MS", 0)?;

        Ok(Self {
            rpc_url: get("SUI_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            owner_address: get("OWNER_ADDRESS").map(Address::new),
            package_id,
            layout,
            withdraw_function: get("WITHDRAW_FUNCTION")
                .unwrap_or_else(|| DEFAULT_WITHDRAW_FUNCTION.to_string()),
            chain: get("SUI_CHAIN").unwrap_or_else(|| DEFAULT_CHAIN.to_string()),
            settle_delay: Duration::from_millis(parse_ms(
                &get,
                "SETTLE_DELAY_MS",
                DEFAULT_SETTLE_DELAY_MS,
            )?),
            metadata_stale_after: Duration::from_millis(parse_ms(
                &get,
                "METADATA_STALE_MS",
                DEFAULT_METADATA_STALE_MS,
            )?),
            tick_interval: (tick_ms > 0).then(|| Duration::from_millis(tick_ms)),
            capability_policy: get("CAPABILITY_POLICY")
                .map(|v| parse_policy(&v))
                .unwrap_or_default(),
            log_format: get("LOG_FORMAT")
                .map(|v| LogFormat::from_str_lossy(&v))
                .unwrap_or(LogFormat::Pretty),
        })
    }

    /// Builder for the configured withdraw entry point.
    pub fn withdrawal_builder(&self) -> MoveCallBuilder {
        MoveCallBuilder::new(self.package_id.clone(), self.layout.module.clone())
            .with_function(self.withdraw_function.clone())
    }
}

fn parse_ms(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a whole number of milliseconds, got {:?}", key, raw)),
        None => Ok(default),
    }
}

/// `reject`, `first`, or a capability object id.
fn parse_policy(raw: &str) -> CapabilityPolicy {
    match raw.to_lowercase().as_str() {
        "reject" => CapabilityPolicy::Reject,
        "first" => CapabilityPolicy::First,
        _ => CapabilityPolicy::Explicit(ObjectId::new(raw)),
    }
}
