use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use ethers::types::TxHash;
use serde::Serialize;
use std::env;
use url::Url;

use crate::wallet::Eip1193Wallet;

/// Default endpoint of a desktop wallet exposing EIP-1193 methods over HTTP (Frame).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

/// Gas budgeted per recipient when building the disperse transaction.
pub const DEFAULT_GAS_PER_RECIPIENT: u64 = 60_000;

/// Native currency descriptor as expected by `wallet_addEthereumChain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// The single EVM network this application operates on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    pub chain_id: u64,
    pub name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub explorer_urls: &'static [&'static str],
}

pub const MONAD_TESTNET: NetworkProfile = NetworkProfile {
    chain_id: 10143,
    name: "Monad Testnet",
    native_currency: NativeCurrency {
        name: "MON",
        symbol: "MON",
        decimals: 18,
    },
    rpc_urls: &["https://testnet-rpc.monad.xyz/"],
    explorer_urls: &["https://testnet.monadexplorer.com/"],
};

/// Parameter object for `wallet_addEthereumChain`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams<'a> {
    pub chain_id: String,
    pub chain_name: &'a str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'a [&'a str],
    pub block_explorer_urls: &'a [&'a str],
}

impl NetworkProfile {
    /// Chain id in the `0x`-prefixed hex form wallets expect
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn add_chain_params(&self) -> AddChainParams<'_> {
        AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.name,
            native_currency: self.native_currency,
            rpc_urls: self.rpc_urls,
            block_explorer_urls: self.explorer_urls,
        }
    }

    /// Base explorer URL without a trailing slash
    pub fn explorer_url(&self) -> Option<&'static str> {
        self.explorer_urls.first().map(|url| url.trim_end_matches('/'))
    }

    /// Get the full URL to view a transaction on the block explorer
    pub fn tx_url(&self, tx_hash: TxHash) -> Option<String> {
        self.explorer_url()
            .map(|base| format!("{}/tx/{:?}", base, tx_hash))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub wallet_url: String,
    pub network: NetworkProfile,
    pub default_multisender: String,
    pub default_token: String,
    pub gas_per_recipient: u64,
}

impl Config {
    pub fn new(wallet_url: String) -> Self {
        Self {
            wallet_url,
            network: MONAD_TESTNET,
            default_multisender: String::new(),
            default_token: String::new(),
            gas_per_recipient: DEFAULT_GAS_PER_RECIPIENT,
        }
    }

    /// Build the configuration from the process environment (after `.env` has been loaded).
    ///
    /// Recognised variables:
    /// - `MULTISENDER_WALLET_URL` - wallet JSON-RPC endpoint
    /// - `MULTISENDER_CONTRACT` - prefilled multisender contract address
    /// - `MULTISENDER_TOKEN` - prefilled token contract address
    /// - `MULTISENDER_GAS_PER_RECIPIENT` - gas limit budget per recipient
    pub fn from_env() -> Self {
        let wallet_url =
            env::var("MULTISENDER_WALLET_URL").unwrap_or_else(|_| DEFAULT_WALLET_URL.to_string());

        let mut config = Self::new(wallet_url);
        config.default_multisender = env::var("MULTISENDER_CONTRACT").unwrap_or_default();
        config.default_token = env::var("MULTISENDER_TOKEN").unwrap_or_default();
        config.gas_per_recipient = env::var("MULTISENDER_GAS_PER_RECIPIENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|gas| *gas > 0)
            .unwrap_or(DEFAULT_GAS_PER_RECIPIENT);
        config
    }

    pub fn network_label(&self) -> &str {
        self.network.name
    }

    /// Gas-limit hint for a disperse to `recipient_count` recipients.
    pub fn disperse_gas_limit(&self, recipient_count: usize) -> u64 {
        self.gas_per_recipient.saturating_mul(recipient_count as u64)
    }

    pub fn wallet(&self) -> Result<Eip1193Wallet<Http>> {
        let url = Url::parse(&self.wallet_url)
            .map_err(|e| anyhow!("Invalid wallet URL '{}': {}", self.wallet_url, e))?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Eip1193Wallet::new(provider))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_URL.to_string())
    }
}
