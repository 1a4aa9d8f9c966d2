//! Wallet provider interface.
//!
//! The wallet holds the keys, signs and broadcasts. The app only talks to it
//! through the EIP-1193 style JSON-RPC methods below, so any wallet exposing
//! them over HTTP (e.g. Frame at `http://127.0.0.1:1248`) can be used.

#![allow(async_fn_in_trait)]

use crate::config::NetworkProfile;
use ethers::prelude::*;
use ethers::providers::RpcError;
use ethers::types::transaction::eip2718::TypedTransaction;
use serde_json::json;
use thiserror::Error;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326: `wallet_switchEthereumChain` for a chain the wallet does not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Request rejected in the wallet")]
    UserRejected,
    #[error("Chain is not known to the wallet")]
    UnrecognizedChain,
    #[error("{message} (code {code})")]
    Rpc { code: i64, message: String },
    #[error("Wallet unreachable: {0}")]
    Transport(String),
    #[error("Transaction {0:?} reverted")]
    Reverted(TxHash),
    #[error("Transaction {0:?} was dropped before confirmation")]
    Dropped(TxHash),
}

impl WalletError {
    /// Build the error for a JSON-RPC error response, mapping well-known codes.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => WalletError::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => WalletError::UnrecognizedChain,
            code => WalletError::Rpc {
                code,
                message: message.into(),
            },
        }
    }

    /// Whether the wallet itself answered (as opposed to a transport failure)
    pub fn is_response(&self) -> bool {
        !matches!(self, WalletError::Transport(_))
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match RpcError::as_error_response(&err) {
            Some(response) => WalletError::from_code(response.code, response.message.clone()),
            None => WalletError::Transport(err.to_string()),
        }
    }
}

/// Notifications a wallet may push about the connected session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Requests the app makes to the wallet. Calls may suspend while the user
/// approves them in the wallet UI.
pub trait Wallet: Send + Sync {
    /// Whether a wallet answers at all
    async fn is_present(&self) -> bool;

    /// `eth_requestAccounts`: prompts the user to authorize the app
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// `eth_accounts`: already-authorized accounts, never prompts
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    async fn add_chain(&self, profile: &NetworkProfile) -> Result<(), WalletError>;

    /// Read-only `eth_call`
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;

    /// Ask the wallet to sign and broadcast; resolves once the hash is known.
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        gas_limit: Option<u64>,
    ) -> Result<TxHash, WalletError>;

    /// Wait until the transaction is mined. No timeout.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, WalletError>;
}

/// Wallet reached through an `ethers` JSON-RPC client.
#[derive(Debug, Clone)]
pub struct Eip1193Wallet<P> {
    provider: Provider<P>,
}

impl<P: JsonRpcClient> Eip1193Wallet<P> {
    pub fn new(provider: Provider<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }
}

impl<P: JsonRpcClient> Wallet for Eip1193Wallet<P> {
    async fn is_present(&self) -> bool {
        match self.provider.get_chainid().await {
            Ok(_) => true,
            Err(e) => WalletError::from(e).is_response(),
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self
            .provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await?)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.provider.get_chainid().await?.as_u64())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let params = [json!({ "chainId": format!("{:#x}", chain_id) })];
        self.provider
            .request::<_, serde_json::Value>("wallet_switchEthereumChain", params)
            .await?;
        Ok(())
    }

    async fn add_chain(&self, profile: &NetworkProfile) -> Result<(), WalletError> {
        let params = [profile.add_chain_params()];
        self.provider
            .request::<_, serde_json::Value>("wallet_addEthereumChain", params)
            .await?;
        Ok(())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        Ok(self.provider.call(&tx, None).await?)
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        gas_limit: Option<u64>,
    ) -> Result<TxHash, WalletError> {
        let mut tx = TransactionRequest::new().from(from).to(to).data(data);
        if let Some(gas) = gas_limit {
            tx = tx.gas(gas);
        }
        let pending = self.provider.send_transaction(tx, None).await?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, WalletError> {
        let receipt = PendingTransaction::new(tx_hash, &self.provider)
            .await?
            .ok_or(WalletError::Dropped(tx_hash))?;
        if receipt.status == Some(U64::from(1u64)) {
            Ok(receipt)
        } else {
            Err(WalletError::Reverted(tx_hash))
        }
    }
}
