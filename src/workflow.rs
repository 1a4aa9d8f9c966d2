//! Approve-then-disperse workflow against the token and multisender contracts.
//!
//! Each operation runs its chain calls strictly one after another and reports
//! every step to the activity log. A failure aborts the remaining steps;
//! nothing is retried.

use crate::activity_log::{ActivityLog, LogLink};
use crate::config::Config;
use crate::contracts::{self, AbiError};
use crate::recipients::{parse_contract_address, parse_recipients, RecipientBatch, ValidationError};
use crate::session::{NetworkError, SessionError, SessionManager, WalletSession};
use crate::units::{self, UnitsError};
use crate::wallet::{Wallet, WalletError};
use ethers::types::{Address, TxHash, U256};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Approve,
    Disperse,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Approve => write!(f, "Approve"),
            Operation::Disperse => write!(f, "Disperse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Units(#[from] UnitsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error("{call}() call failed: {source}")]
    ContractCallFailed {
        call: &'static str,
        source: WalletError,
    },
    #[error("Allowance is not sufficient. Please run 'Approve' first.")]
    InsufficientAllowance { allowance: U256, required: U256 },
    #[error("{0}")]
    TransactionFailed(WalletError),
    #[error("{0} is already in progress.")]
    Busy(Operation),
}

/// Raw form input, captured fresh for every user action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub multisender: String,
    pub token: String,
    pub recipients: String,
}

/// Validated form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    pub multisender: Address,
    pub token: Address,
    pub batch: RecipientBatch,
}

impl TransferRequest {
    /// Contract fields are checked before the recipient list.
    pub fn validate(&self) -> Result<TransferBatch, ValidationError> {
        let multisender = parse_contract_address(&self.multisender)?;
        let token = parse_contract_address(&self.token)?;
        let batch = parse_recipients(&self.recipients)?;
        Ok(TransferBatch {
            multisender,
            token,
            batch,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveOutcome {
    pub tx_hash: TxHash,
    pub total: U256,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisperseOutcome {
    pub tx_hash: TxHash,
    pub total: U256,
    pub recipients: usize,
}

/// In-flight marker for one operation. Acquiring fails while a previous call
/// of the same operation has not finished.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

pub struct OperationGuard<'a>(&'a BusyFlag);

impl BusyFlag {
    pub fn try_acquire(&self) -> Option<OperationGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| OperationGuard(self))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.store(false, Ordering::Release);
    }
}

pub struct Controller<W> {
    wallet: Arc<W>,
    session: SessionManager<W>,
    config: Config,
    log: ActivityLog,
    approve_busy: BusyFlag,
    disperse_busy: BusyFlag,
}

impl<W: Wallet> Controller<W> {
    pub fn new(wallet: W, config: Config) -> Self {
        let wallet = Arc::new(wallet);
        let log = ActivityLog::new();
        let session = SessionManager::new(wallet.clone(), config.network.clone(), log.clone());
        Self {
            wallet,
            session,
            config,
            log,
            approve_busy: BusyFlag::default(),
            disperse_busy: BusyFlag::default(),
        }
    }

    pub fn session(&self) -> &SessionManager<W> {
        &self.session
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        match operation {
            Operation::Approve => self.approve_busy.is_busy(),
            Operation::Disperse => self.disperse_busy.is_busy(),
        }
    }

    /// Approve the multisender to spend the batch total of the token.
    pub async fn approve(&self, request: &TransferRequest) -> Result<ApproveOutcome, WorkflowError> {
        let Some(_guard) = self.approve_busy.try_acquire() else {
            return Err(WorkflowError::Busy(Operation::Approve));
        };

        let result = self.run_approve(request).await;
        if let Err(err) = &result {
            self.log.error(format!("Approval Error: {}", err));
        }
        result
    }

    /// Send the whole batch through the multisender in one transaction.
    pub async fn disperse(&self, request: &TransferRequest) -> Result<DisperseOutcome, WorkflowError> {
        let Some(_guard) = self.disperse_busy.try_acquire() else {
            return Err(WorkflowError::Busy(Operation::Disperse));
        };

        let result = self.run_disperse(request).await;
        if let Err(err) = &result {
            self.log.error(format!("Disperse Error: {}", err));
        }
        result
    }

    async fn run_approve(&self, request: &TransferRequest) -> Result<ApproveOutcome, WorkflowError> {
        let transfer = request.validate()?;
        let session = self.active_session().await?;

        let decimals = self.read_decimals(transfer.token).await?;
        let symbol = self.read_symbol(transfer.token).await?;
        let (_, total) = units::total_base_units(&transfer.batch.amounts(), decimals)?;

        self.log.info(format!(
            "Total: {} {}. Requesting approval...",
            units::format_base_units(total, decimals),
            symbol
        ));
        let data = contracts::encode_approve(transfer.multisender, total)?;
        let tx_hash = self
            .wallet
            .send_transaction(session.account, transfer.token, data, None)
            .await
            .map_err(WorkflowError::TransactionFailed)?;
        self.log
            .append_with_link("Approval transaction sent.", self.tx_link(tx_hash));

        self.wallet
            .wait_for_receipt(tx_hash)
            .await
            .map_err(WorkflowError::TransactionFailed)?;
        self.log.info("Approval transaction confirmed successfully!");
        info!(?tx_hash, %total, "approval confirmed");

        Ok(ApproveOutcome {
            tx_hash,
            total,
            symbol,
        })
    }

    async fn run_disperse(&self, request: &TransferRequest) -> Result<DisperseOutcome, WorkflowError> {
        let transfer = request.validate()?;
        let session = self.active_session().await?;

        let decimals = self.read_decimals(transfer.token).await?;
        let (amounts, total) = units::total_base_units(&transfer.batch.amounts(), decimals)?;

        self.log.info("Checking allowance...");
        let allowance = self
            .read_allowance(transfer.token, session.account, transfer.multisender)
            .await?;
        debug!(%allowance, %total, "allowance check");
        if allowance < total {
            return Err(WorkflowError::InsufficientAllowance {
                allowance,
                required: total,
            });
        }

        self.log.info("Allowance is sufficient. Dispersing tokens...");
        let recipients = transfer.batch.addresses();
        let gas_limit = self.config.disperse_gas_limit(recipients.len());
        let data = contracts::encode_disperse_token(transfer.token, &recipients, &amounts)?;
        let tx_hash = self
            .wallet
            .send_transaction(session.account, transfer.multisender, data, Some(gas_limit))
            .await
            .map_err(WorkflowError::TransactionFailed)?;
        self.log
            .append_with_link("Disperse transaction sent.", self.tx_link(tx_hash));

        self.wallet
            .wait_for_receipt(tx_hash)
            .await
            .map_err(WorkflowError::TransactionFailed)?;
        self.log
            .info("Disperse successful! Tokens have been sent.");
        info!(?tx_hash, recipients = recipients.len(), %total, "disperse confirmed");

        Ok(DisperseOutcome {
            tx_hash,
            total,
            recipients: recipients.len(),
        })
    }

    /// The connected session, re-checked against the wallet and the target network.
    async fn active_session(&self) -> Result<WalletSession, WorkflowError> {
        let session = self.session.verify().await?;
        self.session.ensure_network(&session)?;
        Ok(session)
    }

    async fn read_decimals(&self, token: Address) -> Result<u8, WorkflowError> {
        let output = self.contract_call("decimals", token, contracts::encode_decimals()?).await?;
        Ok(contracts::decode_decimals(&output)?)
    }

    async fn read_symbol(&self, token: Address) -> Result<String, WorkflowError> {
        let output = self.contract_call("symbol", token, contracts::encode_symbol()?).await?;
        Ok(contracts::decode_symbol(&output)?)
    }

    async fn read_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WorkflowError> {
        let data = contracts::encode_allowance(owner, spender)?;
        let output = self.contract_call("allowance", token, data).await?;
        Ok(contracts::decode_allowance(&output)?)
    }

    async fn contract_call(
        &self,
        call: &'static str,
        to: Address,
        data: ethers::types::Bytes,
    ) -> Result<ethers::types::Bytes, WorkflowError> {
        self.wallet
            .call(to, data)
            .await
            .map_err(|source| WorkflowError::ContractCallFailed { call, source })
    }

    fn tx_link(&self, tx_hash: TxHash) -> Option<LogLink> {
        self.config.network.tx_url(tx_hash).map(|url| LogLink {
            label: "View Transaction".to_string(),
            url,
        })
    }
}
