//! Wallet session management: connecting, network enforcement and
//! invalidation when the wallet switches account or chain.

use crate::activity_log::ActivityLog;
use crate::config::NetworkProfile;
use crate::wallet::{Wallet, WalletError, WalletEvent};
use ethers::types::Address;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// An authorized connection to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSession {
    pub account: Address,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(WalletSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Correct,
    Wrong { chain_id: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("No wallet provider detected. Install a wallet and make sure it is running.")]
    NoWalletProvider,
    #[error("You rejected the connection request in your wallet.")]
    UserRejected,
    #[error("{0}")]
    ConnectionFailed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Wrong network (chain id {actual}). Please switch to {expected_name}.")]
    WrongNetwork {
        actual: u64,
        expected: u64,
        expected_name: &'static str,
    },
    #[error("User rejected the network switch request.")]
    SwitchRejected,
    #[error("Failed to switch network: {0}")]
    SwitchFailed(WalletError),
    #[error("Failed to add {name} to the wallet: {source}")]
    AddFailed {
        name: &'static str,
        source: WalletError,
    },
    #[error("Wallet session was lost during the network switch.")]
    SessionLost,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Wallet is not connected. Please connect your wallet first.")]
    NotConnected,
    #[error("Wallet account or network changed. Please reconnect.")]
    Invalidated,
    #[error("Failed to read wallet state: {0}")]
    Wallet(#[from] WalletError),
}

/// Compare a session's chain with the configured target chain.
pub fn ensure_network(session: &WalletSession, profile: &NetworkProfile) -> Result<(), NetworkError> {
    if session.chain_id == profile.chain_id {
        Ok(())
    } else {
        Err(NetworkError::WrongNetwork {
            actual: session.chain_id,
            expected: profile.chain_id,
            expected_name: profile.name,
        })
    }
}

/// Owns the single wallet session of the application.
pub struct SessionManager<W> {
    wallet: Arc<W>,
    profile: NetworkProfile,
    log: ActivityLog,
    state: Mutex<ConnectionState>,
}

impl<W: Wallet> SessionManager<W> {
    pub fn new(wallet: Arc<W>, profile: NetworkProfile, log: ActivityLog) -> Self {
        Self {
            wallet,
            profile,
            log,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> ConnectionState {
        *self.lock()
    }

    pub fn session(&self) -> Option<WalletSession> {
        match self.state() {
            ConnectionState::Connected(session) => Some(session),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn network_status(&self) -> Option<NetworkStatus> {
        self.session().map(|session| match ensure_network(&session, &self.profile) {
            Ok(()) => NetworkStatus::Correct,
            Err(_) => NetworkStatus::Wrong {
                chain_id: session.chain_id,
            },
        })
    }

    pub fn ensure_network(&self, session: &WalletSession) -> Result<(), NetworkError> {
        ensure_network(session, &self.profile)
    }

    /// Ask the wallet for account access and record the session.
    pub async fn connect(&self) -> Result<WalletSession, ConnectionError> {
        if !self.wallet.is_present().await {
            let err = ConnectionError::NoWalletProvider;
            self.log.error(format!("Connection Failed: {}", err));
            return Err(err);
        }

        self.log.info("Requesting wallet connection...");
        match self.open_session().await {
            Ok(session) => {
                *self.lock() = ConnectionState::Connected(session);
                tracing::info!(account = ?session.account, chain_id = session.chain_id, "wallet connected");
                self.log.info(format!("Successfully connected! Account: {:?}", session.account));
                self.report_network(&session);
                Ok(session)
            }
            Err(err) => {
                let message = match &err {
                    ConnectionError::ConnectionFailed(_) => format!(
                        "Connection Failed: {} Hint: is your wallet running and exposing its JSON-RPC endpoint (MULTISENDER_WALLET_URL)?",
                        err
                    ),
                    _ => format!("Connection Failed: {}", err),
                };
                self.log.error(message);
                Err(err)
            }
        }
    }

    async fn open_session(&self) -> Result<WalletSession, ConnectionError> {
        let accounts = self.wallet.request_accounts().await.map_err(|e| match e {
            WalletError::UserRejected => ConnectionError::UserRejected,
            other => ConnectionError::ConnectionFailed(other.to_string()),
        })?;
        let account = accounts.first().copied().ok_or_else(|| {
            ConnectionError::ConnectionFailed("Wallet returned no accounts.".to_string())
        })?;
        let chain_id = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;
        Ok(WalletSession { account, chain_id })
    }

    /// Reconnect silently if the wallet already authorized this app.
    pub async fn resume(&self) -> Option<WalletSession> {
        if !self.wallet.is_present().await {
            return None;
        }
        match self.wallet.accounts().await {
            Ok(accounts) if !accounts.is_empty() => self.connect().await.ok(),
            _ => None,
        }
    }

    fn report_network(&self, session: &WalletSession) {
        match self.ensure_network(session) {
            Ok(()) => self
                .log
                .info(format!("Correctly connected to {}.", self.profile.name)),
            Err(err) => self.log.error(err.to_string()),
        }
    }

    /// Ask the wallet to switch to the target chain, registering it first if
    /// the wallet does not know it.
    pub async fn switch_network(&self) -> Result<(), NetworkError> {
        match self.wallet.switch_chain(self.profile.chain_id).await {
            Ok(()) => {}
            Err(WalletError::UnrecognizedChain) => {
                tracing::info!(chain_id = self.profile.chain_id, "chain unknown to wallet, adding it");
                if let Err(source) = self.wallet.add_chain(&self.profile).await {
                    self.log
                        .error(format!("Failed to add {} to the wallet.", self.profile.name));
                    return Err(NetworkError::AddFailed {
                        name: self.profile.name,
                        source,
                    });
                }
            }
            Err(WalletError::UserRejected) => {
                let err = NetworkError::SwitchRejected;
                self.log.error(err.to_string());
                return Err(err);
            }
            Err(other) => {
                let err = NetworkError::SwitchFailed(other);
                self.log.error(err.to_string());
                return Err(err);
            }
        }

        let chain_id = match self.wallet.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                let err = NetworkError::SwitchFailed(e);
                self.log.error(err.to_string());
                return Err(err);
            }
        };

        let updated = {
            let mut state = self.lock();
            match &mut *state {
                ConnectionState::Connected(session) => {
                    session.chain_id = chain_id;
                    Some(*session)
                }
                ConnectionState::Disconnected => None,
            }
        };
        let session = match updated {
            Some(session) => session,
            // the chain change may already have dropped the session
            None => match self.reopen_after_switch(chain_id).await {
                Some(session) => session,
                None => {
                    self.log
                        .error("Network switched, but the wallet session was lost. Please reconnect.");
                    return Err(NetworkError::SessionLost);
                }
            },
        };
        self.report_network(&session);
        self.ensure_network(&session)
    }

    /// Rebuild the session from the already-authorized account, without prompting.
    async fn reopen_after_switch(&self, chain_id: u64) -> Option<WalletSession> {
        let account = self.wallet.accounts().await.ok()?.first().copied()?;
        let session = WalletSession { account, chain_id };
        *self.lock() = ConnectionState::Connected(session);
        tracing::info!(account = ?account, chain_id, "session restored after network switch");
        Some(session)
    }

    /// Apply a wallet notification. Any real change drops the session; the
    /// activity log is kept.
    pub fn handle_event(&self, event: WalletEvent) {
        let mut state = self.lock();
        let ConnectionState::Connected(session) = *state else {
            return;
        };

        let reason = match &event {
            WalletEvent::AccountsChanged(accounts) if accounts.first() != Some(&session.account) => {
                "Wallet account changed. Please reconnect."
            }
            WalletEvent::ChainChanged(chain_id) if *chain_id != session.chain_id => {
                "Wallet network changed. Please reconnect."
            }
            _ => return,
        };

        *state = ConnectionState::Disconnected;
        drop(state);
        tracing::info!(?event, "wallet session invalidated");
        self.log.error(reason);
    }

    /// Re-read the wallet's account and chain and make sure the session is
    /// still the one it was opened as.
    pub async fn verify(&self) -> Result<WalletSession, SessionError> {
        let session = self.session().ok_or(SessionError::NotConnected)?;

        let accounts = self.wallet.accounts().await?;
        self.handle_event(WalletEvent::AccountsChanged(accounts));
        let chain_id = self.wallet.chain_id().await?;
        self.handle_event(WalletEvent::ChainChanged(chain_id));

        match self.session() {
            Some(current) if current == session => Ok(current),
            _ => Err(SessionError::Invalidated),
        }
    }

    pub fn disconnect(&self) {
        *self.lock() = ConnectionState::Disconnected;
        self.log.info("Disconnected.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MONAD_TESTNET;
    use crate::wallet::mock::{account, MockWallet};

    fn manager(wallet: MockWallet) -> (SessionManager<MockWallet>, Arc<MockWallet>, ActivityLog) {
        let wallet = Arc::new(wallet);
        let log = ActivityLog::new();
        (
            SessionManager::new(wallet.clone(), MONAD_TESTNET, log.clone()),
            wallet,
            log,
        )
    }

    #[test]
    fn test_ensure_network_matches_target() {
        let session = WalletSession {
            account: account(1),
            chain_id: MONAD_TESTNET.chain_id,
        };
        assert_eq!(ensure_network(&session, &MONAD_TESTNET), Ok(()));
    }

    #[test]
    fn test_ensure_network_rejects_other_chains() {
        for chain_id in [1u64, 10, 137, 10142, 10144, 11155111] {
            let session = WalletSession {
                account: account(1),
                chain_id,
            };
            assert_eq!(
                ensure_network(&session, &MONAD_TESTNET),
                Err(NetworkError::WrongNetwork {
                    actual: chain_id,
                    expected: MONAD_TESTNET.chain_id,
                    expected_name: "Monad Testnet",
                })
            );
        }
    }

    #[tokio::test]
    async fn test_connect_records_session() {
        let (manager, _, log) = manager(MockWallet::new());
        let session = manager.connect().await.unwrap();

        assert_eq!(session.account, account(1));
        assert_eq!(session.chain_id, MONAD_TESTNET.chain_id);
        assert_eq!(manager.state(), ConnectionState::Connected(session));
        assert_eq!(manager.network_status(), Some(NetworkStatus::Correct));
        assert!(log.messages().iter().any(|m| m.starts_with("Successfully connected!")));
    }

    #[tokio::test]
    async fn test_connect_without_wallet() {
        let mut wallet = MockWallet::new();
        wallet.present = false;
        let (manager, _, log) = manager(wallet);

        assert_eq!(manager.connect().await, Err(ConnectionError::NoWalletProvider));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(log.entries()[0].is_error);
    }

    #[tokio::test]
    async fn test_connect_user_rejected() {
        let wallet = MockWallet::new();
        wallet.fail_request_accounts(WalletError::UserRejected);
        let (manager, _, log) = manager(wallet);

        assert_eq!(manager.connect().await, Err(ConnectionError::UserRejected));
        assert!(log
            .messages()
            .iter()
            .any(|m| m.contains("You rejected the connection request")));
    }

    #[tokio::test]
    async fn test_connect_failure_has_hint() {
        let wallet = MockWallet::new();
        wallet.fail_request_accounts(WalletError::Rpc {
            code: -32000,
            message: "locked".to_string(),
        });
        let (manager, _, log) = manager(wallet);

        assert!(matches!(
            manager.connect().await,
            Err(ConnectionError::ConnectionFailed(_))
        ));
        let last = log.entries().pop().unwrap();
        assert!(last.is_error);
        assert!(last.message.contains("Hint:"));
    }

    #[tokio::test]
    async fn test_connect_on_wrong_network_reports_it() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        let (manager, _, log) = manager(wallet);

        manager.connect().await.unwrap();
        assert_eq!(manager.network_status(), Some(NetworkStatus::Wrong { chain_id: 1 }));
        assert!(log.messages().iter().any(|m| m.contains("Wrong network")));
    }

    #[tokio::test]
    async fn test_resume_without_authorization_does_not_prompt() {
        let wallet = MockWallet::new();
        wallet.set_accounts(vec![]);
        let (manager, wallet, _) = manager(wallet);

        assert_eq!(manager.resume().await, None);
        assert!(!wallet.was_called("request_accounts"));
    }

    #[tokio::test]
    async fn test_resume_with_authorized_account() {
        let (manager, _, _) = manager(MockWallet::new());
        assert!(manager.resume().await.is_some());
        assert!(manager.session().is_some());
    }

    #[tokio::test]
    async fn test_switch_network_updates_session() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        let (manager, wallet, _) = manager(wallet);
        manager.connect().await.unwrap();

        manager.switch_network().await.unwrap();
        assert_eq!(manager.session().unwrap().chain_id, MONAD_TESTNET.chain_id);
        assert_eq!(manager.network_status(), Some(NetworkStatus::Correct));
        assert!(!wallet.was_called("add_chain"));
    }

    #[tokio::test]
    async fn test_switch_network_adds_unknown_chain() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        wallet.fail_switch(WalletError::UnrecognizedChain);
        let (manager, wallet, _) = manager(wallet);
        manager.connect().await.unwrap();

        manager.switch_network().await.unwrap();
        assert!(wallet.was_called("add_chain"));
        assert_eq!(manager.network_status(), Some(NetworkStatus::Correct));
    }

    #[tokio::test]
    async fn test_switch_network_rejected() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        wallet.fail_switch(WalletError::UserRejected);
        let (manager, wallet, log) = manager(wallet);
        manager.connect().await.unwrap();

        assert_eq!(manager.switch_network().await, Err(NetworkError::SwitchRejected));
        assert!(!wallet.was_called("add_chain"));
        assert_eq!(
            log.entries().pop().unwrap().message,
            "User rejected the network switch request."
        );
        assert_eq!(manager.session().unwrap().chain_id, 1);
    }

    #[tokio::test]
    async fn test_switch_network_add_fails() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        wallet.fail_switch(WalletError::UnrecognizedChain);
        wallet.fail_add(WalletError::UserRejected);
        let (manager, _, log) = manager(wallet);
        manager.connect().await.unwrap();

        assert!(matches!(
            manager.switch_network().await,
            Err(NetworkError::AddFailed { .. })
        ));
        assert_eq!(
            log.entries().pop().unwrap().message,
            "Failed to add Monad Testnet to the wallet."
        );
    }

    #[tokio::test]
    async fn test_switch_network_restores_session_dropped_mid_switch() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        let (manager, _, log) = manager(wallet);
        manager.connect().await.unwrap();

        // a wallet re-check saw the new chain first and dropped the session
        manager.handle_event(WalletEvent::ChainChanged(MONAD_TESTNET.chain_id));
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.switch_network().await.unwrap();
        let session = manager.session().unwrap();
        assert_eq!(session.account, account(1));
        assert_eq!(session.chain_id, MONAD_TESTNET.chain_id);
        assert_eq!(
            log.entries().pop().unwrap().message,
            "Correctly connected to Monad Testnet."
        );
    }

    #[tokio::test]
    async fn test_switch_network_reports_lost_session() {
        let wallet = MockWallet::new();
        wallet.set_chain_id(1);
        let (manager, wallet, log) = manager(wallet);
        manager.connect().await.unwrap();
        manager.handle_event(WalletEvent::ChainChanged(MONAD_TESTNET.chain_id));
        wallet.set_accounts(vec![]);

        assert_eq!(manager.switch_network().await, Err(NetworkError::SessionLost));
        assert!(manager.session().is_none());
        assert!(log.entries().pop().unwrap().is_error);
    }

    #[tokio::test]
    async fn test_account_change_invalidates_session_and_keeps_log() {
        let (manager, _, log) = manager(MockWallet::new());
        manager.connect().await.unwrap();
        let before = log.len();

        manager.handle_event(WalletEvent::AccountsChanged(vec![account(2)]));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(log.len(), before + 1);
    }

    #[tokio::test]
    async fn test_same_account_event_is_ignored() {
        let (manager, _, _) = manager(MockWallet::new());
        manager.connect().await.unwrap();

        manager.handle_event(WalletEvent::AccountsChanged(vec![account(1)]));
        manager.handle_event(WalletEvent::ChainChanged(MONAD_TESTNET.chain_id));
        assert!(manager.session().is_some());
    }

    #[tokio::test]
    async fn test_verify_detects_chain_change() {
        let (manager, wallet, _) = manager(MockWallet::new());
        manager.connect().await.unwrap();

        wallet.set_chain_id(1);
        assert_eq!(manager.verify().await, Err(SessionError::Invalidated));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_verify_requires_connection() {
        let (manager, _, _) = manager(MockWallet::new());
        assert_eq!(
            tokio_test::block_on(manager.verify()),
            Err(SessionError::NotConnected)
        );
    }

    #[test]
    fn test_disconnect() {
        let (manager, _, _) = manager(MockWallet::new());
        tokio_test::block_on(manager.connect()).unwrap();
        manager.disconnect();
        assert!(manager.session().is_none());
    }
}
