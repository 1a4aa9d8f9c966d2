//! Monad Multisender
//!
//! Desktop front-end that approves an ERC20 allowance and disperses the token to
//! many recipients in one `disperseToken` call, signing through the user's wallet.

pub mod activity_log;
pub mod config;
pub mod contracts;
pub mod gui;
pub mod recipients;
pub mod session;
pub mod units;
pub mod wallet;
pub mod workflow;
