//! View modules for the GUI
//!
//! Each submodule adds rendering methods to `GuiApp`; they are called from
//! `App::update` in `app.rs`.
//!
//! - `connection` - connect button, account, network badge and wrong-network banner
//! - `transfer` - contract fields, recipient batch and the Approve / Send actions
//! - `activity` - the activity log panel

pub mod activity;
pub mod connection;
pub mod transfer;
