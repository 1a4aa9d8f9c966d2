//! GUI for the multisender
//!
//! Built with egui/eframe. Wallet and workflow calls run as background jobs
//! (`async_job`) so the frame loop never blocks on the wallet or the chain.
//!
//! ## Module Structure
//!
//! - `app` - GuiApp state, job spawning and polling, the frame loop and `launch`
//! - `async_job` - polling of background task results
//! - `theme` - colors, spacing and styled widget factories (AppTheme)
//! - `views` - rendering of the connection bar, transfer form and activity log
//!
//! ## Usage
//!
//! ```no_run
//! use monad_multisender::config::Config;
//! use monad_multisender::gui;
//!
//! gui::launch(Config::from_env()).expect("Failed to launch GUI");
//! ```

mod app;
pub mod async_job;
pub mod theme;
pub mod views;

pub use app::{launch, GuiApp};
pub use async_job::AsyncJob;
pub use theme::{configure_style, AppTheme};
