#![windows_subsystem = "windows"]

use anyhow::Result;
use monad_multisender::{config::Config, gui};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    tracing::info!(wallet_url = %config.wallet_url, network = config.network_label(), "starting");
    gui::launch(config)?;

    Ok(())
}
