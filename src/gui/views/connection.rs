//! Wallet connection bar and wrong-network banner.

use crate::gui::app::GuiApp;
use crate::session::{ConnectionState, NetworkStatus};
use eframe::egui::{self, RichText};
use ethers::types::Address;
use ethers::utils::to_checksum;

/// `0xAb58…eC9B`
pub(crate) fn short_address(address: &Address) -> String {
    let full = to_checksum(address, None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

impl GuiApp {
    pub(crate) fn view_connection_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.heading(RichText::new("Monad Multisender").strong().color(self.theme.text_primary));
            ui.label(
                RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                    .size(12.0)
                    .color(self.theme.text_secondary),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(err) = &self.startup_error {
                    ui.colored_label(self.theme.error, format!("[XX] {}", err));
                    return;
                }

                match self.connection_state() {
                    ConnectionState::Disconnected => {
                        let label = if self.is_connecting() {
                            "Connecting..."
                        } else {
                            "Connect Wallet"
                        };
                        let button = self.theme.button_primary(label);
                        if ui.add_enabled(!self.is_connecting(), button).clicked() {
                            self.start_connect();
                        }
                        ui.label(
                            RichText::new(format!("Wallet: {}", self.config.wallet_url))
                                .small()
                                .color(self.theme.text_secondary),
                        );
                    }
                    ConnectionState::Connected(session) => {
                        if ui.add(self.theme.button_small("Disconnect")).clicked() {
                            self.disconnect();
                        }
                        let (badge, color) = match self.network_status() {
                            Some(NetworkStatus::Correct) => {
                                (self.config.network_label().to_string(), self.theme.success)
                            }
                            _ => (format!("Chain {}", session.chain_id), self.theme.warning),
                        };
                        ui.label(RichText::new(format!("● {}", badge)).color(color));
                        ui.label(RichText::new(short_address(&session.account)).monospace().strong())
                            .on_hover_text(to_checksum(&session.account, None));
                    }
                }
            });
        });
    }

    /// Shown while connected to any chain other than the target network.
    pub(crate) fn view_network_banner(&mut self, ui: &mut egui::Ui) {
        let Some(NetworkStatus::Wrong { chain_id }) = self.network_status() else {
            return;
        };

        egui::Frame::none()
            .fill(self.theme.surface)
            .stroke(egui::Stroke::new(2.0, self.theme.warning))
            .rounding(2.0)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        RichText::new(format!(
                            "[!!] Wrong network (chain id {}). Approve and Send are disabled until you switch to {}.",
                            chain_id,
                            self.config.network_label()
                        ))
                        .color(self.theme.warning),
                    );
                    let label = if self.is_switching() {
                        "Switching..."
                    } else {
                        "Switch Network"
                    };
                    let button = self.theme.button_warning(label);
                    if ui.add_enabled(!self.is_switching(), button).clicked() {
                        self.start_switch_network();
                    }
                });
            });
        ui.add_space(self.theme.spacing_md);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_address() {
        let address: Address = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B".parse().unwrap();
        assert_eq!(short_address(&address), "0xAb58…eC9B");
    }
}
