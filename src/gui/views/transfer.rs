//! Transfer form: contract addresses, recipient batch and the two actions.

use crate::gui::app::GuiApp;
use crate::recipients::parse_recipients;
use crate::session::{ConnectionState, NetworkStatus};
use crate::workflow::Operation;
use eframe::egui::{self, RichText};
use ethers::utils::to_checksum;

const PREVIEW_ROWS: usize = 10;

/// Approve and Send need a live session on the target network.
pub(crate) fn actions_enabled(
    has_controller: bool,
    state: ConnectionState,
    network: Option<NetworkStatus>,
) -> bool {
    has_controller
        && matches!(state, ConnectionState::Connected(_))
        && network == Some(NetworkStatus::Correct)
}

impl GuiApp {
    pub(crate) fn view_transfer_form(&mut self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(self.theme.section_header_text("[$]", "DISPERSE TOKENS"))
                .size(16.0)
                .strong(),
        );
        ui.add_space(self.theme.spacing_sm);

        self.render_contract_fields(ui);
        ui.add_space(self.theme.spacing_md);
        self.render_recipients_input(ui);
        self.render_recipients_preview(ui);
        ui.add_space(self.theme.spacing_md);
        self.render_actions(ui);
    }

    fn render_contract_fields(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("contract_fields")
            .num_columns(2)
            .spacing([self.theme.spacing_md, self.theme.spacing_sm])
            .show(ui, |ui| {
                ui.label("Multisender contract:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.multisender)
                        .hint_text("0x...")
                        .desired_width(420.0)
                        .font(egui::TextStyle::Monospace),
                );
                ui.end_row();

                ui.label("Token contract:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.token)
                        .hint_text("0x...")
                        .desired_width(420.0)
                        .font(egui::TextStyle::Monospace),
                );
                ui.end_row();
            });
    }

    fn render_recipients_input(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Recipients and Amounts:").strong());
        ui.add_space(self.theme.spacing_xs);

        self.theme.frame_panel().show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut self.form.recipients)
                    .desired_rows(8)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace)
                    .hint_text("One recipient per line:\naddress,amount\n\n0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B,10"),
            );
        });

        ui.add_space(self.theme.spacing_xs);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Format: address,amount per line (amounts in whole tokens)").italics().size(11.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(self.theme.button_small("📄 Load File")).clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Recipient lists", &["txt", "csv"])
                        .pick_file()
                    {
                        self.file_error = self.load_recipients_file(&path).err().map(|e| e.to_string());
                    }
                }
                if ui.add(self.theme.button_small("Fill Example")).clicked() {
                    let log = self.controller.as_ref().map(|c| c.log());
                    self.form.fill_example(log);
                    self.file_error = None;
                }
            });
        });

        if let Some(err) = &self.file_error {
            ui.colored_label(self.theme.error, format!("[XX] {}", err));
        }
    }

    fn render_recipients_preview(&self, ui: &mut egui::Ui) {
        if self.form.recipients.trim().is_empty() {
            return;
        }

        ui.add_space(self.theme.spacing_sm);
        match parse_recipients(&self.form.recipients) {
            Ok(batch) => {
                ui.colored_label(
                    self.theme.success,
                    format!("[OK] {} recipient(s)", batch.len()),
                );
                egui::ScrollArea::vertical()
                    .id_source("recipients_preview")
                    .max_height(120.0)
                    .show(ui, |ui| {
                        for (i, entry) in batch.entries().iter().enumerate() {
                            if i >= PREVIEW_ROWS {
                                ui.label(format!("... and {} more", batch.len() - PREVIEW_ROWS));
                                break;
                            }
                            ui.monospace(format!(
                                "{}. {} → {}",
                                i + 1,
                                to_checksum(&entry.address, None),
                                entry.amount
                            ));
                        }
                    });
            }
            Err(e) => {
                ui.colored_label(self.theme.error, format!("[XX] {}", e));
            }
        }
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        let usable = actions_enabled(
            self.controller.is_some(),
            self.connection_state(),
            self.network_status(),
        );

        ui.horizontal(|ui| {
            let approving = self.is_busy(Operation::Approve);
            let label = if approving { "Approving..." } else { "1. Approve" };
            let button = self.theme.button_primary(label);
            if ui
                .add_enabled(usable && !approving, button)
                .on_hover_text("Allow the multisender to spend the batch total")
                .clicked()
            {
                self.start_approve();
            }

            ui.add_space(self.theme.spacing_sm);

            let dispersing = self.is_busy(Operation::Disperse);
            let label = if dispersing { "Sending..." } else { "2. Send" };
            let button = self.theme.button_success(label);
            if ui
                .add_enabled(usable && !dispersing, button)
                .on_hover_text("Disperse the token to every recipient in one transaction")
                .clicked()
            {
                self.start_disperse();
            }

            if approving || dispersing {
                ui.spinner();
                ui.label(RichText::new("Waiting for the wallet and the network...").color(self.theme.text_secondary));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::WalletSession;
    use ethers::types::Address;

    fn connected(chain_id: u64) -> ConnectionState {
        ConnectionState::Connected(WalletSession {
            account: Address::repeat_byte(1),
            chain_id,
        })
    }

    #[test]
    fn test_actions_disabled_while_disconnected() {
        assert!(!actions_enabled(true, ConnectionState::Disconnected, None));
    }

    #[test]
    fn test_actions_disabled_on_wrong_network() {
        assert!(!actions_enabled(
            true,
            connected(1),
            Some(NetworkStatus::Wrong { chain_id: 1 })
        ));
    }

    #[test]
    fn test_actions_enabled_on_target_network() {
        assert!(actions_enabled(true, connected(10143), Some(NetworkStatus::Correct)));
        assert!(!actions_enabled(false, connected(10143), Some(NetworkStatus::Correct)));
    }
}
