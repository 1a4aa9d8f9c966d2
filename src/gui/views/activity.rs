//! Activity log panel.

use crate::activity_log::LogEntry;
use crate::gui::app::GuiApp;
use eframe::egui::{self, RichText};

impl GuiApp {
    pub(crate) fn view_activity_log(&mut self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing_xs);
        ui.label(
            RichText::new(self.theme.section_header_text("[>]", "ACTIVITY LOG"))
                .strong(),
        );
        ui.add_space(self.theme.spacing_xs);

        let entries = self
            .controller
            .as_ref()
            .map(|c| c.log().entries())
            .unwrap_or_default();
        let scroll_to_bottom = entries.len() != self.seen_log_len;
        self.seen_log_len = entries.len();

        self.theme.frame_surface().show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("activity_log_scroll")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    for entry in &entries {
                        self.render_log_entry(ui, entry);
                    }
                    if scroll_to_bottom {
                        let bottom = ui.label("");
                        bottom.scroll_to_me(Some(egui::Align::BOTTOM));
                    }
                });
        });
    }

    fn render_log_entry(&self, ui: &mut egui::Ui, entry: &LogEntry) {
        let color = if entry.is_error {
            self.theme.error
        } else {
            self.theme.text_primary
        };
        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new(format!("[{}]", entry.time_label()))
                    .monospace()
                    .color(self.theme.text_secondary),
            );
            ui.label(RichText::new(&entry.message).monospace().color(color));
            if let Some(link) = &entry.link {
                if ui.link(&link.label).on_hover_text(&link.url).clicked() {
                    if let Err(e) = open::that(&link.url) {
                        tracing::warn!("Failed to open {}: {}", link.url, e);
                    }
                }
            }
        });
    }
}
