use eframe::egui;

/// Returns `true` when the user asked to send; clearing the draft is the send path's job.
pub fn render(ui: &mut egui::Ui, draft: &mut String, enabled: bool) -> bool {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(draft)
                .hint_text("Type a message...")
                .desired_width(ui.available_width() - 64.0),
        );
        if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    send
}
