use eframe::egui;

use crate::ui::state::LoginState;

/// Returns `true` when the user submitted the form.
pub fn render(ui: &mut egui::Ui, state: &mut LoginState) -> bool {
    let pending = state.is_pending();
    let mut submit = false;

    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("Chat App");
        ui.add_space(16.0);

        ui.label("Username");
        let response = ui.add_enabled(
            !pending,
            egui::TextEdit::singleline(&mut state.username_input).hint_text("Enter a username"),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }

        if let Some(error) = &state.error {
            ui.colored_label(egui::Color32::RED, error);
        }

        ui.add_space(8.0);
        if ui
            .add_enabled(!pending, egui::Button::new("Enter chat room"))
            .clicked()
        {
            submit = true;
        }
        if pending {
            ui.spinner();
        }
    });

    submit && !pending
}
