use eframe::egui;

use crate::common::ConnectionState;

#[derive(Debug, Default)]
pub struct StatusActions {
    pub reconnect: bool,
    pub leave: bool,
}

pub fn render(ui: &mut egui::Ui, username: &str, state: ConnectionState) -> StatusActions {
    let mut actions = StatusActions::default();

    ui.horizontal(|ui| {
        ui.heading(format!("Chat Room - {username}"));

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Leave").clicked() {
                actions.leave = true;
            }
            if state == ConnectionState::Disconnected && ui.button("Reconnect").clicked() {
                actions.reconnect = true;
            }

            let color = match state {
                ConnectionState::Connected => egui::Color32::GREEN,
                ConnectionState::Connecting => egui::Color32::YELLOW,
                ConnectionState::Disconnected => egui::Color32::RED,
            };
            ui.label(state.label());
            ui.colored_label(color, "●");
        });
    });

    actions
}
