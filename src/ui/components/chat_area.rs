use eframe::egui;

use crate::common::{Identity, Message};

const OWN_BUBBLE: egui::Color32 = egui::Color32::from_rgb(134, 239, 172);

pub fn render(ui: &mut egui::Ui, messages: &[Message], identity: &Identity) {
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.weak("No messages yet");
                return;
            }

            // Ids repeat if the server redelivers, so the row index keeps egui ids unique.
            for (row, message) in messages.iter().enumerate() {
                ui.push_id((message.id, row), |ui| bubble(ui, message, identity));
                ui.add_space(6.0);
            }
        });
}

fn bubble(ui: &mut egui::Ui, message: &Message, identity: &Identity) {
    let own = message.is_from(identity);
    let layout = if own {
        egui::Layout::right_to_left(egui::Align::TOP)
    } else {
        egui::Layout::left_to_right(egui::Align::TOP)
    };
    let fill = if own {
        OWN_BUBBLE
    } else {
        ui.visuals().extreme_bg_color
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
            ui.set_max_width(360.0);
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(&message.username).strong().small());
                ui.label(&message.message);
                ui.label(egui::RichText::new(message.display_timestamp()).small().weak());
            });
        });
    });
}
