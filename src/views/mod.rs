use crate::chat::{Role, Turn};
use crate::theme::Theme;
use eframe::egui::{self, Layout, RichText};

pub mod admissions;
pub mod laptops;

fn clock_label(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|parsed| parsed.format("%H:%M").to_string())
        })
        .unwrap_or_default()
}

pub fn render_turn(ui: &mut egui::Ui, theme: &Theme, turn: &Turn) {
    let layout = match turn.role {
        Role::User => Layout::right_to_left(egui::Align::TOP),
        Role::Assistant => Layout::left_to_right(egui::Align::TOP),
    };
    ui.with_layout(layout, |ui| {
        theme.bubble_frame(turn.role).show(ui, |ui| {
            ui.set_max_width(560.0);
            ui.vertical(|ui| {
                ui.label(turn.content.as_str());
                let clock = clock_label(&turn.timestamp);
                if !clock.is_empty() {
                    ui.label(RichText::new(clock).small().color(theme.text_muted));
                }
            });
        });
    });
}

/// Single-line composer. Returns the text to send when the user submits.
pub fn composer(ui: &mut egui::Ui, buffer: &mut String, enabled: bool, hint: &str) -> Option<String> {
    let mut send_now = false;
    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(buffer)
                .desired_width(ui.available_width() - 80.0)
                .hint_text(hint),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send_now = true;
        }
        send_now |= ui
            .add_enabled(enabled && !buffer.trim().is_empty(), egui::Button::new("Send"))
            .clicked();
    });

    if send_now && enabled && !buffer.trim().is_empty() {
        Some(buffer.trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::clock_label;

    #[test]
    fn clock_label_accepts_naive_server_timestamps() {
        assert_eq!(clock_label("2024-05-01T10:42:13.123456"), "10:42");
        assert_eq!(clock_label("not a time"), "");
    }
}
