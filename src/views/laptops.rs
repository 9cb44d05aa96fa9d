use crate::chat::client::{ChatReply, LaptopClient};
use crate::chat::selection::{best_value, format_pkr, COMPARISON_ROWS};
use crate::chat::session::{persist_session, ChatSession, ResumeState, Startup};
use crate::chat::{Laptop, Turn};
use crate::error::ClientResult;
use crate::session::store::SessionStore;
use crate::theme::Theme;
use crate::views::{composer, render_turn};
use eframe::egui::{self, RichText, ScrollArea};

pub struct LaptopView {
    session: ChatSession,
    client: LaptopClient,
    store: SessionStore,
    input_buffer: String,
}

impl LaptopView {
    pub fn new(client: LaptopClient, store: SessionStore) -> Self {
        let (session, startup) = ChatSession::start(store.load());
        if let Startup::Resume(session_id) = startup {
            tracing::info!(session_id = %session_id, "resuming chat session");
            client.resume(session_id);
        }
        Self {
            session,
            client,
            store,
            input_buffer: String::new(),
        }
    }

    fn send(&mut self, text: &str) {
        if let Some(request) = self.session.begin_send(text) {
            self.client.send(request);
            self.input_buffer.clear();
        }
    }

    pub fn on_reply(&mut self, result: ClientResult<ChatReply>) {
        if let Some(session_id) = self.session.finish_send(result) {
            persist_session(&self.store, &session_id);
        }
    }

    pub fn on_history(&mut self, result: ClientResult<Vec<Turn>>) {
        self.session.apply_history(result);
    }

    pub fn show(&mut self, ctx: &egui::Context, theme: &Theme) {
        self.show_comparison(ctx, theme);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Laptop Finder Pakistan");
            ui.label(
                RichText::new("AI-powered recommendations for Pakistani students")
                    .color(theme.text_muted),
            );
            ui.separator();

            let scroll_to_bottom = self.session.log_mut().take_scroll_request();
            let transcript_height = (ui.available_height() - 150.0).max(120.0);
            let mut toggled: Option<Laptop> = None;
            ScrollArea::vertical()
                .id_salt("laptop_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    match (self.session.resume_state(), self.session.session_id()) {
                        (ResumeState::Loading, Some(session_id)) => {
                            ui.label(
                                RichText::new(format!("Loading conversation {session_id}..."))
                                    .italics()
                                    .color(theme.text_muted),
                            );
                        }
                        (ResumeState::Failed, _) if self.session.log().is_empty() => {
                            ui.label(
                                RichText::new("Could not load the previous conversation.")
                                    .italics()
                                    .color(theme.danger),
                            );
                        }
                        _ => {}
                    }
                    for turn in self.session.log().turns() {
                        render_turn(ui, theme, turn);
                        for laptop in turn.recommendations() {
                            let selected = self.session.selection().contains(laptop.id);
                            if laptop_card(ui, theme, laptop, selected) {
                                toggled = Some(laptop.clone());
                            }
                        }
                    }
                    if self.session.is_in_flight() {
                        ui.label(RichText::new("Thinking...").italics().color(theme.text_muted));
                    }
                    if scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            if let Some(laptop) = toggled {
                self.session.selection_mut().toggle(&laptop);
            }

            let mut quick_reply: Option<&'static str> = None;
            if self.session.show_quick_replies() {
                ui.horizontal_wrapped(|ui| {
                    for (label, message) in self.session.quick_replies() {
                        if ui.button(*label).clicked() {
                            quick_reply = Some(*message);
                        }
                    }
                });
            }
            if let Some(message) = quick_reply {
                self.send(message);
            }

            self.show_selection_bar(ui, theme);

            ui.separator();
            let hint = if self.session.is_in_flight() {
                "Waiting for response..."
            } else if self.session.resume_state() == ResumeState::Loading {
                "Loading conversation..."
            } else {
                "Ask about laptops, budget, or where to buy..."
            };
            let enabled = self.session.can_send();
            if let Some(text) = composer(ui, &mut self.input_buffer, enabled, hint) {
                self.send(&text);
            }
        });
    }

    fn show_selection_bar(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        if self.session.selection().is_empty() {
            return;
        }
        let mut clear = false;
        let mut compare = false;
        ui.horizontal(|ui| {
            let count = self.session.selection().len();
            let plural = if count > 1 { "s" } else { "" };
            ui.label(RichText::new(format!("{count} laptop{plural} selected")).color(theme.selected_stroke));
            for laptop in self.session.selection().items() {
                ui.label(RichText::new(laptop.brand.as_str()).small());
            }
            clear = ui.button("Clear").clicked();
            if self.session.selection().can_compare() {
                compare = ui.button("Compare").clicked();
            }
        });
        if clear {
            self.session.selection_mut().clear();
        } else if compare {
            self.session.selection_mut().open_comparison();
        }
    }

    fn show_comparison(&mut self, ctx: &egui::Context, theme: &Theme) {
        if !self.session.selection().is_comparison_open() {
            return;
        }

        let mut close = false;
        egui::Window::new("Laptop Comparison")
            .collapsible(false)
            .default_width(760.0)
            .show(ctx, |ui| {
                let laptops = self.session.selection().items();
                egui::Grid::new("comparison_grid")
                    .striped(true)
                    .min_col_width(140.0)
                    .show(ui, |ui| {
                        ui.label("");
                        for laptop in laptops {
                            ui.vertical(|ui| {
                                ui.strong(laptop.brand.as_str());
                                ui.label(laptop.display_model());
                            });
                        }
                        ui.end_row();

                        for row in COMPARISON_ROWS.iter() {
                            ui.strong(row.label);
                            for laptop in laptops {
                                ui.label((row.value)(laptop));
                            }
                            ui.end_row();
                        }

                        ui.strong("Best For");
                        for laptop in laptops {
                            ui.label(laptop.category.as_str());
                        }
                        ui.end_row();

                        ui.label("");
                        for laptop in laptops {
                            match &laptop.url {
                                Some(url) => {
                                    ui.hyperlink_to("View Details", url);
                                }
                                None => {
                                    ui.label("");
                                }
                            }
                        }
                        ui.end_row();
                    });

                ui.separator();
                if let Some(best) = best_value(laptops) {
                    ui.label(RichText::new("Best Value").strong().color(theme.warning));
                    ui.label(format!(
                        "{} offers the lowest price at {}",
                        best.brand,
                        format_pkr(best.price)
                    ));
                }
                close = ui.button("Close").clicked();
            });

        if close {
            self.session.selection_mut().clear();
        }
    }
}

/// Draws one recommendation. Returns true when its compare toggle was clicked.
fn laptop_card(ui: &mut egui::Ui, theme: &Theme, laptop: &Laptop, selected: bool) -> bool {
    let mut clicked = false;
    theme.card_frame(selected).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.strong(laptop.name.as_str());
            ui.label(RichText::new(laptop.category.as_str()).small().color(theme.text_muted));
        });
        ui.label(format!(
            "{} · {} · {} · {}",
            laptop.processor, laptop.ram, laptop.storage, laptop.graphics
        ));
        ui.label(laptop.display.as_str());
        ui.horizontal(|ui| {
            ui.label(RichText::new(format_pkr(laptop.price)).strong().color(theme.success));
            if let Some(url) = &laptop.url {
                ui.hyperlink_to("View Details", url);
            }
            let label = if selected { "Selected" } else { "Compare" };
            clicked = ui.selectable_label(selected, label).clicked();
        });
    });
    clicked
}
