use crate::event::AppEvent;
use crate::theme::Theme;
use crate::views::admissions::AdmissionsView;
use crate::views::laptops::LaptopView;
use eframe::egui::{self, RichText};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

const EVENT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Surface {
    Laptops,
    Admissions,
}

impl Surface {
    fn label(self) -> &'static str {
        match self {
            Self::Laptops => "Laptop Finder",
            Self::Admissions => "Admissions Desk",
        }
    }
}

pub struct StudentDeskApp {
    rx: Receiver<AppEvent>,
    theme: Theme,
    theme_applied: bool,
    surface: Surface,
    laptops: LaptopView,
    admissions: AdmissionsView,
    channel_closed: bool,
}

impl StudentDeskApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        surface: Surface,
        laptops: LaptopView,
        admissions: AdmissionsView,
    ) -> Self {
        Self {
            rx,
            theme: Theme::default(),
            theme_applied: false,
            surface,
            laptops,
            admissions,
            channel_closed: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.channel_closed {
                        tracing::warn!("event channel disconnected");
                        self.channel_closed = true;
                    }
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatReply(result) => self.laptops.on_reply(result),
            AppEvent::ChatHistory(result) => self.laptops.on_history(result),
            AppEvent::JobSubmitted(result) => self.admissions.on_job_submitted(result),
            AppEvent::JobsRefreshed(snapshot) => {
                tracing::debug!("jobs refreshed");
                self.admissions.on_jobs(snapshot);
            }
            AppEvent::ApplicationValidated(result) => self.admissions.on_validation(result),
            AppEvent::PoliciesLoaded(result) => self.admissions.on_policies(result),
            AppEvent::PolicySearchFinished { query, result } => {
                self.admissions.on_search(&query, result)
            }
            AppEvent::DownloadFinished { link, result } => {
                self.admissions.on_download(&link, result)
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("StudentDesk");
                ui.separator();
                for surface in [Surface::Laptops, Surface::Admissions] {
                    ui.selectable_value(&mut self.surface, surface, surface.label());
                }
                if self.channel_closed {
                    ui.separator();
                    ui.label(RichText::new("Background tasks stopped").color(self.theme.danger));
                }
            });
        });
    }
}

impl eframe::App for StudentDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            self.theme.apply_visuals(ctx);
            self.theme_applied = true;
        }

        self.drain_events(ctx);
        self.render_top_bar(ctx);
        match self.surface {
            Surface::Laptops => self.laptops.show(ctx, &self.theme),
            Surface::Admissions => self.admissions.show(ctx, &self.theme),
        }
        // Background results arrive without input events.
        ctx.request_repaint_after(EVENT_POLL);
    }
}
