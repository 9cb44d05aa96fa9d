use crate::admissions::client::AdmissionsClient;
use crate::admissions::desk::{AdmissionsDesk, ApplyStep, FORM_INCOMPLETE};
use crate::admissions::{
    ellipsize, ApplyForm, Command, DocFormat, DocumentForm, FormIncomplete, LoginForm,
    PolicyCatalog, PolicySearchResults, PresentationForm, RegisterForm, ValidationReport,
};
use crate::error::ClientResult;
use crate::jobs::poller::JobPoller;
use crate::jobs::tracker::DownloadLink;
use crate::jobs::{short_id, JobsSnapshot, RECENT_JOBS_LIMIT};
use crate::theme::Theme;
use crate::views::{composer, render_turn};
use eframe::egui::{self, RichText, ScrollArea};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialog {
    Login,
    Register,
    Apply,
    Document,
    Presentation,
}

impl Dialog {
    fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Apply => "Apply for Admission",
            Self::Document => "Create Document",
            Self::Presentation => "Create Presentation",
        }
    }
}

#[derive(Default)]
struct Forms {
    login: LoginForm,
    register: RegisterForm,
    apply: ApplyForm,
    document: DocumentForm,
    presentation: PresentationForm,
}

pub struct AdmissionsView {
    desk: AdmissionsDesk,
    client: AdmissionsClient,
    // Dropping the view stops polling.
    _poller: JobPoller,
    forms: Forms,
    dialog: Option<Dialog>,
    form_notice: Option<&'static str>,
    input_buffer: String,
    search_buffer: String,
    download_dir: PathBuf,
}

impl AdmissionsView {
    pub fn new(client: AdmissionsClient, poller: JobPoller, download_dir: PathBuf) -> Self {
        Self {
            desk: AdmissionsDesk::default(),
            client,
            _poller: poller,
            forms: Forms::default(),
            dialog: None,
            form_notice: None,
            input_buffer: String::new(),
            search_buffer: String::new(),
            download_dir,
        }
    }

    pub fn on_job_submitted(&mut self, result: ClientResult<String>) {
        self.desk.job_submitted(result);
    }

    pub fn on_jobs(&mut self, snapshot: JobsSnapshot) {
        self.desk.jobs_refreshed(snapshot);
    }

    pub fn on_validation(&mut self, result: ClientResult<ValidationReport>) {
        if let Some(command) = self.desk.validation_finished(result) {
            self.client.submit(command);
        }
    }

    pub fn on_policies(&mut self, result: ClientResult<PolicyCatalog>) {
        self.desk.policies_loaded(result);
    }

    pub fn on_search(&mut self, query: &str, result: ClientResult<PolicySearchResults>) {
        self.desk.search_finished(query, result);
    }

    pub fn on_download(&mut self, link: &DownloadLink, result: ClientResult<PathBuf>) {
        self.desk.download_finished(link, result);
    }

    pub fn show(&mut self, ctx: &egui::Context, theme: &Theme) {
        self.show_sidebar(ctx, theme);
        self.show_dialog(ctx);
        self.show_validation_prompt(ctx, theme);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Admissions Assistant");
                ui.separator();
                ui.label(RichText::new(self.desk.status_text()).color(theme.text_muted));
                if self.desk.is_validating() {
                    ui.spinner();
                    ui.label(RichText::new("Validating application...").small());
                }
            });
            ui.separator();

            let scroll_to_bottom = self.desk.log_mut().take_scroll_request();
            let transcript_height = (ui.available_height() - 110.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("admissions_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for turn in self.desk.log().turns() {
                        render_turn(ui, theme, turn);
                    }
                    if scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });

            let mut requested: Option<DownloadLink> = None;
            if !self.desk.downloads().is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for link in self.desk.downloads() {
                        if ui.button(format!("Download {}", link.filename)).clicked() {
                            requested = Some(link.clone());
                        }
                    }
                });
            }
            if let Some(link) = requested {
                self.client.download(link, self.download_dir.clone());
            }

            ui.separator();
            if let Some(text) = composer(ui, &mut self.input_buffer, true, "Type a message...") {
                self.desk.free_text(&text);
                self.input_buffer.clear();
            }
        });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context, theme: &Theme) {
        egui::SidePanel::left("admissions_actions")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Actions");
                if ui.button("Home").clicked() {
                    self.desk.show_welcome_back();
                }
                for dialog in [
                    Dialog::Login,
                    Dialog::Register,
                    Dialog::Apply,
                    Dialog::Document,
                    Dialog::Presentation,
                ] {
                    if ui.button(dialog.title()).clicked() {
                        self.dialog = Some(dialog);
                        self.form_notice = None;
                    }
                }
                if ui.button("University Policies").clicked() {
                    self.desk.request_policies();
                    self.client.load_policies();
                }

                ui.separator();
                ui.strong("Search Policies");
                let response = ui.text_edit_singleline(&mut self.search_buffer);
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if submitted || ui.button("Search").clicked() {
                    if let Some(query) = self.desk.request_search(&self.search_buffer) {
                        self.client.search_policies(query);
                        self.search_buffer.clear();
                    }
                }

                ui.separator();
                ui.strong("Recent Jobs");
                if self.desk.jobs().is_empty() {
                    ui.label(RichText::new("No active jobs").color(theme.text_muted));
                }
                let tracked = self.desk.tracked_job().map(str::to_owned);
                for (job_id, job) in self.desk.jobs().recent(RECENT_JOBS_LIMIT) {
                    ui.horizontal(|ui| {
                        if tracked.as_deref() == Some(job_id) {
                            ui.label(RichText::new("●").small().color(theme.accent_primary));
                        }
                        ui.label(
                            RichText::new(job.status.as_str())
                                .small()
                                .color(theme.status_color(job.status)),
                        );
                        ui.monospace(short_id(job_id));
                    });
                    if let Some(message) = job.message.as_deref().filter(|m| !m.is_empty()) {
                        ui.label(RichText::new(ellipsize(message, 50)).small().color(theme.text_muted));
                    }
                }
            });
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog else {
            return;
        };

        let mut submit = false;
        let mut cancel = false;
        let forms = &mut self.forms;
        let notice = self.form_notice;
        egui::Window::new(dialog.title())
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                match dialog {
                    Dialog::Login => {
                        credential_fields(ui, &mut forms.login.email, &mut forms.login.password);
                        ui.checkbox(&mut forms.login.remember, "Remember credentials");
                    }
                    Dialog::Register => {
                        ui.label("Full name");
                        ui.text_edit_singleline(&mut forms.register.name);
                        ui.label("Mobile");
                        ui.text_edit_singleline(&mut forms.register.mobile);
                        credential_fields(ui, &mut forms.register.email, &mut forms.register.password);
                        ui.checkbox(&mut forms.register.remember, "Remember credentials");
                    }
                    Dialog::Apply => {
                        credential_fields(ui, &mut forms.apply.email, &mut forms.apply.password);
                        ui.checkbox(&mut forms.apply.submit, "Submit the application");
                        ui.checkbox(&mut forms.apply.remember, "Remember credentials");
                        ui.checkbox(&mut forms.apply.validate, "Validate against policies first");
                    }
                    Dialog::Document => {
                        ui.label("Title");
                        ui.text_edit_singleline(&mut forms.document.title);
                        ui.label("Content");
                        ui.text_edit_multiline(&mut forms.document.content);
                        egui::ComboBox::from_label("Format")
                            .selected_text(forms.document.format.label())
                            .show_ui(ui, |ui| {
                                for format in DocFormat::ALL {
                                    ui.selectable_value(&mut forms.document.format, format, format.label());
                                }
                            });
                    }
                    Dialog::Presentation => {
                        ui.label("Title");
                        ui.text_edit_singleline(&mut forms.presentation.title);
                        ui.label("Slides (title line, then content lines; blank line between slides)");
                        ui.text_edit_multiline(&mut forms.presentation.slides);
                    }
                }

                if let Some(notice) = notice {
                    ui.colored_label(egui::Color32::YELLOW, notice);
                }
                ui.horizontal(|ui| {
                    submit = ui.button("Submit").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            self.dialog = None;
            self.form_notice = None;
        } else if submit {
            self.submit_dialog(dialog);
        }
    }

    fn submit_dialog(&mut self, dialog: Dialog) {
        let outcome = match dialog {
            Dialog::Apply => {
                let step = self
                    .desk
                    .request_apply(self.forms.apply.command(), self.forms.apply.validate);
                step.map(|step| match step {
                    ApplyStep::Validate => self.client.validate(),
                    ApplyStep::Submit(command) => self.client.submit(command),
                })
            }
            Dialog::Login => self.submit_request(self.forms.login.command()),
            Dialog::Register => self.submit_request(self.forms.register.command()),
            Dialog::Document => self.submit_request(self.forms.document.command()),
            Dialog::Presentation => self.submit_request(self.forms.presentation.command()),
        };

        match outcome {
            Ok(()) => {
                self.dialog = None;
                self.form_notice = None;
            }
            Err(FormIncomplete) => self.form_notice = Some(FORM_INCOMPLETE),
        }
    }

    fn submit_request(&mut self, command: Result<Command, FormIncomplete>) -> Result<(), FormIncomplete> {
        let command = self.desk.request(command)?;
        self.client.submit(command);
        Ok(())
    }

    fn show_validation_prompt(&mut self, ctx: &egui::Context, theme: &Theme) {
        let Some(pending) = self.desk.pending_apply() else {
            return;
        };

        let mut decision: Option<bool> = None;
        egui::Window::new("Validation errors found")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                for error in &pending.report.errors {
                    ui.colored_label(theme.danger, error.as_str());
                }
                ui.label("Do you want to proceed anyway?");
                ui.horizontal(|ui| {
                    if ui.button("Proceed").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });

        if let Some(proceed) = decision {
            if let Some(command) = self.desk.confirm_pending_apply(proceed) {
                self.client.submit(command);
            }
        }
    }
}

fn credential_fields(ui: &mut egui::Ui, email: &mut String, password: &mut String) {
    ui.label("Email");
    ui.text_edit_singleline(email);
    ui.label("Password");
    ui.add(egui::TextEdit::singleline(password).password(true));
}
