use crate::admissions::{
    ellipsize, Command, FormIncomplete, JobKind, PolicyCatalog, PolicySearchHit,
    PolicySearchResults, ValidationReport, WELCOME_MESSAGE,
};
use crate::chat::log::ConversationLog;
use crate::chat::Turn;
use crate::error::ClientResult;
use crate::jobs::tracker::{DownloadLink, JobNotice, JobTracker};
use crate::jobs::{short_id, JobStatus, JobsSnapshot};
use std::path::PathBuf;

pub const FORM_INCOMPLETE: &str = "Please fill in all fields";
const PREVIEW_CHARS: usize = 150;

/// An apply command held back until the user decides on validation errors.
#[derive(Debug, Clone)]
pub struct PendingApply {
    pub command: Command,
    pub report: ValidationReport,
}

/// What the caller must do next after the user asks to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyStep {
    Validate,
    Submit(Command),
}

/// Client-side state of the admissions surface.
#[derive(Debug)]
pub struct AdmissionsDesk {
    log: ConversationLog,
    tracker: JobTracker,
    status_text: String,
    jobs: JobsSnapshot,
    downloads: Vec<DownloadLink>,
    pending_kind: JobKind,
    validating: Option<Command>,
    pending_apply: Option<PendingApply>,
}

impl Default for AdmissionsDesk {
    fn default() -> Self {
        Self {
            log: ConversationLog::welcome(WELCOME_MESSAGE),
            tracker: JobTracker::default(),
            status_text: "Ready".to_string(),
            jobs: JobsSnapshot::default(),
            downloads: Vec::new(),
            pending_kind: JobKind::Portal,
            validating: None,
            pending_apply: None,
        }
    }
}

impl AdmissionsDesk {
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn jobs(&self) -> &JobsSnapshot {
        &self.jobs
    }

    pub fn downloads(&self) -> &[DownloadLink] {
        &self.downloads
    }

    pub fn tracked_job(&self) -> Option<&str> {
        self.tracker.last_job_id()
    }

    pub fn pending_apply(&self) -> Option<&PendingApply> {
        self.pending_apply.as_ref()
    }

    pub fn is_validating(&self) -> bool {
        self.validating.is_some()
    }

    fn say(&mut self, text: impl Into<String>) {
        self.log.append(Turn::assistant(text));
    }

    fn user(&mut self, text: impl Into<String>) {
        self.log.append(Turn::user(text));
    }

    pub fn free_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.user(text);
        self.say("I understand. Let me help you with that...");
    }

    pub fn show_welcome_back(&mut self) {
        self.say("Welcome back! What would you like to do today?");
    }

    /// Narrates a portal or document request and hands back the command to post.
    pub fn request(
        &mut self,
        command: Result<Command, FormIncomplete>,
    ) -> Result<Command, FormIncomplete> {
        let command = command?;
        let (user_line, progress) = match &command {
            Command::Login(_) => ("Login to admissions portal".to_string(), "Logging in..."),
            Command::Register(_) => ("Register new account".to_string(), "Creating account..."),
            Command::Apply(_) => ("Apply for admission".to_string(), "Starting application process..."),
            Command::CreateDoc { title, format, .. } => (
                format!("Create {} document: {title}", format.label()),
                "Creating document...",
            ),
            Command::CreatePpt { title, .. } => (
                format!("Create presentation: {title}"),
                "Creating PowerPoint presentation...",
            ),
        };
        self.user(user_line);
        self.say(progress);
        self.pending_kind = command.job_kind();
        Ok(command)
    }

    /// Starts the apply flow. With validation on, the command waits for
    /// [`Self::validation_finished`].
    pub fn request_apply(
        &mut self,
        command: Result<Command, FormIncomplete>,
        validate: bool,
    ) -> Result<ApplyStep, FormIncomplete> {
        let command = command?;
        self.user("Apply for admission");
        self.pending_kind = command.job_kind();
        if validate {
            self.say("Validating application against university policies...");
            self.validating = Some(command);
            return Ok(ApplyStep::Validate);
        }
        self.say("Starting application process...");
        Ok(ApplyStep::Submit(command))
    }

    /// Returns the command to submit now, or `None` when the user must confirm
    /// or the flow was not waiting on validation.
    pub fn validation_finished(&mut self, result: ClientResult<ValidationReport>) -> Option<Command> {
        let command = self.validating.take()?;
        match result {
            Err(err) => {
                tracing::warn!("application validation failed: {err}");
                self.say(format!("Validation check failed: {err}"));
                self.say("Proceeding with application anyway...");
                Some(self.start_application(command))
            }
            Ok(report) if !report.errors.is_empty() => {
                self.say("Validation Errors Found:");
                for error in &report.errors {
                    self.say(error.clone());
                }
                self.pending_apply = Some(PendingApply { command, report });
                None
            }
            Ok(report) => {
                self.report_warnings(&report);
                Some(self.start_application(command))
            }
        }
    }

    /// Validation errors are advisory: the user may proceed anyway.
    pub fn confirm_pending_apply(&mut self, proceed: bool) -> Option<Command> {
        let pending = self.pending_apply.take()?;
        if !proceed {
            self.say("Application cancelled by user");
            return None;
        }
        self.report_warnings(&pending.report);
        Some(self.start_application(pending.command))
    }

    fn report_warnings(&mut self, report: &ValidationReport) {
        if !report.warnings.is_empty() {
            self.say("Warnings:");
            for warning in &report.warnings {
                self.say(warning.clone());
            }
        }
        if report.is_valid {
            self.say("Validation passed! Proceeding with application...");
        }
    }

    fn start_application(&mut self, command: Command) -> Command {
        self.say("Starting application process...");
        command
    }

    pub fn job_submitted(&mut self, result: ClientResult<String>) {
        match result {
            Ok(job_id) => {
                self.say(format!("Job created: {}", short_id(&job_id)));
                self.tracker.track(job_id);
                self.status_text = self.pending_kind.status_text().to_string();
            }
            Err(err) => {
                tracing::warn!("command submission failed: {err}");
                self.say(format!("Error: {err}"));
            }
        }
    }

    /// Mirrors a fresh `/jobs` snapshot and narrates the tracked job.
    pub fn jobs_refreshed(&mut self, snapshot: JobsSnapshot) {
        let outcome = self.tracker.reconcile(&snapshot);
        self.jobs = snapshot;

        match outcome.status {
            Some(JobStatus::Done) => self.status_text = "Completed".to_string(),
            Some(JobStatus::Failed) => self.status_text = "Failed".to_string(),
            Some(JobStatus::Running) => self.status_text = "Running...".to_string(),
            _ => {}
        }

        match outcome.notice {
            Some(JobNotice::Completed { download, .. }) => {
                self.say("Task completed successfully!");
                if let Some(link) = download {
                    self.say(format!("Download {} is ready", link.filename));
                    self.downloads.retain(|existing| existing.job_id != link.job_id);
                    self.downloads.push(link);
                }
            }
            Some(JobNotice::Failed { message, .. }) => {
                self.say(format!("Task failed: {message}"));
            }
            None => {}
        }
    }

    pub fn download_finished(&mut self, link: &DownloadLink, result: ClientResult<PathBuf>) {
        match result {
            Ok(path) => self.say(format!("Saved {} to {}", link.filename, path.display())),
            Err(err) => {
                tracing::warn!(job_id = %link.job_id, "download failed: {err}");
                self.say(format!("Download failed: {err}"));
            }
        }
    }

    pub fn request_policies(&mut self) {
        self.say("Loading university policies...");
        self.status_text = "Loading policies...".to_string();
    }

    pub fn policies_loaded(&mut self, result: ClientResult<PolicyCatalog>) {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(err) => {
                self.say(format!("Failed to load policies: {err}"));
                self.status_text = "Error".to_string();
                return;
            }
        };

        if !catalog.categories.is_empty() {
            let mut message = String::from("Policy Categories:\n\n");
            for (index, category) in catalog.categories.iter().enumerate() {
                message.push_str(&format!("{}. {}\n", index + 1, category.name));
            }
            self.say(message);
        }

        if !catalog.details.is_empty() {
            self.say("Policy Details:");
            for (index, detail) in catalog.details.iter().enumerate() {
                self.say(format!(
                    "{}. {}\n{}",
                    index + 1,
                    detail.title,
                    ellipsize(&detail.content, PREVIEW_CHARS)
                ));
            }
        }

        self.say(format!("Full policies: {}", catalog.url));
        self.status_text = "Policies loaded".to_string();
    }

    /// Returns the trimmed query to search for, if any.
    pub fn request_search(&mut self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.user(format!("Search policies: {query}"));
        self.say(format!("Searching for \"{query}\"..."));
        Some(query.to_string())
    }

    pub fn search_finished(&mut self, query: &str, result: ClientResult<PolicySearchResults>) {
        let results = match result {
            Ok(results) => results.results,
            Err(err) => {
                self.say(format!("Search failed: {err}"));
                return;
            }
        };

        if results.is_empty() {
            self.say(format!("No policies found for \"{query}\""));
            return;
        }

        self.say(format!("Found {} result(s):", results.len()));
        for (index, hit) in results.iter().enumerate() {
            let line = match hit {
                PolicySearchHit::Category { name, url } => format!("{}. {name}\n{url}", index + 1),
                PolicySearchHit::Detail { title, content } => format!(
                    "{}. {title}\n{}",
                    index + 1,
                    ellipsize(content, PREVIEW_CHARS)
                ),
            };
            self.say(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissions::{
        ApplyForm, DocumentForm, LoginForm, PolicyCategory, PolicyDetail, PresentationForm,
    };
    use crate::chat::Role;
    use crate::error::ClientError;
    use crate::jobs::{job, Job};

    fn contents(desk: &AdmissionsDesk) -> Vec<&str> {
        desk.log().turns().iter().map(|turn| turn.content.as_str()).collect()
    }

    fn apply_form() -> ApplyForm {
        ApplyForm {
            email: "a@b.pk".to_string(),
            password: "pw".to_string(),
            ..ApplyForm::default()
        }
    }

    fn snapshot_of(id: &str, job: Job) -> JobsSnapshot {
        JobsSnapshot::from_entries(vec![(id, job)])
    }

    #[test]
    fn starts_with_welcome_turn() {
        let desk = AdmissionsDesk::default();
        assert_eq!(contents(&desk), [WELCOME_MESSAGE]);
    }

    #[test]
    fn incomplete_form_sends_nothing() {
        let mut desk = AdmissionsDesk::default();
        let result = desk.request(LoginForm::default().command());
        assert_eq!(result, Err(FormIncomplete));
        assert_eq!(desk.log().len(), 1);
    }

    #[test]
    fn presentation_request_sets_presentation_status() {
        let mut desk = AdmissionsDesk::default();
        let form = PresentationForm {
            title: "Intro".to_string(),
            slides: "One\nfirst point".to_string(),
        };
        desk.request(form.command()).expect("form is complete");
        desk.job_submitted(Ok("job-ppt".to_string()));
        assert_eq!(desk.status_text(), "Creating presentation...");
    }

    #[test]
    fn completed_job_is_narrated_once() {
        let mut desk = AdmissionsDesk::default();
        let form = DocumentForm {
            title: "SOP".to_string(),
            content: "text".to_string(),
            ..DocumentForm::default()
        };
        desk.request(form.command())
            .expect("form is complete");
        desk.job_submitted(Ok("0123456789".to_string()));
        assert_eq!(desk.status_text(), "Creating document...");
        assert_eq!(desk.log().last().map(|t| t.content.as_str()), Some("Job created: 01234567..."));

        let mut done = job(JobStatus::Done);
        done.filepath = Some("/tmp/sop.docx".to_string());
        done.filename = Some("sop.docx".to_string());
        for status in [JobStatus::Queued, JobStatus::Running] {
            desk.jobs_refreshed(snapshot_of("0123456789", job(status)));
        }
        assert_eq!(desk.status_text(), "Running...");
        for _ in 0..3 {
            desk.jobs_refreshed(snapshot_of("0123456789", done.clone()));
        }

        let completions = desk
            .log()
            .turns()
            .iter()
            .filter(|turn| turn.content == "Task completed successfully!")
            .count();
        assert_eq!(completions, 1);
        assert_eq!(desk.status_text(), "Completed");
        assert_eq!(desk.downloads().len(), 1);
        assert_eq!(desk.downloads()[0].filename, "sop.docx");
    }

    #[test]
    fn failed_submission_becomes_assistant_turn() {
        let mut desk = AdmissionsDesk::default();
        desk.job_submitted(Err(ClientError::Server("down".to_string())));
        let last = desk.log().last().expect("log should have an error turn");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Error: server error: down");
        assert!(desk.tracked_job().is_none());
    }

    #[test]
    fn validation_errors_wait_for_confirmation() {
        let mut desk = AdmissionsDesk::default();
        let step = desk
            .request_apply(apply_form().command(), true)
            .expect("form is complete");
        assert_eq!(step, ApplyStep::Validate);

        let report = ValidationReport {
            is_valid: false,
            errors: vec!["CNIC missing".to_string()],
            warnings: vec!["Photo is large".to_string()],
        };
        assert!(desk.validation_finished(Ok(report)).is_none());
        assert!(desk.pending_apply().is_some());
        assert!(contents(&desk).contains(&"CNIC missing"));

        let command = desk.confirm_pending_apply(true);
        assert!(matches!(command, Some(Command::Apply(_))));
        assert!(contents(&desk).contains(&"Photo is large"));
        assert_eq!(desk.log().last().map(|t| t.content.as_str()), Some("Starting application process..."));
    }

    #[test]
    fn declining_validation_cancels_apply() {
        let mut desk = AdmissionsDesk::default();
        desk.request_apply(apply_form().command(), true)
            .expect("form is complete");
        let report = ValidationReport {
            is_valid: false,
            errors: vec!["GPA too low".to_string()],
            warnings: Vec::new(),
        };
        desk.validation_finished(Ok(report));

        assert!(desk.confirm_pending_apply(false).is_none());
        assert_eq!(desk.log().last().map(|t| t.content.as_str()), Some("Application cancelled by user"));
        assert!(desk.pending_apply().is_none());
    }

    #[test]
    fn validation_transport_failure_still_applies() {
        let mut desk = AdmissionsDesk::default();
        desk.request_apply(apply_form().command(), true)
            .expect("form is complete");
        let command = desk.validation_finished(Err(ClientError::Server("no data".to_string())));
        assert!(command.is_some());
        assert!(contents(&desk).contains(&"Proceeding with application anyway..."));
    }

    #[test]
    fn clean_validation_submits_immediately() {
        let mut desk = AdmissionsDesk::default();
        desk.request_apply(apply_form().command(), true)
            .expect("form is complete");
        let report = ValidationReport {
            is_valid: true,
            ..ValidationReport::default()
        };
        assert!(desk.validation_finished(Ok(report)).is_some());
        assert!(contents(&desk).contains(&"Validation passed! Proceeding with application..."));
    }

    #[test]
    fn policies_render_numbered_and_truncated() {
        let mut desk = AdmissionsDesk::default();
        desk.request_policies();
        desk.policies_loaded(Ok(PolicyCatalog {
            categories: vec![
                PolicyCategory { name: "Admissions".to_string() },
                PolicyCategory { name: "Fees".to_string() },
            ],
            details: vec![PolicyDetail {
                title: "Eligibility".to_string(),
                content: "x".repeat(200),
            }],
            url: "https://uni.example/policies".to_string(),
            ..PolicyCatalog::default()
        }));

        let log = contents(&desk);
        assert!(log.contains(&"Policy Categories:\n\n1. Admissions\n2. Fees\n"));
        let detail = format!("1. Eligibility\n{}...", "x".repeat(150));
        assert!(log.contains(&detail.as_str()));
        assert_eq!(desk.status_text(), "Policies loaded");
    }

    #[test]
    fn empty_search_reports_no_matches() {
        let mut desk = AdmissionsDesk::default();
        let query = desk.request_search("  hostel ").expect("query is not blank");
        desk.search_finished(&query, Ok(PolicySearchResults::default()));
        assert_eq!(
            desk.log().last().map(|t| t.content.as_str()),
            Some("No policies found for \"hostel\"")
        );
    }
}
