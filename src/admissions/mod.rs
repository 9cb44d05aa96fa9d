use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod client;
pub mod desk;

pub const WELCOME_MESSAGE: &str =
    "Welcome! I can help you with university admissions. Choose an action from the sidebar or ask me anything.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slide {
    pub title: String,
    pub content: Vec<String>,
}

/// Body of `POST /command`, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    Login(PortalCommand),
    Register(PortalCommand),
    Apply(PortalCommand),
    CreateDoc {
        title: String,
        content: Vec<String>,
        format: DocFormat,
    },
    CreatePpt {
        title: String,
        slides: Vec<Slide>,
    },
}

impl Command {
    pub fn job_kind(&self) -> JobKind {
        match self {
            Self::Login(_) | Self::Register(_) | Self::Apply(_) => JobKind::Portal,
            Self::CreateDoc { .. } => JobKind::Document,
            Self::CreatePpt { .. } => JobKind::Presentation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalCommand {
    pub command: String,
    pub credentials: Credentials,
    pub fields: Map<String, Value>,
    pub submit: bool,
    pub remember: bool,
}

impl PortalCommand {
    fn new(command: &str, credentials: Credentials, submit: bool, remember: bool) -> Self {
        Self {
            command: command.to_string(),
            credentials,
            fields: Map::new(),
            submit,
            remember,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    #[default]
    Docx,
    Pdf,
    Txt,
}

impl DocFormat {
    pub const ALL: [DocFormat; 3] = [Self::Docx, Self::Pdf, Self::Txt];

    pub fn label(self) -> &'static str {
        match self {
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
            Self::Txt => "TXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Portal,
    Document,
    Presentation,
}

impl JobKind {
    pub fn status_text(self) -> &'static str {
        match self {
            Self::Portal => "Processing...",
            Self::Document => "Creating document...",
            Self::Presentation => "Creating presentation...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormIncomplete;

fn filled<S: AsRef<str>>(values: &[S]) -> Result<(), FormIncomplete> {
    if values.iter().any(|value| value.as_ref().trim().is_empty()) {
        Err(FormIncomplete)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn command(&self) -> Result<Command, FormIncomplete> {
        filled(&[&self.email, &self.password])?;
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            ..Credentials::default()
        };
        Ok(Command::Login(PortalCommand::new(
            "login",
            credentials,
            false,
            self.remember,
        )))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl RegisterForm {
    pub fn command(&self) -> Result<Command, FormIncomplete> {
        filled(&[&self.name, &self.mobile, &self.email, &self.password])?;
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            name: Some(self.name.clone()),
            mobile: Some(self.mobile.clone()),
        };
        Ok(Command::Register(PortalCommand::new(
            "register",
            credentials,
            false,
            self.remember,
        )))
    }
}

#[derive(Debug, Clone)]
pub struct ApplyForm {
    pub email: String,
    pub password: String,
    pub submit: bool,
    pub remember: bool,
    pub validate: bool,
}

impl Default for ApplyForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            submit: false,
            remember: false,
            validate: true,
        }
    }
}

impl ApplyForm {
    pub fn command(&self) -> Result<Command, FormIncomplete> {
        filled(&[&self.email, &self.password])?;
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            ..Credentials::default()
        };
        Ok(Command::Apply(PortalCommand::new(
            "apply",
            credentials,
            self.submit,
            self.remember,
        )))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentForm {
    pub title: String,
    pub content: String,
    pub format: DocFormat,
}

impl DocumentForm {
    pub fn command(&self) -> Result<Command, FormIncomplete> {
        filled(&[&self.title, &self.content])?;
        Ok(Command::CreateDoc {
            title: self.title.clone(),
            content: self.content.split('\n').map(str::to_string).collect(),
            format: self.format,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresentationForm {
    pub title: String,
    pub slides: String,
}

impl PresentationForm {
    pub fn command(&self) -> Result<Command, FormIncomplete> {
        filled(&[&self.title, &self.slides])?;
        Ok(Command::CreatePpt {
            title: self.title.clone(),
            slides: parse_slides(&self.slides),
        })
    }
}

/// Slides are separated by a blank line; the first line of each is its title.
pub fn parse_slides(text: &str) -> Vec<Slide> {
    text.split("\n\n")
        .map(|block| {
            let mut lines = block.split('\n');
            let title = lines.next().unwrap_or_default().to_string();
            Slide {
                title,
                content: lines.map(str::to_string).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyDetail {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolicyCatalog {
    #[serde(default)]
    pub categories: Vec<PolicyCategory>,
    #[serde(default)]
    pub details: Vec<PolicyDetail>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySearchHit {
    Category {
        name: String,
        #[serde(default)]
        url: String,
    },
    Detail {
        title: String,
        #[serde(default)]
        content: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolicySearchResults {
    #[serde(default)]
    pub results: Vec<PolicySearchHit>,
    #[serde(default)]
    pub error: Option<String>,
}

/// First `limit` characters followed by `...`.
pub fn ellipsize(text: &str, limit: usize) -> String {
    format!("{}...", text.chars().take(limit).collect::<String>())
}
