use serde::{Deserialize, Serialize};

pub mod client;
pub mod log;
pub mod selection;
pub mod session;

pub const WELCOME_MESSAGE: &str = "السلام علیکم! Welcome to Pakistan's smartest laptop recommendation assistant!\n\nI'm here to help Pakistani students find the perfect laptop within their budget.\n\nTo get started, tell me:\n1. What will you use the laptop for?\n2. What's your budget in PKR?";

pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Canned prompts offered before the conversation gets going: (label, message).
pub const QUICK_REPLIES: [(&str, &str); 6] = [
    ("FSC Student", "I am an FSC student"),
    ("Programming", "I need a laptop for programming"),
    ("80k Budget", "My budget is around 80,000 PKR"),
    ("Gaming", "I want a gaming laptop"),
    ("Office Work", "I need it for office work"),
    ("Engineering", "I am an engineering student"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Laptop>>,
    #[serde(default)]
    pub timestamp: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::now(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::now(Role::Assistant, content.into(), None)
    }

    pub fn assistant_with(content: impl Into<String>, recommendations: Option<Vec<Laptop>>) -> Self {
        Self::now(Role::Assistant, content.into(), recommendations)
    }

    fn now(role: Role, content: String, recommendations: Option<Vec<Laptop>>) -> Self {
        Self {
            role,
            content,
            recommendations,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn recommendations(&self) -> &[Laptop] {
        self.recommendations.as_deref().unwrap_or(&[])
    }
}

/// A recommended laptop. Two laptops are the same item iff their ids match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laptop {
    pub id: i64,
    pub name: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub processor: String,
    #[serde(default)]
    pub ram: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub graphics: String,
    #[serde(rename = "price_pkr", alias = "price")]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Laptop {
    pub fn display_model(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
pub(crate) fn laptop(id: i64, brand: &str, price: i64) -> Laptop {
    Laptop {
        id,
        name: format!("{brand} {id}"),
        brand: brand.to_string(),
        model: None,
        category: "Programming".to_string(),
        processor: "Core i5".to_string(),
        ram: "16GB".to_string(),
        storage: "512GB SSD".to_string(),
        display: "15.6\" FHD".to_string(),
        graphics: "Integrated".to_string(),
        price,
        url: None,
    }
}
