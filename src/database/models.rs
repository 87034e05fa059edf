/*!
 * Database entity models.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTML stored on a clone whose source had none
pub const EMPTY_HTML_SHELL: &str = "<!doctype html><html><body></body></html>";

/// How an email is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    /// Triggered by campaigns and forms
    #[default]
    Template,
    /// Sent to segments
    List,
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailType::Template => write!(f, "template"),
            EmailType::List => write!(f, "list"),
        }
    }
}

impl std::str::FromStr for EmailType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "template" => Ok(EmailType::Template),
            "list" => Ok(EmailType::List),
            _ => Err(anyhow::anyhow!("Invalid email type: {}", s)),
        }
    }
}

/// Row of the `emails` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// `None` until the record has been saved
    pub id: Option<i64>,
    pub name: String,
    pub subject: String,
    /// Builder theme identifier
    pub template: Option<String>,
    /// ISO language code, lowercase
    pub language: String,
    /// Compiled HTML body
    pub custom_html: Option<String>,
    pub email_type: EmailType,
    pub is_published: bool,
    pub variant_parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl EmailRecord {
    /// Create an unsaved email
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            name: name.into(),
            subject: subject.into(),
            template: None,
            language: "en".to_string(),
            custom_html: None,
            email_type: EmailType::default(),
            is_published: false,
            variant_parent_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into().trim().to_lowercase();
        self
    }

    pub fn with_custom_html(mut self, html: impl Into<String>) -> Self {
        self.custom_html = Some(html.into());
        self
    }

    /// Unsaved copy for a translation into `api_code`.
    ///
    /// Only safe fields are copied: the clone is unpublished, detached from
    /// any variant parent and always has an HTML body.
    pub fn translated_clone(&self, api_code: &str) -> Self {
        let base_name = if self.name.trim().is_empty() {
            "Email"
        } else {
            self.name.as_str()
        };
        let now = chrono::Utc::now().to_rfc3339();

        Self {
            id: None,
            name: format!("{} [{}]", base_name, api_code.trim().to_uppercase()),
            subject: self.subject.clone(),
            template: self.template.clone(),
            language: api_code.trim().to_lowercase(),
            custom_html: Some(
                self.custom_html
                    .clone()
                    .filter(|h| !h.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_HTML_SHELL.to_string()),
            ),
            email_type: self.email_type,
            is_published: false,
            variant_parent_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
