/*!
 * Job result returned to callers as camelCase JSON.
 */

use serde::Serialize;

use crate::errors::JobFailure;
use crate::translation::ChangeSample;

/// Message of a successful job
pub const DONE_MESSAGE: &str = "Done.";

/// Note attached to successful reports
pub const COMPILED_HTML_NOTE: &str =
    "custom_html is compiled from the translated MJML so the preview reflects the translation immediately.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone: Option<CloneSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub email_id: i64,
    pub name: String,
    /// Source language as stored, lowercase
    pub language: String,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSummary {
    pub email_id: i64,
    pub name: String,
    pub subject: String,
    pub template: Option<String>,
    pub language: String,
    /// The source MJML was copied to the clone before translation
    pub mjml_write: bool,
    pub urls: CloneUrls,
}

/// Navigation links for the clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneUrls {
    pub edit: String,
    pub view: String,
    pub builder: String,
    pub preview: String,
}

impl CloneUrls {
    pub fn new(base_url: &str, email_id: i64) -> Self {
        let base = base_url.trim().trim_end_matches('/');
        Self {
            edit: format!("{}/s/emails/edit/{}", base, email_id),
            view: format!("{}/s/emails/view/{}", base, email_id),
            builder: format!("{}/s/emails/builder/{}", base, email_id),
            preview: format!("{}/email/preview/{}", base, email_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSummary {
    pub subject_changed: bool,
    pub mjml_changed: bool,
    pub samples: Vec<ChangeSample>,
    pub locked_mode: bool,
    pub locked_pairs: usize,
}

impl JobReport {
    /// Report for a job that stopped early; carries only the safe message
    pub fn failure(failure: &JobFailure) -> Self {
        Self {
            success: false,
            message: failure.to_string(),
            source: None,
            clone: None,
            translation: None,
            note: None,
        }
    }
}
