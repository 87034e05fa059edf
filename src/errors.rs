/*!
 * Error types for the mjml-translate application.
 *
 * This module contains custom error types for the different layers of the
 * translation job, using the thiserror crate for ergonomic error definitions.
 * Fragment-level failures never travel through these types beyond the
 * orchestrator; they are absorbed there and the fragment keeps its text.
 */

use thiserror::Error;

/// Errors that can occur when talking to the translation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No API credential was configured, so no request was attempted
    #[error("API key not set")]
    MissingCredential,

    /// The request could not be delivered (timeout, DNS, refused connection)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The API answered 200 but the payload did not have the expected shape
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Character quota of the account is used up (HTTP 456)
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Error with authentication (HTTP 401/403)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and the API's message to an error
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            456 => Self::QuotaExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// HTTP status attached to this error, if the API produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            Self::RateLimitExceeded(_) => Some(429),
            Self::QuotaExceeded(_) => Some(456),
            _ => None,
        }
    }
}

/// Errors that can occur while compiling MJML with the external CLI
#[derive(Error, Debug)]
pub enum CompileError {
    /// No mjml executable was found at any candidate location
    #[error("mjml CLI not found")]
    CliNotFound,

    /// Temporary input/output files could not be prepared
    #[error("Unable to create temp files: {0}")]
    TempFile(#[from] std::io::Error),

    /// The CLI did not finish within the configured time
    #[error("mjml CLI timed out after {0} seconds")]
    Timeout(u64),

    /// The CLI ran but produced no output; carries its combined output
    #[error("mjml CLI failed: {0}")]
    Failed(String),
}

/// Failures that end a translation job before any useful work is done.
///
/// The messages are safe to show to end users: they never include the
/// credential, the backend host or raw response bodies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobFailure {
    /// The add-on is switched off in the settings
    #[error("Translations are disabled.")]
    FeatureDisabled,

    /// The source email does not exist (or is not visible)
    #[error("Email not found or access denied.")]
    NotFound,

    /// The request did not name a target language
    #[error("Target language not provided.")]
    MissingTargetLanguage,

    /// No API credential is configured
    #[error("Translation API is not configured. Set the DeepL API key.")]
    NotConfigured,

    /// The probe translation failed
    #[error("DeepL probe failed. Check API key/plan and network.")]
    ProbeFailed,

    /// The clone could not be persisted
    #[error("Failed to clone email.")]
    CloneFailed,
}

impl JobFailure {
    /// HTTP status code the request-handling layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::FeatureDisabled => 403,
            Self::NotFound => 404,
            Self::MissingTargetLanguage | Self::NotConfigured | Self::ProbeFailed => 400,
            Self::CloneFailed => 500,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the translation backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the MJML compiler
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// A translation job ended early
    #[error("Job failed: {0}")]
    Job(#[from] JobFailure),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
