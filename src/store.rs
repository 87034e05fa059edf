/*!
 * Storage seams used by the translation job.
 *
 * The SQLite `Repository` implements both traits; tests may provide their
 * own.
 */

use anyhow::Result;
use async_trait::async_trait;

use crate::database::models::EmailRecord;

/// Raw MJML per email
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// MJML of the email, `None` when it has none
    async fn fetch_document(&self, email_id: i64) -> Result<Option<String>>;

    /// Write the MJML of an email, creating the row when missing
    async fn upsert_document(&self, email_id: i64, document: &str) -> Result<()>;
}

/// Email records
#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn get_email(&self, email_id: i64) -> Result<Option<EmailRecord>>;

    /// Insert when `id` is `None`, update otherwise; returns the id
    async fn save_email(&self, email: &EmailRecord) -> Result<i64>;
}
