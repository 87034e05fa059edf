/*!
 * Repository layer for database operations.
 *
 * Typed access to emails and their MJML documents. Every call runs on the
 * blocking pool through `DatabaseConnection::execute_async`.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

use super::connection::DatabaseConnection;
use super::models::{EmailRecord, EmailType};
use crate::store::{DocumentStore, EmailStore};

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Repository on the default database file
    pub fn new_default() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// Repository on an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Email Operations
    // =========================================================================

    /// Insert a new email, returning its id
    pub async fn insert_email(&self, email: &EmailRecord) -> Result<i64> {
        let email = email.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO emails (
                        name, subject, template, language, custom_html, email_type,
                        is_published, variant_parent_id, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        email.name,
                        email.subject,
                        email.template,
                        email.language,
                        email.custom_html,
                        email.email_type.to_string(),
                        email.is_published,
                        email.variant_parent_id,
                        email.created_at,
                        email.updated_at,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                debug!("Inserted email {}", id);
                Ok(id)
            })
            .await
    }

    /// Update an existing email
    pub async fn update_email(&self, email: &EmailRecord) -> Result<()> {
        let email = email.clone();
        let id = email
            .id
            .ok_or_else(|| anyhow!("Cannot update an email without an id"))?;

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    r#"
                    UPDATE emails SET
                        name = ?2, subject = ?3, template = ?4, language = ?5,
                        custom_html = ?6, email_type = ?7, is_published = ?8,
                        variant_parent_id = ?9, updated_at = ?10
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        email.name,
                        email.subject,
                        email.template,
                        email.language,
                        email.custom_html,
                        email.email_type.to_string(),
                        email.is_published,
                        email.variant_parent_id,
                        email.updated_at,
                    ],
                )?;
                if updated == 0 {
                    return Err(anyhow!("Email {} does not exist", id));
                }
                Ok(())
            })
            .await
    }

    /// Get an email by id
    pub async fn find_email(&self, email_id: i64) -> Result<Option<EmailRecord>> {
        self.db
            .execute_async(move |conn| Self::find_email_sync(conn, email_id))
            .await
    }

    fn find_email_sync(conn: &Connection, email_id: i64) -> Result<Option<EmailRecord>> {
        let result = conn
            .query_row(
                r#"
                SELECT id, name, subject, template, language, custom_html, email_type,
                       is_published, variant_parent_id, created_at, updated_at
                FROM emails WHERE id = ?1
                "#,
                [email_id],
                |row| {
                    Ok(EmailRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        subject: row.get(2)?,
                        template: row.get(3)?,
                        language: row.get(4)?,
                        custom_html: row.get(5)?,
                        email_type: row
                            .get::<_, String>(6)?
                            .parse()
                            .unwrap_or(EmailType::Template),
                        is_published: row.get(7)?,
                        variant_parent_id: row.get(8)?,
                        created_at: row.get(9)?,
                        updated_at: row.get(10)?,
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    /// All emails written in `language`, newest first
    pub async fn list_emails_by_language(&self, language: &str) -> Result<Vec<EmailRecord>> {
        let language = language.trim().to_lowercase();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare("SELECT id FROM emails WHERE language = ?1 ORDER BY id DESC")?;
                let ids: Vec<i64> = stmt
                    .query_map([&language], |row| row.get(0))?
                    .collect::<rusqlite::Result<_>>()?;

                let mut emails = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(email) = Self::find_email_sync(conn, id)? {
                        emails.push(email);
                    }
                }
                Ok(emails)
            })
            .await
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// MJML stored for an email
    pub async fn find_document(&self, email_id: i64) -> Result<Option<String>> {
        self.db
            .execute_async(move |conn| {
                let document = conn
                    .query_row(
                        "SELECT custom_mjml FROM builder_documents WHERE email_id = ?1",
                        [email_id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(document)
            })
            .await
    }

    /// Update the MJML of an email, inserting the row when none was updated
    pub async fn write_document(&self, email_id: i64, document: &str) -> Result<()> {
        let document = document.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE builder_documents SET custom_mjml = ?2, updated_at = ?3 WHERE email_id = ?1",
                    params![email_id, document, now],
                )?;

                if updated == 0 {
                    conn.execute(
                        "INSERT INTO builder_documents (email_id, custom_mjml, updated_at) VALUES (?1, ?2, ?3)",
                        params![email_id, document, now],
                    )?;
                    debug!("Inserted MJML for email {}", email_id);
                } else {
                    debug!("Updated MJML for email {}", email_id);
                }
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn fetch_document(&self, email_id: i64) -> Result<Option<String>> {
        self.find_document(email_id).await
    }

    async fn upsert_document(&self, email_id: i64, document: &str) -> Result<()> {
        self.write_document(email_id, document).await
    }
}

#[async_trait]
impl EmailStore for Repository {
    async fn get_email(&self, email_id: i64) -> Result<Option<EmailRecord>> {
        self.find_email(email_id).await
    }

    async fn save_email(&self, email: &EmailRecord) -> Result<i64> {
        match email.id {
            Some(id) => {
                self.update_email(email).await?;
                Ok(id)
            }
            None => self.insert_email(email).await,
        }
    }
}
