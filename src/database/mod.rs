/*!
 * SQLite persistence for emails and their MJML documents.
 *
 * - `schema`: versioned table definitions
 * - `connection`: shared connection with blocking-pool access
 * - `models`: row types
 * - `repository`: typed queries; implements the `store` traits
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use models::EmailRecord;
pub use repository::Repository;
