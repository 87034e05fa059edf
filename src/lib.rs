/*!
 * # mjml-translate
 *
 * Clone an MJML email and translate the clone through DeepL without
 * breaking its markup.
 *
 * ## Features
 *
 * - DeepL client with Free/Pro host failover on HTTP 403
 * - Placeholder shielding of tags, comments, template expressions and tokens
 * - `<!-- notranslate:start -->` / `<!-- notranslate:end -->` lock regions
 * - Translation of `mj-text`, `mj-button`, `mj-image` and `mj-preview` only;
 *   `mj-raw` blocks are never touched
 * - MJML to HTML compilation through the `mjml` CLI, with a built-in
 *   fallback renderer
 * - SQLite persistence of emails and their MJML documents
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `settings`: Credential access and the feature gate
 * - `providers`: Translation backends:
 *   - `providers::deepl`: DeepL API client
 *   - `providers::http`: HTTP transport seam
 *   - `providers::mock`: Scripted backend for tests
 * - `translation`: Markup-aware translation:
 *   - `translation::shield`: Placeholder shielding
 *   - `translation::locks`: Lock-region splitting
 *   - `translation::markup`: MJML element and attribute scanning
 *   - `translation::orchestrator`: Document translation
 * - `compiler`: MJML to HTML
 * - `store`, `database`: Persistence seams and their SQLite implementation
 * - `app_controller`: The clone-and-translate job
 * - `report`: JSON job report
 * - `language_utils`: DeepL language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod compiler;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod report;
pub mod settings;
pub mod store;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use compiler::{CompileResult, CompileStrategy, MjmlCompiler};
pub use errors::{AppError, CompileError, JobFailure, ProviderError};
pub use language_utils::{get_language_name, language_codes_match};
pub use report::JobReport;
pub use translation::{DocumentOutcome, MarkupTranslator};
