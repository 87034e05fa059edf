/*!
 * MJML to HTML compilation.
 *
 * The external `mjml` CLI is used when one can be found. Without it, or when
 * it fails, a small tag-mapping renderer produces an approximate HTML body so
 * previews reflect the translated text.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::{Builder, TempPath};
use tokio::process::Command;

use crate::app_config::CompilerConfig;
use crate::errors::CompileError;
use crate::translation::markup;
use crate::translation::shield::ShieldMap;

static MJML_WRAPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?mjml\b[^>]*>").expect("Invalid mjml wrapper regex"));
static PREVIEW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-preview\b[^>]*>(.*?)</mj-preview>").expect("Invalid preview regex")
});
static HEAD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-head\b[^>]*>.*?</mj-head>|<mj-head\b[^>]*/>").expect("Invalid head regex")
});
static TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-text\b[^>]*>(.*?)</mj-text>").expect("Invalid text regex")
});
static BUTTON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-button\b([^>]*)>(.*?)</mj-button>").expect("Invalid button regex")
});
static ANCHOR_MJ_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a\b([^>]*?)\s+mj-?[a-z0-9_-]+="[^"]*"([^>]*)>"#)
        .expect("Invalid anchor attribute regex")
});
static IMAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-image\b([^>]*?)\s*/?>(?:\s*</mj-image>)?").expect("Invalid image regex")
});
static LAYOUT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?mj-(?:body|section|column|wrapper|group)\b[^>]*>")
        .expect("Invalid layout tag regex")
});
static HTML_ROOT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<html\b").expect("Invalid html root regex"));

/// Which path produced the HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStrategy {
    Cli,
    Fallback,
}

/// Outcome of one compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub success: bool,
    pub html: Option<String>,
    /// Error of the CLI attempt, kept even when the fallback succeeded
    pub error: Option<String>,
    pub strategy: CompileStrategy,
}

/// MJML compiler with CLI discovery and a fallback renderer
#[derive(Debug, Clone)]
pub struct MjmlCompiler {
    binary: Option<PathBuf>,
    candidates: Vec<String>,
    timeout: Duration,
    fallback_only: bool,
}

impl Default for MjmlCompiler {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl MjmlCompiler {
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            binary: config
                .binary
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .map(PathBuf::from),
            candidates: config.candidates.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            fallback_only: config.fallback_only,
        }
    }

    /// A compiler that never looks for the CLI
    pub fn fallback_only() -> Self {
        Self {
            binary: None,
            candidates: Vec::new(),
            timeout: Duration::from_secs(30),
            fallback_only: true,
        }
    }

    /// Locate an executable `mjml`
    pub fn find_cli(&self) -> Option<PathBuf> {
        if self.fallback_only {
            return None;
        }

        if let Some(binary) = &self.binary {
            if let Some(found) = resolve_executable(&binary.to_string_lossy()) {
                return Some(found);
            }
            warn!("Configured mjml binary {:?} is not executable, trying defaults", binary);
        }

        self.candidates.iter().find_map(|c| resolve_executable(c))
    }

    /// Compile a document; always yields HTML
    pub async fn compile(&self, document: &str, template_hint: Option<&str>) -> CompileResult {
        debug!("Compiling MJML ({} bytes, template={:?})", document.len(), template_hint);

        let mut cli_error = None;
        if let Some(cli) = self.find_cli() {
            match self.compile_via_cli(&cli, document).await {
                Ok(html) => {
                    info!("Compiled MJML with {}", cli.display());
                    return CompileResult {
                        success: true,
                        html: Some(html),
                        error: None,
                        strategy: CompileStrategy::Cli,
                    };
                }
                Err(e) => {
                    warn!("mjml CLI compile failed, falling back: {}", e);
                    cli_error = Some(e.to_string());
                }
            }
        } else {
            debug!("No mjml CLI available, using the fallback renderer");
        }

        CompileResult {
            success: true,
            html: Some(Self::render_fallback(document)),
            error: cli_error,
            strategy: CompileStrategy::Fallback,
        }
    }

    /// Run `<cli> <in> -o <out>` on private temp files
    pub async fn compile_via_cli(&self, cli: &Path, document: &str) -> Result<String, CompileError> {
        let input = write_input(document)?;
        let output = Builder::new()
            .prefix("mjml_out_")
            .suffix(".html")
            .tempfile()?
            .into_temp_path();

        let result = self.run_cli(cli, &input, &output).await;

        for path in [input, output] {
            let shown = path.to_path_buf();
            if let Err(e) = path.close() {
                warn!("Failed to remove temp file {}: {}", shown.display(), e);
            }
        }

        result
    }

    async fn run_cli(&self, cli: &Path, input: &Path, output: &Path) -> Result<String, CompileError> {
        let mut command = Command::new(cli);
        command
            .arg(input)
            .arg("-o")
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let finished = tokio::select! {
            result = command.output() => {
                result.map_err(|e| CompileError::Failed(format!("failed to run mjml: {}", e)))?
            }
            _ = tokio::time::sleep(self.timeout) => {
                return Err(CompileError::Timeout(self.timeout.as_secs()));
            }
        };

        let html = match tokio::fs::read_to_string(output).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Unable to read mjml output {}: {}", output.display(), e);
                String::new()
            }
        };
        if html.is_empty() {
            let mut combined = String::from_utf8_lossy(&finished.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&finished.stderr));
            let message = combined.trim();
            return Err(CompileError::Failed(if message.is_empty() {
                format!("no output (exit status {})", finished.status)
            } else {
                message.to_string()
            }));
        }

        Ok(html)
    }

    /// Approximate MJML with plain HTML
    pub fn render_fallback(document: &str) -> String {
        let mut raw_blocks = ShieldMap::new();
        let mut html = String::with_capacity(document.len());
        let mut last = 0;
        for block in markup::raw_blocks(document) {
            html.push_str(&document[last..block.outer.start]);
            html.push_str(&raw_blocks.insert(markup::RAW_BLOCK_KIND, &document[block.inner], document));
            last = block.outer.end;
        }
        html.push_str(&document[last..]);

        let html = MJML_WRAPPER_REGEX.replace_all(&html, "");

        let hidden_previews: String = PREVIEW_REGEX
            .captures_iter(&html)
            .filter_map(|caps| caps.get(1))
            .map(|m| format!("<div style=\"display:none;visibility:hidden;\">{}</div>", m.as_str()))
            .collect();
        let html = PREVIEW_REGEX.replace_all(&html, "");
        let html = HEAD_REGEX.replace_all(&html, "");
        let html = format!("{}{}", hidden_previews, html);

        let html = TEXT_REGEX.replace_all(&html, "<p>${1}</p>");
        let html = BUTTON_REGEX.replace_all(&html, "<p><a${1}>${2}</a></p>");
        let mut html = html.into_owned();
        while ANCHOR_MJ_ATTR_REGEX.is_match(&html) {
            html = ANCHOR_MJ_ATTR_REGEX.replace_all(&html, "<a${1}${2}>").into_owned();
        }
        let html = IMAGE_REGEX.replace_all(&html, "<img${1} />");
        let html = LAYOUT_TAG_REGEX.replace_all(&html, "");
        let html = raw_blocks.restore(html.trim());

        if HTML_ROOT_REGEX.is_match(&html) {
            html
        } else {
            format!("<!doctype html>\n<html><body>\n{}\n</body></html>", html)
        }
    }
}

fn write_input(document: &str) -> Result<TempPath, CompileError> {
    let mut file = Builder::new().prefix("mjml_in_").suffix(".mjml").tempfile()?;
    file.write_all(document.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Resolve a candidate to an executable; bare names are searched on PATH
fn resolve_executable(candidate: &str) -> Option<PathBuf> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    match which::which(candidate) {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("mjml candidate {:?} not usable: {}", candidate, e);
            None
        }
    }
}
