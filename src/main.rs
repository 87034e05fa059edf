// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mjml_translate::app_config::{self, Config};
use mjml_translate::compiler::{CompileStrategy, MjmlCompiler};
use mjml_translate::database::{DatabaseConnection, EmailRecord, Repository};
use mjml_translate::errors::JobFailure;
use mjml_translate::language_utils;
use mjml_translate::providers::deepl::DeepL;
use mjml_translate::providers::{TranslateOptions, TranslationBackend};
use mjml_translate::report::JobReport;
use mjml_translate::settings::{DEEPL_INTEGRATION, SettingsProvider};
use mjml_translate::{Controller, MarkupTranslator};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone a stored email and translate the clone
    Email {
        /// Id of the source email
        #[arg(long)]
        email_id: i64,

        /// Target language code (e.g., 'de', 'pt-br')
        #[arg(short, long)]
        target_lang: String,

        /// Base URL for the links in the report (defaults to the configured one)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Translate a single MJML file
    Document {
        /// MJML file to translate
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Target language code (e.g., 'de', 'pt-br')
        #[arg(short, long)]
        target_lang: String,

        /// Where to write the translated MJML (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also compile the translated MJML to this HTML file
        #[arg(long, value_name = "HTML_OUT")]
        html: Option<PathBuf>,
    },

    /// Compile an MJML file to HTML without translating it
    Compile {
        /// MJML file to compile
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Where to write the HTML (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Store an MJML file as a new email
    Import {
        /// MJML file to import
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Email name
        #[arg(long)]
        name: String,

        /// Email subject
        #[arg(long)]
        subject: Option<String>,

        /// Template name
        #[arg(long)]
        template: Option<String>,

        /// Language of the email
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// Send a test phrase to DeepL
    TestApi,

    /// List the DeepL target languages
    Languages,

    /// Generate shell completions for mjml-translate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mjml-translate - translate MJML emails with DeepL
///
/// Clones an email, translates the clone's subject and MJML body while
/// keeping tags, template expressions and locked regions intact, then
/// compiles the result to HTML.
#[derive(Parser, Debug)]
#[command(name = "mjml-translate")]
#[command(version = "0.1.0")]
#[command(about = "Translate MJML emails with DeepL")]
#[command(long_about = "mjml-translate clones MJML emails and translates the clone with DeepL.

EXAMPLES:
    mjml-translate import welcome.mjml --name Welcome --subject \"Hi there\"
    mjml-translate email --email-id 1 -t de        # Clone email 1 into German
    mjml-translate document welcome.mjml -t fr -o welcome.fr.mjml --html welcome.fr.html
    mjml-translate compile welcome.mjml -o welcome.html
    mjml-translate test-api                         # Check the DeepL key
    mjml-translate completions bash > mjml-translate.bash

LOCKED REGIONS:
    Text between <!-- notranslate:start --> and <!-- notranslate:end -->
    is never sent to DeepL.

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. The API key may also come from DEEPL_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// DeepL API key, overrides the configured one
    #[arg(long, global = true, env = "DEEPL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// SQLite database file, overrides the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for a level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The filter is raised later through log::set_max_level
        metadata.level() <= self.level || metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "mjml-translate", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Languages => {
            for (code, name) in language_utils::DEEPL_TARGET_LANGUAGES {
                println!("{:<8} {}", code, name);
            }
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    log::set_max_level(level_filter(&config.log_level));

    match cli.command {
        Commands::Email {
            email_id,
            target_lang,
            base_url,
        } => run_email(&config, email_id, &target_lang, base_url).await,
        Commands::Document {
            input,
            target_lang,
            output,
            html,
        } => run_document(&config, &input, &target_lang, output.as_deref(), html.as_deref()).await,
        Commands::Compile { input, output } => run_compile(&config, &input, output.as_deref()).await,
        Commands::Import {
            input,
            name,
            subject,
            template,
            language,
        } => run_import(&config, &input, name, subject, template, &language).await,
        Commands::TestApi => {
            let controller = Controller::from_config(&config, open_repository(&config)?);
            println!("{}", controller.test_api().await);
            Ok(())
        }
        Commands::Languages | Commands::Completions { .. } => Ok(()),
    }
}

/// Load conf.json (creating it when missing) and apply the global overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = &cli.config;
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    if let Some(api_key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        config.deepl.api_key = api_key.trim().to_string();
    }

    if let Some(database) = &cli.database {
        config.store.database_path = Some(database.to_string_lossy().into_owned());
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn open_repository(config: &Config) -> Result<Repository> {
    let connection = match config.store.database_path() {
        Some(path) => DatabaseConnection::new(path)?,
        None => DatabaseConnection::new_default()?,
    };
    Ok(Repository::new(connection))
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Write to `path`, or to stdout when no path was given
fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output file: {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read input file: {:?}", path))
}

async fn run_email(
    config: &Config,
    email_id: i64,
    target_lang: &str,
    base_url: Option<String>,
) -> Result<()> {
    let controller = Controller::from_config(config, open_repository(config)?);
    let base_url = base_url.unwrap_or_else(|| config.base_url.clone());

    let progress = spinner(format!("Translating email {} to {}", email_id, target_lang));
    let outcome = controller.translate_email(email_id, target_lang, &base_url).await;
    progress.finish_and_clear();

    match outcome {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&JobReport::failure(&failure))?);
            error!("Job failed (HTTP {}): {}", failure.http_status(), failure);
            std::process::exit(1);
        }
    }
}

async fn run_document(
    config: &Config,
    input: &Path,
    target_lang: &str,
    output: Option<&Path>,
    html: Option<&Path>,
) -> Result<()> {
    let document = read_input(input)?;

    let api_code = language_utils::to_api_code(target_lang);
    if api_code.is_empty() {
        return Err(anyhow!(JobFailure::MissingTargetLanguage));
    }
    if !config.has_api_key() {
        return Err(anyhow!(JobFailure::NotConfigured));
    }

    let backend: Arc<dyn TranslationBackend> =
        Arc::new(DeepL::from_config(&config.deepl, config.api_key(DEEPL_INTEGRATION)));
    let mut options = TranslateOptions::default();
    if let Some(formality) = config.deepl.formality.as_deref() {
        options = options.with_formality(formality);
    }
    let translator = MarkupTranslator::with_settings(backend, &config.translation, options);

    let progress = spinner(format!("Translating {:?} to {}", input, api_code));
    let outcome = translator.translate_document(&document, &api_code).await;
    progress.finish_and_clear();

    info!(
        "Document changed={}, locked_mode={}, locked_pairs={}",
        outcome.changed, outcome.locked_mode, outcome.locked_pair_count
    );
    for sample in outcome.samples.iter().take(config.translation.sample_limit) {
        info!("  {:?} → {:?}", sample.from, sample.to);
    }

    write_output(output, &outcome.document)?;

    if let Some(html_path) = html {
        let compiler = MjmlCompiler::from_config(&config.compiler);
        let compiled = compiler.compile(&outcome.document, None).await;
        let html_text = compiled
            .html
            .ok_or_else(|| anyhow!("MJML compile produced no HTML"))?;
        write_output(Some(html_path), &html_text)?;
    }

    Ok(())
}

async fn run_compile(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let document = read_input(input)?;
    let compiler = MjmlCompiler::from_config(&config.compiler);
    let compiled = compiler.compile(&document, None).await;

    if compiled.strategy == CompileStrategy::Fallback {
        warn!(
            "Used the fallback renderer: {}",
            compiled.error.as_deref().unwrap_or("mjml CLI disabled")
        );
    }

    let html = compiled
        .html
        .ok_or_else(|| anyhow!("MJML compile produced no HTML"))?;
    write_output(output, &html)
}

async fn run_import(
    config: &Config,
    input: &Path,
    name: String,
    subject: Option<String>,
    template: Option<String>,
    language: &str,
) -> Result<()> {
    let document = read_input(input)?;
    let repository = open_repository(config)?;

    let mut email = EmailRecord::new(name, subject.unwrap_or_default()).with_language(language);
    if let Some(template) = template {
        email = email.with_template(template);
    }

    let email_id = repository.insert_email(&email).await?;
    repository.write_document(email_id, &document).await?;

    info!("Imported {:?} as email {}", input, email_id);
    info!("Database: {}", repository.connection().stats()?);
    println!("{}", email_id);
    Ok(())
}
