//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use copycraft_core::{Wizard, WizardProgress};
use copycraft_gemini::GeminiClient;
use copycraft_shared::{
    AppConfig, GeminiSettings, Stage, StyleTag, expand_home, init_config, load_config,
    validate_api_key,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::session::{Session, WriteArgs};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CopyCraft: turn a topic into a researched, cited long-form article.
#[derive(Parser)]
#[command(
    name = "copycraft",
    version,
    about = "Research headline angles, outline, and write long-form articles with cited sources.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the writing wizard. Anything not given as a flag is asked for.
    Write {
        /// Article topic.
        #[arg(short, long)]
        topic: Option<String>,

        /// Target audience.
        #[arg(short, long)]
        audience: Option<String>,

        /// Headline angle to pick (1-based) once research is done.
        #[arg(long)]
        angle: Option<usize>,

        /// Style preset: senior, expert, official, neighbor, storytelling, custom.
        #[arg(short, long)]
        style: Option<StyleTag>,

        /// Reference links or accounts whose tone should be imitated.
        #[arg(short, long)]
        links: Option<String>,

        /// Accept the generated outline and exit after the article is written.
        #[arg(short, long)]
        yes: bool,

        /// Directory to save the finished article in (defaults to config).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the article without saving it.
        #[arg(long)]
        no_save: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the article.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "copycraft=info",
        1 => "copycraft=debug",
        _ => "copycraft=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Write {
            topic,
            audience,
            angle,
            style,
            links,
            yes,
            out,
            no_save,
        } => {
            let config = load_config()?;
            let out_dir = out.unwrap_or_else(|| expand_home(&config.defaults.output_dir));
            let args = WriteArgs {
                topic,
                audience,
                angle,
                style,
                links,
                yes,
                out_dir: (!no_save).then_some(out_dir),
            };
            cmd_write(&config, args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_write(config: &AppConfig, args: WriteArgs) -> Result<()> {
    // Validate API key before doing anything
    validate_api_key(config)?;

    let settings = GeminiSettings::from_config(config)?;
    info!(model = %settings.model, "starting writing wizard");

    let client = GeminiClient::new(settings)?;
    let wizard = Wizard::new(client).with_progress(Arc::new(CliProgress::new()));

    Session::new(wizard, args).run().await
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner shown while a generation call is in flight.
struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }
}

impl WizardProgress for CliProgress {
    fn started(&self, stage: Stage, what: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.set_message(format!("[{}/5 {}] {what}", stage.step(), stage.title()));
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));

        let mut slot = self.spinner.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = slot.replace(spinner) {
            previous.finish_and_clear();
        }
    }

    fn finished(&self, _stage: Stage) {
        let mut slot = self.spinner.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(spinner) = slot.take() {
            spinner.finish_and_clear();
        }
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
