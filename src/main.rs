//! Scribe CLI
//!
//! Commands:
//!   serve    - Start the relay HTTP server
//!   generate - Generate text through a running relay (with retries)
//!   prompt   - Print the composed prompt without calling anything
//!   models   - List selectable models
//!   config   - Show or initialize configuration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use scribe::logging::init_logging;
use scribe::{
    AppState, ComposedPrompt, Config, GenerationRequest, HttpRelayClient, Language, NoticeLevel,
    NotificationSink, Orchestrator, Phase, Relay, SessionHandle, Tone, TracingSink, User,
    KNOWN_MODELS,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Writing assistant relay for LLM chat-completion APIs")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.scribe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate text through a running relay
    Generate {
        #[command(flatten)]
        form: FormArgs,

        /// Relay base URL
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Signed-in user (email) to attribute the request to
        #[arg(long)]
        user: Option<String>,

        /// Send notices to the log instead of the terminal
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the composed prompt for a form without sending it
    Prompt {
        #[command(flatten)]
        form: FormArgs,
    },

    /// List selectable models
    Models,

    /// Show configuration path and effective values
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Writing form fields
#[derive(Args)]
struct FormArgs {
    /// Model id (see `scribe models`)
    #[arg(short, long)]
    model: Option<String>,

    /// Topic keywords, e.g. "quantum computing, future trends"
    #[arg(short, long)]
    keywords: Option<String>,

    /// Topic background or writing requirements
    #[arg(short, long)]
    description: Option<String>,

    /// zh, en, ja (or 中文, 英文, 日文)
    #[arg(short, long, default_value = "zh")]
    language: String,

    /// formal, friendly, professional, humorous, informal
    #[arg(short, long, default_value = "professional")]
    tone: String,

    /// Persona for the model, e.g. "You are a senior market analyst."
    #[arg(short, long)]
    role: Option<String>,
}

impl FormArgs {
    fn into_request(self, default_model: &str) -> GenerationRequest {
        if Language::parse(&self.language).is_none() {
            eprintln!(
                "{} unknown language '{}', using {}",
                "note:".yellow(),
                self.language,
                Language::default().code()
            );
        }
        if Tone::parse(&self.tone).is_none() {
            eprintln!(
                "{} unknown tone '{}', using {}",
                "note:".yellow(),
                self.tone,
                Tone::default().code()
            );
        }

        GenerationRequest {
            model: self.model.unwrap_or_else(|| default_model.to_string()),
            keywords: self.keywords.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            language: Language::parse_or_default(&self.language),
            tone: Tone::parse_or_default(&self.tone),
            role: self.role,
        }
    }
}

/// Prints notices to stderr
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => "info".cyan(),
            NoticeLevel::Warning => "warning".yellow(),
            NoticeLevel::Error => "error".red(),
            NoticeLevel::Success => "✓".green(),
        };
        eprintln!("{} {}", tag, message);
    }

    fn phase_changed(&self, phase: Phase) {
        if phase == Phase::Calling {
            eprint!("{}", "Generating... ".dimmed());
            let _ = std::io::stderr().flush();
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)?
            .with_context(|| format!("Config file {} not found", path.display())),
        None => Config::load_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env.local wins over .env; neither is required
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            if std::env::var(&config.upstream.api_key_env).is_err() {
                eprintln!(
                    "{} {} is not set; generation requests will fail until it is",
                    "warning:".yellow(),
                    config.upstream.api_key_env
                );
            }

            println!("Starting relay on http://{}...", config.server.bind_addr());
            let state = Arc::new(AppState::new(Relay::from_config(&config)));
            scribe::run_server(&config.server, state).await?;
        }

        Commands::Generate {
            form,
            endpoint,
            user,
            quiet,
        } => {
            let endpoint = endpoint.unwrap_or_else(|| config.client.endpoint.clone());
            let request = form.into_request(&config.client.model);
            let session = SessionHandle::new(user.map(|email| User::new(&email).with_email(email)));

            let sink: Arc<dyn NotificationSink> = if quiet {
                Arc::new(TracingSink)
            } else {
                Arc::new(ConsoleSink)
            };

            let mut orchestrator = Orchestrator::new(Arc::new(HttpRelayClient::new(&endpoint)), sink)
                .with_identity(Arc::new(session))
                .with_form(request);

            let outcome = orchestrator.generate().await;
            if !outcome.is_success() {
                std::process::exit(1);
            }
            println!("{}", orchestrator.output());
        }

        Commands::Prompt { form } => {
            let request = form.into_request(&config.client.model);
            let prompt = ComposedPrompt::compose(&request);
            println!("{}", "System:".bold());
            println!("{}\n", prompt.system);
            println!("{}", "User:".bold());
            println!("{}", prompt.user);
        }

        Commands::Models => {
            println!("Models:\n");
            for model in KNOWN_MODELS {
                let marker = if model.id == config.client.model { "*" } else { " " };
                let tier = if model.free { "free" } else { "paid" };
                println!("  {} {:<40} {}", marker, model.id, tier.dimmed());
            }
        }

        Commands::Config { init } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::path()?,
            };

            if init {
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    Config::default().save_to(&path)?;
                    println!("{} Wrote default config to {}", "✓".green(), path.display());
                }
                return Ok(());
            }

            let status = if path.exists() { "" } else { " (not found, using defaults)" };
            println!("Config: {}{}\n", path.display(), status);
            print!("{}", toml::to_string_pretty(&config).context("Failed to render config")?);
        }
    }

    Ok(())
}
