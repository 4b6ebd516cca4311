use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slidesynth_common::{Deck, FileHandle, NormalizedInput, SynthConfig};
use slidesynth_core::{input_capture, ErrorReporter, Session, SynthError};
use slidesynth_transport::HttpTransport;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "slidesynth", version)]
#[command(about = "Turn text or recorded audio into slide decks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Slide service base URL (e.g., http://localhost:8000)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Seconds to wait for the slide service
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Config file (.json or .toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Exactly one source to generate from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Text describing the presentation
    #[arg(long)]
    pub text: Option<String>,

    /// Audio, text or markdown file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive generate/preview/download mode
    Interactive,
    /// Generate a deck and print it
    Generate {
        #[command(flatten)]
        input: InputArgs,
        /// Print the deck as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a deck as a .pptx file
    Export {
        #[command(flatten)]
        input: InputArgs,
        /// Name of the saved file
        #[arg(long)]
        filename: Option<String>,
        /// Directory to save into
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Preview a deck saved with `generate --json`
    Preview {
        /// Path to the deck JSON
        file: PathBuf,
    },
    /// Transcribe an audio file
    Transcribe {
        file: PathBuf,
    },
    /// Check that the slide service answers
    Ping,
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Interactive));
    init_logging(cli.debug, interactive);

    match cli.command {
        Some(Commands::Interactive) | None => {
            let config = load_config(&cli)?;
            let session = Session::from_config(&config).map_err(user_error)?;
            slidesynth_tui::run_interactive(session, config.output_dir).await?;
        }
        Some(Commands::Generate { ref input, json }) => {
            let config = load_config(&cli)?;
            generate(&config, input, json).await?;
        }
        Some(Commands::Export {
            ref input,
            ref filename,
            ref out_dir,
        }) => {
            let mut config = load_config(&cli)?;
            if let Some(dir) = out_dir {
                config.output_dir = dir.clone();
            }
            export(&config, input, filename.as_deref()).await?;
        }
        Some(Commands::Preview { ref file }) => {
            slidesynth_tui::run_preview(file).await?;
        }
        Some(Commands::Transcribe { ref file }) => {
            let config = load_config(&cli)?;
            let transport = HttpTransport::from_config(&config).map_err(to_user_error)?;
            let audio = FileHandle::open(file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let text = transport.transcribe(&audio).await.map_err(to_user_error)?;
            println!("{text}");
        }
        Some(Commands::Ping) => {
            let config = load_config(&cli)?;
            let transport = HttpTransport::from_config(&config).map_err(to_user_error)?;
            let info = transport.service_info().await.map_err(to_user_error)?;
            println!("{}: {}", transport.base_url(), info.message);
        }
        Some(Commands::Config { ref action }) => match action {
            ConfigCommand::Init { path, force } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => SynthConfig::config_path()?,
                };
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                SynthConfig::default().save_to_file(&path)?;
                println!("Wrote {}", path.display());
            }
            ConfigCommand::Show => {
                let config = load_config(&cli)?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

/// File config, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<SynthConfig> {
    let mut config = SynthConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    config.validate()?;
    tracing::debug!("using slide service at {}", config.base_url);
    Ok(config)
}

fn user_error(err: SynthError) -> anyhow::Error {
    anyhow!(ErrorReporter::format_user_error(&err))
}

fn to_user_error(err: impl Into<SynthError>) -> anyhow::Error {
    user_error(err.into())
}

/// Logs go to stderr, or to a file while the TUI owns the terminal.
fn init_logging(debug: bool, interactive: bool) {
    let filter = if debug {
        EnvFilter::new("slidesynth=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slidesynth=info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if interactive {
        let path = std::env::temp_dir().join("slidesynth.log");
        match std::fs::File::create(&path) {
            Ok(file) => {
                let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
            }
            Err(_) => {
                let _ = builder.with_writer(std::io::sink).try_init();
            }
        }
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
}

async fn read_input(args: &InputArgs) -> Result<NormalizedInput> {
    if let Some(path) = &args.file {
        return input_capture::pick_path(path)
            .await
            .with_context(|| format!("reading {}", path.display()));
    }
    let raw = args.text.as_deref().unwrap_or_default();
    input_capture::from_text(raw).context("input text is empty")
}

async fn generate(config: &SynthConfig, args: &InputArgs, json: bool) -> Result<()> {
    let input = read_input(args).await?;
    let session = Session::from_config(config).map_err(user_error)?;
    session.generate(input).await;

    let state = session.state();
    if let Some(error) = state.error {
        bail!(error);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&state.deck)?);
    } else {
        print!("{}", render_deck(&state.deck));
    }
    Ok(())
}

async fn export(config: &SynthConfig, args: &InputArgs, filename: Option<&str>) -> Result<()> {
    let input = read_input(args).await?;
    let session = Session::from_config(config).map_err(user_error)?;
    let name = filename.unwrap_or(session.default_filename()).trim().to_string();
    session.download(input, Some(&name)).await;

    if let Some(error) = session.state().error {
        bail!(error);
    }
    println!("Saved {}", config.output_dir.join(name).display());
    Ok(())
}

/// Numbered slide titles with their bullets indented below.
pub fn render_deck(deck: &Deck) -> String {
    let mut out = String::new();
    for (i, slide) in deck.slides.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, slide.title));
        for bullet in &slide.bullets {
            out.push_str(&format!("   - {bullet}\n"));
        }
    }
    out
}
