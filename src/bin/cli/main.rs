mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use aralin_lib::content::ContentKind;

#[derive(Parser)]
#[command(name = "aralin-cli", about = "Aralin learning server and content tools", version)]
struct Cli {
    /// Config file (default: <data dir>/aralin/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum KindArg {
    Quiz,
    Flashcards,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Quiz => ContentKind::Quiz,
            KindArg::Flashcards => ContentKind::Flashcards,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API until interrupted
    Serve {
        /// Address to listen on (overrides the config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Extract and validate quiz or flashcard JSON from model output
    Extract {
        /// Expected content kind
        kind: KindArg,
        /// File holding the model output (default: stdin)
        file: Option<PathBuf>,
    },

    /// Compute the next review schedule for one response
    Schedule {
        /// Recall quality, 0 to 5
        #[arg(long)]
        quality: i64,
        /// Current ease factor
        #[arg(long, default_value_t = aralin_lib::review::DEFAULT_EASE_FACTOR)]
        ease_factor: f64,
        /// Current interval in days
        #[arg(long, default_value_t = aralin_lib::review::DEFAULT_INTERVAL_DAYS)]
        interval: u32,
    },

    /// Generate quiz questions or flashcards with the configured model
    Generate {
        /// Content kind
        kind: KindArg,
        /// Subject name
        #[arg(long)]
        subject: String,
        /// Grade level
        #[arg(long)]
        grade: u8,
        /// Number of items
        #[arg(long, default_value = "5")]
        count: usize,
        /// Extra content for the prompt (use "-" to read from stdin)
        #[arg(long)]
        content: Option<String>,
    },
}

/// Resolve "-" as stdin
fn resolve_content(content: Option<String>) -> anyhow::Result<Option<String>> {
    match content.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            Ok(Some(buf))
        }
        _ => Ok(content),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();

    match cli.command {
        Command::Serve { bind } => {
            let app = app::App::new(cli.config.as_deref())?;
            commands::serve::run(app, bind)?;
        }
        Command::Extract { kind, file } => {
            commands::extract::run(kind.into(), file.as_deref(), &cli.format, use_color)?;
        }
        Command::Schedule {
            quality,
            ease_factor,
            interval,
        } => {
            commands::schedule::run(quality, ease_factor, interval, &cli.format, use_color)?;
        }
        Command::Generate {
            kind,
            subject,
            grade,
            count,
            content,
        } => {
            let app = app::App::new(cli.config.as_deref())?;
            let content = resolve_content(content)?;
            commands::generate::run(
                &app,
                kind.into(),
                &subject,
                grade,
                count,
                content.as_deref().unwrap_or(""),
                &cli.format,
                use_color,
            )?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
