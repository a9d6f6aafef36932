mod generate;
mod listing;
mod promptgen;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use nanobanana_contracts::models::{
    ResolutionTier, DEFAULT_ASPECT_RATIO, DEFAULT_MODEL, DEFAULT_TEXT_MODEL,
};
use nanobanana_contracts::prompts::PromptTemplate;
use nanobanana_engine::{ClientConfig, HttpGenAiClient};

const INTERRUPTED_EXIT_CODE: i32 = 130;
const WORKSPACE_MODULES: [&str; 3] = ["nanobanana", "nanobanana_contracts", "nanobanana_engine"];

#[derive(Debug, Parser)]
#[command(
    name = "nanobanana",
    version,
    about = "Generate images with Gemini and Imagen models from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image from a prompt and optional reference images.
    Generate(GenerateArgs),
    /// Refine an image over several invocations, threading the previous output forward.
    GenerateConversation(ConversationArgs),
    /// Expand a short description into a detailed image prompt.
    Promptgen(PromptgenArgs),
    /// List supported image models with pricing.
    ListModels,
    /// List supported aspect ratios and their baseline resolutions.
    ListAspectRatios,
}

/// Credentials and endpoint selection. Unset values fall back to the environment.
#[derive(Debug, Clone, Args)]
struct AuthArgs {
    /// Overrides GOOGLE_API_KEY / GEMINI_API_KEY.
    #[arg(long)]
    api_key: Option<String>,
    /// Use Vertex AI instead of the Gemini Developer API.
    #[arg(long)]
    use_vertex: bool,
    /// Google Cloud project (Vertex AI).
    #[arg(long)]
    project: Option<String>,
    /// Google Cloud location (Vertex AI).
    #[arg(long)]
    location: Option<String>,
    /// OAuth access token (Vertex AI), e.g. from `gcloud auth print-access-token`.
    #[arg(long)]
    access_token: Option<String>,
}

impl AuthArgs {
    fn client(&self) -> Result<HttpGenAiClient> {
        let method = if self.use_vertex {
            "Vertex AI"
        } else {
            "Gemini Developer API"
        };
        log::info!("Authenticating with {method}...");
        let client = HttpGenAiClient::from_config(&ClientConfig {
            api_key: self.api_key.clone(),
            use_vertex: self.use_vertex,
            project: self.project.clone(),
            location: self.location.clone(),
            access_token: self.access_token.clone(),
        })?;
        log::debug!("Client created successfully");
        Ok(client)
    }
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    /// Prompt text.
    prompt: Option<String>,
    /// Output image path.
    #[arg(short, long)]
    output: PathBuf,
    /// Read the prompt from a file.
    #[arg(short = 'f', long)]
    prompt_file: Option<PathBuf>,
    /// Read the prompt from standard input.
    #[arg(short, long)]
    stdin: bool,
    /// Reference image; repeat for several.
    #[arg(short = 'i', long = "image")]
    images: Vec<PathBuf>,
    #[arg(short, long, default_value = DEFAULT_ASPECT_RATIO)]
    aspect_ratio: String,
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,
    /// 1K, 2K or 4K; ignored by models with a fixed resolution.
    #[arg(short, long)]
    resolution: Option<ResolutionTier>,
    /// Enhance the prompt with a text model before generating.
    #[arg(long)]
    promptgen: bool,
    #[arg(long, requires = "promptgen")]
    promptgen_template: Option<PromptTemplate>,
    #[command(flatten)]
    auth: AuthArgs,
    /// -v info, -vv debug, -vvv trace including HTTP internals.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Parser)]
struct ConversationArgs {
    prompt: String,
    #[arg(short, long)]
    output: PathBuf,
    /// Conversation file to continue; created when missing.
    #[arg(short = 'f', long = "file")]
    conversation_file: Option<PathBuf>,
    /// Only used for new conversations.
    #[arg(short, long, default_value = DEFAULT_ASPECT_RATIO)]
    aspect_ratio: String,
    /// Only used for new conversations.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(short, long)]
    resolution: Option<ResolutionTier>,
    #[command(flatten)]
    auth: AuthArgs,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Parser)]
struct PromptgenArgs {
    description: Option<String>,
    #[arg(short = 'd', long = "description")]
    description_opt: Option<String>,
    #[arg(short, long)]
    template: Option<PromptTemplate>,
    /// Category hint; overrides detection.
    #[arg(short, long)]
    category: Option<String>,
    /// Style hint such as watercolor or anime.
    #[arg(short, long)]
    style: Option<String>,
    #[arg(long)]
    stdin: bool,
    /// Write the output to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
    /// Human-readable analysis instead of the bare prompt.
    #[arg(short, long)]
    verbose: bool,
    #[arg(long)]
    list_templates: bool,
    #[arg(short, long, default_value = DEFAULT_TEXT_MODEL)]
    model: String,
    #[command(flatten)]
    auth: AuthArgs,
}

fn main() {
    if let Err(err) = install_interrupt_handler() {
        eprintln!("Warning: could not install interrupt handler: {err}");
    }
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            report_error(&err);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => {
            init_logging(args.verbose);
            generate::run_generate(args)
        }
        Command::GenerateConversation(args) => {
            init_logging(args.verbose);
            generate::run_conversation(args)
        }
        Command::Promptgen(args) => {
            init_logging(0);
            promptgen::run_promptgen(args)
        }
        Command::ListModels => {
            print!("{}", listing::render_models());
            Ok(())
        }
        Command::ListAspectRatios => {
            print!("{}", listing::render_aspect_ratios());
            Ok(())
        }
    }
}

/// Ctrl-C exits with a status of its own instead of dying by signal.
fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        eprintln!("Operation interrupted by user");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}

/// One line on stderr per failure. The full chain is only logged at debug.
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<nanobanana_engine::Error>() {
        Some(typed) => eprintln!("{}: {typed}", typed.kind()),
        None => eprintln!("Unexpected error: {err}"),
    }
    log::debug!("Error details: {err:?}");
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level_for(verbose));
    if verbose == 2 {
        for module in WORKSPACE_MODULES {
            builder.filter_module(module, LevelFilter::Debug);
        }
    }
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

/// Global level; `-vv` additionally raises this workspace's crates to debug.
fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 | 2 => LevelFilter::Info,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use log::LevelFilter;
    use nanobanana_contracts::models::ResolutionTier;
    use nanobanana_contracts::prompts::PromptTemplate;

    use super::{install_interrupt_handler, level_for, Cli, Command, INTERRUPTED_EXIT_CODE};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Info);
        assert_eq!(level_for(3), LevelFilter::Trace);
        assert_eq!(level_for(7), LevelFilter::Trace);
    }

    #[test]
    fn interrupt_handler_installs_with_distinct_exit_code() {
        assert_eq!(INTERRUPTED_EXIT_CODE, 130);
        assert!(install_interrupt_handler().is_ok());
    }

    #[test]
    fn generate_parses_repeated_images_and_tier() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "nanobanana", "generate", "a cat", "-o", "cat.png", "-i", "a.png", "-i", "b.jpg",
            "-r", "2K", "-vv",
        ])?;
        let Command::Generate(args) = cli.command else {
            anyhow::bail!("expected generate");
        };
        assert_eq!(args.prompt.as_deref(), Some("a cat"));
        assert_eq!(args.images.len(), 2);
        assert_eq!(args.resolution, Some(ResolutionTier::TwoK));
        assert_eq!(args.aspect_ratio, "1:1");
        assert_eq!(args.model, "gemini-2.5-flash-image");
        assert_eq!(args.verbose, 2);
        Ok(())
    }

    #[test]
    fn promptgen_template_requires_promptgen() {
        assert!(Cli::try_parse_from([
            "nanobanana", "generate", "x", "-o", "x.png", "--promptgen-template", "logo",
        ])
        .is_err());

        let parsed = Cli::try_parse_from([
            "nanobanana", "generate", "x", "-o", "x.png", "--promptgen", "--promptgen-template",
            "Logo",
        ]);
        assert!(matches!(
            parsed.map(|cli| cli.command),
            Ok(Command::Generate(args)) if args.promptgen_template == Some(PromptTemplate::Logo)
        ));
    }

    #[test]
    fn bad_resolution_is_a_usage_error() {
        assert!(Cli::try_parse_from(["nanobanana", "generate", "x", "-o", "x.png", "-r", "8K"])
            .is_err());
    }

    #[test]
    fn conversation_file_flag_is_optional() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "nanobanana", "generate-conversation", "more orange", "-o", "two.png", "--file",
            "conv.json",
        ])?;
        let Command::GenerateConversation(args) = cli.command else {
            anyhow::bail!("expected generate-conversation");
        };
        assert_eq!(
            args.conversation_file.as_deref(),
            Some(std::path::Path::new("conv.json"))
        );
        Ok(())
    }
}
