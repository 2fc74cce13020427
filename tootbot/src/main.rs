//! tootbot - Generate a toot with a language model and publish it

use clap::Parser;
use libtootbot::config::Config;
use libtootbot::logging::{LogFormat, LoggingConfig};
use libtootbot::platforms::mastodon::MastodonClient;
use libtootbot::prompt::PromptSource;
use libtootbot::services::openai::OpenAiClient;
use libtootbot::{bot, Result, RunOptions, TootBot, Visibility};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "tootbot")]
#[command(version)]
#[command(about = "Generate a toot with a language model and publish it to Mastodon")]
#[command(long_about = "\
tootbot - Generate a toot with a language model and publish it to Mastodon

DESCRIPTION:
    Reads an instruction prompt, asks the completion service for a short
    post, optionally generates an illustration, and publishes the result.
    Intended to be run from cron or a systemd timer, one toot per run.

ENVIRONMENT:
    URL             Mastodon instance base address (required)
    TOKEN           Mastodon access token (required)
    OPENAI_API_KEY  Completion and image service key (required)
    VISIBILITY      direct, public, unlisted or private (default: direct)
    OPENAI_BASE_URL Override the API endpoint
    TOOTBOT_CONFIG  Path to a TOML file with content settings

    A .env file in the working directory is loaded if present.

EXIT CODES:
    0 - Toot published
    1 - Upstream service error
    2 - Configuration or prompt error
    3 - Authentication rejected by a service
    4 - Generated text stayed too long
")]
struct Cli {
    /// Path to the TOML content settings file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Prompt file (overrides text.prompt_file)
    #[arg(short, long, value_name = "PATH")]
    prompt_file: Option<String>,

    /// Post visibility (overrides VISIBILITY)
    #[arg(long, value_name = "SCOPE")]
    visibility: Option<String>,

    /// Post text only, without an illustration
    #[arg(long)]
    no_image: bool,

    /// Print the generated text instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Log output format (text, json, pretty)
    #[arg(long, env = "TOOTBOT_LOG_FORMAT", value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env(cli.verbose);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(visibility) = cli.visibility.as_deref() {
        config.visibility = visibility.parse::<Visibility>()?;
    }
    if let Some(path) = cli.prompt_file {
        config.content.text.prompt_file = path;
    }

    debug!(
        instance = %config.mastodon.instance,
        visibility = %config.visibility,
        "Configuration loaded"
    );

    let prompt = PromptSource::from_path(
        &config.content.text.prompt_file,
        config.content.text.normalize_whitespace,
    )?;

    let openai = OpenAiClient::from_config(&config)?;
    let mastodon = MastodonClient::from_config(&config.mastodon)?;

    let tootbot = TootBot {
        prompt: &prompt,
        completion: &openai,
        images: &openai,
        platform: &mastodon,
        content: &config.content,
        visibility: config.visibility,
    };

    let mut options = RunOptions::from_content(&config.content);
    options.with_image &= !cli.no_image;
    options.dry_run = cli.dry_run;

    let outcome = tootbot.run(options).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    bot::report(&outcome, &mut out)?;

    Ok(())
}
