use std::path::PathBuf;

use clap::{Parser, Subcommand};

use yt_mix_dl::commands;
use yt_mix_dl::config::{DEFAULT_VIDEO_COUNT, Settings, load_env};
use yt_mix_dl::error::Result;

#[derive(Parser)]
#[command(name = "yt-mix-dl")]
#[command(about = "Collect the videos of a YouTube Mix and download them with yt-dlp")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the browser used to load the mix page
#[derive(clap::Args)]
struct BrowserArgs {
    /// WebDriver server URL (default: http://localhost:9515)
    #[arg(long)]
    webdriver: Option<String>,

    /// Start this chromedriver binary for the session
    #[arg(long)]
    chromedriver: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the videos of a mix
    Download {
        /// Mix URL (e.g., https://www.youtube.com/watch?v=ID&list=RDID)
        url: String,

        /// Number of videos to download (default: 25)
        #[arg(short = 'n', long, default_value_t = DEFAULT_VIDEO_COUNT)]
        count: usize,

        /// Output directory (default: downloads)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Print the video URLs of a mix without downloading
    List {
        /// Mix URL
        url: String,

        /// Number of videos to collect (default: 25)
        #[arg(short = 'n', long, default_value_t = DEFAULT_VIDEO_COUNT)]
        count: usize,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Write a config file with the WebDriver URL and yt-dlp location
    Init {
        /// WebDriver server URL
        #[arg(long)]
        webdriver: Option<String>,

        /// Path to the yt-dlp binary
        #[arg(long)]
        ytdlp: Option<PathBuf>,

        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn settings_with(browser: BrowserArgs) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(url) = browser.webdriver {
        settings.browser.webdriver_url = url;
    }
    if let Some(path) = browser.chromedriver {
        settings.browser.chromedriver = Some(path);
    }
    if browser.headed {
        settings.browser.headless = false;
    }
    Ok(settings)
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Download {
            url,
            count,
            output,
            browser,
        } => commands::download::run(&url, count, output, settings_with(browser)?).await,
        Commands::List {
            url,
            count,
            browser,
        } => commands::list::run(&url, count, settings_with(browser)?).await,
        Commands::Init {
            webdriver,
            ytdlp,
            force,
        } => commands::init::run(webdriver, ytdlp, force),
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    load_env();
    pretty_env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        log::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
