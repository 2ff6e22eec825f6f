use std::path::PathBuf;

use crate::browser::WebDriverLauncher;
use crate::config::Settings;
use crate::error::Result;
use crate::media::YtDlp;
use crate::orchestrator::{Orchestrator, download_mix};
use crate::progress::ConsoleSink;
use crate::scraper::MixScraper;
use crate::video_url::validate_mix_url;

pub async fn run(
    url: &str,
    count: usize,
    output_dir: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    validate_mix_url(url)?;

    let mut download_settings = settings.download;
    if let Some(dir) = output_dir {
        download_settings.output_dir = dir;
    }
    let output_dir = download_settings.output_dir.clone();

    // Fail before opening a browser if there is nothing to download with
    let ytdlp = YtDlp::locate(settings.ytdlp.as_deref())?;

    let sink = ConsoleSink;
    let scraper = MixScraper::new(WebDriverLauncher::new(settings.browser), settings.scrape, &sink);
    let orchestrator = Orchestrator::new(ytdlp, download_settings, &sink);

    let downloaded = download_mix(&scraper, &orchestrator, &sink, url, count).await?;

    println!("{} video(s) saved to {}", downloaded, output_dir.display());
    Ok(())
}
