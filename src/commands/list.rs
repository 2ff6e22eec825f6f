use crate::browser::WebDriverLauncher;
use crate::config::Settings;
use crate::error::Result;
use crate::progress::ConsoleSink;
use crate::scraper::MixScraper;
use crate::video_url::validate_mix_url;

pub async fn run(url: &str, count: usize, settings: Settings) -> Result<()> {
    validate_mix_url(url)?;

    let sink = ConsoleSink;
    let scraper = MixScraper::new(WebDriverLauncher::new(settings.browser), settings.scrape, &sink);
    let outcome = scraper.collect(url, count).await?;

    if outcome.urls.is_empty() {
        println!("No videos found in mix: {}", url);
        return Ok(());
    }

    if outcome.exhausted {
        eprintln!(
            "Only {} of {} requested videos are available.",
            outcome.urls.len(),
            count
        );
    }

    for video in &outcome.urls {
        println!("{}", video);
    }

    Ok(())
}
