use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_VIDEO_COUNT: usize = 25;

/// Anchors of the rows in the playlist side panel of a watch page.
pub const PLAYLIST_ROW_SELECTOR: &str =
    "a.yt-simple-endpoint.style-scope.ytd-playlist-panel-video-renderer";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Get the base data directory (~/.yt-mix-dl/)
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        std::env::var("YT_MIX_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".yt-mix-dl")
            })
    })
}

/// Get the .env file path
pub fn env_file_path() -> PathBuf {
    data_dir().join(".env")
}

/// Load environment variables from the data directory's .env file
pub fn load_env() {
    let env_path = env_file_path();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    } else {
        // Try current directory as fallback
        let _ = dotenvy::dotenv();
    }
}

/// Timing and termination knobs of the scroll-and-collect loop.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Wait after the initial navigation.
    pub settle_delay: Duration,
    /// Wait after each scroll before harvesting anchors.
    pub render_delay: Duration,
    /// Consecutive rounds without a new entry before the page counts as exhausted.
    pub stall_rounds: usize,
    pub selector: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            render_delay: Duration::from_secs(2),
            stall_rounds: 3,
            selector: PLAYLIST_ROW_SELECTOR.to_string(),
        }
    }
}

impl ScrapeSettings {
    /// No waiting at all, for fakes that render instantly.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            render_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    /// Pause between two consecutive downloads.
    pub inter_item_delay: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            inter_item_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    /// When set, this chromedriver binary is started for every session.
    pub chromedriver: Option<PathBuf>,
    pub user_agent: String,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            chromedriver: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
        }
    }
}

/// Everything the CLI needs, resolved from the environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub browser: BrowserSettings,
    pub scrape: ScrapeSettings,
    pub download: DownloadSettings,
    pub ytdlp: Option<PathBuf>,
}

impl Settings {
    /// Read `YT_MIX_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(url) = lookup("YT_MIX_WEBDRIVER_URL") {
            settings.browser.webdriver_url = url;
        }
        if let Some(path) = lookup("YT_MIX_CHROMEDRIVER") {
            settings.browser.chromedriver = Some(PathBuf::from(path));
        }
        if let Some(agent) = lookup("YT_MIX_USER_AGENT") {
            settings.browser.user_agent = agent;
        }
        if let Some(value) = lookup("YT_MIX_HEADLESS") {
            settings.browser.headless = parse_bool("YT_MIX_HEADLESS", &value)?;
        }
        if let Some(path) = lookup("YT_MIX_YTDLP") {
            settings.ytdlp = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("YT_MIX_OUTPUT_DIR") {
            settings.download.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("YT_MIX_SETTLE_DELAY_MS") {
            settings.scrape.settle_delay = parse_millis("YT_MIX_SETTLE_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("YT_MIX_RENDER_DELAY_MS") {
            settings.scrape.render_delay = parse_millis("YT_MIX_RENDER_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("YT_MIX_INTER_ITEM_DELAY_MS") {
            settings.download.inter_item_delay =
                parse_millis("YT_MIX_INTER_ITEM_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("YT_MIX_STALL_ROUNDS") {
            let rounds: usize = value.trim().parse().map_err(|_| {
                Error::Config(format!("YT_MIX_STALL_ROUNDS must be a number, got {:?}", value))
            })?;
            if rounds == 0 {
                return Err(Error::Config("YT_MIX_STALL_ROUNDS must be at least 1".to_string()));
            }
            settings.scrape.stall_rounds = rounds;
        }
        if let Some(selector) = lookup("YT_MIX_SELECTOR") {
            settings.scrape.selector = selector;
        }

        Ok(settings)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::Config(format!("{} must be milliseconds, got {:?}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got {:?}", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_documented_timings() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.scrape.settle_delay, Duration::from_secs(3));
        assert_eq!(settings.scrape.render_delay, Duration::from_secs(2));
        assert_eq!(settings.download.inter_item_delay, Duration::from_secs(1));
        assert_eq!(settings.download.output_dir, PathBuf::from("downloads"));
        assert_eq!(settings.browser.webdriver_url, DEFAULT_WEBDRIVER_URL);
        assert!(settings.browser.headless);
    }

    #[test]
    fn environment_overrides_delays_and_paths() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("YT_MIX_SETTLE_DELAY_MS", "10"),
            ("YT_MIX_RENDER_DELAY_MS", "0"),
            ("YT_MIX_INTER_ITEM_DELAY_MS", "250"),
            ("YT_MIX_OUTPUT_DIR", "/tmp/mix"),
            ("YT_MIX_HEADLESS", "no"),
            ("YT_MIX_STALL_ROUNDS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.scrape.settle_delay, Duration::from_millis(10));
        assert_eq!(settings.scrape.render_delay, Duration::ZERO);
        assert_eq!(settings.download.inter_item_delay, Duration::from_millis(250));
        assert_eq!(settings.download.output_dir, PathBuf::from("/tmp/mix"));
        assert!(!settings.browser.headless);
        assert_eq!(settings.scrape.stall_rounds, 5);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = Settings::from_lookup(lookup_from(&[("YT_MIX_RENDER_DELAY_MS", "2s")]));
        assert!(matches!(err, Err(Error::Config(_))));

        let err = Settings::from_lookup(lookup_from(&[("YT_MIX_STALL_ROUNDS", "0")]));
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
