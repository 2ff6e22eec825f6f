use crate::browser::{BrowserLauncher, BrowserSession, SCROLL_TO_BOTTOM};
use crate::collected::CollectedSet;
use crate::config::ScrapeSettings;
use crate::error::{Error, Result};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::video_url::{VideoUrl, is_watch_href};

/// Result of one scrape session.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// At most the requested number of videos, in discovery order.
    pub urls: Vec<VideoUrl>,
    /// The page stopped producing new entries before the requested count was reached.
    pub exhausted: bool,
}

/// Collects the videos of a mix by scrolling its page until enough rows have loaded.
pub struct MixScraper<'a, L: BrowserLauncher> {
    launcher: L,
    settings: ScrapeSettings,
    sink: &'a dyn ProgressSink,
}

impl<'a, L: BrowserLauncher> MixScraper<'a, L> {
    pub fn new(launcher: L, settings: ScrapeSettings, sink: &'a dyn ProgressSink) -> Self {
        Self {
            launcher,
            settings,
            sink,
        }
    }

    /// Collect up to `count` unique videos from the mix at `mix_url`.
    ///
    /// The browser session is closed before returning, whether collection succeeded or not.
    pub async fn collect(&self, mix_url: &str, count: usize) -> Result<ScrapeOutcome> {
        if count == 0 {
            return Err(Error::Config("video count must be at least 1".to_string()));
        }

        let mut session = self.launcher.launch().await?;
        let collected = self.scroll_and_collect(session.as_mut(), mix_url, count).await;
        let closed = session.close().await;

        let (collected, exhausted) = collected?;
        if let Err(e) = closed {
            // Everything is already collected, a failed quit does not invalidate it
            log::warn!("Failed to close browser session: {}", e);
        }

        Ok(ScrapeOutcome {
            urls: collected.into_truncated(count),
            exhausted,
        })
    }

    async fn scroll_and_collect(
        &self,
        session: &mut dyn BrowserSession,
        mix_url: &str,
        count: usize,
    ) -> Result<(CollectedSet, bool)> {
        self.sink.notify(&ProgressEvent::LoadingPlaylist);
        session.navigate(mix_url).await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        let mut collected = CollectedSet::new();
        let mut stalled_rounds = 0;

        while collected.len() < count {
            session.execute_script(SCROLL_TO_BOTTOM).await?;
            tokio::time::sleep(self.settings.render_delay).await;

            let hrefs = session
                .attribute_values(&self.settings.selector, "href")
                .await?;
            let before = collected.len();
            harvest(&mut collected, hrefs);
            collected.dedup();

            self.sink.notify(&ProgressEvent::Found {
                count: collected.len(),
            });
            log::debug!(
                "Scroll round added {} videos ({} total)",
                collected.len() - before,
                collected.len()
            );

            if collected.len() >= count {
                break;
            }

            if collected.len() == before {
                stalled_rounds += 1;
                if stalled_rounds >= self.settings.stall_rounds {
                    self.sink.notify(&ProgressEvent::Exhausted {
                        count: collected.len(),
                        requested: count,
                    });
                    return Ok((collected, true));
                }
            } else {
                stalled_rounds = 0;
            }
        }

        Ok((collected, false))
    }
}

/// Add every watch href to `collected`, skipping missing attributes and unparsable addresses.
fn harvest(collected: &mut CollectedSet, hrefs: Vec<Option<String>>) {
    for href in hrefs.into_iter().flatten() {
        if !is_watch_href(&href) {
            continue;
        }
        match VideoUrl::parse(&href) {
            Ok(url) => {
                collected.insert(url);
            }
            Err(e) => log::debug!("Skipping anchor: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_ignores_missing_and_foreign_hrefs() {
        let mut collected = CollectedSet::new();
        harvest(
            &mut collected,
            vec![
                Some("/watch?v=one&list=RDone&index=1".to_string()),
                None,
                Some("/@someone".to_string()),
                Some("/watch?v=two&list=RDone&index=2".to_string()),
                Some("https://www.youtube.com/watch?v=one&pp=sAQB".to_string()),
                Some("/watch?v=&list=RDone".to_string()),
            ],
        );

        let ids: Vec<&str> = collected.iter().map(|u| u.id()).collect();
        assert_eq!(ids, vec!["one", "two"]);
    }
}
