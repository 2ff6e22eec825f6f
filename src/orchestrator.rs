use std::path::Path;

use crate::browser::BrowserLauncher;
use crate::config::DownloadSettings;
use crate::error::Result;
use crate::media::{DownloadOptions, MediaDownloader, MediaInfo, TransferProgress};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::scraper::MixScraper;
use crate::video_url::VideoUrl;

/// What happened to one video. Failure details only live in the progress stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub url: VideoUrl,
    pub succeeded: bool,
    pub title: Option<String>,
}

/// Running count of successful downloads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTally {
    successful: usize,
}

impl DownloadTally {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        if outcome.succeeded {
            self.successful += 1;
        }
    }

    pub fn successful(&self) -> usize {
        self.successful
    }
}

/// Create `path` if it is missing. Returns true when the directory was created by this call.
pub fn ensure_output_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    log::info!("Created output directory {}", path.display());
    Ok(true)
}

/// Downloads a list of videos one after another.
pub struct Orchestrator<'a, D: MediaDownloader> {
    downloader: D,
    settings: DownloadSettings,
    sink: &'a dyn ProgressSink,
}

impl<'a, D: MediaDownloader> Orchestrator<'a, D> {
    pub fn new(downloader: D, settings: DownloadSettings, sink: &'a dyn ProgressSink) -> Self {
        Self {
            downloader,
            settings,
            sink,
        }
    }

    /// Download a single video. Errors are reported to the sink and turned into a failed outcome.
    pub async fn download_one(&self, url: &VideoUrl) -> DownloadOutcome {
        let (succeeded, title) = match self.try_download(url).await {
            Ok(Some(info)) => {
                let title = info
                    .title
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Unknown title".to_string());
                self.sink.notify(&ProgressEvent::Downloaded {
                    title: title.clone(),
                });
                (true, Some(title))
            }
            Ok(None) => {
                self.sink.notify(&ProgressEvent::Failed {
                    message: format!("no metadata returned for {}", url),
                });
                (false, None)
            }
            Err(e) => {
                log::debug!("Download of {} failed: {}", url, e);
                self.sink.notify(&ProgressEvent::Failed {
                    message: e.to_string(),
                });
                (false, None)
            }
        };

        DownloadOutcome {
            url: url.clone(),
            succeeded,
            title,
        }
    }

    async fn try_download(&self, url: &VideoUrl) -> Result<Option<MediaInfo>> {
        ensure_output_dir(&self.settings.output_dir)?;

        let options = DownloadOptions::for_dir(&self.settings.output_dir);
        let sink = self.sink;
        let on_progress = move |progress: TransferProgress| {
            sink.notify(&ProgressEvent::Transfer {
                percent: progress.percent,
                total_size: progress.total_size,
            })
        };

        self.downloader
            .download(url.as_str(), &options, &on_progress)
            .await
    }

    /// Download the first `count` of `urls` in order and return how many succeeded.
    pub async fn download_all(&self, urls: &[VideoUrl], count: usize) -> usize {
        let items = &urls[..urls.len().min(count)];
        let total = items.len();
        let mut tally = DownloadTally::default();

        for (i, url) in items.iter().enumerate() {
            self.sink.notify(&ProgressEvent::ItemStarted {
                index: i + 1,
                total,
            });
            let outcome = self.download_one(url).await;
            tally.record(&outcome);

            if i + 1 < total {
                tokio::time::sleep(self.settings.inter_item_delay).await;
            }
        }

        self.sink.notify(&ProgressEvent::Finished {
            successful: tally.successful(),
        });
        tally.successful()
    }
}

/// Scrape the mix at `mix_url`, then download up to `count` of its videos.
pub async fn download_mix<L, D>(
    scraper: &MixScraper<'_, L>,
    orchestrator: &Orchestrator<'_, D>,
    sink: &dyn ProgressSink,
    mix_url: &str,
    count: usize,
) -> Result<usize>
where
    L: BrowserLauncher,
    D: MediaDownloader,
{
    sink.notify(&ProgressEvent::Starting);

    let outcome = scraper.collect(mix_url, count).await?;
    if outcome.exhausted {
        log::info!(
            "Mix only offered {} of {} requested videos",
            outcome.urls.len(),
            count
        );
    }

    Ok(orchestrator.download_all(&outcome.urls, count).await)
}
