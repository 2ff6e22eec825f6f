#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use yt_mix_dl::browser::{BrowserLauncher, BrowserSession};
use yt_mix_dl::error::{Error, Result};
use yt_mix_dl::media::{DownloadOptions, MediaDownloader, MediaInfo, TransferProgress};
use yt_mix_dl::progress::{ProgressEvent, ProgressSink};

/// Collects every event it is notified with.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl ProgressSink for RecordingSink {
    fn notify(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn watch_href(id: &str) -> Option<String> {
    Some(format!("/watch?v={}&list=RDmix&index=1&pp=iAQB", id))
}

/// Anchors `vid0 .. vid{n-1}` as the page would render them.
pub fn page_with(n: usize) -> Vec<Option<String>> {
    (0..n).map(|i| watch_href(&format!("vid{}", i))).collect()
}

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub scripts: usize,
    pub queries: usize,
}

/// Serves a scripted sequence of pages; the last one repeats once the script runs out.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub log: Arc<Mutex<BrowserLog>>,
    rounds: Vec<Vec<Option<String>>>,
    fail_launch: bool,
    fail_navigate: bool,
}

impl FakeBrowser {
    pub fn with_rounds(rounds: Vec<Vec<Option<String>>>) -> Self {
        Self {
            rounds,
            ..Self::default()
        }
    }

    pub fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub fn failing_navigation() -> Self {
        Self {
            fail_navigate: true,
            ..Self::default()
        }
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(Error::Config("browser could not start".to_string()));
        }
        self.log.lock().unwrap().launches += 1;
        Ok(Box::new(FakeSession {
            log: Arc::clone(&self.log),
            rounds: self.rounds.clone(),
            fail_navigate: self.fail_navigate,
        }))
    }
}

struct FakeSession {
    log: Arc<Mutex<BrowserLog>>,
    rounds: Vec<Vec<Option<String>>>,
    fail_navigate: bool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.fail_navigate {
            return Err(Error::Config("navigation failed".to_string()));
        }
        self.log.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<()> {
        self.log.lock().unwrap().scripts += 1;
        Ok(())
    }

    async fn attribute_values(
        &mut self,
        _selector: &str,
        _attribute: &str,
    ) -> Result<Vec<Option<String>>> {
        let mut log = self.log.lock().unwrap();
        let round = log.queries.min(self.rounds.len().saturating_sub(1));
        log.queries += 1;
        Ok(self.rounds.get(round).cloned().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// How the fake downloader treats a video id.
#[derive(Clone, Copy, PartialEq)]
pub enum Behavior {
    Succeed,
    Fail,
    NoMetadata,
}

#[derive(Clone, Default)]
pub struct FakeDownloader {
    failing: HashSet<String>,
    silent: HashSet<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeDownloader {
    pub fn with(behaviors: &[(&str, Behavior)]) -> Self {
        let mut fake = Self::default();
        for (id, behavior) in behaviors {
            match behavior {
                Behavior::Fail => {
                    fake.failing.insert(id.to_string());
                }
                Behavior::NoMetadata => {
                    fake.silent.insert(id.to_string());
                }
                Behavior::Succeed => {}
            }
        }
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Option<MediaInfo>> {
        self.calls.lock().unwrap().push(url.to_string());
        let id = url.rsplit("v=").next().unwrap_or_default().to_string();
        assert!(options.output_template.to_string_lossy().ends_with("%(title)s.%(ext)s"));

        if self.failing.contains(&id) {
            return Err(Error::Download(format!("simulated failure for {}", id)));
        }
        on_progress(TransferProgress {
            percent: "100.0%".to_string(),
            total_size: "1.00MiB".to_string(),
        });
        if self.silent.contains(&id) {
            return Ok(None);
        }
        Ok(Some(MediaInfo {
            id: id.clone(),
            title: Some(format!("Title {}", id)),
            filepath: None,
        }))
    }
}
