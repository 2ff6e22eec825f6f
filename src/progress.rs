use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

/// Status updates emitted while scraping and downloading.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Starting,
    LoadingPlaylist,
    Found { count: usize },
    /// The page stopped producing new entries before the requested count was reached.
    Exhausted { count: usize, requested: usize },
    ItemStarted { index: usize, total: usize },
    Transfer { percent: String, total_size: String },
    Downloaded { title: String },
    Failed { message: String },
    Finished { successful: usize },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Starting => write!(f, "Starting YouTube Mix downloader..."),
            ProgressEvent::LoadingPlaylist => write!(f, "Loading playlist page..."),
            ProgressEvent::Found { count } => write!(f, "Found {} videos...", count),
            ProgressEvent::Exhausted { count, requested } => write!(
                f,
                "No more videos available: found {} of {} requested",
                count, requested
            ),
            ProgressEvent::ItemStarted { index, total } => {
                write!(f, "[{}/{}] Processing video...", index, total)
            }
            ProgressEvent::Transfer { percent, total_size } => {
                write!(f, "Downloading: {} of {}", percent, total_size)
            }
            ProgressEvent::Downloaded { title } => {
                write!(f, "Successfully downloaded: {}", title)
            }
            ProgressEvent::Failed { message } => {
                write!(f, "Error downloading video: {}", message)
            }
            ProgressEvent::Finished { successful } => write!(
                f,
                "Download complete! Successfully downloaded {} videos.",
                successful
            ),
        }
    }
}

impl ProgressEvent {
    /// True for the events that close out a single item.
    pub fn is_item_outcome(&self) -> bool {
        matches!(self, ProgressEvent::Downloaded { .. } | ProgressEvent::Failed { .. })
    }
}

/// Receiver of progress events. Called synchronously from the scrape and download loops.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: &ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events into a channel so another task can render them.
#[derive(Debug, Clone)]
pub struct ChannelSink(UnboundedSender<ProgressEvent>);

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self(sender)
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, event: &ProgressEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.0.send(event.clone());
    }
}

/// Prints events to stderr for the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn notify(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Transfer { .. } => log::trace!("{}", event),
            ProgressEvent::Failed { .. } | ProgressEvent::Exhausted { .. } => {
                log::warn!("{}", event)
            }
            _ => log::debug!("{}", event),
        }
        eprintln!("{}", event);
    }
}
