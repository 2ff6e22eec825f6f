pub mod browser;
pub mod collected;
pub mod commands;
pub mod config;
pub mod error;
pub mod media;
pub mod orchestrator;
pub mod progress;
pub mod scraper;
pub mod video_url;
