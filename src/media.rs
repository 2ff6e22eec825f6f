use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{Error, Result};

/// Prefer mp4 video merged with m4a audio, then a single mp4, then anything.
pub const FORMAT_CHAIN: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
pub const CONTAINER: &str = "mp4";

const PROGRESS_PREFIX: &str = "[mix-progress]";
const STDERR_TAIL_LINES: usize = 20;

/// Metadata reported for a finished download
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: String,
    pub title: Option<String>,
    pub filepath: Option<String>,
}

/// Incremental transfer status, as formatted by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub percent: String,
    pub total_size: String,
}

/// Format and output policy handed to the media backend.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub format: String,
    pub merge_container: String,
    /// Post-processing step converting the result to this container.
    pub recode_container: String,
    pub output_template: PathBuf,
}

impl DownloadOptions {
    /// The fixed policy: mp4 output named after the video title inside `output_dir`.
    pub fn for_dir(output_dir: &Path) -> Self {
        Self {
            format: FORMAT_CHAIN.to_string(),
            merge_container: CONTAINER.to_string(),
            recode_container: CONTAINER.to_string(),
            output_template: output_dir.join("%(title)s.%(ext)s"),
        }
    }
}

/// Something that can fetch a video to disk.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `url`. `Ok(None)` means the backend finished without reporting metadata.
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Option<MediaInfo>>;
}

/// Find the yt-dlp binary
pub fn find_ytdlp(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Config(format!(
            "yt-dlp not found at {}",
            path.display()
        )));
    }

    // Try common locations
    let paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];

    for path in paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    // Try PATH
    if let Ok(output) = std::process::Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
    }

    Err(Error::Download(
        "yt-dlp not found. Install it with: pip install yt-dlp".to_string(),
    ))
}

/// The yt-dlp command line tool.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Locate the binary, preferring the configured path.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        Ok(Self::new(find_ytdlp(configured)?))
    }
}

/// Arguments for one download.
fn build_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    vec![
        "-f".to_string(),
        options.format.clone(),
        "--merge-output-format".to_string(),
        options.merge_container.clone(),
        "--recode-video".to_string(),
        options.recode_container.clone(),
        "-o".to_string(),
        options.output_template.to_string_lossy().to_string(),
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--progress".to_string(),
        "--progress-template".to_string(),
        format!(
            "download:{} %(progress._percent_str)s of %(progress._total_bytes_str)s",
            PROGRESS_PREFIX
        ),
        "--print".to_string(),
        "after_move:%(.{id,title,filepath})j".to_string(),
        url.to_string(),
    ]
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[mix-progress\]\s+(\S+)\s+of\s+(.+?)\s*$").expect("valid progress regex")
    })
}

/// Parse one progress line emitted through the progress template.
pub fn parse_progress(line: &str) -> Option<TransferProgress> {
    let captures = progress_regex().captures(line.trim())?;
    Some(TransferProgress {
        percent: captures[1].to_string(),
        total_size: match captures[2].trim() {
            "NA" | "N/A" | "" => "Unknown".to_string(),
            size => size.to_string(),
        },
    })
}

/// Parse the metadata line printed after the file has been moved into place.
fn parse_info(line: &str) -> Option<MediaInfo> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(info) => Some(info),
        Err(e) => {
            log::debug!("Ignoring unparsable metadata line {:?}: {}", line, e);
            None
        }
    }
}

/// Turn one raw output line into text. Invalid UTF-8 is replaced rather than rejected;
/// `None` means the stream is finished or could not be read any further.
fn decode_line(segment: std::io::Result<Option<Vec<u8>>>, stream: &str) -> Option<String> {
    match segment {
        Ok(Some(bytes)) => {
            let line = String::from_utf8_lossy(&bytes);
            Some(line.trim_end_matches('\r').to_string())
        }
        Ok(None) => None,
        Err(e) => {
            log::warn!("Stopped reading yt-dlp {}: {}", stream, e);
            None
        }
    }
}

#[async_trait]
impl MediaDownloader for YtDlp {
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Option<MediaInfo>> {
        let args = build_args(url, options);
        log::debug!("Running {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Download("yt-dlp stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Download("yt-dlp stderr not captured".to_string()))?;

        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;

        let mut info = None;
        let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        // Progress may land on either stream depending on the yt-dlp version.
        // Only the exit status decides failure, so unreadable output just ends that stream.
        while stdout_open || stderr_open {
            tokio::select! {
                segment = stdout.next_segment(), if stdout_open => match decode_line(segment, "stdout") {
                    Some(line) => {
                        log::trace!("yt-dlp stdout: {}", line);
                        if let Some(progress) = parse_progress(&line) {
                            on_progress(progress);
                        } else if let Some(parsed) = parse_info(&line) {
                            info = Some(parsed);
                        }
                    }
                    None => stdout_open = false,
                },
                segment = stderr.next_segment(), if stderr_open => match decode_line(segment, "stderr") {
                    Some(line) => {
                        log::trace!("yt-dlp stderr: {}", line);
                        if let Some(progress) = parse_progress(&line) {
                            on_progress(progress);
                        } else {
                            if stderr_tail.len() == STDERR_TAIL_LINES {
                                stderr_tail.pop_front();
                            }
                            stderr_tail.push_back(line);
                        }
                    }
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let lines: Vec<String> = stderr_tail.into_iter().collect();
            let message = lines
                .iter()
                .rev()
                .find(|line| line.contains("ERROR"))
                .cloned()
                .unwrap_or_else(|| lines.join("\n"));
            return Err(Error::Download(if message.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                message
            }));
        }

        Ok(info)
    }
}
