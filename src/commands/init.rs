use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::{DEFAULT_WEBDRIVER_URL, data_dir, env_file_path};
use crate::error::Result;
use crate::media::find_ytdlp;

pub fn run(webdriver: Option<String>, ytdlp: Option<PathBuf>, force: bool) -> Result<()> {
    std::fs::create_dir_all(data_dir())?;

    let env_file = env_file_path();

    if env_file.exists() && !force {
        println!("Config already exists at {}", env_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    let ytdlp = match ytdlp {
        Some(path) => Some(find_ytdlp(Some(&path))?),
        None => find_ytdlp(None).ok(),
    };
    if ytdlp.is_none() {
        eprintln!("Warning: yt-dlp was not found, downloads will fail until it is installed.");
    }

    let contents = render_env(
        webdriver.as_deref().unwrap_or(DEFAULT_WEBDRIVER_URL),
        ytdlp.as_deref(),
    );
    std::fs::write(&env_file, contents)?;

    println!("Config saved to {}", env_file.display());
    println!("Data directory: {}", data_dir().display());

    Ok(())
}

fn render_env(webdriver: &str, ytdlp: Option<&std::path::Path>) -> String {
    let mut contents = format!("YT_MIX_WEBDRIVER_URL={}\n", webdriver);
    if let Some(path) = ytdlp {
        let _ = writeln!(contents, "YT_MIX_YTDLP={}", path.display());
    }
    contents
}
