use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context as _;

/// Fetches the captions of one video into a directory and reports its title.
pub trait CaptionDownloader {
    fn download(&self, url: &str, captions_dir: &Path) -> anyhow::Result<String>;
}

/// Shells out to `yt-dlp`; subtitles land at `<dir>/<title>.<lang>.srt`.
#[derive(Debug, Clone)]
pub struct YtDlp {
    pub bin: String,
    pub lang: String,
}

impl YtDlp {
    pub fn from_env(lang: &str) -> Self {
        let bin = std::env::var("SUMMAQUIZ_YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_owned());
        Self {
            bin,
            lang: lang.to_owned(),
        }
    }

    fn command(&self, url: &str, captions_dir: &Path) -> Command {
        let template = captions_dir.join("%(title)s.%(ext)s");
        let mut cmd = Command::new(&self.bin);
        cmd.args([
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            &self.lang,
            "--sub-format",
            "srt/best",
            "--convert-subs",
            "srt",
            "--no-simulate",
            "--print",
            "title",
            "--no-progress",
            "-o",
        ]);
        cmd.arg(template);
        cmd.arg(url);
        cmd
    }
}

impl CaptionDownloader for YtDlp {
    fn download(&self, url: &str, captions_dir: &Path) -> anyhow::Result<String> {
        std::fs::create_dir_all(captions_dir)
            .with_context(|| format!("create captions dir: {}", captions_dir.display()))?;

        tracing::info!(bin = %self.bin, lang = %self.lang, url, "fetch captions");

        let output = self
            .command(url, captions_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("spawn caption downloader: {}", self.bin))?;
        if !output.status.success() {
            anyhow::bail!("caption downloader failed for {url} ({})", output.status);
        }

        let stdout = String::from_utf8(output.stdout)
            .context("caption downloader stdout is not valid UTF-8")?;
        let title = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| anyhow::anyhow!("caption downloader printed no title for {url}"))?;
        Ok(title.to_owned())
    }
}
