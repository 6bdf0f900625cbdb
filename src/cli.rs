use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_CAPTION_LANG, LlmConfig};
use crate::llm::LlmEngine;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Workspace directory holding the ledger and the artifact folders.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the YouTube link ledger.
    Links {
        #[command(subcommand)]
        command: LinksCommand,
    },
    /// Fetch and summarize YouTube captions.
    Youtube {
        #[command(subcommand)]
        command: YoutubeCommand,
    },
    /// Summarize Kindle highlight exports.
    Kindle {
        #[command(subcommand)]
        command: KindleCommand,
    },
    /// Build quizzes from summaries.
    Quiz {
        #[command(subcommand)]
        command: QuizCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// Register a YouTube URL (duplicates are ignored).
    Add(LinksAddArgs),
    /// Print every ledger entry and its progress.
    Status,
    /// Record that captions were fetched outside this tool.
    MarkFetched(MarkFetchedArgs),
    /// Clear the fetched and summarized flags of an entry.
    Reset(VideoIdArgs),
}

#[derive(Debug, Args)]
pub struct LinksAddArgs {
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct MarkFetchedArgs {
    #[arg(long)]
    pub video_id: String,

    /// Video title as printed by the caption downloader.
    #[arg(long)]
    pub title: String,
}

#[derive(Debug, Args)]
pub struct VideoIdArgs {
    #[arg(long)]
    pub video_id: String,
}

#[derive(Debug, Subcommand)]
pub enum YoutubeCommand {
    /// Download captions for every link not fetched yet.
    Fetch(CaptionArgs),
    /// Summarize every fetched link not summarized yet.
    Summarize(YoutubeSummarizeArgs),
}

#[derive(Debug, Args)]
pub struct CaptionArgs {
    /// Caption language code.
    #[arg(long, default_value = DEFAULT_CAPTION_LANG)]
    pub lang: String,
}

#[derive(Debug, Args)]
pub struct YoutubeSummarizeArgs {
    #[command(flatten)]
    pub captions: CaptionArgs,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Debug, Subcommand)]
pub enum KindleCommand {
    /// Summarize every export under `highlight/`.
    Summarize(KindleSummarizeArgs),
}

#[derive(Debug, Args)]
pub struct KindleSummarizeArgs {
    /// Overwrite summaries that already exist.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Debug, Subcommand)]
pub enum QuizCommand {
    /// Write a Markdown quiz bank for every summary.
    Bank(QuizBankArgs),
    /// Generate question/answer pairs as JSON.
    Generate(QuizGenerateArgs),
}

#[derive(Debug, Args)]
pub struct QuizBankArgs {
    /// Overwrite quiz banks that already exist.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Debug, Args)]
pub struct QuizGenerateArgs {
    /// Number of questions to ask for.
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// Summary file to quiz on (repeatable; default: every file in `summary/`).
    #[arg(long = "summary")]
    pub summaries: Vec<PathBuf>,

    /// Output JSON file (default: stdout).
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Debug, Clone, Args)]
pub struct LlmArgs {
    /// Text generation backend.
    #[arg(long, value_enum, default_value_t = LlmEngine::Gemini)]
    pub engine: LlmEngine,

    /// Model name (default: `GEMINI_MODEL` or the built-in default).
    #[arg(long)]
    pub model: Option<String>,

    /// API base URL (default: `GEMINI_BASE_URL` or the public endpoint).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-request timeout.
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Program to run when `--engine=command`.
    #[arg(long)]
    pub command: Option<String>,

    /// Arguments for `--command`, given after `--`.
    #[arg(last = true)]
    pub command_args: Vec<String>,
}

impl LlmArgs {
    pub fn to_config(&self) -> LlmConfig {
        LlmConfig {
            engine: self.engine,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            command: self.command.clone(),
            command_args: self.command_args.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }

    #[test]
    fn command_engine_collects_trailing_args() {
        let cli = Cli::parse_from([
            "summaquiz",
            "--root",
            "/data",
            "quiz",
            "generate",
            "--count",
            "3",
            "--summary",
            "a.md",
            "--summary",
            "b.md",
            "--engine",
            "command",
            "--command",
            "sh",
            "--",
            "-c",
            "cat",
        ]);

        assert_eq!(cli.root, PathBuf::from("/data"));
        let Command::Quiz {
            command: QuizCommand::Generate(args),
        } = cli.command
        else {
            panic!("expected quiz generate");
        };
        assert_eq!(args.count, 3);
        assert_eq!(args.summaries, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);

        let config = args.llm.to_config();
        assert_eq!(config.engine, LlmEngine::Command);
        assert_eq!(config.command.as_deref(), Some("sh"));
        assert_eq!(config.command_args, vec!["-c", "cat"]);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn every_subcommand_has_help_text() {
        use clap::CommandFactory as _;
        let cli = Cli::command();
        for group in cli.get_subcommands() {
            assert!(group.get_about().is_some(), "{} has no about", group.get_name());
            for sub in group.get_subcommands() {
                assert!(
                    sub.get_about().is_some(),
                    "{} {} has no about",
                    group.get_name(),
                    sub.get_name()
                );
            }
        }
    }

    #[test]
    fn gemini_is_the_default_engine() {
        let cli = Cli::parse_from(["summaquiz", "kindle", "summarize", "--force"]);
        let Command::Kindle {
            command: KindleCommand::Summarize(args),
        } = cli.command
        else {
            panic!("expected kindle summarize");
        };
        assert!(args.force);
        assert_eq!(args.llm.engine, LlmEngine::Gemini);
        assert_eq!(cli.root, PathBuf::from("."));
    }
}
