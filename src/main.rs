use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use summaquiz::cli::{
    Cli, Command, KindleCommand, LinksCommand, QuizCommand, YoutubeCommand,
};
use summaquiz::commands;
use summaquiz::config::Workspace;
use summaquiz::pipeline::BatchReport;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    summaquiz::logging::init(cli.verbose).context("init logging")?;
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    tracing::debug!(?cli, "parsed cli");

    let workspace = Workspace::new(&cli.root);

    match cli.command {
        Command::Links {
            command: LinksCommand::Add(args),
        } => {
            commands::links_add(&workspace, args).context("links add")?;
        }
        Command::Links {
            command: LinksCommand::Status,
        } => {
            commands::links_status(&workspace).context("links status")?;
        }
        Command::Links {
            command: LinksCommand::MarkFetched(args),
        } => {
            commands::links_mark_fetched(&workspace, args).context("links mark-fetched")?;
        }
        Command::Links {
            command: LinksCommand::Reset(args),
        } => {
            commands::links_reset(&workspace, args).context("links reset")?;
        }
        Command::Youtube {
            command: YoutubeCommand::Fetch(args),
        } => {
            let report = commands::youtube_fetch(&workspace, args).context("youtube fetch")?;
            finish("youtube fetch", &report)?;
        }
        Command::Youtube {
            command: YoutubeCommand::Summarize(args),
        } => {
            let report =
                commands::youtube_summarize(&workspace, args).context("youtube summarize")?;
            finish("youtube summarize", &report)?;
        }
        Command::Kindle {
            command: KindleCommand::Summarize(args),
        } => {
            let report =
                commands::kindle_summarize(&workspace, args).context("kindle summarize")?;
            finish("kindle summarize", &report)?;
        }
        Command::Quiz {
            command: QuizCommand::Bank(args),
        } => {
            let report = commands::quiz_bank(&workspace, args).context("quiz bank")?;
            finish("quiz bank", &report)?;
        }
        Command::Quiz {
            command: QuizCommand::Generate(args),
        } => {
            commands::quiz_generate(&workspace, args).context("quiz generate")?;
        }
    }

    Ok(())
}

fn finish(pass: &str, report: &BatchReport) -> anyhow::Result<()> {
    report.log(pass);
    if report.has_failures() {
        let items = report
            .failed
            .iter()
            .map(|(item, _)| item.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::bail!("{pass}: {} item(s) failed: {items}", report.failed.len());
    }
    Ok(())
}
