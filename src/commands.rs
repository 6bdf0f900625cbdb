//! Subcommand handlers. Each opens the workspace pieces it needs and runs one
//! pass; `main` turns a report with failures into a non-zero exit.

use std::io::Write as _;

use anyhow::Context as _;

use crate::cli::{
    CaptionArgs, KindleSummarizeArgs, LinksAddArgs, MarkFetchedArgs, QuizBankArgs,
    QuizGenerateArgs, VideoIdArgs, YoutubeSummarizeArgs,
};
use crate::config::Workspace;
use crate::downloader::YtDlp;
use crate::ledger::Ledger;
use crate::llm;
use crate::pipeline::{self, BatchReport};
use crate::store;
use crate::youtube::VideoId;

pub fn links_add(workspace: &Workspace, args: LinksAddArgs) -> anyhow::Result<()> {
    let mut ledger = Ledger::open(workspace.ledger_path())?;
    if !ledger.insert(&args.url)? {
        anyhow::bail!("not a YouTube video URL: {}", args.url);
    }
    Ok(())
}

pub fn links_status(workspace: &Workspace) -> anyhow::Result<()> {
    let ledger = Ledger::open(workspace.ledger_path())?;
    let mut stdout = std::io::stdout().lock();
    for item in ledger.items() {
        let stage = match (item.done, item.summarized) {
            (_, true) => "summarized",
            (true, false) => "fetched",
            (false, false) => "pending",
        };
        writeln!(
            stdout,
            "{}\t{stage}\t{}\t{}",
            item.video_id,
            item.title.as_deref().unwrap_or("-"),
            item.url
        )
        .context("write status")?;
    }
    Ok(())
}

pub fn links_mark_fetched(workspace: &Workspace, args: MarkFetchedArgs) -> anyhow::Result<()> {
    let video_id = parse_video_id(&args.video_id)?;
    let mut ledger = Ledger::open(workspace.ledger_path())?;
    ledger.mark_fetched(&video_id, &args.title)
}

pub fn links_reset(workspace: &Workspace, args: VideoIdArgs) -> anyhow::Result<()> {
    let video_id = parse_video_id(&args.video_id)?;
    let mut ledger = Ledger::open(workspace.ledger_path())?;
    ledger.reset(&video_id)
}

fn parse_video_id(raw: &str) -> anyhow::Result<VideoId> {
    VideoId::parse(raw).ok_or_else(|| anyhow::anyhow!("invalid video id: {raw}"))
}

pub fn youtube_fetch(workspace: &Workspace, args: CaptionArgs) -> anyhow::Result<BatchReport> {
    let mut ledger = Ledger::open(workspace.ledger_path())?;
    let downloader = YtDlp::from_env(&args.lang);
    pipeline::fetch_pending(&mut ledger, &downloader, &workspace.captions_dir())
}

pub fn youtube_summarize(
    workspace: &Workspace,
    args: YoutubeSummarizeArgs,
) -> anyhow::Result<BatchReport> {
    let mut ledger = Ledger::open(workspace.ledger_path())?;
    let gateway = llm::build_gateway(&args.llm.to_config())?;
    pipeline::summarize_captions(&mut ledger, &gateway, workspace, &args.captions.lang)
}

pub fn kindle_summarize(
    workspace: &Workspace,
    args: KindleSummarizeArgs,
) -> anyhow::Result<BatchReport> {
    let gateway = llm::build_gateway(&args.llm.to_config())?;
    pipeline::summarize_highlights(&gateway, workspace, args.force)
}

pub fn quiz_bank(workspace: &Workspace, args: QuizBankArgs) -> anyhow::Result<BatchReport> {
    let gateway = llm::build_gateway(&args.llm.to_config())?;
    pipeline::build_quiz_bank(&gateway, workspace, args.force)
}

pub fn quiz_generate(workspace: &Workspace, args: QuizGenerateArgs) -> anyhow::Result<()> {
    let summaries = pipeline::select_summaries(workspace, &args.summaries)?;
    if summaries.is_empty() {
        anyhow::bail!("no summaries to quiz on");
    }
    let gateway = llm::build_gateway(&args.llm.to_config())?;
    let pairs = pipeline::quiz_from_summaries(&gateway, &summaries, args.count)?;

    match args.out {
        Some(path) => {
            store::write_json_atomic(&path, &pairs)
                .with_context(|| format!("write quiz: {}", path.display()))?;
            tracing::info!(path = %path.display(), questions = pairs.len(), "quiz written");
        }
        None => {
            let json = serde_json::to_string_pretty(&pairs).context("serialize quiz")?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write quiz")?;
        }
    }
    Ok(())
}
