#![forbid(unsafe_code)]

pub mod captions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod downloader;
pub mod frontmatter;
pub mod gemini;
pub mod highlight;
pub mod ledger;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod quiz;
pub mod sanitize;
pub mod store;
pub mod summarize;
pub mod youtube;
