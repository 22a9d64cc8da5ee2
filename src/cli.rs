use crate::config::DEFAULT_INTERVAL_SECS;
use clap::Parser;

/// Poll the configured RSS/Atom feeds and append new articles
/// to a JSON news archive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding all_news.json and last_dates.json
    #[arg(short, long, env = "NEWS_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Optional path to a sources.yaml file (defaults to the built-in list)
    #[arg(short, long, env = "NEWS_SOURCES")]
    pub sources: Option<String>,

    /// Seconds between scheduled fetch cycles
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Run a single cycle and exit (for externally scheduled runs)
    #[arg(long)]
    pub once: bool,
}
