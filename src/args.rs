use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::source::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Report as JSON
    Json,
    /// Human-readable ranked lists
    Summary,
}

#[derive(Parser, Debug)]
#[command(
    name = "mailsumm",
    about = "Parse mail-log summarizer reports into structured JSON",
    version,
    long_about = None
)]
pub struct Args {
    /// Report files to parse ("-" for stdin; stdin when none are given)
    pub inputs: Vec<PathBuf>,

    /// Run the summarizer for this range instead of reading report files
    /// (day = today only; week and month both cover the whole log file)
    #[arg(short, long, value_enum)]
    pub range: Option<Range>,

    /// Mail log handed to the summarizer
    #[arg(long, default_value = "/var/log/mail.log")]
    pub log_path: PathBuf,

    /// Summarizer program to run for --range
    #[arg(long, default_value = "pflogsumm")]
    pub summarizer: String,

    /// Seconds to wait for the summarizer before giving up
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Path to custom report pattern file
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Write hosts as CSV (host,count) to this path
    #[arg(long)]
    pub hosts_csv: Option<PathBuf>,

    /// Write senders and recipients as CSV (type,address,count) to this path
    #[arg(long)]
    pub contacts_csv: Option<PathBuf>,

    /// Number of entries per list in summary output
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Redact addresses and host names in summary output
    #[arg(long)]
    pub redact: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads for parsing several files
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Initialize report_patterns.txt with default patterns
    #[arg(long)]
    pub init: bool,
}
