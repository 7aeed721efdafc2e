use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

use crate::parser::Section;
use crate::report::TotalKind;

// Include default patterns at compile time
const DEFAULT_PATTERNS_BYTES: &[u8] = include_bytes!("../default_report_patterns.txt");

pub const DEFAULT_PATTERN_FILE: &str = "report_patterns.txt";

/// Where a pattern line goes in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Header(Section),
    Total(TotalKind),
    Row(Section),
}

impl Slot {
    fn required_groups(self) -> &'static [&'static str] {
        match self {
            Slot::Header(_) => &[],
            Slot::Total(_) => &["value"],
            Slot::Row(Section::Hourly) => &["period", "received", "sent"],
            Slot::Row(_) => &["label", "count"],
        }
    }

    fn case_insensitive(self) -> bool {
        !matches!(self, Slot::Row(_))
    }
}

impl FromStr for Slot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, name) = s
            .split_once('.')
            .with_context(|| format!("Malformed slot '{}'", s))?;

        let slot = match kind {
            "header" => Slot::Header(name.parse()?),
            "row" => Slot::Row(name.parse()?),
            "total" => match name {
                "received" => Slot::Total(TotalKind::Received),
                "sent" => Slot::Total(TotalKind::Sent),
                _ => anyhow::bail!("Unknown total '{}'", name),
            },
            _ => anyhow::bail!("Unknown slot kind '{}'", kind),
        };
        Ok(slot)
    }
}

/// Header, total and row patterns for every section, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    headers: Vec<(Section, Regex)>,
    received_totals: Vec<Regex>,
    sent_totals: Vec<Regex>,
    hourly_rows: Vec<Regex>,
    host_rows: Vec<Regex>,
    sender_rows: Vec<Regex>,
    recipient_rows: Vec<Regex>,
}

impl PatternSet {
    pub fn push(&mut self, slot: Slot, regex: Regex) {
        match slot {
            Slot::Header(section) => self.headers.push((section, regex)),
            Slot::Total(TotalKind::Received) => self.received_totals.push(regex),
            Slot::Total(TotalKind::Sent) => self.sent_totals.push(regex),
            Slot::Row(section) => self.rows_mut(section).push(regex),
        }
    }

    pub fn headers(&self) -> &[(Section, Regex)] {
        &self.headers
    }

    /// Total patterns with received checked before sent.
    pub fn totals(&self) -> impl Iterator<Item = (TotalKind, &Regex)> {
        self.received_totals
            .iter()
            .map(|r| (TotalKind::Received, r))
            .chain(self.sent_totals.iter().map(|r| (TotalKind::Sent, r)))
    }

    pub fn rows(&self, section: Section) -> &[Regex] {
        match section {
            Section::Hourly => &self.hourly_rows,
            Section::Hosts => &self.host_rows,
            Section::Senders => &self.sender_rows,
            Section::Recipients => &self.recipient_rows,
        }
    }

    fn rows_mut(&mut self, section: Section) -> &mut Vec<Regex> {
        match section {
            Section::Hourly => &mut self.hourly_rows,
            Section::Hosts => &mut self.host_rows,
            Section::Senders => &mut self.sender_rows,
            Section::Recipients => &mut self.recipient_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
            + self.received_totals.len()
            + self.sent_totals.len()
            + self.hourly_rows.len()
            + self.host_rows.len()
            + self.sender_rows.len()
            + self.recipient_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a table, failing on the first invalid entry.
    pub fn from_str_strict(content: &str) -> Result<Self> {
        let mut set = PatternSet::default();
        for (line_num, line) in content.lines().enumerate() {
            if let Some((slot, regex)) = compile_entry(line)
                .with_context(|| format!("Invalid pattern entry at line {}", line_num + 1))?
            {
                set.push(slot, regex);
            }
        }
        Ok(set)
    }

    /// Builds a table, skipping invalid entries with a warning.
    pub fn from_str_lenient(content: &str, component: &str) -> Self {
        let mut set = PatternSet::default();
        for (line_num, line) in content.lines().enumerate() {
            match compile_entry(line) {
                Ok(Some((slot, regex))) => set.push(slot, regex),
                Ok(None) => {}
                Err(e) => {
                    warn!(action = "parse", component = component, line_number = line_num + 1, error = %e, "Invalid pattern entry")
                }
            }
        }
        set
    }
}

/// Compiles one `<slot> <regex>` line; comments and blank lines yield `None`.
fn compile_entry(line: &str) -> Result<Option<(Slot, Regex)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (slot, pattern) = line
        .split_once(char::is_whitespace)
        .with_context(|| format!("Missing pattern after slot '{}'", line))?;
    let slot: Slot = slot.parse()?;
    let pattern = pattern.trim_start();

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(slot.case_insensitive())
        .build()
        .with_context(|| format!("Invalid regex '{}'", pattern))?;

    for group in slot.required_groups() {
        if !regex.capture_names().flatten().any(|name| name == *group) {
            anyhow::bail!("Pattern '{}' is missing the '{}' group", pattern, group);
        }
    }

    Ok(Some((slot, regex)))
}

/// The embedded default table, compiled once per process.
pub fn default_patterns() -> &'static PatternSet {
    static DEFAULTS: OnceLock<PatternSet> = OnceLock::new();
    DEFAULTS.get_or_init(|| {
        let content = String::from_utf8_lossy(DEFAULT_PATTERNS_BYTES);
        PatternSet::from_str_lenient(&content, "embedded_patterns")
    })
}

pub fn load_report_patterns(pattern_file_path: Option<&Path>) -> Result<PatternSet> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "pattern_loading",
        "Starting report pattern loading"
    );

    let patterns = if let Some(path) = pattern_file_path {
        info!(action = "load", component = "pattern_file", file_path = ?path, "Loading patterns from specified file");
        if !path.exists() {
            anyhow::bail!("Pattern file not found: {:?}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern file {:?}", path))?;
        let patterns = PatternSet::from_str_strict(&content)
            .with_context(|| format!("Failed to load pattern file {:?}", path))?;
        info!(action = "loaded", component = "pattern_file", pattern_count = patterns.len(), file_path = ?path, "Loaded patterns from file");
        patterns
    } else {
        // Try default file
        let default_file = Path::new(DEFAULT_PATTERN_FILE);
        let mut patterns = PatternSet::default();
        if default_file.exists() {
            info!(action = "load", component = "default_pattern_file", file_path = ?default_file, "Loading patterns from default file");
            let content = fs::read_to_string(default_file)?;
            patterns = PatternSet::from_str_lenient(&content, "default_pattern_file");
            info!(action = "loaded", component = "default_pattern_file", pattern_count = patterns.len(), file_path = ?default_file, "Loaded patterns from default file");
        }

        // If no patterns loaded, use embedded defaults
        if patterns.is_empty() {
            info!(
                action = "load",
                component = "embedded_patterns",
                "Using embedded default patterns"
            );
            patterns = default_patterns().clone();
        }
        patterns
    };

    let pattern_time = start_time.elapsed();
    info!(
        action = "complete",
        component = "pattern_loading",
        pattern_count = patterns.len(),
        duration_ms = pattern_time.as_millis(),
        "Successfully compiled patterns"
    );
    Ok(patterns)
}

pub fn init_default_patterns() -> Result<()> {
    init_default_patterns_at(Path::new(DEFAULT_PATTERN_FILE))
}

pub fn init_default_patterns_at(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            path.display()
        );
    }

    let default_content = std::str::from_utf8(DEFAULT_PATTERNS_BYTES)
        .context("Failed to decode embedded default patterns")?;

    fs::write(path, default_content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default patterns", path.display());

    Ok(())
}
