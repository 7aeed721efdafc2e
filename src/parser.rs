//! Section-aware parser for mail-log summarizer reports.
//!
//! The report is read line by line. A header line opens a section, a blank
//! line closes it, and rows are only taken while a section is open. Totals are
//! picked up anywhere in the text. Lines that fit nothing are dropped.

use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::debug;

use crate::patterns::{default_patterns, PatternSet};
use crate::report::{CountedEntry, HourlyBucket, Report, TotalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Hourly,
    Hosts,
    Senders,
    Recipients,
}

impl FromStr for Section {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "hourly" => Ok(Section::Hourly),
            "hosts" => Ok(Section::Hosts),
            "senders" => Ok(Section::Senders),
            "recipients" => Ok(Section::Recipients),
            _ => anyhow::bail!("Unknown section '{}'", s),
        }
    }
}

/// What a single trimmed line means to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Header(Section),
    Total(TotalKind, u64),
    Other,
}

/// Parses a report with the embedded default patterns.
pub fn parse(raw: &str) -> Report {
    parse_with(default_patterns(), raw)
}

pub fn parse_with(patterns: &PatternSet, raw: &str) -> Report {
    let mut report = Report::default();
    let mut section: Option<Section> = None;

    for line in raw.lines() {
        let line = line.trim();
        let kind = classify(patterns, line);

        match kind {
            LineKind::Total(total, value) => report.record_total(total, value),
            LineKind::Other => {
                if let Some(current) = section {
                    extract_row(patterns, current, line, &mut report);
                }
            }
            LineKind::Blank | LineKind::Header(_) => {}
        }

        section = transition(section, kind);
    }

    debug!(
        action = "complete",
        component = "report_parser",
        hourly = report.hourly.len(),
        hosts = report.hosts.len(),
        senders = report.senders.len(),
        recipients = report.recipients.len(),
        has_totals = report.totals.is_some(),
        "Parsed report"
    );

    report
}

/// The section state after a line of the given kind.
pub fn transition(current: Option<Section>, kind: LineKind) -> Option<Section> {
    match kind {
        LineKind::Blank => None,
        LineKind::Header(section) => Some(section),
        LineKind::Total(..) | LineKind::Other => current,
    }
}

/// Classifies a trimmed line. Headers win over totals, totals over rows.
pub fn classify(patterns: &PatternSet, line: &str) -> LineKind {
    if line.is_empty() {
        return LineKind::Blank;
    }

    if let Some((section, _)) = patterns.headers().iter().find(|(_, re)| re.is_match(line)) {
        return LineKind::Header(*section);
    }

    for (kind, re) in patterns.totals() {
        if let Some(value) = re
            .captures(line)
            .and_then(|caps| caps.name("value"))
            .and_then(|m| parse_scaled(m.as_str()))
        {
            return LineKind::Total(kind, value);
        }
    }

    LineKind::Other
}

fn extract_row(patterns: &PatternSet, section: Section, line: &str, report: &mut Report) {
    let rows = patterns.rows(section);
    match section {
        Section::Hourly => {
            if let Some(bucket) = first_match(rows, line, hourly_bucket) {
                report.hourly.push(bucket);
            }
        }
        Section::Hosts => {
            if let Some(entry) = first_match(rows, line, counted_entry) {
                report.hosts.push(entry);
            }
        }
        Section::Senders => {
            if let Some(entry) = first_match(rows, line, counted_entry) {
                report.senders.push(entry);
            }
        }
        Section::Recipients => {
            if let Some(entry) = first_match(rows, line, counted_entry) {
                report.recipients.push(entry);
            }
        }
    }
}

/// Tries each pattern in order and returns the first complete row.
fn first_match<T>(patterns: &[Regex], line: &str, build: fn(&Captures) -> Option<T>) -> Option<T> {
    patterns
        .iter()
        .filter_map(|re| re.captures(line))
        .find_map(|caps| build(&caps))
}

fn hourly_bucket(caps: &Captures) -> Option<HourlyBucket> {
    let period = caps.name("period")?.as_str();
    let received = caps.name("received")?.as_str().parse().ok()?;
    let sent = caps.name("sent")?.as_str().parse().ok()?;

    if !is_valid_period(period) {
        return None;
    }

    Some(HourlyBucket {
        period: period.to_string(),
        received,
        sent,
    })
}

fn counted_entry(caps: &Captures) -> Option<CountedEntry> {
    let label = caps.name("label")?.as_str();
    let count = caps.name("count")?.as_str().parse().ok()?;

    // The purely numeric token is the count, never the label.
    if label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(CountedEntry::new(label, count))
}

/// Date-style periods ("Jun 15 2025") must name a real day.
fn is_valid_period(period: &str) -> bool {
    let starts_alpha = period
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_alpha {
        return true;
    }

    let normalized = period.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&normalized, "%b %d %Y").is_ok()
}

/// Parses a total such as `1234`, `1,234` or `12k`.
///
/// Unit suffixes are binary multiples, matching the summarizer's own scaling.
pub fn parse_scaled(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last()?.to_ascii_lowercase() {
        'k' => (&value[..value.len() - 1], 1u64 << 10),
        'm' => (&value[..value.len() - 1], 1u64 << 20),
        'g' => (&value[..value.len() - 1], 1u64 << 30),
        _ => (value, 1),
    };

    let digits: String = digits.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}
