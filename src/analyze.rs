use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::args::OutputFormat;
use crate::export::{export_csv_file, write_contacts_csv, write_hosts_csv};
use crate::parser::parse_with;
use crate::patterns::{load_report_patterns, PatternSet};
use crate::report::{AnalysisResult, CountedEntry, Report};
use crate::source::{read_input, run_summarizer};
use crate::utils::{format_number, redact_label};
use crate::Args;

pub fn analyze_reports(args: &Args) -> Result<Vec<AnalysisResult>> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "analysis", "Starting report analysis");

    let patterns = load_report_patterns(args.patterns.as_deref())?;

    let results = if let Some(range) = args.range {
        let raw = run_summarizer(
            &args.summarizer,
            range,
            &args.log_path,
            Duration::from_secs(args.timeout),
        )?;
        vec![AnalysisResult {
            source: format!("{} ({})", args.summarizer, range.as_str()),
            report: parse_with(&patterns, &raw),
        }]
    } else if args.inputs.len() <= 1 {
        let path = args
            .inputs
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("-"));
        vec![parse_file(&patterns, &path)?]
    } else {
        parse_files(&patterns, &args.inputs, args.workers)?
    };

    let total_time = total_start_time.elapsed();
    info!(
        action = "complete",
        component = "analysis",
        report_count = results.len(),
        duration_ms = total_time.as_millis(),
        "Analysis completed successfully"
    );

    Ok(results)
}

fn parse_file(patterns: &PatternSet, path: &Path) -> Result<AnalysisResult> {
    let raw = read_input(path)?;
    let source = if path.as_os_str() == "-" {
        "stdin".to_string()
    } else {
        path.display().to_string()
    };
    Ok(AnalysisResult {
        source,
        report: parse_with(patterns, &raw),
    })
}

/// Parses several report files on a dedicated thread pool, keeping input order.
fn parse_files(
    patterns: &PatternSet,
    paths: &[PathBuf],
    max_workers: Option<usize>,
) -> Result<Vec<AnalysisResult>> {
    let max_workers = max_workers.unwrap_or_else(|| {
        let cpu_count = num_cpus::get();
        std::cmp::min(cpu_count, 8)
    });

    info!(action = "configure", component = "report_parsing", worker_count = max_workers, file_count = paths.len(), "Using workers for processing");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()
        .context("Failed to build worker pool")?;

    pool.install(|| {
        paths
            .par_iter()
            .map(|path| parse_file(patterns, path))
            .collect::<Result<Vec<_>>>()
    })
}

/// Writes the requested CSV exports for a single report.
pub fn export_report(report: &Report, args: &Args) -> Result<()> {
    if let Some(path) = &args.hosts_csv {
        export_csv_file(path, report, write_hosts_csv)?;
    }
    if let Some(path) = &args.contacts_csv {
        export_csv_file(path, report, write_contacts_csv)?;
    }
    Ok(())
}

pub fn write_results<W: Write>(out: &mut W, results: &[AnalysisResult], args: &Args) -> Result<()> {
    match args.format {
        OutputFormat::Json => write_json(out, results, args.pretty),
        OutputFormat::Summary => {
            for result in results {
                write_summary(out, result, args)?;
            }
            Ok(())
        }
    }
}

/// One report is written bare; several become an array of `{source, report}`.
fn write_json<W: Write>(out: &mut W, results: &[AnalysisResult], pretty: bool) -> Result<()> {
    let value = match results {
        [single] => serde_json::to_value(&single.report)?,
        _ => serde_json::to_value(results)?,
    };

    if pretty {
        serde_json::to_writer_pretty(&mut *out, &value)?;
    } else {
        serde_json::to_writer(&mut *out, &value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, result: &AnalysisResult, args: &Args) -> Result<()> {
    let report = &result.report;

    writeln!(out, "\n--- Mail Report: {} ---", result.source)?;

    match &report.totals {
        Some(totals) => {
            writeln!(out, "Messages received: {}", optional_number(totals.received))?;
            writeln!(out, "Messages sent: {}", optional_number(totals.sent))?;
        }
        None => writeln!(out, "No totals found")?,
    }

    if !report.hourly.is_empty() {
        writeln!(out, "\nTraffic by period:")?;
        for bucket in &report.hourly {
            writeln!(
                out,
                "- {}: {} received, {} sent",
                bucket.period,
                format_number(bucket.received),
                format_number(bucket.sent)
            )?;
        }
    }

    write_ranked(out, "hosts", &report.hosts, args)?;
    write_ranked(out, "senders", &report.senders, args)?;
    write_ranked(out, "recipients", &report.recipients, args)?;
    Ok(())
}

fn optional_number(value: Option<u64>) -> String {
    value.map(format_number).unwrap_or_else(|| "n/a".to_string())
}

fn write_ranked<W: Write>(
    out: &mut W,
    title: &str,
    entries: &[CountedEntry],
    args: &Args,
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let shown = args.top.unwrap_or(entries.len()).min(entries.len());
    writeln!(out, "\nTop {} {}:", shown, title)?;
    for entry in entries.iter().take(shown) {
        let label = if args.redact {
            redact_label(&entry.label)
        } else {
            entry.label.clone()
        };
        writeln!(out, "- {}: {} messages", label, format_number(entry.count))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    const REPORT: &str = "\
Senders by message count
9   alice@example.com
4   bob@example.com

Messages received 13
";

    #[test]
    fn parses_several_files_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..5 {
            let path = dir.path().join(format!("report-{}.txt", i));
            fs::write(&path, format!("Messages received {}\n", i)).unwrap();
            paths.push(path);
        }

        let patterns = crate::patterns::default_patterns();
        let results = parse_files(patterns, &paths, Some(2)).unwrap();
        let received: Vec<Option<u64>> = results
            .iter()
            .map(|r| r.report.totals.as_ref().and_then(|t| t.received))
            .collect();
        assert_eq!(received, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn one_missing_file_fails_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, REPORT).unwrap();
        let paths = vec![good, dir.path().join("missing.txt")];

        let patterns = crate::patterns::default_patterns();
        assert!(parse_files(patterns, &paths, Some(2)).is_err());
    }

    #[test]
    fn single_report_json_is_bare() {
        let args = Args::parse_from(["mailsumm"]);
        let results = vec![AnalysisResult {
            source: "stdin".to_string(),
            report: crate::parse(REPORT),
        }];

        let mut out = Vec::new();
        write_results(&mut out, &results, &args).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["senders"][0]["label"], "alice@example.com");
        assert_eq!(value["totals"]["received"], 13);
    }

    #[test]
    fn several_reports_json_is_tagged() {
        let args = Args::parse_from(["mailsumm"]);
        let results = vec![
            AnalysisResult {
                source: "a.txt".to_string(),
                report: crate::parse(REPORT),
            },
            AnalysisResult {
                source: "b.txt".to_string(),
                report: Report::default(),
            },
        ];

        let mut out = Vec::new();
        write_results(&mut out, &results, &args).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["source"], "a.txt");
        assert_eq!(value[1]["report"]["hosts"], serde_json::json!([]));
    }

    #[test]
    fn summary_respects_top_and_redact() {
        let args = Args::parse_from(["mailsumm", "--format", "summary", "--top", "1", "--redact"]);
        let results = vec![AnalysisResult {
            source: "stdin".to_string(),
            report: crate::parse(REPORT),
        }];

        let mut out = Vec::new();
        write_results(&mut out, &results, &args).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Messages received: 13"));
        assert!(text.contains("Messages sent: n/a"));
        assert!(text.contains("Top 1 senders:"));
        assert!(text.contains("- *****@*******.com: 9 messages"));
        assert!(!text.contains("bob"));
    }

    #[test]
    fn exports_requested_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let contacts = dir.path().join("contacts.csv");
        let contacts_arg = contacts.display().to_string();
        let args = Args::parse_from(["mailsumm", "--contacts-csv", contacts_arg.as_str()]);

        export_report(&crate::parse(REPORT), &args).unwrap();
        let written = fs::read_to_string(&contacts).unwrap();
        assert_eq!(
            written,
            "type,address,count\nsender,alice@example.com,9\nsender,bob@example.com,4\n"
        );
    }
}
