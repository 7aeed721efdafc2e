use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};
use wait_timeout::ChildExt;

/// Reporting window handed to the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Range {
    Day,
    Week,
    Month,
}

impl Range {
    pub fn as_str(self) -> &'static str {
        match self {
            Range::Day => "day",
            Range::Week => "week",
            Range::Month => "month",
        }
    }

    /// Summarizer arguments for this range. Week and month cover the whole
    /// log file; log rotation decides how far back it reaches.
    pub fn summarizer_args(self, log_path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if self == Range::Day {
            args.push("-d".to_string());
            args.push("today".to_string());
        }
        args.push(log_path.display().to_string());
        args
    }
}

/// Reads report text from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read report from stdin")?;
        info!(action = "read", component = "input", source = "stdin", bytes = raw.len(), "Read report text");
        return Ok(raw);
    }

    if !path.exists() {
        anyhow::bail!("Report file not found: {:?}", path);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file {:?}", path))?;
    info!(action = "read", component = "input", file_path = ?path, bytes = raw.len(), "Read report text");
    Ok(raw)
}

/// Runs the summarizer over `log_path` and returns its standard output.
///
/// The summarizer's stderr is logged but never carried in the returned error.
pub fn run_summarizer(
    program: &str,
    range: Range,
    log_path: &Path,
    timeout: Duration,
) -> Result<String> {
    let start_time = Instant::now();
    let args = range.summarizer_args(log_path);
    info!(action = "start", component = "summarizer", program = program, range = range.as_str(), args = ?args, "Running summarizer");

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start summarizer '{}'", program))?;

    // Drain both pipes while waiting; a full pipe would block the child.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = match child
        .wait_timeout(timeout)
        .with_context(|| format!("Failed to wait for summarizer '{}'", program))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            error!(action = "timeout", component = "summarizer", program = program, timeout_ms = timeout.as_millis(), "Summarizer timed out");
            return Err(anyhow!("Summarizer timed out after {:?}", timeout));
        }
    };

    let stderr = match stderr_reader {
        Some(handle) => join_reader(handle).unwrap_or_default(),
        None => String::new(),
    };

    if !status.success() {
        error!(
            action = "complete",
            component = "summarizer",
            program = program,
            exit_code = status.code().unwrap_or(-1),
            stderr = %stderr.trim(),
            "Summarizer failed"
        );
        anyhow::bail!("Summarizer failed");
    }

    let stdout = match stdout_reader {
        Some(handle) => join_reader(handle).context("Failed to read summarizer output")?,
        None => String::new(),
    };

    info!(
        action = "complete",
        component = "summarizer",
        bytes = stdout.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Summarizer completed"
    );
    Ok(stdout)
}

fn read_pipe<R: Read>(mut pipe: R) -> io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn spawn_reader<R: Read + Send + 'static>(pipe: R) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || read_pipe(pipe))
}

fn join_reader(handle: JoinHandle<io::Result<String>>) -> Result<String> {
    let text = handle
        .join()
        .map_err(|_| anyhow!("Pipe reader thread panicked"))??;
    Ok(text)
}
