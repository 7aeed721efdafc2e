use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::report::{CountedEntry, Report};

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write>(w: &mut W, row: &[&str]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, ",")?;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// `host,count` for every host, in report order.
pub fn write_hosts_csv<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    write_row(w, &["host", "count"])?;
    for entry in &report.hosts {
        let count = entry.count.to_string();
        write_row(w, &[entry.label.as_str(), count.as_str()])?;
    }
    Ok(())
}

/// `type,address,count` for senders followed by recipients.
pub fn write_contacts_csv<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    write_row(w, &["type", "address", "count"])?;
    write_contacts(w, "sender", &report.senders)?;
    write_contacts(w, "recipient", &report.recipients)
}

fn write_contacts<W: Write>(w: &mut W, kind: &str, entries: &[CountedEntry]) -> io::Result<()> {
    for entry in entries {
        let count = entry.count.to_string();
        write_row(w, &[kind, entry.label.as_str(), count.as_str()])?;
    }
    Ok(())
}

pub fn export_csv_file<F>(path: &Path, report: &Report, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>, &Report) -> io::Result<()>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);
    write(&mut out, report).with_context(|| format!("Failed to write {:?}", path))?;
    out.flush().with_context(|| format!("Failed to flush {:?}", path))?;
    info!(action = "export", component = "csv", file_path = ?path, "Wrote CSV export");
    Ok(())
}
