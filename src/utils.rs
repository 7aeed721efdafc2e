use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    // Logs go to stderr; stdout carries report data only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Masks an address or host name, keeping only the top-level domain.
pub fn redact_label(label: &str) -> String {
    let (local, domain) = match label.rsplit_once('@') {
        Some((local, domain)) => (Some(local), domain),
        None => (None, label),
    };

    let parts: Vec<&str> = domain.split('.').collect();
    let domain = if parts.len() <= 1 {
        "*".repeat(domain.chars().count())
    } else if parts[parts.len() - 2].chars().count() <= 3 {
        format!("???.{}", parts[parts.len() - 1])
    } else {
        let mut redacted: Vec<String> = parts[..parts.len() - 1]
            .iter()
            .map(|part| "*".repeat(part.chars().count()))
            .collect();
        redacted.push(parts[parts.len() - 1].to_string());
        redacted.join(".")
    };

    match local {
        Some(local) => format!("{}@{}", "*".repeat(local.chars().count()), domain),
        None => domain,
    }
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if let Some(top) = args.top {
        if top == 0 {
            anyhow::bail!("--top must be greater than 0");
        }
    }

    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
    }

    if args.timeout == 0 {
        anyhow::bail!("--timeout must be greater than 0");
    }

    if args.range.is_some() && !args.inputs.is_empty() {
        anyhow::bail!("--range cannot be combined with report files");
    }

    let exporting = args.hosts_csv.is_some() || args.contacts_csv.is_some();
    if exporting && args.inputs.len() > 1 {
        anyhow::bail!("CSV export needs exactly one report");
    }

    Ok(())
}
