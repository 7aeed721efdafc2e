use anyhow::Result;
use clap::Parser;
use tracing::error;

use mailsumm::{analyze_reports, export_report, init_default_patterns, utils, write_results, Args};

fn run(args: &Args) -> Result<()> {
    let results = analyze_reports(args)?;

    if let [single] = results.as_slice() {
        export_report(&single.report, args)?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, &results, args)
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);

    if args.init {
        return init_default_patterns();
    }

    utils::validate_args(&args)?;

    if let Err(e) = run(&args) {
        error!(error = %format!("{:#}", e), "Error");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
