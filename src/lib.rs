pub mod analyze;
pub mod args;
pub mod export;
pub mod parser;
pub mod patterns;
pub mod report;
pub mod source;
pub mod utils;

pub use analyze::{analyze_reports, export_report, write_results};
pub use args::Args;
pub use parser::{parse, parse_with, Section};
pub use patterns::{default_patterns, init_default_patterns, load_report_patterns, PatternSet};
pub use report::{AnalysisResult, CountedEntry, HourlyBucket, Report, Totals};
