use gasbench::Report;

use super::Result;

/// Output format of the benchmark report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary per operation
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Print the benchmark report in `format` to stdout.
pub fn print_report(report: &Report, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => {
            println!();
            println!("=== Gas Report ({} runs) ===", report.runs);
            println!();
            print!("{report}");
        }
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
