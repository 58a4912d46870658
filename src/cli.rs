use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Attendance tracking sidecar. Reads one JSON request per line on stdin and writes one
/// JSON response per line on stdout.
#[derive(Parser, Debug)]
#[command(name = "dailytrackd", version, about = "Daily attendance tracking sidecar")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Workspace directory to open at startup.
    #[arg(long, env = "DAILYTRACK_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Pin "today" to a fixed date (YYYY-MM-DD) instead of the local clock.
    #[arg(long, env = "DAILYTRACK_TODAY", value_parser = parse_day)]
    pub today: Option<NaiveDate>,

    /// Directory for report delivery fallbacks. Defaults to `<workspace>/outbox`.
    #[arg(long, env = "DAILYTRACK_OUTBOX")]
    pub outbox: Option<PathBuf>,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    crate::dates::parse_storage_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got '{s}'"))
}
