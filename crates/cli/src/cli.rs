use clap::Parser;

/// Cron contention heat map in the terminal.
///
/// Evaluates a set of cron expressions for one day against the evaluation
/// service and paints which minutes they fire in.
#[derive(Parser, Debug)]
#[command(name = "crontention", about = "Cron contention heat map")]
pub struct CliArgs {
    /// Evaluation service base URL (overrides env var and config file)
    #[arg(long)]
    pub server: Option<String>,

    /// Reference date: "today" or YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    /// IANA time zone for axis labels, e.g. Europe/Copenhagen
    #[arg(long)]
    pub timezone: Option<String>,

    /// Path to config file (default: ~/.config/crontention/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Shareable query to load, e.g. "?expressions=...&date=today"
    #[arg(long, conflicts_with_all = ["expression", "date"])]
    pub url: Option<String>,

    /// Cron expression; repeat for several
    #[arg(short = 'e', long = "expression")]
    pub expression: Vec<String>,

    /// Evaluate once, print the heat map and exit
    #[arg(long)]
    pub once: bool,
}
