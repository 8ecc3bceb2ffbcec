//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// freefall - crash-safe batch downloader (demo work)
#[derive(Debug, Parser)]
#[command(
    name = "freefall",
    about = "Process requests once, survive crashes, retry when told to",
    after_help = "Each request keeps status.json and log.txt under <archive>/<name>/"
)]
pub struct Cli {
    /// Archive root; every request gets its own directory below it
    #[arg(short, long)]
    pub archive: PathBuf,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Request names. `partial-*` finish in two runs, `flaky-*` ask for a
    /// retry, `broken-*` fail permanently.
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_flags() {
        let cli = Cli::try_parse_from(["freefall", "--archive", "/tmp/a", "-v", "x", "partial-y"])
            .unwrap();
        assert_eq!(cli.archive, PathBuf::from("/tmp/a"));
        assert!(cli.verbose);
        assert_eq!(cli.names, vec!["x", "partial-y"]);
    }

    #[test]
    fn names_are_required() {
        assert!(Cli::try_parse_from(["freefall", "--archive", "/tmp/a"]).is_err());
    }
}
