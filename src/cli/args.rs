//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

/// Serve a directory of Markdown and HTML pages as a personal wiki
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Wiki root directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// Config file path (optional TOML)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Minify pages, CSS and JS
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["quire", "wiki", "-i", "0.0.0.0", "-p", "9000", "-m", "-v"]);
        assert_eq!(cli.root, PathBuf::from("wiki"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.minify, Some(true));
        assert!(cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_minify_off() {
        let cli = Cli::parse_from(["quire", "wiki", "--minify", "false"]);
        assert_eq!(cli.minify, Some(false));
    }
}
