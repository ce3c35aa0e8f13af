use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "gitpulse")]
#[command(about = "A terminal dashboard for pending push/pull state across many Git repositories")]
pub struct CliArgs {
    /// Directory to scan for repositories (overrides config)
    pub root: Option<PathBuf>,

    /// How many directory levels to descend while scanning (overrides config)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let args = CliArgs::parse_from(["gitpulse"]);
        assert_eq!(args.root, None);
        assert_eq!(args.depth, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_cli_parse_root_positional() {
        let args = CliArgs::parse_from(["gitpulse", "/home/me/src"]);
        assert_eq!(args.root, Some(PathBuf::from("/home/me/src")));
    }

    #[test]
    fn test_cli_parse_depth_and_config() {
        let args = CliArgs::parse_from([
            "gitpulse",
            "/work",
            "--depth",
            "3",
            "--config",
            "/custom/gitpulse.toml",
        ]);
        assert_eq!(args.root, Some(PathBuf::from("/work")));
        assert_eq!(args.depth, Some(3));
        assert_eq!(args.config, Some(PathBuf::from("/custom/gitpulse.toml")));
    }
}
