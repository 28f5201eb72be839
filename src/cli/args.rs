//! Command-line argument parsing for Avatar Fetcher
//!
//! This module defines the CLI structure using clap derive macros, covering
//! login, listing, downloads, the interactive browser and credential
//! management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::models::ReleaseFilter;

/// Avatar Fetcher - list and download your VRChat avatars
#[derive(Parser, Debug)]
#[command(
    name = "avatar_fetcher",
    version,
    about = "List, search and download the avatars on your VRChat account",
    long_about = "A command-line client for the VRChat API.
Logs in with two-factor support, lists your avatars page by page, and downloads avatar bundles with progress reporting."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the session log to a file; `--save-log=PATH` picks the name
    /// (default: avatar_fetcher_log_<timestamp>.txt)
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true
    )]
    pub save_log: Option<Option<PathBuf>>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and show the account name
    Login(LoginArgs),

    /// List your avatars
    List(ListArgs),

    /// Download an avatar bundle by id
    Download(DownloadArgs),

    /// Download any file URL with your session
    DownloadUrl(DownloadUrlArgs),

    /// Save an avatar's thumbnail image
    Thumbnail(ThumbnailArgs),

    /// Browse, search and download interactively
    Browse(BrowseArgs),

    /// Manage saved credentials
    Auth(AuthArgs),

    /// Set the colour theme
    Theme(ThemeArgs),
}

/// Arguments for the login command
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Save the username and password after a successful login
    #[arg(long)]
    pub save: bool,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Release status to list: all, public or private
    #[arg(short, long, default_value = "all")]
    pub release: ReleaseFilter,

    /// Only show avatars whose name, author or description contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Avatars per page (default from config)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Avatar id (avtr_...)
    #[arg(value_name = "AVATAR_ID")]
    pub avatar_id: String,

    /// Output path (default: <avatar name>.vrca in the output directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the download-url command
#[derive(Args, Debug, Clone)]
pub struct DownloadUrlArgs {
    /// File URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Output path
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the thumbnail command
#[derive(Args, Debug, Clone)]
pub struct ThumbnailArgs {
    /// Avatar id (avtr_...)
    #[arg(value_name = "AVATAR_ID")]
    pub avatar_id: String,

    /// Output path
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the browse command
#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    /// Release status to list: all, public or private
    #[arg(short, long, default_value = "all")]
    pub release: ReleaseFilter,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Enter and save VRChat credentials
    Setup,

    /// Verify current credentials by logging in
    Verify,

    /// Show authentication status
    Status,

    /// Clear stored credentials
    Clear,
}

/// Arguments for the theme command
#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[arg(value_enum)]
    pub mode: ThemeMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl ListArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("Page numbers start at 1".to_string());
        }
        if self.page_size == Some(0) {
            return Err("Page size must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_list_defaults() {
        let cli = parse(&["avatar_fetcher", "list"]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.release, ReleaseFilter::All);
                assert_eq!(args.page, 1);
                assert!(args.page_size.is_none());
                assert!(args.validate().is_ok());
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_list_options() {
        let cli = parse(&[
            "avatar_fetcher",
            "list",
            "--release",
            "private",
            "--search",
            "fox",
            "--page",
            "2",
            "--page-size",
            "25",
            "--json",
        ]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.release, ReleaseFilter::Private);
                assert_eq!(args.search.as_deref(), Some("fox"));
                assert_eq!(args.page, 2);
                assert_eq!(args.page_size, Some(25));
                assert!(args.json);
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_release_rejected() {
        assert!(Cli::try_parse_from(["avatar_fetcher", "list", "--release", "friends"]).is_err());
    }

    #[test]
    fn test_list_validation() {
        let cli = parse(&["avatar_fetcher", "list", "--page", "0"]);
        match cli.command {
            Commands::List(args) => assert!(args.validate().is_err()),
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_save_log_optional_value() {
        let cli = parse(&["avatar_fetcher", "--save-log", "auth", "status"]);
        assert_eq!(cli.global.save_log, Some(None));

        let cli = parse(&["avatar_fetcher", "--save-log=run.txt", "auth", "status"]);
        assert_eq!(cli.global.save_log, Some(Some(PathBuf::from("run.txt"))));

        let cli = parse(&["avatar_fetcher", "auth", "status"]);
        assert!(cli.global.save_log.is_none());
    }

    #[test]
    fn test_save_log_does_not_swallow_subcommand() {
        let cli = parse(&["avatar_fetcher", "--save-log", "list"]);
        assert_eq!(cli.global.save_log, Some(None));
        assert!(matches!(cli.command, Commands::List(_)));

        let cli = parse(&["avatar_fetcher", "list", "--save-log", "--json"]);
        assert_eq!(cli.global.save_log, Some(None));
        match cli.command {
            Commands::List(args) => assert!(args.json),
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_download_args() {
        let cli = parse(&["avatar_fetcher", "download", "avtr_1", "-o", "out.vrca", "-f"]);
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.avatar_id, "avtr_1");
                assert_eq!(args.output, Some(PathBuf::from("out.vrca")));
                assert!(args.force);
            }
            other => panic!("Expected download, got {:?}", other),
        }
    }

    #[test]
    fn test_download_url_requires_output() {
        assert!(Cli::try_parse_from(["avatar_fetcher", "download-url", "https://x/file"]).is_err());
    }

    #[test]
    fn test_theme() {
        let cli = parse(&["avatar_fetcher", "theme", "light"]);
        match cli.command {
            Commands::Theme(args) => assert!(!args.mode.is_dark()),
            other => panic!("Expected theme, got {:?}", other),
        }
    }

    #[test]
    fn test_log_level() {
        let cli = parse(&["avatar_fetcher", "-q", "auth", "status"]);
        assert_eq!(cli.log_level(), tracing::Level::ERROR);

        let cli = parse(&["avatar_fetcher", "-v", "auth", "status"]);
        assert_eq!(cli.log_level(), tracing::Level::INFO);

        let cli = parse(&["avatar_fetcher", "--very-verbose", "auth", "status"]);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }
}
