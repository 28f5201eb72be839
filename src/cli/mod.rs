//! Command-line interface components
//!
//! This module contains CLI-specific code for Avatar Fetcher, including
//! argument parsing, progress display, and the command handlers.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AuthAction, AuthArgs, BrowseArgs, Cli, Commands, DownloadArgs, DownloadUrlArgs, GlobalArgs,
    ListArgs, LoginArgs, ThemeArgs, ThemeMode, ThumbnailArgs,
};
pub use commands::{
    handle_auth, handle_browse, handle_download, handle_download_url, handle_list, handle_login,
    handle_theme, handle_thumbnail,
};
pub use progress::{spinner, ProgressTheme, TaskProgressDisplay};
