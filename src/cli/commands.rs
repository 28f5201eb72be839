//! Command handlers for Avatar Fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the application context: logging in, filling the catalog, and running
//! downloads on the task pool with a progress display.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::app::context::{AppContext, DownloadSummary};
use crate::app::models::{AvatarRecord, ReleaseFilter};
use crate::app::tasks::TaskHandle;
use crate::auth::{
    clear_credentials, credentials_or_prompt, prompt_two_factor_code, save_theme,
    setup_credentials, show_auth_status, verify_credentials,
};
use crate::cli::progress::{spinner, ProgressTheme, TaskProgressDisplay};
use crate::cli::{
    AuthAction, AuthArgs, BrowseArgs, DownloadArgs, DownloadUrlArgs, ListArgs, LoginArgs,
    ThemeArgs, ThumbnailArgs,
};
use crate::constants::catalog;
use crate::errors::{AppError, Result};

fn theme(ctx: &AppContext) -> ProgressTheme {
    ProgressTheme::new(ctx.settings().dark_mode)
}

/// Logs in with resolved credentials unless a session already exists
async fn ensure_logged_in(ctx: &mut AppContext) -> Result<()> {
    if ctx.auth_state().is_authenticated() {
        return Ok(());
    }

    let credentials = credentials_or_prompt(ctx.settings())?;
    login_with(ctx, &credentials.username, &credentials.password).await
}

/// Runs a fresh login, prompting for a second factor if asked
async fn login_with(ctx: &mut AppContext, username: &str, password: &str) -> Result<()> {
    let login_spinner = spinner(theme(ctx), "Logging in...");
    let pending = ctx.begin_login(username, password).await;
    login_spinner.finish_and_clear();

    if let Some(kind) = pending? {
        let code = prompt_two_factor_code(kind)?;
        let verify_spinner = spinner(theme(ctx), "Verifying code...");
        let result = ctx.submit_two_factor(&code).await.map(|_| ());
        verify_spinner.finish_and_clear();
        result?;
    }

    info!("Logged in as {}", ctx.user()?.display_name);
    Ok(())
}

/// Handle the login command
pub async fn handle_login(ctx: &mut AppContext, args: LoginArgs) -> Result<()> {
    let credentials = credentials_or_prompt(ctx.settings())?;
    login_with(ctx, &credentials.username, &credentials.password).await?;

    println!("Logged in as {}", ctx.user()?.display_name);

    if args.save {
        let settings = ctx.settings_mut();
        settings.username = Some(credentials.username);
        settings.password = Some(credentials.password);
        ctx.save_settings()?;
        println!(
            "Credentials saved to {} (password stored in plaintext)",
            ctx.settings_path().display()
        );
    }

    Ok(())
}

/// Fetches the full listing into the catalog
async fn refresh_catalog(ctx: &mut AppContext, filter: ReleaseFilter) -> Result<usize> {
    let handle = ctx.spawn_fetch(filter)?;
    let mut display = TaskProgressDisplay::new(theme(ctx), "Fetching avatars...");

    let records = handle.wait_with_progress(|p| display.update(p)).await?;
    let records = match records {
        Ok(records) => records,
        Err(e) => {
            display.clear();
            return Err(e.into());
        }
    };

    display.finish(format!("Fetched {} avatars", records.len()));
    let count = records.len();
    ctx.load_catalog(records);
    Ok(count)
}

/// Waits for a download task while drawing its progress
async fn run_download(
    ctx: &AppContext,
    handle: TaskHandle<Result<DownloadSummary>>,
) -> Result<DownloadSummary> {
    let mut display = TaskProgressDisplay::new(theme(ctx), "Starting download...");

    let result = handle.wait_with_progress(|p| display.update(p)).await?;
    match result {
        Ok(summary) => {
            display.finish(format!("Saved {}", summary.path.display()));
            Ok(summary)
        }
        Err(e) => {
            display.clear();
            Err(e)
        }
    }
}

fn format_row(position: usize, record: &AvatarRecord) -> String {
    let platforms = record.platforms();
    format!(
        "{:>3}. {} by {} [{}] {}{}",
        position,
        record.display_name(),
        if record.author_name.is_empty() {
            "unknown"
        } else {
            record.author_name.as_str()
        },
        record.release_status.as_deref().unwrap_or("unknown"),
        record.id,
        if platforms.is_empty() {
            String::new()
        } else {
            format!(" ({})", platforms.join(", "))
        }
    )
}

fn print_current_page(ctx: &AppContext) {
    let catalog = ctx.catalog();
    for (i, record) in catalog.current_page_items().into_iter().enumerate() {
        println!("{}", format_row(i + 1, record));
    }
    println!();
    println!("{} | {}", catalog.status_line(), catalog.page_label());
}

/// Handle the list command
pub async fn handle_list(ctx: &mut AppContext, args: ListArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    ensure_logged_in(ctx).await?;

    refresh_catalog(ctx, args.release).await?;

    let catalog = ctx.catalog_mut();
    if let Some(search) = &args.search {
        catalog.set_filter(search);
    }
    if let Some(page_size) = args.page_size {
        catalog.set_page_size(page_size);
    }
    let page = catalog.set_page(args.page);
    if page != args.page {
        warn!("Page {} out of range, showing page {}", args.page, page);
    }

    if args.json {
        let items = ctx.catalog().current_page_items();
        let json = serde_json::to_string_pretty(&items)
            .map_err(|e| AppError::generic(format!("Failed to encode avatars: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if args.search.is_some() {
        println!("{}", ctx.catalog().filter_summary());
    }
    print_current_page(ctx);
    Ok(())
}

/// Handle the download command
pub async fn handle_download(ctx: &mut AppContext, args: DownloadArgs) -> Result<()> {
    ensure_logged_in(ctx).await?;

    let handle = ctx.spawn_avatar_download(&args.avatar_id, args.output, args.force)?;
    let summary = run_download(ctx, handle).await?;

    println!(
        "Downloaded {} ({:.1} MB)",
        summary.path.display(),
        summary.bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// Handle the download-url command
pub async fn handle_download_url(ctx: &mut AppContext, args: DownloadUrlArgs) -> Result<()> {
    ensure_logged_in(ctx).await?;

    let handle = ctx.spawn_url_download(&args.url, args.output, args.force)?;
    let summary = run_download(ctx, handle).await?;

    println!("Downloaded {}", summary.path.display());
    Ok(())
}

/// Handle the thumbnail command
pub async fn handle_thumbnail(ctx: &mut AppContext, args: ThumbnailArgs) -> Result<()> {
    ensure_logged_in(ctx).await?;

    let session = ctx.session()?;
    let record = session.client().fetch_avatar(args.avatar_id.trim()).await?;
    let bytes = session
        .client()
        .download_thumbnail(&record, &args.output)
        .await?;

    println!("Saved thumbnail ({} bytes) to {}", bytes, args.output.display());
    Ok(())
}

const BROWSE_HELP: &str = "Commands:
  search <text>      filter by name, author or description (empty clears)
  page <n>           go to page n
  next | prev        move one page
  size <n>           avatars per page (10, 25, 50, 100)
  refresh            fetch the listing again
  download <n> [path] download item n on this page
  help               show this help
  quit               leave";

/// One parsed line of the interactive browser
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Search(String),
    Page(usize),
    Next,
    Previous,
    Size(usize),
    Refresh,
    Download {
        position: usize,
        output: Option<PathBuf>,
    },
    Help,
    Quit,
}

fn parse_browse_command(line: &str) -> std::result::Result<BrowseCommand, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let number = |what: &str| -> std::result::Result<usize, String> {
        rest.parse::<usize>()
            .map_err(|_| format!("'{}' expects a number", what))
    };

    match command.to_lowercase().as_str() {
        "search" | "s" => Ok(BrowseCommand::Search(rest.to_string())),
        "page" | "p" => number("page").map(BrowseCommand::Page),
        "next" | "n" => Ok(BrowseCommand::Next),
        "prev" | "previous" => Ok(BrowseCommand::Previous),
        "size" => number("size").map(BrowseCommand::Size),
        "refresh" | "r" => Ok(BrowseCommand::Refresh),
        "download" | "d" => {
            let (position, output) = match rest.split_once(char::is_whitespace) {
                Some((position, output)) => (position, Some(PathBuf::from(output.trim()))),
                None => (rest, None),
            };
            let position = position
                .parse::<usize>()
                .map_err(|_| "'download' expects an item number".to_string())?;
            Ok(BrowseCommand::Download { position, output })
        }
        "help" | "h" | "?" => Ok(BrowseCommand::Help),
        "quit" | "q" | "exit" => Ok(BrowseCommand::Quit),
        "" => Ok(BrowseCommand::Help),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

fn report(error: &AppError) {
    if error.is_warning() {
        println!("Warning: {}", error);
    } else {
        println!("Error: {}", error);
    }
}

/// Handle the browse command
pub async fn handle_browse(ctx: &mut AppContext, args: BrowseArgs) -> Result<()> {
    ensure_logged_in(ctx).await?;
    refresh_catalog(ctx, args.release).await?;

    println!("{}", ctx.catalog().filter_summary());
    print_current_page(ctx);
    println!();
    println!("Type 'help' for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let command = match parse_browse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!("Browse command: {:?}", command);

        match command {
            BrowseCommand::Search(text) => {
                ctx.catalog_mut().set_filter(&text);
                println!("{}", ctx.catalog().filter_summary());
                print_current_page(ctx);
            }
            BrowseCommand::Page(page) => {
                ctx.catalog_mut().set_page(page);
                print_current_page(ctx);
            }
            BrowseCommand::Next => {
                ctx.catalog_mut().next_page();
                print_current_page(ctx);
            }
            BrowseCommand::Previous => {
                ctx.catalog_mut().previous_page();
                print_current_page(ctx);
            }
            BrowseCommand::Size(size) => {
                if !catalog::PAGE_SIZE_OPTIONS.contains(&size) {
                    println!("Page size must be one of {:?}", catalog::PAGE_SIZE_OPTIONS);
                    continue;
                }
                ctx.catalog_mut().set_page_size(size);
                print_current_page(ctx);
            }
            BrowseCommand::Refresh => match refresh_catalog(ctx, args.release).await {
                Ok(_) => {
                    println!("{}", ctx.catalog().filter_summary());
                    print_current_page(ctx);
                }
                Err(e) => report(&e),
            },
            BrowseCommand::Download { position, output } => {
                let Some(record) = ctx.catalog().select(position) else {
                    println!("No item {} on this page", position);
                    continue;
                };
                let avatar_id = record.id.clone();

                let result = match ctx.spawn_avatar_download(&avatar_id, output, false) {
                    Ok(handle) => run_download(ctx, handle).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(summary) => println!("Downloaded {}", summary.path.display()),
                    Err(e) => report(&e),
                }
            }
            BrowseCommand::Help => println!("{}", BROWSE_HELP),
            BrowseCommand::Quit => break,
        }
    }

    Ok(())
}

/// Handle authentication commands
pub async fn handle_auth(ctx: &AppContext, args: AuthArgs) -> Result<()> {
    let client_config = &ctx.config().client;
    let settings_path = ctx.settings_path();

    match args.action {
        AuthAction::Setup => {
            setup_credentials(client_config, settings_path).await?;
        }
        AuthAction::Verify => {
            if verify_credentials(client_config, settings_path).await? {
                println!("Credentials verified successfully");
            } else {
                return Err(AppError::generic("Credential verification failed"));
            }
        }
        AuthAction::Status => {
            show_auth_status(client_config, settings_path).await?;
        }
        AuthAction::Clear => {
            if clear_credentials(settings_path)? {
                println!("Saved credentials cleared from {}", settings_path.display());
            } else {
                println!("No saved credentials to clear");
            }
        }
    }

    Ok(())
}

/// Handle the theme command
pub fn handle_theme(ctx: &mut AppContext, args: ThemeArgs) -> Result<()> {
    let settings = save_theme(ctx.settings_path(), args.mode.is_dark())?;
    *ctx.settings_mut() = settings;

    println!(
        "Theme set to {}",
        if args.mode.is_dark() { "dark" } else { "light" }
    );
    Ok(())
}
