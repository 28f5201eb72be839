//! Application context shared by the command handlers
//!
//! Holds the runtime configuration, the saved settings, the login state, the
//! catalog of fetched avatars and the task pool. Long-running work (fetching,
//! downloading) is spawned on the pool with a clone of the session, so the
//! context itself never blocks on the network while a task runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::catalog::AvatarCatalog;
use crate::app::client::{ApiClient, AuthHandler, LoginOutcome, PendingTwoFactor, Session};
use crate::app::fetch::AvatarFetcher;
use crate::app::models::{AvatarRecord, ReleaseFilter, TwoFactorKind, User};
use crate::app::resolve::{file_name_with_extension, resolve_download_url};
use crate::app::tasks::{ProgressReporter, TaskHandle, TaskPool};
use crate::auth::Settings;
use crate::config::RuntimeConfig;
use crate::errors::{ApiResult, AuthError, AuthResult, DownloadError, Result};

/// Where the login flow stands
#[derive(Debug, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingTwoFactor(PendingTwoFactor),
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The code the service is waiting for, if any
    pub fn pending_kind(&self) -> Option<TwoFactorKind> {
        match self {
            Self::AwaitingTwoFactor(pending) => Some(pending.kind()),
            _ => None,
        }
    }
}

/// Finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Explicit application state
#[derive(Debug)]
pub struct AppContext {
    config: RuntimeConfig,
    settings_path: PathBuf,
    settings: Settings,
    auth: AuthState,
    catalog: AvatarCatalog,
    tasks: TaskPool,
}

impl AppContext {
    pub fn new(config: RuntimeConfig, settings_path: PathBuf, settings: Settings) -> Self {
        let catalog = AvatarCatalog::new(config.catalog_page_size);
        let tasks = TaskPool::new(config.max_concurrent_tasks);

        Self {
            config,
            settings_path,
            settings,
            auth: AuthState::Unauthenticated,
            catalog,
            tasks,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn catalog(&self) -> &AvatarCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut AvatarCatalog {
        &mut self.catalog
    }

    pub fn tasks(&self) -> &TaskPool {
        &self.tasks
    }

    /// Starts a fresh login, discarding any previous session
    ///
    /// Returns the kind of code needed when the service asks for a second
    /// factor; `None` means the login is complete.
    pub async fn begin_login(
        &mut self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<TwoFactorKind>> {
        self.auth = AuthState::Unauthenticated;

        match AuthHandler::login(&self.config.client, username, password).await? {
            LoginOutcome::Authenticated(session) => {
                self.auth = AuthState::Authenticated(session);
                Ok(None)
            }
            LoginOutcome::TwoFactorRequired(pending) => {
                let kind = pending.kind();
                self.auth = AuthState::AwaitingTwoFactor(pending);
                Ok(Some(kind))
            }
        }
    }

    /// Submits the second-factor code for the pending login
    ///
    /// On failure the pending login is dropped and `begin_login` must be
    /// called again.
    pub async fn submit_two_factor(&mut self, code: &str) -> AuthResult<&User> {
        let pending = match std::mem::take(&mut self.auth) {
            AuthState::AwaitingTwoFactor(pending) => pending,
            other => {
                self.auth = other;
                return Err(AuthError::NotAuthenticated);
            }
        };

        let session = pending.verify(code).await?;
        self.auth = AuthState::Authenticated(session);
        self.user()
    }

    /// The active session
    pub fn session(&self) -> AuthResult<&Session> {
        match &self.auth {
            AuthState::Authenticated(session) => Ok(session),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    pub fn user(&self) -> AuthResult<&User> {
        self.session().map(Session::user)
    }

    /// Spawns a full listing fetch; progress reports each received page
    pub fn spawn_fetch(
        &self,
        filter: ReleaseFilter,
    ) -> AuthResult<TaskHandle<ApiResult<Vec<AvatarRecord>>>> {
        let client = self.session()?.shared_client();
        let fetch_config = self.config.fetch;

        Ok(self.tasks.spawn(
            format!("fetch {} avatars", filter),
            move |progress: ProgressReporter| async move {
                progress.message("Fetching avatars...");
                AvatarFetcher::new(client.as_ref(), fetch_config)
                    .fetch_all_with_progress(filter, |page| {
                        progress.message(format!(
                            "Retrieved {} avatars (total: {})",
                            page.received, page.total
                        ))
                    })
                    .await
            },
        ))
    }

    /// Replaces the catalog contents with a finished fetch
    pub fn load_catalog(&mut self, records: Vec<AvatarRecord>) {
        self.catalog.replace_records(records);
        tracing::info!("{}", self.catalog.filter_summary());
    }

    /// Spawns the download of one avatar by id
    ///
    /// The detail record is fetched first, since listings can omit package
    /// URLs. Without `destination` the file goes to the configured output
    /// directory under the avatar's sanitized name.
    pub fn spawn_avatar_download(
        &self,
        avatar_id: &str,
        destination: Option<PathBuf>,
        force: bool,
    ) -> Result<TaskHandle<Result<DownloadSummary>>> {
        let avatar_id = avatar_id.trim().to_string();
        if avatar_id.is_empty() {
            return Err(DownloadError::MissingAvatarId.into());
        }

        let client = self.session()?.shared_client();
        let output_dir = self.config.download.output_dir.clone();
        let extension = self.config.download.file_extension.clone();

        Ok(self.tasks.spawn(
            format!("download {}", avatar_id),
            move |progress: ProgressReporter| async move {
                progress.message("Fetching avatar details...");
                let record = client.fetch_avatar(&avatar_id).await?;
                let url = resolve_download_url(&record)?;
                let path = destination.unwrap_or_else(|| {
                    output_dir.join(file_name_with_extension(&record, &extension))
                });

                tracing::info!("Downloading avatar {} to {}", record.display_name(), path.display());
                download_with_progress(&client, &url, path, force, &progress).await
            },
        ))
    }

    /// Spawns the download of an arbitrary file URL with the session
    pub fn spawn_url_download(
        &self,
        url: &str,
        destination: PathBuf,
        force: bool,
    ) -> AuthResult<TaskHandle<Result<DownloadSummary>>> {
        let client = self.session()?.shared_client();
        let url = url.trim().to_string();

        Ok(self.tasks.spawn(
            format!("download {}", url),
            move |progress: ProgressReporter| async move {
                download_with_progress(&client, &url, destination, force, &progress).await
            },
        ))
    }

    /// Persists the current settings
    pub fn save_settings(&self) -> AuthResult<()> {
        self.settings.save(&self.settings_path)
    }
}

async fn download_with_progress(
    client: &Arc<ApiClient>,
    url: &str,
    path: PathBuf,
    force: bool,
    progress: &ProgressReporter,
) -> Result<DownloadSummary> {
    let bytes = client
        .download_file(url, &path, force, |p| {
            progress.percent(p.percent, p.message.clone())
        })
        .await?;

    Ok(DownloadSummary { path, bytes })
}
