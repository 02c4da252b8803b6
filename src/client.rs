//! Client facade composing the QR authenticator, session store and request
//! executor into the operations end users and MCP tools call.
//!
//! Every operation goes through [`Client::call`], which performs the single
//! documented recovery: when the provider reports the session expired, the
//! store is cleared (by the executor), the QR handshake may run once, and
//! the same operation is retried exactly once. A second consecutive expiry
//! escalates to a fatal authentication error.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{endpoints, HttpTransport, Operation, RequestExecutor};
use crate::api::transport::ApiTransport;
use crate::auth::{QrAuthenticator, QrTicket};
use crate::errors::{Error, Result};
use crate::models::{
    DirectoryInfo, DownloadInfo, DownloadTask, FileResource, Session, UserInfo,
};
use crate::session::SessionStore;
use crate::settings::BitqiuSettings;
use crate::utils::datetime_to_timestamp_ms;

/// Page size used by the resource listing endpoints
const LIST_PAGE_LIMIT: u32 = 24;
/// Provider limit on items moved or copied in one call
const MAX_BATCH_ITEMS: usize = 50;
/// Provider limit on offline download tasks added in one call
const MAX_DOWNLOAD_TASKS: usize = 20;

/// Sort field for resource listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    UpdateTime,
    Size,
}

impl SortField {
    const fn as_wire(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::UpdateTime => "updateTime",
            Self::Size => "size",
        }
    }
}

/// BitQiu cloud storage client
#[derive(Clone)]
pub struct Client {
    executor: RequestExecutor,
    authenticator: QrAuthenticator,
    store: SessionStore,
    settings: BitqiuSettings,
}

// Wire shapes for the listing endpoints; public models are built from these
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    has_next: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResource {
    resource_id: String,
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    dir_type: Option<i64>,
    create_time: String,
    update_time: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDirectory {
    dir_id: String,
    name: String,
    create_time: String,
    update_time: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    task_id: String,
    #[serde(default)]
    name: String,
    status: crate::models::TaskStatus,
}

impl Client {
    /// Build a client for the configured provider, restoring a persisted
    /// session if one is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the configured base URL is
    /// invalid.
    pub fn new(settings: BitqiuSettings) -> Result<Self> {
        let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(
            &settings.api.base_url,
            Duration::from_secs(settings.api.request_timeout_secs),
        )?);
        let store = settings
            .session
            .store_path
            .as_deref()
            .map_or_else(SessionStore::new, SessionStore::load);
        Ok(Self::with_transport(settings, transport, store))
    }

    /// Build a client over an explicit transport and store. This is the
    /// seam tests and embedders use to substitute the network.
    #[must_use]
    pub fn with_transport(
        settings: BitqiuSettings,
        transport: Arc<dyn ApiTransport>,
        store: SessionStore,
    ) -> Self {
        let executor = RequestExecutor::new(
            transport.clone(),
            store.clone(),
            settings.api.org_channel.clone(),
        );
        let authenticator =
            QrAuthenticator::new(transport, settings.api.clone(), settings.auth.clone());
        Self {
            executor,
            authenticator,
            store,
            settings,
        }
    }

    /// The session store backing this client
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The QR authenticator backing this client
    #[must_use]
    pub const fn authenticator(&self) -> &QrAuthenticator {
        &self.authenticator
    }

    /// Whether a session is currently held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    // =========================================================================
    // Login and session lifecycle
    // =========================================================================

    /// Start a QR login attempt.
    ///
    /// # Errors
    ///
    /// Propagates ticket-creation failures from the authenticator.
    pub async fn login_begin(&self) -> Result<QrTicket> {
        self.authenticator.begin().await
    }

    /// Wait for a previously started login attempt to finish, then store
    /// (and if configured, persist) the resulting session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the ticket expires, is
    /// denied, or the wait times out. The store is untouched on failure.
    pub async fn login_complete(&self, ticket: QrTicket) -> Result<Session> {
        let session = self.authenticator.wait_for_confirmation(ticket).await?;
        let session =
            QrAuthenticator::with_local_ttl(session, self.settings.session.ttl_hours);
        self.store.set(session.clone());
        self.persist_store();
        Ok(session)
    }

    /// Run the full QR handshake: issue a ticket, log the scannable link,
    /// and wait for confirmation.
    ///
    /// # Errors
    ///
    /// See [`Client::login_begin`] and [`Client::login_complete`].
    pub async fn login_with_qr(&self) -> Result<Session> {
        let ticket = self.login_begin().await?;
        log::info!(
            "please scan the QR code: {}",
            self.authenticator.qr_image_link(&ticket)
        );
        self.login_complete(ticket).await
    }

    /// Drop the current session, also removing the persisted record
    pub fn logout(&self) {
        self.store.clear();
        self.persist_store();
    }

    fn persist_store(&self) {
        if let Some(path) = &self.settings.session.store_path {
            if let Err(e) = self.store.save(path) {
                log::warn!("failed to persist session to {}: {e}", path.display());
            }
        }
    }

    /// Execute an operation with the single retry-after-reauthentication
    /// recovery applied
    async fn call(&self, operation: Operation) -> Result<Value> {
        match self.executor.execute(&operation).await {
            Err(Error::SessionExpired) => {
                if !self.settings.auth.reauth_on_expiry {
                    return Err(Error::auth("session expired - please login again"));
                }
                log::info!("session expired; starting QR reauthentication");
                self.login_with_qr().await?;
                match self.executor.execute(&operation).await {
                    Err(Error::SessionExpired) => Err(Error::auth(
                        "session expired again immediately after reauthentication",
                    )),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Root directory for the account, required by the listing and
    /// creation endpoints when no parent is given
    fn root_dir(&self) -> Result<String> {
        self.store
            .get()
            .and_then(|s| s.root_dir_id)
            .ok_or_else(|| Error::auth("user info not loaded - call user_info first"))
    }

    // =========================================================================
    // Account operations
    // =========================================================================

    /// Fetch account information and record the root directory id on the
    /// session.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn user_info(&self) -> Result<UserInfo> {
        let data = self.call(Operation::post(endpoints::USER_INFO)).await?;
        let info: UserInfo = serde_json::from_value(data).map_err(Error::malformed)?;

        if let Some(mut session) = self.store.get() {
            session.root_dir_id = Some(info.root_dir_id.clone());
            self.store.set(session);
            self.persist_store();
        }

        Ok(info)
    }

    /// Perform the daily sign-in; returns the awarded points when the
    /// provider reports them.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn daily_signin(&self) -> Result<Option<i64>> {
        let data = self.call(Operation::post(endpoints::SIGNIN)).await?;
        Ok(data.get("integral").and_then(Value::as_i64))
    }

    // =========================================================================
    // Resource operations
    // =========================================================================

    /// List files and directories under `parent_dir` (account root when
    /// `None`), following pagination to the end.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn list_resources(
        &self,
        parent_dir: Option<&str>,
        order_by: SortField,
        ascending: bool,
    ) -> Result<Vec<FileResource>> {
        let parent_id = match parent_dir {
            Some(id) => id.to_string(),
            None => self.root_dir()?,
        };
        let user_id = self
            .store
            .get()
            .map(|s| s.user_id)
            .ok_or_else(|| Error::auth("not authenticated - please login first"))?;

        let mut resources = Vec::new();
        let mut page: u32 = 1;

        loop {
            let operation = Operation::post(endpoints::RESOURCE_PAGES)
                .param("parentId", parent_id.clone())
                .param("userId", user_id.clone())
                .param("limit", LIST_PAGE_LIMIT.to_string())
                .param("model", "1")
                .param("orderType", order_by.as_wire())
                .param("desc", if ascending { "0" } else { "1" })
                .param("currentPage", page.to_string())
                .param("page", page.to_string());

            let data = self.call(operation).await?;
            let wire: WirePage = serde_json::from_value(data).map_err(Error::malformed)?;

            for item in wire.data {
                resources.push(Self::resource_from_wire(item)?);
            }

            if !wire.has_next {
                break;
            }
            page += 1;
        }

        Ok(resources)
    }

    /// Search resources by name.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn search(&self, keyword: &str) -> Result<Vec<FileResource>> {
        if keyword.is_empty() {
            return Err(Error::InvalidArgument(
                "search keyword must not be empty".to_string(),
            ));
        }
        let user_id = self
            .store
            .get()
            .map(|s| s.user_id)
            .ok_or_else(|| Error::auth("not authenticated - please login first"))?;

        let mut resources = Vec::new();
        let mut page: u32 = 1;

        loop {
            let operation = Operation::post(endpoints::SEARCH)
                .param("name", keyword)
                .param("userId", user_id.clone())
                .param("limit", LIST_PAGE_LIMIT.to_string())
                .param("currentPage", page.to_string())
                .param("page", page.to_string());

            let data = self.call(operation).await?;
            let wire: WirePage = serde_json::from_value(data).map_err(Error::malformed)?;

            for item in wire.data {
                resources.push(Self::resource_from_wire(item)?);
            }

            if !wire.has_next {
                break;
            }
            page += 1;
        }

        Ok(resources)
    }

    /// List only the directories under `parent_dir` (account root when
    /// `None`).
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn list_directories(&self, parent_dir: Option<&str>) -> Result<Vec<DirectoryInfo>> {
        let parent_id = match parent_dir {
            Some(id) => id.to_string(),
            None => self.root_dir()?,
        };

        let operation = Operation::post(endpoints::RESOURCE_LIST)
            .param("parentId", parent_id)
            .param("limit", "100")
            .param("currentPage", "1");

        let data = self.call(operation).await?;
        let wire: WirePage = serde_json::from_value(data).map_err(Error::malformed)?;
        if wire.has_next {
            log::warn!("directory listing truncated at 100 entries");
        }

        wire.data
            .into_iter()
            .map(Self::directory_from_wire)
            .collect()
    }

    /// Create a directory under `parent_dir` (account root when `None`).
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn create_directory(
        &self,
        name: &str,
        parent_dir: Option<&str>,
    ) -> Result<DirectoryInfo> {
        let parent_id = match parent_dir {
            Some(id) => id.to_string(),
            None => self.root_dir()?,
        };

        let operation = Operation::post(endpoints::RESOURCE_CREATE)
            .param("parentId", parent_id)
            .param("name", name);

        let data = self.call(operation).await?;
        Self::directory_from_wire(data)
    }

    /// Rename a file or directory.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn rename_resource(
        &self,
        resource_id: &str,
        new_name: &str,
        is_directory: bool,
    ) -> Result<()> {
        let operation = Operation::post(endpoints::RESOURCE_RENAME)
            .param("resourceId", resource_id)
            .param("name", new_name)
            .param("type", if is_directory { "1" } else { "2" });

        self.call(operation).await?;
        Ok(())
    }

    /// Move resources into `target_dir` (account root when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when more than 50 items are given;
    /// otherwise fails with the standard taxonomy.
    pub async fn move_resources(
        &self,
        target_dir: Option<&str>,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        if dir_ids.len() + file_ids.len() > MAX_BATCH_ITEMS {
            return Err(Error::InvalidArgument(format!(
                "cannot move more than {MAX_BATCH_ITEMS} items at once"
            )));
        }
        let target_id = match target_dir {
            Some(id) => id.to_string(),
            None => self.root_dir()?,
        };

        let operation = Operation::post(endpoints::RESOURCE_MOVE)
            .param("parentId", target_id)
            .param("dirIds", dir_ids.join(","))
            .param("fileIds", file_ids.join(","));

        self.call(operation).await?;
        Ok(())
    }

    /// Copy resources into `target_dir` (account root when `None`).
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn copy_resources(
        &self,
        target_dir: Option<&str>,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        let target_id = match target_dir {
            Some(id) => id.to_string(),
            None => self.root_dir()?,
        };

        let operation = Operation::post(endpoints::RESOURCE_COPY)
            .param("parentId", target_id)
            .param("dirIds", dir_ids.join(","))
            .param("fileIds", file_ids.join(","));

        self.call(operation).await?;
        Ok(())
    }

    /// Delete directories and files.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn delete_resources(&self, dir_ids: &[String], file_ids: &[String]) -> Result<()> {
        let operation = Operation::post(endpoints::RESOURCE_DELETE)
            .param("dirIds", dir_ids.join(","))
            .param("fileIds", file_ids.join(","));

        self.call(operation).await?;
        Ok(())
    }

    /// Fetch the download location for a file.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn download_url(&self, file_id: &str) -> Result<DownloadInfo> {
        let operation = Operation::post(endpoints::DOWNLOAD_URL).param("fileIds", file_id);
        let data = self.call(operation).await?;
        serde_json::from_value(data).map_err(Error::malformed)
    }

    /// Add resources to, or remove them from, the favorites collection.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn set_collected(
        &self,
        collected: bool,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        let endpoint = if collected {
            endpoints::COLLECTION_ADD
        } else {
            endpoints::COLLECTION_CANCEL
        };
        let operation = Operation::post(endpoint)
            .param("dirIds", dir_ids.join(","))
            .param("fileIds", file_ids.join(","));

        self.call(operation).await?;
        Ok(())
    }

    // =========================================================================
    // Offline download tasks
    // =========================================================================

    /// Queue magnet/ed2k links for offline download into `target_dir`.
    ///
    /// Returns the number of tasks the provider accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for non-magnet/ed2k links or more
    /// than 20 URLs; otherwise fails with the standard taxonomy.
    pub async fn add_download_tasks(
        &self,
        urls: &[String],
        target_dir: Option<&str>,
    ) -> Result<usize> {
        for url in urls {
            if !(url.starts_with("magnet:") || url.starts_with("ed2k://")) {
                return Err(Error::InvalidArgument(
                    "only magnet or ed2k links are allowed".to_string(),
                ));
            }
        }
        if urls.len() > MAX_DOWNLOAD_TASKS {
            return Err(Error::InvalidArgument(format!(
                "cannot add more than {MAX_DOWNLOAD_TASKS} download tasks at once"
            )));
        }
        let user_id = self
            .store
            .get()
            .map(|s| s.user_id)
            .ok_or_else(|| Error::auth("not authenticated - please login first"))?;

        let encoded: Vec<String> = urls
            .iter()
            .map(|url| urlencoding::encode(url).into_owned())
            .collect();
        let download_urls =
            serde_json::to_string(&encoded).map_err(Error::malformed)?;

        let operation = Operation::post(endpoints::TASK_ADD)
            .param("userId", user_id)
            .param("dirId", target_dir.unwrap_or(""))
            .param("downloadUrls", download_urls);

        let data = self.call(operation).await?;
        let accepted = data
            .get("success")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if accepted < urls.len() {
            log::warn!(
                "provider accepted {accepted} of {} download tasks",
                urls.len()
            );
        }
        Ok(accepted)
    }

    /// List the account's offline download tasks.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn list_download_tasks(&self) -> Result<Vec<DownloadTask>> {
        let data = self.call(Operation::post(endpoints::TASK_LIST)).await?;
        let wire: WirePage = serde_json::from_value(data).map_err(Error::malformed)?;
        wire.data
            .into_iter()
            .map(|item| {
                let task: WireTask = serde_json::from_value(item).map_err(Error::malformed)?;
                Ok(DownloadTask {
                    task_id: task.task_id,
                    name: task.name,
                    status: task.status,
                })
            })
            .collect()
    }

    /// Cancel an offline download task.
    ///
    /// # Errors
    ///
    /// Fails with the standard taxonomy; see [`crate::errors::Error`].
    pub async fn cancel_download_task(&self, task_id: &str) -> Result<()> {
        let operation = Operation::post(endpoints::TASK_CANCEL).param("taskIds", task_id);
        self.call(operation).await?;
        Ok(())
    }

    // =========================================================================
    // Wire conversions
    // =========================================================================

    fn resource_from_wire(item: Value) -> Result<FileResource> {
        let wire: WireResource = serde_json::from_value(item).map_err(Error::malformed)?;
        Ok(FileResource {
            resource_id: wire.resource_id,
            name: wire.name,
            size: wire.size,
            is_directory: wire.dir_type.is_some(),
            create_time: datetime_to_timestamp_ms(&wire.create_time)?,
            update_time: datetime_to_timestamp_ms(&wire.update_time)?,
        })
    }

    fn directory_from_wire(item: Value) -> Result<DirectoryInfo> {
        let wire: WireDirectory = serde_json::from_value(item).map_err(Error::malformed)?;
        Ok(DirectoryInfo {
            dir_id: wire.dir_id,
            name: wire.name,
            create_time: datetime_to_timestamp_ms(&wire.create_time)?,
            update_time: datetime_to_timestamp_ms(&wire.update_time)?,
        })
    }
}
