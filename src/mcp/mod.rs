//! MCP server exposing the client facade as callable tools
//!
//! The blocking QR handshake is split into two tools so it stays usable
//! from a tool-call interface: `login_start` returns the scannable link
//! immediately and parks the ticket; `login_wait` drives the poll loop to a
//! terminal state. Tool errors are structured (kind plus provider
//! code/message), never raw transport detail.

pub mod params;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::auth::QrTicket;
use crate::client::{Client, SortField};
use crate::errors::Error;
use crate::mcp::params::{
    CreateDirectoryParams, DeleteResourcesParams, DownloadUrlParams, ListDirectoriesParams,
    ListResourcesParams, MoveResourcesParams, RenameResourceParams, SearchParams,
    SetCollectedParams,
};

/// Map a client error onto a structured MCP error
fn to_mcp_error(err: Error) -> McpError {
    let data = Some(serde_json::json!({ "kind": err.kind() }));
    match err {
        Error::InvalidArgument(message) => McpError::invalid_params(message, data),
        Error::Api { code, message } => McpError::internal_error(
            format!("provider rejected the call ({code}): {message}"),
            Some(serde_json::json!({ "kind": "api", "code": code, "message": message })),
        ),
        other => McpError::internal_error(other.to_string(), data),
    }
}

/// Serialize a result payload into tool content
fn json_content<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to encode result: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn parse_sort_field(order_by: Option<&str>) -> Result<SortField, McpError> {
    match order_by {
        None | Some("name") => Ok(SortField::Name),
        Some("updateTime") => Ok(SortField::UpdateTime),
        Some("size") => Ok(SortField::Size),
        Some(other) => Err(McpError::invalid_params(
            format!("unknown sort field {other:?}; expected name, updateTime or size"),
            None,
        )),
    }
}

/// BitQiu MCP server
#[derive(Clone)]
pub struct BitqiuMcpServer {
    client: Arc<Client>,
    pending_login: Arc<Mutex<Option<QrTicket>>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BitqiuMcpServer {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            pending_login: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Start a QR-code login. Returns a link to a scannable QR image; scan it with the BitQiu mobile app, then call login_wait."
    )]
    async fn login_start(&self) -> Result<CallToolResult, McpError> {
        let ticket = self.client.login_begin().await.map_err(to_mcp_error)?;
        let qr_image = self.client.authenticator().qr_image_link(&ticket);

        let response = serde_json::json!({
            "ticket_id": ticket.ticket_id,
            "qr_image": qr_image,
            "next_step": "scan the QR code, confirm on the device, then call login_wait",
        });
        *self.pending_login.lock().unwrap() = Some(ticket);

        json_content(&response)
    }

    #[tool(
        description = "Wait for the pending QR login to be scanned and confirmed. Blocks until the login reaches a terminal state or times out."
    )]
    async fn login_wait(&self) -> Result<CallToolResult, McpError> {
        let ticket = self.pending_login.lock().unwrap().take().ok_or_else(|| {
            McpError::invalid_params("no login in progress - call login_start first", None)
        })?;

        let session = self
            .client
            .login_complete(ticket)
            .await
            .map_err(to_mcp_error)?;

        json_content(&serde_json::json!({
            "authenticated": true,
            "user_id": session.user_id,
            "issued_at": session.issued_at,
        }))
    }

    #[tool(description = "Report whether a session is held and for which user.")]
    async fn session_status(&self) -> Result<CallToolResult, McpError> {
        match self.client.store().get() {
            Some(session) => json_content(&serde_json::json!({
                "authenticated": true,
                "user_id": session.user_id,
                "issued_at": session.issued_at,
                "expires_at": session.expires_at,
            })),
            None => json_content(&serde_json::json!({ "authenticated": false })),
        }
    }

    #[tool(description = "Drop the current session, including the persisted record.")]
    async fn logout(&self) -> Result<CallToolResult, McpError> {
        self.client.logout();
        json_content(&serde_json::json!({ "authenticated": false }))
    }

    #[tool(description = "Fetch account information (root directory id, privileges, quotas).")]
    async fn user_info(&self) -> Result<CallToolResult, McpError> {
        let info = self.client.user_info().await.map_err(to_mcp_error)?;
        json_content(&info)
    }

    #[tool(
        description = "List files and directories under a directory (the account root when parent_dir is omitted). Follows pagination to the end."
    )]
    async fn list_resources(
        &self,
        Parameters(params): Parameters<ListResourcesParams>,
    ) -> Result<CallToolResult, McpError> {
        let order_by = parse_sort_field(params.order_by.as_deref())?;
        let resources = self
            .client
            .list_resources(
                params.parent_dir.as_deref(),
                order_by,
                params.ascending.unwrap_or(true),
            )
            .await
            .map_err(to_mcp_error)?;
        json_content(&resources)
    }

    #[tool(description = "List only the directories under a directory.")]
    async fn list_directories(
        &self,
        Parameters(params): Parameters<ListDirectoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        let directories = self
            .client
            .list_directories(params.parent_dir.as_deref())
            .await
            .map_err(to_mcp_error)?;
        json_content(&directories)
    }

    #[tool(description = "Search resources by name.")]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let resources = self
            .client
            .search(&params.keyword)
            .await
            .map_err(to_mcp_error)?;
        json_content(&resources)
    }

    #[tool(description = "Create a directory.")]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<CreateDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let directory = self
            .client
            .create_directory(&params.name, params.parent_dir.as_deref())
            .await
            .map_err(to_mcp_error)?;
        json_content(&directory)
    }

    #[tool(description = "Rename a file or directory.")]
    async fn rename_resource(
        &self,
        Parameters(params): Parameters<RenameResourceParams>,
    ) -> Result<CallToolResult, McpError> {
        self.client
            .rename_resource(
                &params.resource_id,
                &params.new_name,
                params.is_directory.unwrap_or(false),
            )
            .await
            .map_err(to_mcp_error)?;
        json_content(&serde_json::json!({ "renamed": params.resource_id }))
    }

    #[tool(description = "Move files and directories into a target directory (at most 50 items).")]
    async fn move_resources(
        &self,
        Parameters(params): Parameters<MoveResourcesParams>,
    ) -> Result<CallToolResult, McpError> {
        self.client
            .move_resources(
                params.target_dir.as_deref(),
                &params.dir_ids,
                &params.file_ids,
            )
            .await
            .map_err(to_mcp_error)?;
        json_content(&serde_json::json!({
            "moved": params.dir_ids.len() + params.file_ids.len()
        }))
    }

    #[tool(description = "Delete files and directories.")]
    async fn delete_resources(
        &self,
        Parameters(params): Parameters<DeleteResourcesParams>,
    ) -> Result<CallToolResult, McpError> {
        self.client
            .delete_resources(&params.dir_ids, &params.file_ids)
            .await
            .map_err(to_mcp_error)?;
        json_content(&serde_json::json!({
            "deleted": params.dir_ids.len() + params.file_ids.len()
        }))
    }

    #[tool(description = "Fetch the download URL (with md5 and size) for a file.")]
    async fn get_download_url(
        &self,
        Parameters(params): Parameters<DownloadUrlParams>,
    ) -> Result<CallToolResult, McpError> {
        let info = self
            .client
            .download_url(&params.file_id)
            .await
            .map_err(to_mcp_error)?;
        json_content(&info)
    }

    #[tool(description = "Add resources to, or remove them from, the favorites collection.")]
    async fn set_collected(
        &self,
        Parameters(params): Parameters<SetCollectedParams>,
    ) -> Result<CallToolResult, McpError> {
        self.client
            .set_collected(params.collected, &params.dir_ids, &params.file_ids)
            .await
            .map_err(to_mcp_error)?;
        json_content(&serde_json::json!({ "collected": params.collected }))
    }

    #[tool(description = "Perform the daily sign-in to earn points.")]
    async fn daily_signin(&self) -> Result<CallToolResult, McpError> {
        let points = self.client.daily_signin().await.map_err(to_mcp_error)?;
        json_content(&serde_json::json!({ "signed_in": true, "points": points }))
    }
}

#[tool_handler]
impl ServerHandler for BitqiuMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bitqiu".into(),
                title: Some("BitQiu Cloud Storage".into()),
                version: crate::VERSION.into(),
                ..Default::default()
            },
            instructions: Some(
                "BitQiu cloud storage tools. Authenticate with login_start followed by \
                 login_wait before calling the storage operations."
                    .into(),
            ),
        }
    }
}
