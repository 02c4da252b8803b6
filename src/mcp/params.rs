//! Tool parameter schemas for the MCP surface

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListResourcesParams {
    /// Directory id to list; the account root when omitted
    pub parent_dir: Option<String>,
    /// Sort field: "name", "updateTime" or "size" (default "name")
    pub order_by: Option<String>,
    /// Sort ascending (default true)
    pub ascending: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoriesParams {
    /// Directory id to list; the account root when omitted
    pub parent_dir: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Name fragment to search for
    pub keyword: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDirectoryParams {
    /// Name of the directory to create
    pub name: String,
    /// Parent directory id; the account root when omitted
    pub parent_dir: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameResourceParams {
    /// Id of the file or directory to rename
    pub resource_id: String,
    /// New name
    pub new_name: String,
    /// Whether the resource is a directory (default false)
    pub is_directory: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveResourcesParams {
    /// Target directory id; the account root when omitted
    pub target_dir: Option<String>,
    /// Directory ids to move
    #[serde(default)]
    pub dir_ids: Vec<String>,
    /// File ids to move
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteResourcesParams {
    /// Directory ids to delete
    #[serde(default)]
    pub dir_ids: Vec<String>,
    /// File ids to delete
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadUrlParams {
    /// Id of the file to fetch a download URL for
    pub file_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetCollectedParams {
    /// true to add to favorites, false to remove
    pub collected: bool,
    /// Directory ids
    #[serde(default)]
    pub dir_ids: Vec<String>,
    /// File ids
    #[serde(default)]
    pub file_ids: Vec<String>,
}
