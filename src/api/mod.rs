//! Provider API plumbing: endpoint table, response envelope, transport and
//! the authenticated request executor

pub mod envelope;
pub mod executor;
pub mod transport;

pub use envelope::{classify, ApiEnvelope, Outcome, SESSION_EXPIRED_CODE, SUCCESS_CODE};
pub use executor::{Operation, RequestExecutor};
pub use transport::{ApiRequest, ApiTransport, HttpTransport};

/// API endpoint paths, kept in one place so no wrapper re-derives them
pub mod endpoints {
    pub const QR_CODE: &str = "/loginServer/getQRCode";
    pub const QR_CODE_INFO: &str = "/loginServer/getQRCodeInfo";
    pub const USER_INFO: &str = "/user/getInfo";
    pub const SEARCH: &str = "/apiToken/cfi/fs/search/name";
    pub const RESOURCE_PAGES: &str = "/apiToken/cfi/fs/resources/pages";
    pub const RESOURCE_COPY: &str = "/apiToken/cfi/fs/async/copy";
    pub const RESOURCE_LIST: &str = "/resource/dirList";
    pub const RESOURCE_CREATE: &str = "/resource/create";
    pub const RESOURCE_DELETE: &str = "/resource/delete";
    pub const RESOURCE_RENAME: &str = "/resource/rename";
    pub const RESOURCE_MOVE: &str = "/resource/remove";
    pub const COLLECTION_ADD: &str = "/collect/add";
    pub const COLLECTION_CANCEL: &str = "/collect/cancel";
    pub const TASK_LIST: &str = "/cloudDownload/getUserTaskList";
    pub const TASK_ADD: &str = "/cloudDownload/addTasks";
    pub const TASK_CANCEL: &str = "/cloudDownload/cancelTask";
    pub const DOWNLOAD_URL: &str = "/download/getUrl";
    pub const SIGNIN: &str = "/integral/randomSignin";
}
