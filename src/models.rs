//! Session and provider data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session state for a single BitQiu user.
///
/// A session is created by the QR authenticator once the handshake reaches
/// the confirmed state, read by every authenticated request, and dropped
/// again when the provider reports it expired. A `Session` value is always
/// fully populated; "no session" is represented by absence (see
/// [`crate::session::SessionStore`]), never by a half-initialized record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Opaque session token (the provider's `cloud_web_sid` cookie)
    pub token: String,
    /// Provider user identifier (the `cloud_web_uid` cookie)
    pub user_id: String,
    /// Root directory id, filled in after the first `user_info` call
    pub root_dir_id: Option<String>,
    /// When the handshake completed
    pub issued_at: DateTime<Utc>,
    /// Optional local validity window; `None` leaves expiry to the server
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check whether the session is past its local expiry at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Check whether the session is past its local expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// User privilege flags and remaining quotas
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserPrivilege {
    pub cloud_download: bool,
    pub cloud_download_count_remain: i64,
    pub cloud_video_play: bool,
    pub cloud_video_play_count_remain: i64,
    pub cloud_music_play: bool,
    pub cloud_music_play_count_remain: i64,
    pub cloud_doc_play: bool,
    pub cloud_doc_play_count_remain: i64,
    pub privileged_gear_name: String,
}

/// Account information returned by the user-info endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub root_dir_id: String,
    pub privilege: UserPrivilege,
}

/// A file or directory entry in a resource listing
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileResource {
    pub resource_id: String,
    pub name: String,
    pub size: Option<u64>,
    pub is_directory: bool,
    /// Creation time, epoch milliseconds
    pub create_time: i64,
    /// Last update time, epoch milliseconds
    pub update_time: i64,
}

/// A directory entry from the directory-list endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DirectoryInfo {
    pub dir_id: String,
    pub name: String,
    pub create_time: i64,
    pub update_time: i64,
}

/// Download location for a single file
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DownloadInfo {
    pub md5: String,
    pub size: u64,
    pub url: String,
}

/// Offline download task state as encoded on the wire
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    #[serde(rename = "0")]
    Pending,
    #[serde(rename = "1")]
    Downloading,
    #[serde(rename = "2")]
    Completed,
    #[serde(rename = "3")]
    Failed,
}

/// An offline (cloud) download task
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTask {
    pub task_id: String,
    pub name: String,
    pub status: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            token: "sid_123".to_string(),
            user_id: "uid_456".to_string(),
            root_dir_id: None,
            issued_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn test_session_without_expiry_never_expires() {
        assert!(!session(None).is_expired());
    }

    #[test]
    fn test_session_expiry_window() {
        let now = Utc::now();
        assert!(!session(Some(now + Duration::hours(1))).is_expired_at(now));
        assert!(session(Some(now - Duration::hours(1))).is_expired_at(now));
        // Expiry boundary counts as expired
        assert!(session(Some(now)).is_expired_at(now));
    }

    #[test]
    fn test_session_serde_round_trip() {
        let original = Session {
            token: "sid".to_string(),
            user_id: "uid".to_string(),
            root_dir_id: Some("root".to_string()),
            issued_at: Utc::now(),
            expires_at: Some(Utc::now() + Duration::hours(24)),
        };
        let json = serde_json::to_string(&original).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_task_status_wire_codes() {
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"1\"").unwrap(),
            TaskStatus::Downloading
        );
        assert_eq!(serde_json::to_string(&TaskStatus::Failed).unwrap(), "\"3\"");
    }

    #[test]
    fn test_user_info_camel_case_aliases() {
        let payload = serde_json::json!({
            "userId": 42,
            "rootDirId": "root_1",
            "privilege": {
                "cloudDownload": true,
                "cloudDownloadCountRemain": 3,
                "cloudVideoPlay": false,
                "cloudVideoPlayCountRemain": 0,
                "cloudMusicPlay": true,
                "cloudMusicPlayCountRemain": 5,
                "cloudDocPlay": true,
                "cloudDocPlayCountRemain": 9,
                "privilegedGearName": "basic"
            }
        });
        let info: UserInfo = serde_json::from_value(payload).unwrap();
        assert_eq!(info.user_id, 42);
        assert_eq!(info.root_dir_id, "root_1");
        assert_eq!(info.privilege.cloud_download_count_remain, 3);
        assert_eq!(info.privilege.privileged_gear_name, "basic");
    }
}
