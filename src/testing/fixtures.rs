//! Pre-built test data

use crate::models::Session;
use crate::settings::BitqiuSettings;
use crate::testing::builders::SessionBuilder;

/// Common fixtures shared across unit and integration tests
pub struct TestFixtures;

impl TestFixtures {
    /// A valid session with a known token and user id
    #[must_use]
    pub fn session() -> Session {
        SessionBuilder::new().build()
    }

    /// A session that already knows the account's root directory
    #[must_use]
    pub fn session_with_root() -> Session {
        SessionBuilder::new().root_dir("root_dir_test").build()
    }

    /// Default settings with a short QR wait, suitable for paused-clock
    /// tests
    #[must_use]
    pub fn settings() -> BitqiuSettings {
        let mut settings = BitqiuSettings::default();
        settings.auth.poll_interval_secs = 2;
        settings.auth.wait_timeout_secs = 120;
        settings
    }

    /// A resource-listing page payload in the provider's wire shape
    #[must_use]
    pub fn resource_page(names: &[&str], has_next: bool) -> serde_json::Value {
        let items: Vec<serde_json::Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "resourceId": format!("res_{i}"),
                    "name": name,
                    "size": 1024,
                    "dirType": serde_json::Value::Null,
                    "createTime": "2023-01-01 00:00:00",
                    "updateTime": "2023-06-15 12:30:00"
                })
            })
            .collect();
        serde_json::json!({ "data": items, "hasNext": has_next })
    }
}
