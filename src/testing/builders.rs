//! Fluent builders for creating test objects

use chrono::{DateTime, Utc};

use crate::models::Session;

/// Builder for [`Session`] values in tests
pub struct SessionBuilder {
    token: String,
    user_id: String,
    root_dir_id: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: "sid_test".to_string(),
            user_id: "uid_test".to_string(),
            root_dir_id: None,
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    #[must_use]
    pub fn root_dir(mut self, root_dir_id: &str) -> Self {
        self.root_dir_id = Some(root_dir_id.to_string());
        self
    }

    #[must_use]
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn build(self) -> Session {
        Session {
            token: self.token,
            user_id: self.user_id,
            root_dir_id: self.root_dir_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
