//! Authenticated request execution
//!
//! [`RequestExecutor`] is the single path every endpoint wrapper goes
//! through: it attaches the current session, sends the call, and classifies
//! the envelope. Session-expiry detection (and the store clear that goes
//! with it) happens here and nowhere else.

use serde_json::Value;
use std::sync::Arc;

use crate::api::envelope::Outcome;
use crate::api::transport::{ApiRequest, ApiTransport, SessionAuth};
use crate::errors::{Error, Result};
use crate::session::SessionStore;

/// Descriptor for one provider operation, retryable as-is after
/// reauthentication
#[derive(Debug, Clone)]
pub struct Operation {
    pub method: reqwest::Method,
    pub path: &'static str,
    pub params: Vec<(String, String)>,
}

impl Operation {
    #[must_use]
    pub fn get(path: &'static str) -> Self {
        Self {
            method: reqwest::Method::GET,
            path,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn post(path: &'static str) -> Self {
        Self {
            method: reqwest::Method::POST,
            path,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }
}

/// Executes operations against the provider with the current session
/// attached
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn ApiTransport>,
    store: SessionStore,
    org_channel: String,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>, store: SessionStore, org_channel: String) -> Self {
        Self {
            transport,
            store,
            org_channel,
        }
    }

    /// The session store this executor reads from and clears on expiry
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Execute one authenticated operation and return its payload.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if no valid session is held; the
    ///   transport is never contacted in that case.
    /// - [`Error::SessionExpired`] if the provider reports the session
    ///   invalid; the store is cleared first so the caller can
    ///   reauthenticate and retry once.
    /// - [`Error::Api`] for any other provider rejection, code and message
    ///   verbatim.
    /// - [`Error::Network`] for transport failures and malformed bodies.
    pub async fn execute(&self, operation: &Operation) -> Result<Value> {
        let Some(session) = self.store.get() else {
            return Err(Error::auth("not authenticated - please login first"));
        };

        let mut request = ApiRequest {
            method: operation.method.clone(),
            path: operation.path.to_string(),
            params: operation.params.clone(),
            auth: Some(SessionAuth {
                sid: session.token,
                uid: session.user_id,
            }),
        };
        request
            .params
            .push(("org_channel".to_string(), self.org_channel.clone()));

        let envelope = self.transport.send(request).await?;

        match envelope.outcome() {
            Outcome::Success => Ok(envelope.into_data()),
            Outcome::SessionExpired => {
                log::warn!("provider reported session expired; clearing stored session");
                self.store.clear();
                Err(Error::SessionExpired)
            }
            Outcome::Failure => Err(Error::api(envelope.code, envelope.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, TestFixtures};

    #[tokio::test]
    async fn test_absent_session_fails_before_any_network_call() {
        let transport = Arc::new(MockTransport::new());
        let store = SessionStore::new();
        let executor = RequestExecutor::new(
            transport.clone(),
            store,
            "default|default|stpan".to_string(),
        );

        let result = executor.execute(&Operation::post("/user/getInfo")).await;

        assert!(matches!(result, Err(Error::Authentication(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_passes_payload_through() {
        let transport = Arc::new(MockTransport::new());
        transport.push_success(serde_json::json!({"rootDirId": "root_1"}));

        let store = SessionStore::new();
        store.set(TestFixtures::session());
        let executor =
            RequestExecutor::new(transport.clone(), store, "default|default|stpan".to_string());

        let payload = executor
            .execute(&Operation::post("/user/getInfo").param("k", "v"))
            .await
            .unwrap();

        assert_eq!(payload, serde_json::json!({"rootDirId": "root_1"}));

        // The request carried the session cookies and the org channel
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let auth = sent[0].auth.as_ref().unwrap();
        assert_eq!(auth.sid, TestFixtures::session().token);
        assert!(sent[0]
            .params
            .iter()
            .any(|(k, v)| k == "org_channel" && v == "default|default|stpan"));
    }

    #[tokio::test]
    async fn test_session_expired_clears_store() {
        let transport = Arc::new(MockTransport::new());
        transport.push_session_expired();

        let store = SessionStore::new();
        store.set(TestFixtures::session());
        let executor =
            RequestExecutor::new(transport, store.clone(), "default|default|stpan".to_string());

        let result = executor.execute(&Operation::post("/resource/create")).await;

        assert!(matches!(result, Err(Error::SessionExpired)));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_other_error_codes_surface_verbatim_and_keep_session() {
        let transport = Arc::new(MockTransport::new());
        transport.push_failure("10404", "invalid directory id");

        let store = SessionStore::new();
        store.set(TestFixtures::session());
        let executor =
            RequestExecutor::new(transport, store.clone(), "default|default|stpan".to_string());

        let result = executor.execute(&Operation::post("/resource/rename")).await;

        match result {
            Err(Error::Api { code, message }) => {
                assert_eq!(code, "10404");
                assert_eq!(message, "invalid directory id");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(store.get().is_some());
    }
}
