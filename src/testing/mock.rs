//! Mock objects and fake implementations for testing
//!
//! [`MockTransport`] replaces the HTTP layer with a scripted queue of
//! envelopes and records every request it is handed, so tests can assert on
//! call counts, attached credentials and parameters without any network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::api::envelope::{ApiEnvelope, SESSION_EXPIRED_CODE, SUCCESS_CODE};
use crate::api::transport::{ApiRequest, ApiTransport};
use crate::errors::Error;

enum Scripted {
    Envelope(ApiEnvelope),
    NetworkError(String),
}

/// Scripted transport double
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful envelope with the given payload
    pub fn push_success(&self, data: Value) {
        self.push_envelope(ApiEnvelope {
            code: SUCCESS_CODE.to_string(),
            message: String::new(),
            data: Some(data),
            cookies: HashMap::new(),
        });
    }

    /// Queue a session-expired envelope
    pub fn push_session_expired(&self) {
        self.push_envelope(ApiEnvelope {
            code: SESSION_EXPIRED_CODE.to_string(),
            message: "session invalid".to_string(),
            data: None,
            cookies: HashMap::new(),
        });
    }

    /// Queue a failure envelope with the given provider code and message
    pub fn push_failure(&self, code: &str, message: &str) {
        self.push_envelope(ApiEnvelope {
            code: code.to_string(),
            message: message.to_string(),
            data: None,
            cookies: HashMap::new(),
        });
    }

    /// Queue a QR status-poll envelope carrying the given wire status
    pub fn push_qr_status(&self, wire_status: &str) {
        self.push_envelope(ApiEnvelope {
            code: SUCCESS_CODE.to_string(),
            message: String::new(),
            data: Some(serde_json::json!({ "status": wire_status })),
            cookies: HashMap::new(),
        });
    }

    /// Queue a QR status-poll envelope that also hands back session cookies
    pub fn push_qr_status_with_cookies(&self, wire_status: &str, sid: &str, uid: &str) {
        let mut cookies = HashMap::new();
        cookies.insert("cloud_web_sid".to_string(), sid.to_string());
        cookies.insert("cloud_web_uid".to_string(), uid.to_string());
        self.push_envelope(ApiEnvelope {
            code: SUCCESS_CODE.to_string(),
            message: String::new(),
            data: Some(serde_json::json!({ "status": wire_status })),
            cookies,
        });
    }

    /// Queue a transport-level failure
    pub fn push_network_error(&self, detail: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::NetworkError(detail.to_string()));
    }

    /// Queue an arbitrary envelope
    pub fn push_envelope(&self, envelope: ApiEnvelope) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Envelope(envelope));
    }

    /// Number of requests the mock has served
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every request seen, in order
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any
    #[must_use]
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiEnvelope, Error> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Envelope(envelope)) => Ok(envelope),
            Some(Scripted::NetworkError(detail)) => Err(Error::Network(detail)),
            None => Err(Error::Network(
                "mock transport exhausted: no scripted response left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let mock = MockTransport::new();
        mock.push_success(serde_json::json!({"a": 1}));
        mock.push_failure("10404", "nope");

        let first = mock.send(ApiRequest::get("/x")).await.unwrap();
        assert_eq!(first.code, SUCCESS_CODE);

        let second = mock.send(ApiRequest::get("/y")).await.unwrap();
        assert_eq!(second.code, "10404");

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[1].path, "/y");
    }

    #[tokio::test]
    async fn test_exhausted_mock_reports_network_error() {
        let mock = MockTransport::new();
        let result = mock.send(ApiRequest::get("/x")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
