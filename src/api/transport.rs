//! HTTP transport for the provider API
//!
//! [`ApiTransport`] is the seam between the request executor and the wire:
//! production uses [`HttpTransport`] (reqwest), tests substitute a scripted
//! mock. The transport only moves envelopes; it never interprets provider
//! status codes.

use async_trait::async_trait;
use reqwest::header;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::api::envelope::ApiEnvelope;
use crate::errors::Error;

/// Session credentials attached to a request, sent as provider cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAuth {
    pub sid: String,
    pub uid: String,
}

/// One outgoing provider call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: reqwest::Method,
    pub path: String,
    /// Query parameters for GET, form body for POST
    pub params: Vec<(String, String)>,
    pub auth: Option<SessionAuth>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: reqwest::Method::GET,
            path: path.to_string(),
            params: Vec::new(),
            auth: None,
        }
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self {
            method: reqwest::Method::POST,
            path: path.to_string(),
            params: Vec::new(),
            auth: None,
        }
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: SessionAuth) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Transport seam between the executor and the network
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send one request and parse the provider envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure or an unparsable
    /// body, and [`Error::Api`] with an `HTTP <status>` code when the
    /// response is not HTTP 200.
    async fn send(&self, request: ApiRequest) -> Result<ApiEnvelope, Error>;
}

/// Production transport backed by a shared reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the given provider base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the base URL does not parse or
    /// the HTTP client cannot be constructed.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidArgument(format!("invalid base URL {base_url:?}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidArgument(format!("invalid endpoint path {path:?}: {e}")))
    }

    /// Pull `name=value` pairs out of the response's Set-Cookie headers
    fn collect_cookies(response: &reqwest::Response) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            // Only the leading name=value pair matters; attributes follow ';'
            let Some(pair) = raw.split(';').next() else { continue };
            if let Some((name, value)) = pair.split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        cookies
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiEnvelope, Error> {
        let url = self.endpoint(&request.path)?;
        log::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);

        builder = if request.method == reqwest::Method::GET {
            builder.query(&request.params)
        } else {
            builder.form(&request.params)
        };

        if let Some(auth) = &request.auth {
            builder = builder.header(
                header::COOKIE,
                format!("cloud_web_sid={}; cloud_web_uid={}", auth.sid, auth.uid),
            );
        }

        let response = builder.send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(
                format!("HTTP {}", status.as_u16()),
                body.chars().take(512).collect::<String>(),
            ));
        }

        let cookies = Self::collect_cookies(&response);
        let mut envelope: ApiEnvelope = response.json().await.map_err(Error::malformed)?;
        envelope.cookies = cookies;

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::post("/resource/create")
            .param("name", "docs")
            .param("parentId", "root_1")
            .with_auth(SessionAuth {
                sid: "sid".to_string(),
                uid: "uid".to_string(),
            });

        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.path, "/resource/create");
        assert_eq!(request.params.len(), 2);
        assert_eq!(request.params[0], ("name".to_string(), "docs".to_string()));
        assert!(request.auth.is_some());

        let request = ApiRequest::get("/loginServer/getQRCode");
        assert_eq!(request.method, reqwest::Method::GET);
        assert!(request.auth.is_none());
    }

    #[test]
    fn test_endpoint_join() {
        let transport =
            HttpTransport::new("https://pan.bitqiu.com", Duration::from_secs(30)).unwrap();
        let url = transport.endpoint("/download/getUrl").unwrap();
        assert_eq!(url.as_str(), "https://pan.bitqiu.com/download/getUrl");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransport::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
