//! QR ticket state machine and the polling authenticator
//!
//! One login attempt is one [`QrTicket`]. The remote end reports the
//! ticket's state on every poll; transitions are forward-only
//! (pending → scanned → confirmed/expired/denied), and a response carrying
//! an earlier state than already observed is ignored rather than allowed to
//! reopen the wait.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::api::endpoints;
use crate::api::envelope::Outcome;
use crate::api::transport::{ApiRequest, ApiTransport};
use crate::errors::{Error, Result};
use crate::models::Session;
use crate::settings::{ApiSettings, AuthSettings};
use crate::utils::timestamp_ms;

/// Cookie names the provider uses to hand back session credentials
const SID_COOKIE: &str = "cloud_web_sid";
const UID_COOKIE: &str = "cloud_web_uid";

/// State of a QR login ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    /// Issued, not yet scanned
    Pending,
    /// Scanned on a device, awaiting confirmation there
    Scanned,
    /// Confirmed; credentials are available
    Confirmed,
    /// The ticket aged out before confirmation
    Expired,
    /// The user rejected the login on the scanning device
    Denied,
}

impl TicketStatus {
    /// Parse the provider's wire encoding (`data.status`)
    #[must_use]
    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            "0" => Some(Self::Pending),
            "1" => Some(Self::Scanned),
            "2" => Some(Self::Confirmed),
            "3" => Some(Self::Expired),
            "4" => Some(Self::Denied),
            _ => None,
        }
    }

    /// Position in the forward-only ordering; all terminal states share the
    /// top rank since no transition between them is legal
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Scanned => 1,
            Self::Confirmed | Self::Expired | Self::Denied => 2,
        }
    }

    /// Whether this state ends the handshake
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Expired | Self::Denied)
    }
}

/// One in-progress QR login attempt
#[derive(Debug, Clone)]
pub struct QrTicket {
    /// Provider verify code identifying this attempt
    pub ticket_id: String,
    /// Payload to render as a QR code
    pub qr_content: String,
    pub created_at: DateTime<Utc>,
    pub status: TicketStatus,
}

impl QrTicket {
    /// Apply an observed state, enforcing forward-only transitions.
    ///
    /// Returns the effective status after the observation: regressions and
    /// anything observed after a terminal state are ignored.
    pub fn advance(&mut self, observed: TicketStatus) -> TicketStatus {
        if self.status.is_terminal() {
            if observed != self.status {
                log::debug!(
                    "ignoring status {observed:?} reported after terminal {:?}",
                    self.status
                );
            }
            return self.status;
        }
        if observed.rank() < self.status.rank() {
            log::debug!(
                "ignoring status regression {observed:?} (currently {:?})",
                self.status
            );
            return self.status;
        }
        self.status = observed;
        self.status
    }
}

/// Drives the QR login handshake against the provider.
///
/// The authenticator has no side effects beyond its network calls: it never
/// touches the session store, so an abandoned or failed login provably
/// leaves no credential state behind. Storing the returned [`Session`] is
/// the facade's job.
#[derive(Clone)]
pub struct QrAuthenticator {
    transport: Arc<dyn ApiTransport>,
    api: ApiSettings,
    auth: AuthSettings,
}

impl QrAuthenticator {
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>, api: ApiSettings, auth: AuthSettings) -> Self {
        Self {
            transport,
            api,
            auth,
        }
    }

    /// Link to a rendered QR image for a ticket, for clients that cannot
    /// draw the payload themselves
    #[must_use]
    pub fn qr_image_link(&self, ticket: &QrTicket) -> String {
        self.api
            .qr_render_url
            .replace("{}", &urlencoding::encode(&ticket.qr_content))
    }

    /// Request a fresh QR ticket from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the call cannot complete and
    /// [`Error::Api`] if the provider refuses to issue a ticket.
    pub async fn begin(&self) -> Result<QrTicket> {
        let request = ApiRequest::get(endpoints::QR_CODE)
            .param("org_channel", self.api.org_channel.clone())
            .param("_", timestamp_ms().to_string());

        let envelope = self.transport.send(request).await?;
        if envelope.outcome() != Outcome::Success {
            return Err(Error::api(envelope.code, envelope.message));
        }

        let data = envelope.into_data();
        let ticket_id = data
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::malformed("QR ticket response missing code"))?
            .to_string();
        let qr_content = data
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::malformed("QR ticket response missing url"))?
            .to_string();

        log::info!("issued QR login ticket {ticket_id}");
        Ok(QrTicket {
            ticket_id,
            qr_content,
            created_at: Utc::now(),
            status: TicketStatus::Pending,
        })
    }

    /// Poll the provider once for the ticket's state.
    ///
    /// On a confirmed ticket the provider hands session credentials back via
    /// cookies; they are returned alongside the status. The session store is
    /// never written here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure or when the reported
    /// status is not one of the defined wire codes, and [`Error::Api`] if
    /// the provider rejects the status query outright.
    pub async fn poll(&self, ticket: &mut QrTicket) -> Result<(TicketStatus, Option<Session>)> {
        let request = ApiRequest::get(endpoints::QR_CODE_INFO)
            .param("org_channel", self.api.org_channel.clone())
            .param("_", timestamp_ms().to_string())
            .param("code", ticket.ticket_id.clone());

        let envelope = self.transport.send(request).await?;
        if envelope.outcome() != Outcome::Success {
            return Err(Error::api(envelope.code, envelope.message));
        }

        let cookies = envelope.cookies.clone();
        let data = envelope.into_data();
        let wire_status = data
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::malformed("QR status response missing status"))?;
        let observed = TicketStatus::from_wire(wire_status)
            .ok_or_else(|| Error::malformed(format!("unknown QR status {wire_status:?}")))?;

        let effective = ticket.advance(observed);
        if effective != TicketStatus::Confirmed {
            return Ok((effective, None));
        }

        let sid = cookies.get(SID_COOKIE).filter(|v| !v.is_empty());
        let uid = cookies.get(UID_COOKIE).filter(|v| !v.is_empty());
        let (Some(sid), Some(uid)) = (sid, uid) else {
            return Err(Error::auth(
                "login confirmed but session credentials missing from response",
            ));
        };

        let issued_at = Utc::now();
        Ok((
            TicketStatus::Confirmed,
            Some(Session {
                token: sid.clone(),
                user_id: uid.clone(),
                root_dir_id: None,
                issued_at,
                expires_at: None,
            }),
        ))
    }

    /// Poll until the ticket reaches a terminal state or the overall wait
    /// budget is spent, sleeping the configured interval between polls.
    ///
    /// Polls are strictly sequential; each result is fully processed before
    /// the next query is issued. Cancellation is cooperative: dropping the
    /// returned future stops polling immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the ticket expires, is denied,
    /// or the wait times out, plus the underlying [`Error::Network`] /
    /// [`Error::Api`] failures from individual polls.
    pub async fn wait_for_confirmation(&self, mut ticket: QrTicket) -> Result<Session> {
        let poll_interval = Duration::from_secs(self.auth.poll_interval_secs);
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.auth.wait_timeout_secs);

        loop {
            let (status, session) = self.poll(&mut ticket).await?;
            match status {
                TicketStatus::Confirmed => {
                    let session = session.ok_or_else(|| {
                        Error::auth("login confirmed but session credentials missing from response")
                    })?;
                    log::info!("QR login confirmed for user {}", session.user_id);
                    return Ok(session);
                }
                TicketStatus::Expired => {
                    return Err(Error::auth("QR ticket expired before it was confirmed"));
                }
                TicketStatus::Denied => {
                    return Err(Error::auth("QR login was denied on the scanning device"));
                }
                TicketStatus::Pending | TicketStatus::Scanned => {
                    log::debug!("QR ticket {} still {status:?}", ticket.ticket_id);
                }
            }

            if tokio::time::Instant::now() + poll_interval >= deadline {
                return Err(Error::auth(format!(
                    "QR login timed out after {} seconds",
                    self.auth.wait_timeout_secs
                )));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Apply the configured local TTL to a freshly issued session
    #[must_use]
    pub fn with_local_ttl(session: Session, ttl_hours: Option<u64>) -> Session {
        let expires_at = ttl_hours
            .and_then(|hours| i64::try_from(hours).ok())
            .map(|hours| session.issued_at + ChronoDuration::hours(hours));
        Session {
            expires_at,
            ..session
        }
    }
}
