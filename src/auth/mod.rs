//! QR-code login handshake

pub mod qr;

pub use qr::{QrAuthenticator, QrTicket, TicketStatus};
