#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the bitqiu crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod auth;
pub mod client;
pub mod errors;
pub mod mcp;
pub mod models;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use auth::QrAuthenticator;
pub use client::Client;
pub use errors::{Error, Result};
pub use mcp::BitqiuMcpServer;
pub use models::Session;
pub use session::SessionStore;
pub use settings::BitqiuSettings;
