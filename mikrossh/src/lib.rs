//! # mikrossh
//!
//! Async SSH command sessions for MikroTik RouterOS and SwitchOS.
//!
//! The RouterOS console echoes commands more than once, repaints its prompt
//! with escape sequences and has no pager or configuration mode to switch off.
//! mikrossh hides that behind a plain command/response API: send a command,
//! get back exactly its output.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Login-name console options (`admin+cetw511h4098`) so output never wraps or pages
//! - Prompt detection through ANSI noise
//! - Repainted command echoes and doubled trailing prompts removed
//! - Efficient pattern buffer matching (scrapli-style tail search)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mikrossh::{Driver, DriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mikrossh::Error> {
//!     let mut session = DriverBuilder::new("192.168.88.1")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     session.open().await?;
//!
//!     let response = session.send_command("/system resource print").await?;
//!     println!("{}", response.result);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use driver::{
    Driver, DriverBuilder, Response, SendOptions, Session, SessionOptions, SessionState,
    TimingOptions,
};
pub use error::{Error, Result};
pub use platform::{LoginOptions, Platform};
pub use transport::{AuthMethod, Connector, HostKeyVerification, SshConfig};
