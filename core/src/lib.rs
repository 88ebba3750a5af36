//! imapcopy core library
//!
//! This crate contains the transfer logic for the imapcopy tool:
//! - Endpoint resolution (`user[:password]@host[:port]` strings)
//! - The IMAP connection wrapper and its connect-time mailbox catalog
//! - The copy/move transfer driver
//!
//! The IMAP protocol itself is delegated to `async-imap`; everything here
//! is orchestration on top of it, fully sequential with one exclusive
//! session per endpoint.

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod transfer;

// Re-export commonly used types
pub use connection::{ImapBox, SessionStream};
pub use endpoint::{Endpoint, IMAPS_PORT, IMAP_PORT};
pub use error::{CopyError, CopyResult};
pub use message::RawMessage;
pub use transfer::{MailStore, MailboxReport, TransferMode, TransferReport};

/// Message sequence number, as reported by the server at connect time
pub use async_imap::types::Seq;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
