//! Transfer driver
//!
//! Iterates the source catalog (or one selected mailbox) and moves every
//! message through `fetch -> append`, one at a time. The driver is written
//! against the [`MailStore`] trait rather than the concrete connection
//! wrapper so the copy/move semantics can be tested without a server.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::CopyResult;
use crate::message::RawMessage;
use crate::Seq;

/// Operations the driver needs from either side of a transfer.
///
/// Implemented by [`ImapBox`](crate::ImapBox); tests substitute an
/// in-memory store.
#[async_trait]
pub trait MailStore {
    /// Mailbox names recorded in the connect-time catalog
    fn mailbox_names(&self) -> Vec<String>;

    /// Recorded message ids for a mailbox, empty if unknown
    fn message_ids(&self, mailbox: &str) -> Vec<Seq>;

    /// Fetch one message body. `None` means the message could not be
    /// retrieved and is to be skipped, not treated as fatal.
    async fn fetch_message(&mut self, mailbox: &str, id: Seq) -> Option<RawMessage>;

    /// Append a message, creating the mailbox first when necessary
    async fn append_message(&mut self, mailbox: &str, message: &RawMessage) -> CopyResult<()>;

    /// Mark the given ids `\Deleted` and expunge the mailbox
    async fn delete_and_expunge(&mut self, mailbox: &str, ids: &[Seq]) -> CopyResult<()>;
}

/// Whether the originals are left in place or cleared after transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Leave source messages intact
    Copy,
    /// Delete and expunge source messages after the copy
    Move,
}

impl TransferMode {
    /// `true` for [`TransferMode::Move`]
    pub fn is_move(self) -> bool {
        matches!(self, Self::Move)
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Copy => "copied",
            Self::Move => "moved",
        }
    }
}

/// Per-mailbox transfer outcome
#[derive(Debug, Clone)]
pub struct MailboxReport {
    /// Mailbox name
    pub mailbox: String,
    /// Messages successfully fetched and appended
    pub transferred: usize,
    /// Messages that failed to fetch and were skipped
    pub skipped: usize,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    /// One entry per processed mailbox, in processing order
    pub mailboxes: Vec<MailboxReport>,
}

impl TransferReport {
    /// Total messages transferred across all mailboxes
    pub fn total_transferred(&self) -> usize {
        self.mailboxes.iter().map(|report| report.transferred).sum()
    }

    /// Total messages skipped across all mailboxes
    pub fn total_skipped(&self) -> usize {
        self.mailboxes.iter().map(|report| report.skipped).sum()
    }
}

/// Transfer one mailbox, or every mailbox in the source catalog when
/// `mailbox` is `None`.
pub async fn copy<S, D>(
    source: &mut S,
    dest: &mut D,
    mailbox: Option<&str>,
    mode: TransferMode,
) -> CopyResult<TransferReport>
where
    S: MailStore + Send,
    D: MailStore + Send,
{
    let names = match mailbox {
        Some(name) => vec![name.to_string()],
        None => source.mailbox_names(),
    };

    let mut report = TransferReport::default();
    for name in &names {
        report
            .mailboxes
            .push(copy_mailbox(source, dest, name, mode).await?);
    }
    Ok(report)
}

async fn copy_mailbox<S, D>(
    source: &mut S,
    dest: &mut D,
    mailbox: &str,
    mode: TransferMode,
) -> CopyResult<MailboxReport>
where
    S: MailStore + Send,
    D: MailStore + Send,
{
    let ids = source.message_ids(mailbox);

    let mut transferred = 0;
    let mut skipped = 0;
    for &id in &ids {
        match source.fetch_message(mailbox, id).await {
            Some(message) => {
                dest.append_message(mailbox, &message).await?;
                transferred += 1;
            }
            None => {
                debug!(mailbox, id, "fetch failed, message skipped");
                skipped += 1;
            }
        }
    }

    // Clearing the source happens once per mailbox, and only after the full
    // copy loop above.
    if mode.is_move() {
        source.delete_and_expunge(mailbox, &ids).await?;
    }

    info!("{} messages {} from {}", transferred, mode.past_tense(), mailbox);
    Ok(MailboxReport {
        mailbox: mailbox.to_string(),
        transferred,
        skipped,
    })
}
