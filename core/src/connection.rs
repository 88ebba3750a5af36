//! IMAP connection wrapper
//!
//! [`ImapBox`] owns exactly one protocol session and the mailbox catalog
//! captured when the connection was made. The catalog is a snapshot:
//! messages arriving at the source after connect are invisible for the
//! rest of the run.

use std::collections::BTreeMap;
use std::fmt;

use async_imap::types::Seq;
use async_imap::Session;
use async_trait::async_trait;
use futures::TryStreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::{CopyError, CopyResult};
use crate::message::RawMessage;
use crate::transfer::MailStore;

/// Stream requirements of the underlying IMAP session; lets one session
/// type cover both plaintext and TLS connections
pub trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug> SessionStream for T {}

type ImapSession = Session<Box<dyn SessionStream>>;

/// One authenticated IMAP account with its connect-time mailbox catalog
pub struct ImapBox {
    session: ImapSession,
    catalog: BTreeMap<String, Vec<Seq>>,
    label: String,
}

impl fmt::Debug for ImapBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapBox")
            .field("label", &self.label)
            .field("mailboxes", &self.catalog.len())
            .finish()
    }
}

impl ImapBox {
    /// Connect, authenticate and scan the account's mailboxes.
    ///
    /// Login failure is an authentication error; a failing LIST is a
    /// protocol error. Both abort the setup. Individual mailboxes that
    /// cannot be examined are skipped with a warning.
    pub async fn connect(endpoint: &Endpoint) -> CopyResult<Self> {
        let password = endpoint
            .password
            .as_deref()
            .ok_or_else(|| CopyError::config(format!("no password for {}", endpoint.label())))?;

        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        let stream: Box<dyn SessionStream> = if endpoint.tls {
            let connector = native_tls::TlsConnector::new()
                .map_err(|err| CopyError::tls(err.to_string()))?;
            let connector = tokio_native_tls::TlsConnector::from(connector);
            let tls = connector
                .connect(&endpoint.host, tcp)
                .await
                .map_err(|err| CopyError::tls(err.to_string()))?;
            Box::new(tls)
        } else {
            Box::new(tcp)
        };

        let client = async_imap::Client::new(stream);
        let mut session = client
            .login(&endpoint.login, password)
            .await
            .map_err(|(err, _client)| {
                CopyError::auth(format!("login rejected for {}: {err}", endpoint.label()))
            })?;

        let catalog = scan_mailboxes(&mut session).await?;
        info!(
            "connected to {} ({} mailboxes)",
            endpoint.label(),
            catalog.len()
        );

        Ok(Self {
            session,
            catalog,
            label: endpoint.label(),
        })
    }

    /// Mailbox names in the connect-time catalog
    pub fn mailbox_names(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }

    /// Recorded message ids for a mailbox, empty if the mailbox is unknown
    pub fn message_ids(&self, mailbox: &str) -> Vec<Seq> {
        self.catalog.get(mailbox).cloned().unwrap_or_default()
    }

    /// Fetch one message body as raw RFC822 bytes.
    ///
    /// Any non-OK response along the way (unknown mailbox, failing EXAMINE
    /// or FETCH, missing body) yields `None`: the message is skipped, never
    /// fatal.
    pub async fn fetch_message(&mut self, mailbox: &str, id: Seq) -> Option<RawMessage> {
        if !self.catalog.contains_key(mailbox) {
            return None;
        }

        if let Err(err) = self.session.examine(mailbox).await {
            debug!(mailbox, error = %err, "EXAMINE failed");
            return None;
        }

        let fetches = {
            let stream = match self.session.fetch(id.to_string(), "RFC822").await {
                Ok(stream) => stream,
                Err(err) => {
                    debug!(mailbox, id, error = %err, "FETCH failed");
                    return None;
                }
            };
            match stream.try_collect::<Vec<_>>().await {
                Ok(fetches) => fetches,
                Err(err) => {
                    debug!(mailbox, id, error = %err, "FETCH response invalid");
                    return None;
                }
            }
        };

        fetches
            .iter()
            .find_map(|fetch| fetch.body())
            .map(|body| RawMessage::new(body.to_vec()))
    }

    /// Append a message with no flags, creating the mailbox first when it
    /// is absent from this connection's catalog. The INTERNALDATE comes
    /// from the message's `Date:` header, falling back to the current time.
    pub async fn append_message(&mut self, mailbox: &str, message: &RawMessage) -> CopyResult<()> {
        if !self.catalog.contains_key(mailbox) {
            self.session.create(mailbox).await?;
            self.catalog.insert(mailbox.to_string(), Vec::new());
        }

        let internal_date = message.internal_date();
        self.session
            .append(mailbox, None, Some(internal_date.as_str()), message.as_bytes())
            .await?;
        Ok(())
    }

    /// Mark the given ids `\Deleted` and expunge the mailbox
    pub async fn delete_and_expunge(&mut self, mailbox: &str, ids: &[Seq]) -> CopyResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        // STORE needs a read-write selection; the scan and fetches only
        // ever EXAMINE.
        self.session.select(mailbox).await?;

        let sequence_set = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        {
            let responses = self
                .session
                .store(&sequence_set, "+FLAGS (\\Deleted)")
                .await?;
            responses.try_collect::<Vec<_>>().await?;
        }
        {
            let expunged = self.session.expunge().await?;
            expunged.try_collect::<Vec<_>>().await?;
        }

        debug!(mailbox, count = ids.len(), "deleted and expunged");
        Ok(())
    }

    /// Close the selected mailbox and log out
    pub async fn close(mut self) -> CopyResult<()> {
        // CLOSE fails when nothing is selected (an append-only destination);
        // that is fine, LOGOUT still has to happen.
        if let Err(err) = self.session.close().await {
            debug!(error = %err, "CLOSE failed, continuing with LOGOUT");
        }
        self.session.logout().await?;
        info!("disconnected from {}", self.label);
        Ok(())
    }
}

/// LIST all mailboxes, then EXAMINE + SEARCH ALL each one to snapshot its
/// message ids. A failing LIST aborts; unreadable mailboxes are skipped.
async fn scan_mailboxes(session: &mut ImapSession) -> CopyResult<BTreeMap<String, Vec<Seq>>> {
    let names: Vec<String> = {
        let stream = session.list(Some(""), Some("*")).await?;
        stream
            .map_ok(|name| name.name().to_string())
            .try_collect()
            .await?
    };

    let mut catalog = BTreeMap::new();
    for name in names {
        if let Err(err) = session.examine(&name).await {
            warn!(mailbox = %name, error = %err, "cannot examine mailbox, skipping");
            continue;
        }
        match session.search("ALL").await {
            Ok(ids) => {
                let mut ids: Vec<Seq> = ids.into_iter().collect();
                ids.sort_unstable();
                catalog.insert(name, ids);
            }
            Err(err) => {
                warn!(mailbox = %name, error = %err, "SEARCH failed, skipping mailbox");
            }
        }
    }
    Ok(catalog)
}

#[async_trait]
impl MailStore for ImapBox {
    fn mailbox_names(&self) -> Vec<String> {
        ImapBox::mailbox_names(self)
    }

    fn message_ids(&self, mailbox: &str) -> Vec<Seq> {
        ImapBox::message_ids(self, mailbox)
    }

    async fn fetch_message(&mut self, mailbox: &str, id: Seq) -> Option<RawMessage> {
        ImapBox::fetch_message(self, mailbox, id).await
    }

    async fn append_message(&mut self, mailbox: &str, message: &RawMessage) -> CopyResult<()> {
        ImapBox::append_message(self, mailbox, message).await
    }

    async fn delete_and_expunge(&mut self, mailbox: &str, ids: &[Seq]) -> CopyResult<()> {
        ImapBox::delete_and_expunge(self, mailbox, ids).await
    }
}
