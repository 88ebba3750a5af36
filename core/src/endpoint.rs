//! Account endpoint configuration
//!
//! An endpoint is resolved once from a `user[:password]@host[:port]` string
//! and is immutable for the rest of the run. Credential acquisition (the
//! interactive prompt for a missing password) is the caller's concern; the
//! connection layer expects a fully populated endpoint.

use url::Url;

use crate::error::{CopyError, CopyResult};

/// Default IMAP4 port (plaintext)
pub const IMAP_PORT: u16 = 143;

/// Default IMAP4 port over TLS
pub const IMAPS_PORT: u16 = 993;

/// One side of a transfer: a single IMAP account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Account login name
    pub login: String,
    /// Account password, `None` until resolved by the caller
    pub password: Option<String>,
    /// Server hostname
    pub host: String,
    /// Server port
    pub port: u16,
    /// Whether to wrap the connection in TLS
    pub tls: bool,
}

impl Endpoint {
    /// Parse a `user[:password]@host[:port]` string into an endpoint.
    ///
    /// The `imap://` scheme prefix is optional. Host defaults to `localhost`
    /// and port to 143, or 993 when `tls` is requested. A missing username
    /// is a configuration error.
    pub fn parse(uri: &str, tls: bool) -> CopyResult<Self> {
        let raw = if uri.starts_with("imap://") {
            uri.to_string()
        } else {
            format!("imap://{uri}")
        };
        let url = Url::parse(&raw)?;

        let login = url.username();
        if login.is_empty() {
            return Err(CopyError::config(format!("no username found in '{uri}'")));
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => "localhost".to_string(),
        };

        Ok(Self {
            login: login.to_string(),
            password: url.password().map(str::to_string),
            host,
            port: url.port().unwrap_or(default_port(tls)),
            tls,
        })
    }

    /// `user@host:port` form for log output, never includes the password
    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.login, self.host, self.port)
    }
}

fn default_port(tls: bool) -> u16 {
    if tls {
        IMAPS_PORT
    } else {
        IMAP_PORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_uri() {
        let endpoint = Endpoint::parse("bob:secret@mail.example.com:1143", false).unwrap();
        assert_eq!(endpoint.login, "bob");
        assert_eq!(endpoint.password.as_deref(), Some("secret"));
        assert_eq!(endpoint.host, "mail.example.com");
        assert_eq!(endpoint.port, 1143);
        assert!(!endpoint.tls);
    }

    #[test]
    fn test_ssl_uri_without_password() {
        let endpoint = Endpoint::parse("alice@mail.example.com:993", true).unwrap();
        assert_eq!(endpoint.login, "alice");
        assert_eq!(endpoint.password, None);
        assert_eq!(endpoint.host, "mail.example.com");
        assert_eq!(endpoint.port, 993);
        assert!(endpoint.tls);
    }

    #[test]
    fn test_defaults() {
        let endpoint = Endpoint::parse("carol@mail.example.com", false).unwrap();
        assert_eq!(endpoint.host, "mail.example.com");
        assert_eq!(endpoint.port, IMAP_PORT);

        let endpoint = Endpoint::parse("carol@mail.example.com", true).unwrap();
        assert_eq!(endpoint.port, IMAPS_PORT);
    }

    #[test]
    fn test_scheme_prefix_accepted() {
        let endpoint = Endpoint::parse("imap://dave:pw@localhost:143", false).unwrap();
        assert_eq!(endpoint.login, "dave");
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 143);
    }

    #[test]
    fn test_missing_username_is_config_error() {
        let err = Endpoint::parse("mail.example.com:143", false).unwrap_err();
        assert!(matches!(err, CopyError::Config(_)));
    }

    #[test]
    fn test_label_hides_password() {
        let endpoint = Endpoint::parse("bob:secret@mail.example.com", false).unwrap();
        assert_eq!(endpoint.label(), "bob@mail.example.com:143");
        assert!(!endpoint.label().contains("secret"));
    }
}
