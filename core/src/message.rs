//! Raw message handling
//!
//! Messages are transient: fetched from the source, appended to the
//! destination, and dropped. Only the `Date:` header is ever inspected,
//! to preserve the internal date across the transfer.

use chrono::{DateTime, TimeZone, Utc};
use mailparse::MailHeaderMap;
use tracing::debug;

/// A single message as raw RFC822 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    body: Vec<u8>,
}

impl RawMessage {
    /// Wrap raw RFC822 content
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    /// The raw message content
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// The `Date:` header as Unix seconds, `None` when the header is
    /// missing or unparseable
    pub fn date(&self) -> Option<i64> {
        let parsed = mailparse::parse_mail(&self.body).ok()?;
        let date = parsed.headers.get_first_value("Date")?;
        parse_date(&date)
    }

    /// The INTERNALDATE string to append this message with.
    ///
    /// Prefers the message's own `Date:` header; falls back to the current
    /// time when the header is missing or unparseable.
    pub fn internal_date(&self) -> String {
        let timestamp = match self.date().and_then(|secs| Utc.timestamp_opt(secs, 0).single()) {
            Some(timestamp) => timestamp,
            None => {
                debug!("no usable Date header, appending with current time");
                Utc::now()
            }
        };
        format_internal_date(timestamp)
    }
}

/// Parse an RFC 2822 `Date:` header value to Unix seconds.
///
/// `mailparse::dateparse` reports some garbage input as `Ok(0)`, which is
/// indistinguishable from a genuine epoch date. Only trust a zero result
/// when a strict RFC 2822 parse of the header agrees; anything else is
/// unparseable and the caller falls back to the current time.
fn parse_date(header: &str) -> Option<i64> {
    match mailparse::dateparse(header) {
        Ok(secs) if secs != 0 => Some(secs),
        _ => DateTime::parse_from_rfc2822(header.trim())
            .ok()
            .map(|parsed| parsed.timestamp()),
    }
}

/// Format a timestamp as a quoted IMAP INTERNALDATE (RFC 3501 date-time).
/// The date-day is space-padded, not zero-padded.
fn format_internal_date(timestamp: DateTime<Utc>) -> String {
    format!("\"{}\"", timestamp.format("%e-%b-%Y %H:%M:%S +0000"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(raw: &str) -> RawMessage {
        RawMessage::new(raw.replace('\n', "\r\n").into_bytes())
    }

    #[test]
    fn test_date_header_parsed() {
        let msg = message(
            "From: a@example.com\nDate: Wed, 21 Jul 2021 12:34:56 +0000\nSubject: hi\n\nbody\n",
        );
        assert_eq!(msg.date(), Some(1_626_870_896));
    }

    #[test]
    fn test_missing_date_header() {
        let msg = message("From: a@example.com\nSubject: hi\n\nbody\n");
        assert_eq!(msg.date(), None);
    }

    #[test]
    fn test_unparseable_date_header() {
        let msg = message("From: a@example.com\nDate: not a date\nSubject: hi\n\nbody\n");
        assert_eq!(msg.date(), None);
    }

    #[test]
    fn test_garbage_date_appends_with_current_time() {
        // Garbage must not collapse to the epoch; it takes the same
        // current-time path as a missing header.
        let msg = message("From: a@example.com\nDate: not a date\nSubject: hi\n\nbody\n");
        let internal = msg.internal_date();
        assert!(!internal.contains("1970"));
        assert!(internal.contains(&Utc::now().format("%Y").to_string()));
    }

    #[test]
    fn test_genuine_epoch_date_is_honored() {
        let msg = message(
            "From: a@example.com\nDate: Thu, 1 Jan 1970 00:00:00 +0000\nSubject: hi\n\nbody\n",
        );
        assert_eq!(msg.date(), Some(0));
        assert_eq!(msg.internal_date(), "\" 1-Jan-1970 00:00:00 +0000\"");
    }

    #[test]
    fn test_internal_date_from_header() {
        let msg = message(
            "From: a@example.com\nDate: Wed, 21 Jul 2021 12:34:56 +0000\nSubject: hi\n\nbody\n",
        );
        assert_eq!(msg.internal_date(), "\"21-Jul-2021 12:34:56 +0000\"");
    }

    #[test]
    fn test_internal_date_falls_back_to_now() {
        let msg = message("From: a@example.com\nSubject: hi\n\nbody\n");
        let before = Utc::now();
        let internal = msg.internal_date();
        // Quoted, and the year matches the current clock rather than erroring.
        assert!(internal.starts_with('"') && internal.ends_with('"'));
        assert!(internal.contains(&before.format("%Y").to_string()));
    }

    #[test]
    fn test_internal_date_single_digit_day_space_padded() {
        let msg = message(
            "From: a@example.com\nDate: Thu, 1 Jul 2021 00:00:00 +0000\nSubject: hi\n\nbody\n",
        );
        assert_eq!(msg.internal_date(), "\" 1-Jul-2021 00:00:00 +0000\"");
    }

    #[test]
    fn test_date_with_offset_converted_to_utc() {
        let msg = message(
            "From: a@example.com\nDate: Wed, 21 Jul 2021 14:34:56 +0200\nSubject: hi\n\nbody\n",
        );
        assert_eq!(msg.date(), Some(1_626_870_896));
        assert_eq!(msg.internal_date(), "\"21-Jul-2021 12:34:56 +0000\"");
    }
}
