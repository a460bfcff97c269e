//! Scanning record data from its presentation format.
//!
//! The presentation format of record data is a sequence of white-space
//! separated tokens, optionally quoted. The [`Scanner`] type splits a
//! line of such text into tokens and converts them into the various field
//! types record data is made of.

use super::charstr::CharStr;
use super::name::Name;
use super::wire::ParseError;
use crate::utils::{base16, base64};
use core::fmt;
use core::str::FromStr;
use std::net::{Ipv4Addr, Ipv6Addr};

//------------ Scanner -------------------------------------------------------

/// A scanner over the presentation format of record data.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    /// The text still to be processed.
    remaining: &'a str,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given text.
    pub fn new(text: &'a str) -> Self {
        Scanner { remaining: text }
    }

    /// Returns the next token or `None` at the end of the text.
    ///
    /// A token is delimited by white space. A token starting with a
    /// double quote extends to the closing quote and is returned without
    /// the quotes; escape sequences are left untouched.
    pub fn next_opt(&mut self) -> Option<&'a str> {
        self.remaining = self.remaining.trim_start();
        if self.remaining.is_empty() {
            return None;
        }
        if let Some(rest) = self.remaining.strip_prefix('"') {
            let mut escaped = false;
            for (idx, ch) in rest.char_indices() {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    let token = &rest[..idx];
                    self.remaining = &rest[idx + 1..];
                    return Some(token);
                }
            }
            // Unterminated quote: return the rest as the token.
            self.remaining = "";
            Some(rest)
        } else {
            let end = self
                .remaining
                .find(char::is_whitespace)
                .unwrap_or(self.remaining.len());
            let token = &self.remaining[..end];
            self.remaining = &self.remaining[end..];
            Some(token)
        }
    }

    /// Returns the next token or an error at the end of the text.
    pub fn next_token(&mut self) -> Result<&'a str, ScanError> {
        self.next_opt()
            .ok_or_else(|| ScanError::new("unexpected end of record data"))
    }

    /// Checks that no tokens are left.
    pub fn expect_end(&mut self) -> Result<(), ScanError> {
        match self.next_opt() {
            Some(token) => Err(ScanError::new(format!(
                "trailing data: '{}'",
                token
            ))),
            None => Ok(()),
        }
    }

    /// Scans an absolute domain name.
    pub fn scan_name(&mut self) -> Result<Name, ScanError> {
        let token = self.next_token()?;
        let name = Name::from_str(token)
            .map_err(|err| ScanError::new(format!("bad name: {}", err)))?;
        if !name.is_absolute() {
            return Err(ScanError::new("relative domain name"));
        }
        Ok(name)
    }

    /// Scans a decimal integer.
    pub fn scan_int<T: FromStr>(&mut self) -> Result<T, ScanError> {
        self.next_token()?
            .parse()
            .map_err(|_| ScanError::new("bad integer value"))
    }

    /// Scans a character string.
    pub fn scan_charstr(&mut self) -> Result<CharStr, ScanError> {
        CharStr::from_token(self.next_token()?)
            .map_err(|err| ScanError::new(format!("bad string: {}", err)))
    }

    /// Scans an IPv4 address.
    pub fn scan_ipv4(&mut self) -> Result<Ipv4Addr, ScanError> {
        self.next_token()?
            .parse()
            .map_err(|_| ScanError::new("bad IPv4 address"))
    }

    /// Scans an IPv6 address.
    pub fn scan_ipv6(&mut self) -> Result<Ipv6Addr, ScanError> {
        self.next_token()?
            .parse()
            .map_err(|_| ScanError::new("bad IPv6 address"))
    }

    /// Scans all remaining tokens as one Base 64 encoded octets sequence.
    pub fn scan_base64_rest(&mut self) -> Result<Vec<u8>, ScanError> {
        let mut text = String::new();
        while let Some(token) = self.next_opt() {
            text.push_str(token);
        }
        base64::decode(&text)
            .map_err(|err| ScanError::new(format!("bad base64: {}", err)))
    }

    /// Scans one token of Base 16 encoded octets.
    pub fn scan_base16(&mut self) -> Result<Vec<u8>, ScanError> {
        base16::decode(self.next_token()?)
            .map_err(|err| ScanError::new(format!("bad hex: {}", err)))
    }

    /// Scans all remaining tokens as one Base 16 encoded octets sequence.
    pub fn scan_base16_rest(&mut self) -> Result<Vec<u8>, ScanError> {
        let mut text = String::new();
        while let Some(token) = self.next_opt() {
            text.push_str(token);
        }
        base16::decode(&text)
            .map_err(|err| ScanError::new(format!("bad hex: {}", err)))
    }

    /// Scans a point in time.
    ///
    /// Accepts both the `YYYYMMDDHHmmSS` notation used by signature
    /// records and plain seconds since the Unix epoch. The value is
    /// returned in serial number arithmetic, i.e., modulo 2^32.
    pub fn scan_time(&mut self) -> Result<u32, ScanError> {
        let token = self.next_token()?;
        if token.len() == 14 && token.bytes().all(|ch| ch.is_ascii_digit()) {
            let num = |range: core::ops::Range<usize>| -> u64 {
                token[range].parse().unwrap()
            };
            let year = num(0..4) as i64;
            let month = num(4..6);
            let day = num(6..8);
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return Err(ScanError::new("bad time value"));
            }
            let secs = days_from_civil(year, month as u32, day as u32)
                * 86_400
                + (num(8..10) * 3_600 + num(10..12) * 60 + num(12..14))
                    as i64;
            Ok(secs as u32)
        } else {
            token.parse().map_err(|_| ScanError::new("bad time value"))
        }
    }
}

/// Returns the number of days since the Unix epoch for a civil date.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) as i64 + 2) / 5
        + d as i64
        - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

//============ Error Types ===================================================

//------------ ScanError -----------------------------------------------------

/// Record data could not be created from its presentation format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanError(String);

impl ScanError {
    /// Creates a new error with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        ScanError(msg.into())
    }
}

//--- From

impl From<ParseError> for ScanError {
    fn from(err: ParseError) -> Self {
        ScanError::new(format!("bad record data: {}", err))
    }
}

//--- Display and Error

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScanError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tokens() {
        let mut scanner = Scanner::new("  foo \"bar baz\"  qux");
        assert_eq!(scanner.next_opt(), Some("foo"));
        assert_eq!(scanner.next_opt(), Some("bar baz"));
        assert_eq!(scanner.next_opt(), Some("qux"));
        assert_eq!(scanner.next_opt(), None);
        assert!(scanner.next_token().is_err());
    }

    #[test]
    fn quoted_escapes() {
        let mut scanner = Scanner::new("\"a\\\"b\" rest");
        assert_eq!(scanner.next_opt(), Some("a\\\"b"));
        assert_eq!(scanner.next_opt(), Some("rest"));
    }

    #[test]
    fn time_formats() {
        // Both notations for 2021-01-01T00:00:00Z.
        let mut scanner = Scanner::new("20210101000000 1609459200");
        let a = scanner.scan_time().unwrap();
        let b = scanner.scan_time().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 1_609_459_200);
    }

    #[test]
    fn expect_end() {
        let mut scanner = Scanner::new("a b");
        scanner.next_token().unwrap();
        assert!(scanner.expect_end().is_err());
        assert!(scanner.expect_end().is_ok());
    }
}
