//! Record data from [RFC 8659]: CAA records.
//!
//! [RFC 8659]: https://tools.ietf.org/html/rfc8659

use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use bytes::Bytes;
use core::fmt;

//------------ Caa -----------------------------------------------------------

/// CAA record data.
///
/// CAA records state which certification authorities may issue
/// certificates for the owner name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Caa {
    flags: u8,
    tag: Bytes,
    value: Bytes,
}

impl Caa {
    /// Creates new CAA record data from its components.
    ///
    /// The tag must be a non-empty sequence of at most 255 ASCII letters
    /// and digits.
    pub fn new(
        flags: u8,
        tag: Bytes,
        value: Bytes,
    ) -> Result<Self, ParseError> {
        if tag.is_empty()
            || tag.len() > 255
            || !tag.iter().all(|ch| ch.is_ascii_alphanumeric())
        {
            return Err(ParseError::form_error("invalid CAA tag"));
        }
        Ok(Caa { flags, tag, value })
    }

    /// Returns the flags field.
    ///
    /// Only the most significant bit, the critical flag, is defined.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns whether the critical flag is set.
    pub fn critical(&self) -> bool {
        self.flags & 0x80 != 0
    }

    /// Returns the property tag.
    pub fn tag(&self) -> &Bytes {
        &self.tag
    }

    /// Returns the property value.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let flags = parser.parse_u8()?;
        let tag_len = parser.parse_u8()? as usize;
        let tag = Bytes::copy_from_slice(parser.parse_octets(tag_len)?);
        let len = parser.remaining();
        let value = Bytes::copy_from_slice(parser.parse_octets(len)?);
        Caa::new(flags, tag, value)
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u8(self.flags)?;
        target.append_u8(self.tag.len() as u8)?;
        target.append_slice(&self.tag)?;
        target.append_slice(&self.value)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let flags = scanner.scan_int()?;
        let tag = Bytes::copy_from_slice(scanner.next_token()?.as_bytes());
        let value = scanner.scan_charstr()?;
        Caa::new(flags, tag, Bytes::copy_from_slice(value.as_slice()))
            .map_err(|_| ScanError::new("invalid CAA tag"))
    }
}

//--- Display

impl fmt::Display for Caa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ", self.flags)?;
        for &ch in self.tag.iter() {
            write!(f, "{}", ch as char)?;
        }
        f.write_str(" \"")?;
        for &ch in self.value.iter() {
            match ch {
                b'"' | b'\\' => write!(f, "\\{}", ch as char)?,
                0x20..=0x7E => write!(f, "{}", ch as char)?,
                _ => write!(f, "\\{:03}", ch)?,
            }
        }
        f.write_str("\"")
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let caa =
            Caa::scan(&mut Scanner::new("128 issue \"ca.example.net\""))
                .unwrap();
        assert!(caa.critical());
        assert_eq!(caa.tag().as_ref(), b"issue");
        assert_eq!(caa.value().as_ref(), b"ca.example.net");

        let mut target = Composer::new(512);
        caa.compose(&mut target).unwrap();
        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Caa::parse(&mut parser).unwrap(), caa);
    }

    #[test]
    fn rejects_bad_tag() {
        assert!(Caa::new(0, Bytes::from_static(b""), Bytes::new()).is_err());
        assert!(
            Caa::new(0, Bytes::from_static(b"is sue"), Bytes::new()).is_err()
        );
    }
}
