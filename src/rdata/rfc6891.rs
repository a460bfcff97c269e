//! Record data from [RFC 6891]: OPT records.
//!
//! The OPT pseudo record carries the EDNS(0) capabilities of a sender.
//! Its record data is a sequence of options; the fixed record fields are
//! reinterpreted: the class holds the supported UDP payload size and the
//! TTL holds an extended response code, a version, and flags. The
//! record-level view lives in [`base::opt`][crate::base::opt].
//!
//! [RFC 6891]: https://tools.ietf.org/html/rfc6891

use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use bytes::Bytes;
use core::fmt;

//------------ Opt -----------------------------------------------------------

/// OPT record data.
///
/// The data of an OPT record is a sequence of options, each carrying a
/// 16 bit option code and a length-prefixed opaque value. Options not
/// understood are retained verbatim.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Opt {
    options: Vec<EdnsOption>,
}

impl Opt {
    /// Creates new, empty OPT record data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates OPT record data from a sequence of options.
    pub fn from_options(options: Vec<EdnsOption>) -> Self {
        Opt { options }
    }

    /// Returns the options of the record.
    pub fn options(&self) -> &[EdnsOption] {
        &self.options
    }

    /// Appends an option.
    pub fn push(&mut self, option: EdnsOption) {
        self.options.push(option);
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut options = Vec::new();
        while parser.remaining() > 0 {
            options.push(EdnsOption::parse(parser)?);
        }
        Ok(Opt { options })
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        for option in &self.options {
            option.compose(target)?;
        }
        Ok(())
    }
}

//--- Display

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        for option in &self.options {
            write!(f, "{}{}", sep, option)?;
            sep = " ";
        }
        Ok(())
    }
}

//------------ EdnsOption ----------------------------------------------------

/// A single EDNS option.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EdnsOption {
    /// The option code.
    code: u16,

    /// The option data.
    data: Bytes,
}

impl EdnsOption {
    /// Creates an option from code and data.
    pub fn new(code: u16, data: Bytes) -> Self {
        EdnsOption { code, data }
    }

    /// Returns the option code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the option data.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let code = parser.parse_u16()?;
        let len = parser.parse_u16()? as usize;
        let data = Bytes::copy_from_slice(parser.parse_octets(len)?);
        Ok(EdnsOption { code, data })
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u16(self.code)?;
        target.append_u16(self.data.len() as u16)?;
        target.append_slice(&self.data)
    }
}

//--- Display

impl fmt::Display for EdnsOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.code)?;
        crate::utils::base16::display(&self.data, f)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let mut opt = Opt::new();
        // An NSID option and a cookie-like opaque one.
        opt.push(EdnsOption::new(3, Bytes::from_static(b"ns1")));
        opt.push(EdnsOption::new(10, Bytes::from_static(b"\x01\x02")));

        let mut target = Composer::new(512);
        opt.compose(&mut target).unwrap();
        assert_eq!(
            target.as_slice(),
            b"\x00\x03\x00\x03ns1\x00\x0A\x00\x02\x01\x02"
        );

        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Opt::parse(&mut parser).unwrap(), opt);
    }
}
