//! Record data from [RFC 3596]: AAAA records.
//!
//! [RFC 3596]: https://tools.ietf.org/html/rfc3596

use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use core::fmt;
use std::net::Ipv6Addr;

//------------ Aaaa ----------------------------------------------------------

/// AAAA record data.
///
/// AAAA records convey the IPv6 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Aaaa {
    addr: Ipv6Addr,
}

impl Aaaa {
    /// Creates new AAAA record data from an IPv6 address.
    pub fn new(addr: Ipv6Addr) -> Aaaa {
        Aaaa { addr }
    }

    /// Returns the IPv6 address.
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut buf = [0u8; 16];
        parser.parse_buf(&mut buf)?;
        Ok(Aaaa::new(buf.into()))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.addr.octets())
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Aaaa::new(scanner.scan_ipv6()?))
    }
}

//--- From

impl From<Ipv6Addr> for Aaaa {
    fn from(addr: Ipv6Addr) -> Self {
        Aaaa::new(addr)
    }
}

//--- Display

impl fmt::Display for Aaaa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aaaa_text_and_wire() {
        let aaaa = Aaaa::scan(&mut Scanner::new("2001:db8::53")).unwrap();
        assert_eq!(
            aaaa.addr(),
            Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x53)
        );

        let mut target = Composer::new(512);
        aaaa.compose(&mut target).unwrap();
        assert_eq!(
            target.as_slice(),
            b"\x20\x01\x0d\xb8\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
              \x00\x53"
        );

        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Aaaa::parse(&mut parser).unwrap(), aaaa);
    }

    #[test]
    fn canonical_form_is_the_wire_form() {
        // Addresses contain no names, so the canonical form of the data
        // is the plain wire form.
        use crate::base::iana::Rtype;
        use crate::rdata::{codec, Rdata};

        let rdata = Rdata::Aaaa(Aaaa::new(Ipv6Addr::LOCALHOST));
        let mut plain = Composer::new(512);
        (codec(Rtype::Aaaa).unwrap().emit)(&rdata, &mut plain).unwrap();
        let mut canonical = Composer::new(512);
        (codec(Rtype::Aaaa).unwrap().canonical)(&rdata, &mut canonical)
            .unwrap();
        assert_eq!(plain.as_slice(), canonical.as_slice());
        let expected = Ipv6Addr::LOCALHOST.octets();
        assert_eq!(plain.as_slice(), &expected[..]);
    }

    #[test]
    fn display() {
        let aaaa = Aaaa::scan(&mut Scanner::new("2001:db8::53")).unwrap();
        assert_eq!(format!("{}", aaaa), "2001:db8::53");
    }
}
