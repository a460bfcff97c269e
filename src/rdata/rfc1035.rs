//! Record data from [RFC 1035]: the initial record types.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use crate::base::charstr::CharStr;
use crate::base::name::Name;
use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use bytes::Bytes;
use core::fmt;
use std::net::Ipv4Addr;

//------------ A -------------------------------------------------------------

/// A record data.
///
/// A records convey the IPv4 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct A {
    addr: Ipv4Addr,
}

impl A {
    /// Creates a new A record data from an IPv4 address.
    pub fn new(addr: Ipv4Addr) -> A {
        A { addr }
    }

    /// Returns the IPv4 address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut buf = [0u8; 4];
        parser.parse_buf(&mut buf)?;
        Ok(A::new(buf.into()))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.addr.octets())
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(A::new(scanner.scan_ipv4()?))
    }
}

//--- From

impl From<Ipv4Addr> for A {
    fn from(addr: Ipv4Addr) -> Self {
        A::new(addr)
    }
}

//--- Display

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}

//------------ Ns, Cname, Ptr ------------------------------------------------

macro_rules! name_type {
    ( $(#[$attr:meta])* $target:ident, $field:ident ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $target {
            $field: Name,
        }

        impl $target {
            /// Creates new record data from the domain name.
            pub fn new($field: Name) -> Self {
                $target { $field }
            }

            /// Returns a reference to the domain name.
            pub fn $field(&self) -> &Name {
                &self.$field
            }

            pub fn parse(
                parser: &mut Parser
            ) -> Result<Self, ParseError> {
                Name::parse(parser).map(Self::new)
            }

            /// Appends the record data, compressing the name.
            ///
            /// The name in this record type predates RFC 3597 and thus
            /// remains eligible for compression.
            pub fn compose(
                &self, target: &mut Composer
            ) -> Result<(), ShortBuf> {
                target.append_name(&self.$field)
            }

            pub fn compose_canonical(
                &self, target: &mut Composer
            ) -> Result<(), ShortBuf> {
                target.append_name_canonical(&self.$field)
            }

            pub fn scan(
                scanner: &mut Scanner
            ) -> Result<Self, ScanError> {
                Ok(Self::new(scanner.scan_name()?))
            }
        }

        //--- Display

        impl fmt::Display for $target {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.$field.fmt(f)
            }
        }
    }
}

name_type! {
    /// NS record data.
    ///
    /// NS records specify a host which should be authoritative for the
    /// specified class and domain.
    Ns, nsdname
}

name_type! {
    /// CNAME record data.
    ///
    /// The CNAME type specifies the canonical or primary name for its
    /// owner; the owner name is an alias.
    Cname, cname
}

name_type! {
    /// PTR record data.
    ///
    /// PTR records are used in special domains to point to some other
    /// location in the domain space.
    Ptr, ptrdname
}

//------------ Soa -----------------------------------------------------------

/// SOA record data.
///
/// SOA records mark the top of a zone and contain information pertinent to
/// name server maintenance operations.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Soa {
    mname: Name,
    rname: Name,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
}

impl Soa {
    /// Creates new Soa record data from content.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// Returns the name of the original or primary name server.
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// Returns the mailbox of the person responsible for the zone.
    pub fn rname(&self) -> &Name {
        &self.rname
    }

    /// Returns the serial number of the zone.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the refresh interval in seconds.
    pub fn refresh(&self) -> u32 {
        self.refresh
    }

    /// Returns the retry interval in seconds.
    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// Returns the expire interval in seconds.
    pub fn expire(&self) -> u32 {
        self.expire
    }

    /// Returns the minimum TTL.
    pub fn minimum(&self) -> u32 {
        self.minimum
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Soa::new(
            Name::parse(parser)?,
            Name::parse(parser)?,
            parser.parse_u32()?,
            parser.parse_u32()?,
            parser.parse_u32()?,
            parser.parse_u32()?,
            parser.parse_u32()?,
        ))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_name(&self.mname)?;
        target.append_name(&self.rname)?;
        self.compose_tail(target)
    }

    pub fn compose_canonical(
        &self,
        target: &mut Composer,
    ) -> Result<(), ShortBuf> {
        target.append_name_canonical(&self.mname)?;
        target.append_name_canonical(&self.rname)?;
        self.compose_tail(target)
    }

    fn compose_tail(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u32(self.serial)?;
        target.append_u32(self.refresh)?;
        target.append_u32(self.retry)?;
        target.append_u32(self.expire)?;
        target.append_u32(self.minimum)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Soa::new(
            scanner.scan_name()?,
            scanner.scan_name()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
        ))
    }
}

//--- Display

impl fmt::Display for Soa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum
        )
    }
}

//------------ Mx ------------------------------------------------------------

/// MX record data.
///
/// MX records specify a mail exchange for the owner name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Mx {
    preference: u16,
    exchange: Name,
}

impl Mx {
    /// Creates new Mx record data from a preference and the exchange.
    pub fn new(preference: u16, exchange: Name) -> Self {
        Mx {
            preference,
            exchange,
        }
    }

    /// Returns the preference for this record.
    ///
    /// Lower values are preferred.
    pub fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the name of the mail exchange.
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Mx::new(parser.parse_u16()?, Name::parse(parser)?))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u16(self.preference)?;
        target.append_name(&self.exchange)
    }

    pub fn compose_canonical(
        &self,
        target: &mut Composer,
    ) -> Result<(), ShortBuf> {
        target.append_u16(self.preference)?;
        target.append_name_canonical(&self.exchange)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Mx::new(scanner.scan_int()?, scanner.scan_name()?))
    }
}

//--- Display

impl fmt::Display for Mx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

//------------ Txt -----------------------------------------------------------

/// TXT record data.
///
/// TXT records hold descriptive text: a sequence of one or more character
/// strings.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Txt {
    strings: Vec<CharStr>,
}

impl Txt {
    /// Creates new TXT record data from its strings.
    ///
    /// At least one string is required.
    pub fn new(strings: Vec<CharStr>) -> Result<Self, ParseError> {
        if strings.is_empty() {
            return Err(ParseError::form_error("empty TXT record"));
        }
        Ok(Txt { strings })
    }

    /// Creates new TXT record data from a single string.
    pub fn single(string: CharStr) -> Self {
        Txt {
            strings: vec![string],
        }
    }

    /// Returns the character strings of the record.
    pub fn strings(&self) -> &[CharStr] {
        &self.strings
    }

    /// Parses the record data.
    ///
    /// Character strings are read until the end of the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut strings = Vec::new();
        while parser.remaining() > 0 {
            strings.push(CharStr::parse(parser)?);
        }
        Txt::new(strings)
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        for string in &self.strings {
            string.compose(target)?;
        }
        Ok(())
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let mut strings = Vec::new();
        strings.push(scanner.scan_charstr()?);
        while scanner.clone().next_opt().is_some() {
            strings.push(scanner.scan_charstr()?);
        }
        Ok(Txt { strings })
    }
}

//--- Display

impl fmt::Display for Txt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        for string in &self.strings {
            write!(f, "{}{}", sep, string)?;
            sep = " ";
        }
        Ok(())
    }
}

//------------ Hinfo ---------------------------------------------------------

/// Hinfo record data.
///
/// Hinfo records are used to acquire general information about a host,
/// specifically the CPU type and operating system type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Hinfo {
    cpu: CharStr,
    os: CharStr,
}

impl Hinfo {
    /// Creates new Hinfo record data from the components.
    pub fn new(cpu: CharStr, os: CharStr) -> Self {
        Hinfo { cpu, os }
    }

    /// The CPU type of the host.
    pub fn cpu(&self) -> &CharStr {
        &self.cpu
    }

    /// The operating system type of the host.
    pub fn os(&self) -> &CharStr {
        &self.os
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Hinfo::new(CharStr::parse(parser)?, CharStr::parse(parser)?))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        self.cpu.compose(target)?;
        self.os.compose(target)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Hinfo::new(scanner.scan_charstr()?, scanner.scan_charstr()?))
    }
}

//--- Display

impl fmt::Display for Hinfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.cpu, self.os)
    }
}

//------------ Null ----------------------------------------------------------

/// NULL record data.
///
/// NULL records can contain whatever data. They are experimental and not
/// allowed in zone files.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Null {
    data: Bytes,
}

impl Null {
    /// Creates new NULL record data from content.
    pub fn new(data: Bytes) -> Self {
        Null { data }
    }

    /// The raw content of the record.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let len = parser.remaining();
        Ok(Null::new(Bytes::copy_from_slice(
            parser.parse_octets(len)?,
        )))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.data)
    }
}

//--- Display

impl fmt::Display for Null {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            f.write_str(" ")?;
            crate::utils::base16::display(&self.data, f)?;
        }
        Ok(())
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn a_text_and_wire() {
        let a = A::scan(&mut Scanner::new("1.2.3.4")).unwrap();
        assert_eq!(a.addr(), Ipv4Addr::new(1, 2, 3, 4));

        let mut target = Composer::new(512);
        a.compose(&mut target).unwrap();
        assert_eq!(target.as_slice(), b"\x01\x02\x03\x04");

        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(A::parse(&mut parser).unwrap(), a);
    }

    #[test]
    fn txt_multiple_strings() {
        let txt = Txt::scan(&mut Scanner::new("\"foo bar\" baz")).unwrap();
        assert_eq!(txt.strings().len(), 2);

        let mut target = Composer::new(512);
        txt.compose(&mut target).unwrap();
        assert_eq!(target.as_slice(), b"\x07foo bar\x03baz");
    }

    #[test]
    fn soa_round_trip() {
        use core::str::FromStr;

        let soa = Soa::scan(&mut Scanner::new(
            "ns.example. hostmaster.example. 2023120101 7200 3600 1209600 \
             3600",
        ))
        .unwrap();
        assert_eq!(soa.mname(), &Name::from_str("ns.example.").unwrap());
        assert_eq!(soa.serial(), 2023120101);

        let mut target = Composer::new(512);
        soa.compose(&mut target).unwrap();
        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Soa::parse(&mut parser).unwrap(), soa);
    }
}
