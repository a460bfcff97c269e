//! The header of a DNS message.
//!
//! Every DNS message begins with a fixed twelve octet header: the
//! message ID, the codes and flags describing the exchange, and the
//! number of entries in each of the four sections that follow. Its
//! layout is defined in section 4.1.1 of [RFC 1035].
//!
//! The header is split into two types here along the line of who gets
//! to change what: [`Header`] holds the first four octets with the
//! message ID, opcode, response code, and flags, all of which can be set
//! freely, while [`HeaderCounts`] holds the section counts, which are
//! derived from the sections during parsing and composing rather than
//! set by hand. [`HeaderSection`] wraps both into the full twelve
//! octets.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use super::iana::{Opcode, Rcode};
use super::wire::{Composer, ParseError, Parser, ShortBuf};
use core::{fmt, str::FromStr};

//------------ Header --------------------------------------------------------

/// The first part of the header of a DNS message.
///
/// This is a plain value covering the first four octets of a message:
/// the message ID, opcode, rcode bits, and the flags. The octets are
/// stored exactly as they appear on the wire, so the ID is in network
/// byte order and each flag accessor reaches for its bit directly, laid
/// out like this:
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|Z |AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// The basic structure and most of the fields are defined in [RFC 1035],
/// except for the AD and CD flags, which are defined in [RFC 4035].
///
/// [RFC 1035]: https://tools.ietf.org/html/rfc1035
/// [RFC 4035]: https://tools.ietf.org/html/rfc4035
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    /// The actual header in its wire format representation.
    ///
    /// This means that the ID field is in big endian.
    inner: [u8; 4],
}

/// # Creation and Conversion
///
impl Header {
    /// Creates a new header.
    ///
    /// The new header has all fields as either zero or false. Thus, the
    /// opcode will be [`Opcode::Query`] and the response code will be
    /// [`Rcode::NoError`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header from the first four octets of a message.
    ///
    /// # Panics
    ///
    /// This function panics if the slice is less than four octets long.
    pub fn from_slice(s: &[u8]) -> Self {
        let mut inner = [0u8; 4];
        inner.copy_from_slice(&s[..4]);
        Header { inner }
    }

    /// Returns a reference to the underlying octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }
}

/// # Field Access
///
impl Header {
    /// Returns the value of the ID field.
    ///
    /// The ID field is an identifier chosen by whoever created a query
    /// and is copied into a response by a server. It allows matching
    /// incoming responses to their queries.
    pub fn id(self) -> u16 {
        u16::from_be_bytes([self.inner[0], self.inner[1]])
    }

    /// Sets the value of the ID field.
    pub fn set_id(&mut self, value: u16) {
        self.inner[..2].copy_from_slice(&value.to_be_bytes())
    }

    /// Sets the value of the ID field to a randomly chosen number.
    pub fn set_random_id(&mut self) {
        self.set_id(::rand::random())
    }

    /// Returns whether the [QR](Flags::qr) bit is set.
    pub fn qr(self) -> bool {
        self.get_bit(2, 7)
    }

    /// Sets the value of the [QR](Flags::qr) bit.
    pub fn set_qr(&mut self, set: bool) {
        self.set_bit(2, 7, set)
    }

    /// Returns the value of the Opcode field.
    pub fn opcode(self) -> Opcode {
        Opcode::from_int((self.inner[2] >> 3) & 0x0F)
    }

    /// Sets the value of the opcode field.
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.inner[2] = self.inner[2] & 0x87 | (opcode.to_int() << 3);
    }

    /// Returns all flags contained in the header.
    pub fn flags(self) -> Flags {
        Flags {
            qr: self.qr(),
            aa: self.aa(),
            tc: self.tc(),
            rd: self.rd(),
            ra: self.ra(),
            ad: self.ad(),
            cd: self.cd(),
        }
    }

    /// Sets all flag bits.
    pub fn set_flags(&mut self, flags: Flags) {
        self.set_qr(flags.qr);
        self.set_aa(flags.aa);
        self.set_tc(flags.tc);
        self.set_rd(flags.rd);
        self.set_ra(flags.ra);
        self.set_ad(flags.ad);
        self.set_cd(flags.cd);
    }

    /// Returns whether the [AA](Flags::aa) bit is set.
    pub fn aa(self) -> bool {
        self.get_bit(2, 2)
    }

    /// Sets the value of the [AA](Flags::aa) bit.
    pub fn set_aa(&mut self, set: bool) {
        self.set_bit(2, 2, set)
    }

    /// Returns whether the [TC](Flags::tc) bit is set.
    pub fn tc(self) -> bool {
        self.get_bit(2, 1)
    }

    /// Sets the value of the [TC](Flags::tc) bit.
    pub fn set_tc(&mut self, set: bool) {
        self.set_bit(2, 1, set)
    }

    /// Returns whether the [RD](Flags::rd) bit is set.
    pub fn rd(self) -> bool {
        self.get_bit(2, 0)
    }

    /// Sets the value of the [RD](Flags::rd) bit.
    pub fn set_rd(&mut self, set: bool) {
        self.set_bit(2, 0, set)
    }

    /// Returns whether the [RA](Flags::ra) bit is set.
    pub fn ra(self) -> bool {
        self.get_bit(3, 7)
    }

    /// Sets the value of the [RA](Flags::ra) bit.
    pub fn set_ra(&mut self, set: bool) {
        self.set_bit(3, 7, set)
    }

    /// Returns whether the reserved bit is set.
    ///
    /// This bit must be `false` in all queries and responses.
    pub fn z(self) -> bool {
        self.get_bit(3, 6)
    }

    /// Sets the value of the reserved bit.
    pub fn set_z(&mut self, set: bool) {
        self.set_bit(3, 6, set)
    }

    /// Returns whether the [AD](Flags::ad) bit is set.
    pub fn ad(self) -> bool {
        self.get_bit(3, 5)
    }

    /// Sets the value of the [AD](Flags::ad) bit.
    pub fn set_ad(&mut self, set: bool) {
        self.set_bit(3, 5, set)
    }

    /// Returns whether the [CD](Flags::cd) bit is set.
    pub fn cd(self) -> bool {
        self.get_bit(3, 4)
    }

    /// Sets the value of the [CD](Flags::cd) bit.
    pub fn set_cd(&mut self, set: bool) {
        self.set_bit(3, 4, set)
    }

    /// Returns the response code stored in the header.
    ///
    /// Only the lower four bits live here; the upper bits of an extended
    /// response code come from the OPT record and are combined by
    /// [`Message::rcode`][super::message::Message::rcode].
    pub fn rcode(self) -> Rcode {
        Rcode::from_int(u16::from(self.inner[3] & 0x0F))
    }

    /// Sets the response code bits stored in the header.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.inner[3] = self.inner[3] & 0xF0 | rcode.header_bits();
    }

    //--- Internal helpers

    /// Returns the value of the bit at the given position.
    ///
    /// The argument `offset` gives the byte offset of the underlying bytes
    /// slice and `bit` gives the number of the bit with the most
    /// significant bit being 7.
    fn get_bit(self, offset: usize, bit: usize) -> bool {
        self.inner[offset] & (1 << bit) != 0
    }

    /// Sets or resets the given bit.
    fn set_bit(&mut self, offset: usize, bit: usize, set: bool) {
        if set {
            self.inner[offset] |= 1 << bit
        } else {
            self.inner[offset] &= !(1 << bit)
        }
    }
}

/// # Parsing and Composing
///
impl Header {
    /// Takes a header from the beginning of the parser.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut inner = [0u8; 4];
        parser.parse_buf(&mut inner)?;
        Ok(Header { inner })
    }

    /// Appends the header to the target.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.inner)
    }
}

//------------ Flags ---------------------------------------------------------

/// The flags contained in the DNS message header.
///
/// This is a utility type that makes it easier to work with flags. It
/// contains only standard DNS message flags that are part of the
/// [`Header`]; EDNS flags are not included.
///
/// This type has a text notation and can be created from it as well. Each
/// flag that is set is represented by a two-letter token, which is the
/// uppercase version of the flag name. If multiple flags are set, the
/// tokens are separated by space.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Flags {
    /// The `QR` bit specifies whether a message is a query (`false`) or a
    /// response (`true`).
    pub qr: bool,

    /// The `AA` bit states whether a name server is authoritative for the
    /// requested domain name, i.e., whether this response is an
    /// *authoritative answer.* The field has no meaning in a query.
    pub aa: bool,

    /// The *truncation* (`TC`) bit is set if there was more data available
    /// than fit into the message. This is typically used when employing
    /// datagram transports such as UDP to signal that the answer didn't
    /// fit into a response and the query should be tried again using a
    /// stream transport such as TCP.
    pub tc: bool,

    /// The *recursion desired* (`RD`) bit may be set in a query to ask the
    /// name server to try and recursively gather a response if it doesn't
    /// have the data available locally. The bit's value is copied into the
    /// response.
    pub rd: bool,

    /// In a response, the *recursion available* (`RA`) bit denotes whether
    /// the responding name server supports recursion.
    pub ra: bool,

    /// The *authentic data* (`AD`) bit is used by security-aware recursive
    /// name servers to indicate that all RR sets in the response have
    /// successfully passed DNSSEC validation.
    pub ad: bool,

    /// The *checking disabled* (`CD`) bit is used by a security-aware
    /// resolver to indicate that it does not want upstream name servers to
    /// perform verification but rather would like to verify everything
    /// itself.
    pub cd: bool,
}

/// # Creation and Conversion
///
impl Flags {
    /// Creates new flags.
    ///
    /// All flags will be unset.
    pub fn new() -> Self {
        Self::default()
    }
}

//--- Display & FromStr

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        for (token, flag) in [
            ("QR", self.qr),
            ("AA", self.aa),
            ("TC", self.tc),
            ("RD", self.rd),
            ("RA", self.ra),
            ("AD", self.ad),
            ("CD", self.cd),
        ] {
            if flag {
                write!(f, "{}{}", sep, token)?;
                sep = " ";
            }
        }
        Ok(())
    }
}

impl FromStr for Flags {
    type Err = FlagsFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Flags::new();
        for token in s.split_ascii_whitespace() {
            if token.eq_ignore_ascii_case("QR") {
                flags.qr = true
            } else if token.eq_ignore_ascii_case("AA") {
                flags.aa = true
            } else if token.eq_ignore_ascii_case("TC") {
                flags.tc = true
            } else if token.eq_ignore_ascii_case("RD") {
                flags.rd = true
            } else if token.eq_ignore_ascii_case("RA") {
                flags.ra = true
            } else if token.eq_ignore_ascii_case("AD") {
                flags.ad = true
            } else if token.eq_ignore_ascii_case("CD") {
                flags.cd = true
            } else {
                return Err(FlagsFromStrError);
            }
        }
        Ok(flags)
    }
}

//------------ HeaderCounts --------------------------------------------------

/// The section counts of a DNS message.
///
/// These are the four 16 bit counters for the number of entries in the
/// four sections of the message, kept in wire format.
///
/// The counters are added up while a message is composed or parsed rather
/// than being authoritative on their own; the one exception is transaction
/// signing, where the additional count of the hashed message differs from
/// the one sent out by exactly the TSIG record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderCounts {
    /// The counters in their wire format representation.
    inner: [u8; 8],
}

impl HeaderCounts {
    /// Creates new counts, all set to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates counts from the count octets of a message.
    ///
    /// # Panics
    ///
    /// This function panics if the slice is less than eight octets long.
    pub fn from_slice(s: &[u8]) -> Self {
        let mut inner = [0u8; 8];
        inner.copy_from_slice(&s[..8]);
        HeaderCounts { inner }
    }

    /// Returns a reference to the underlying octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Returns the number of entries in the question section.
    pub fn qdcount(self) -> u16 {
        self.get_u16(0)
    }

    /// Sets the number of entries in the question section.
    pub fn set_qdcount(&mut self, value: u16) {
        self.set_u16(0, value)
    }

    /// Returns the number of entries in the answer section.
    pub fn ancount(self) -> u16 {
        self.get_u16(2)
    }

    /// Sets the number of entries in the answer section.
    pub fn set_ancount(&mut self, value: u16) {
        self.set_u16(2, value)
    }

    /// Returns the number of entries in the authority section.
    pub fn nscount(self) -> u16 {
        self.get_u16(4)
    }

    /// Sets the number of entries in the authority section.
    pub fn set_nscount(&mut self, value: u16) {
        self.set_u16(4, value)
    }

    /// Returns the number of entries in the additional section.
    pub fn arcount(self) -> u16 {
        self.get_u16(6)
    }

    /// Sets the number of entries in the additional section.
    pub fn set_arcount(&mut self, value: u16) {
        self.set_u16(6, value)
    }

    /// Decreases the additional count by one.
    ///
    /// Used when calculating a transaction signature, which covers the
    /// message without the TSIG record itself.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero.
    pub fn dec_arcount(&mut self) {
        let count = self.arcount();
        assert!(count > 0);
        self.set_arcount(count - 1);
    }

    /// Takes the counts from the beginning of the parser.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut inner = [0u8; 8];
        parser.parse_buf(&mut inner)?;
        Ok(HeaderCounts { inner })
    }

    /// Appends the counts to the target.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.inner)
    }

    //--- Internal helpers

    fn get_u16(self, offset: usize) -> u16 {
        u16::from_be_bytes([self.inner[offset], self.inner[offset + 1]])
    }

    fn set_u16(&mut self, offset: usize, value: u16) {
        self.inner[offset..offset + 2]
            .copy_from_slice(&value.to_be_bytes())
    }
}

//------------ HeaderSection -------------------------------------------------

/// The complete header section of a DNS message.
///
/// This type wraps the first twelve octets of a message: the [`Header`]
/// and the [`HeaderCounts`]. It is mostly useful when a header needs to be
/// reassembled verbatim, such as when reconstructing the data covered by a
/// transaction signature.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderSection {
    /// The header part.
    header: Header,

    /// The counts part.
    counts: HeaderCounts,
}

impl HeaderSection {
    /// The length of the header section in octets.
    pub const LEN: usize = 12;

    /// Creates a new header section with all fields set to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header section from the first twelve octets of a message.
    ///
    /// # Panics
    ///
    /// This function panics if the slice is less than twelve octets long.
    pub fn from_message_slice(s: &[u8]) -> Self {
        HeaderSection {
            header: Header::from_slice(&s[..4]),
            counts: HeaderCounts::from_slice(&s[4..12]),
        }
    }

    /// Returns a reference to the header part.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns a mutable reference to the header part.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns a reference to the counts part.
    pub fn counts(&self) -> &HeaderCounts {
        &self.counts
    }

    /// Returns a mutable reference to the counts part.
    pub fn counts_mut(&mut self) -> &mut HeaderCounts {
        &mut self.counts
    }

    /// Returns the twelve octets of the section.
    pub fn to_array(self) -> [u8; Self::LEN] {
        let mut res = [0u8; Self::LEN];
        res[..4].copy_from_slice(self.header.as_slice());
        res[4..].copy_from_slice(self.counts.as_slice());
        res
    }
}

//============ Error Types ===================================================

//------------ FlagsFromStrError ---------------------------------------------

/// An unknown flags token was encountered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlagsFromStrError;

//--- Display and Error

impl fmt::Display for FlagsFromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid flags token")
    }
}

impl std::error::Error for FlagsFromStrError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_fields() {
        let mut header = Header::new();
        header.set_id(0x1234);
        header.set_qr(true);
        header.set_opcode(Opcode::Notify);
        header.set_tc(true);
        header.set_rcode(Rcode::Refused);
        assert_eq!(header.as_slice(), b"\x12\x34\xA2\x05");
        assert_eq!(header.id(), 0x1234);
        assert!(header.qr());
        assert_eq!(header.opcode(), Opcode::Notify);
        assert!(header.tc());
        assert!(!header.aa());
        assert_eq!(header.rcode(), Rcode::Refused);
    }

    #[test]
    fn counts() {
        let mut counts = HeaderCounts::new();
        counts.set_qdcount(1);
        counts.set_arcount(2);
        assert_eq!(counts.as_slice(), b"\0\x01\0\0\0\0\0\x02");
        counts.dec_arcount();
        assert_eq!(counts.arcount(), 1);
    }

    #[test]
    fn flags_text() {
        let flags = Flags::from_str("RD cd").unwrap();
        assert!(flags.rd && flags.cd && !flags.qr);
        assert_eq!(format!("{}", flags), "RD CD");
        assert!(Flags::from_str("XX").is_err());
    }
}
