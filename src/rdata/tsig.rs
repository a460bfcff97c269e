//! Record data for TSIG records, [RFC 8945].
//!
//! The TSIG record carries a transaction signature: a keyed MAC over the
//! message it concludes. It is a meta record that only ever appears as
//! the last record of the additional section of a message and is never
//! part of zone data. Consequently, it is also the one record type with
//! no presentation format at all.
//!
//! [RFC 8945]: https://tools.ietf.org/html/rfc8945

use crate::base::iana::TsigRcode;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::utils::base64;
use bytes::Bytes;
use core::fmt;
use std::time::SystemTime;

//------------ Tsig ----------------------------------------------------------

/// TSIG record data.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Tsig {
    /// The signature algorithm as a domain name.
    algorithm: Name,

    /// The Unix epoch time at which the signature was created.
    ///
    /// Note that this is an unsigned 48 bit value in wire format.
    time_signed: Time48,

    /// Seconds of error permitted in time signed.
    fudge: u16,

    /// The MAC.
    ///
    /// In wire format, consists of an unsigned 16 bit integer containing
    /// the length followed by that many octets of actual MAC.
    mac: Bytes,

    /// Original message ID.
    original_id: u16,

    /// TSIG response code.
    error: TsigRcode,

    /// Other.
    ///
    /// This is normally empty unless a BADTIME error happened. In wire
    /// format, it is encoded as an unsigned 16 bit integer followed by
    /// that many octets.
    other: Bytes,
}

impl Tsig {
    /// Creates new TSIG record data from its components.
    ///
    /// See the access methods for an explanation of these components.
    pub fn new(
        algorithm: Name,
        time_signed: Time48,
        fudge: u16,
        mac: Bytes,
        original_id: u16,
        error: TsigRcode,
        other: Bytes,
    ) -> Self {
        Tsig {
            algorithm,
            time_signed,
            fudge,
            mac,
            original_id,
            error,
            other,
        }
    }

    /// Returns a reference to the algorithm name.
    ///
    /// TSIG encodes the algorithm used for keys and signatures as a
    /// domain name. It does, however, only use the format. No structure
    /// is used at all.
    pub fn algorithm(&self) -> &Name {
        &self.algorithm
    }

    /// Returns the Unix time when the signature was created.
    pub fn time_signed(&self) -> Time48 {
        self.time_signed
    }

    /// Returns the number of seconds of offset from signing time
    /// permitted.
    ///
    /// When a signature is checked, the local system time needs to be
    /// within this many seconds from `time_signed` to be accepted.
    pub fn fudge(&self) -> u16 {
        self.fudge
    }

    /// Returns a reference to the MAC.
    pub fn mac(&self) -> &Bytes {
        &self.mac
    }

    /// Returns the original message ID.
    ///
    /// Since the message ID is part of the signature generation but may
    /// be changed by a forwarder, it is included in the TSIG record.
    pub fn original_id(&self) -> u16 {
        self.original_id
    }

    /// Returns the TSIG error.
    pub fn error(&self) -> TsigRcode {
        self.error
    }

    /// Returns a reference to the other octets.
    ///
    /// This field is only used for BADTIME errors to return the server
    /// time. Otherwise it is empty.
    pub fn other(&self) -> &Bytes {
        &self.other
    }

    /// Returns the other octets as the server time.
    ///
    /// If the other octets are exactly 6 long, returns them as a
    /// [`Time48`] value.
    pub fn other_time(&self) -> Option<Time48> {
        if self.other.len() == 6 {
            Some(Time48::from_slice(&self.other))
        } else {
            None
        }
    }

    /// Returns whether the record is valid at the given time.
    ///
    /// The method checks whether the given time is within
    /// [`fudge`][Self::fudge] seconds of [`time_signed`][Self::time_signed].
    pub fn is_valid_at(&self, now: Time48) -> bool {
        now.eq_fudged(self.time_signed, self.fudge.into())
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let algorithm = Name::parse(parser)?;
        let time_signed = Time48::parse(parser)?;
        let fudge = parser.parse_u16()?;
        let mac_size = parser.parse_u16()? as usize;
        let mac = Bytes::copy_from_slice(parser.parse_octets(mac_size)?);
        let original_id = parser.parse_u16()?;
        let error = TsigRcode::parse(parser)?;
        let other_len = parser.parse_u16()? as usize;
        let other = Bytes::copy_from_slice(parser.parse_octets(other_len)?);
        Ok(Tsig {
            algorithm,
            time_signed,
            fudge,
            mac,
            original_id,
            error,
            other,
        })
    }

    /// Appends the record data.
    ///
    /// The algorithm name is never compressed.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_name_uncompressed(&self.algorithm)?;
        self.time_signed.compose(target)?;
        target.append_u16(self.fudge)?;
        target.append_u16(self.mac.len() as u16)?;
        target.append_slice(&self.mac)?;
        target.append_u16(self.original_id)?;
        self.error.compose(target)?;
        target.append_u16(self.other.len() as u16)?;
        target.append_slice(&self.other)
    }

    /// Returns the length of the wire format of the record data.
    pub fn compose_len(&self) -> u16 {
        // Time signed, fudge, MAC length, original ID, error, and other
        // length amount to 16 octets of fixed fields.
        self.algorithm.compose_len()
            + 16
            + self.mac.len() as u16
            + self.other.len() as u16
    }
}

//--- Display and Debug

impl fmt::Display for Tsig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} ",
            self.algorithm, self.time_signed, self.fudge
        )?;
        base64::display(&self.mac, f)?;
        write!(f, " {} {} ", self.original_id, self.error)?;
        if self.other.is_empty() {
            f.write_str("\"\"")
        } else {
            base64::display(&self.other, f)
        }
    }
}

impl fmt::Debug for Tsig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Tsig")
            .field("algorithm", &self.algorithm)
            .field("time_signed", &self.time_signed)
            .field("fudge", &self.fudge)
            .field("mac", &self.mac)
            .field("original_id", &self.original_id)
            .field("error", &self.error)
            .field("other", &self.other)
            .finish()
    }
}

//------------ Time48 --------------------------------------------------------

/// A 48-bit Unix timestamp.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Time48(u64);

impl Time48 {
    /// Returns the timestamp of the current moment.
    ///
    /// The function will panic if for whatever reason the current moment
    /// is too far in the future to fit into this type. For a correctly
    /// set clock, this will happen in December 8,921,556, so should be
    /// fine.
    pub fn now() -> Time48 {
        Self::from_u64(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .expect("system time before Unix epoch")
                .as_secs(),
        )
    }

    /// Creates a value from a 64 bit integer.
    ///
    /// The upper 16 bits of the argument must be zero or else this
    /// function panics. This is also why we don't implement `From`.
    pub fn from_u64(value: u64) -> Self {
        assert!(value & 0xFFFF_0000_0000_0000 == 0);
        Time48(value)
    }

    /// Creates a value from an octets slice.
    ///
    /// The slice should contain the octets of the value in network byte
    /// order.
    ///
    /// # Panics
    ///
    /// The function panics if the slice is shorter than 6 octets.
    fn from_slice(slice: &[u8]) -> Self {
        Time48(
            (u64::from(slice[0]) << 40)
                | (u64::from(slice[1]) << 32)
                | (u64::from(slice[2]) << 24)
                | (u64::from(slice[3]) << 16)
                | (u64::from(slice[4]) << 8)
                | (u64::from(slice[5])),
        )
    }

    /// Converts a value into its wire format.
    ///
    /// Returns the octets of the encoded value in network byte order.
    pub fn into_octets(self) -> [u8; 6] {
        let mut res = [0u8; 6];
        res[0] = (self.0 >> 40) as u8;
        res[1] = (self.0 >> 32) as u8;
        res[2] = (self.0 >> 24) as u8;
        res[3] = (self.0 >> 16) as u8;
        res[4] = (self.0 >> 8) as u8;
        res[5] = self.0 as u8;
        res
    }

    /// Returns whether the time is within a given period.
    ///
    /// Returns `true` iff `other` is at most `fudge` seconds before or
    /// after this value's time.
    pub fn eq_fudged(self, other: Self, fudge: u64) -> bool {
        self.0.saturating_sub(fudge) <= other.0
            && self.0.saturating_add(fudge) >= other.0
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut buf = [0u8; 6];
        parser.parse_buf(&mut buf)?;
        Ok(Time48::from_slice(&buf))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.into_octets())
    }
}

//--- From

impl From<Time48> for u64 {
    fn from(value: Time48) -> u64 {
        value.0
    }
}

//--- Display

impl fmt::Display for Time48 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn wire_round_trip() {
        let rdata = Tsig::new(
            Name::from_str("hmac-sha256.").unwrap(),
            Time48::from_u64(1_672_531_200),
            300,
            Bytes::from_static(b"0123456789abcdef0123456789abcdef"),
            0x1234,
            TsigRcode::NoError,
            Bytes::new(),
        );
        let mut target = Composer::new(512);
        rdata.compose(&mut target).unwrap();
        assert_eq!(target.len(), usize::from(rdata.compose_len()));

        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Tsig::parse(&mut parser).unwrap(), rdata);
    }

    #[test]
    fn time48_fudge() {
        let now = Time48::from_u64(1_000_000);
        assert!(now.eq_fudged(Time48::from_u64(1_000_200), 300));
        assert!(now.eq_fudged(Time48::from_u64(999_800), 300));
        assert!(!now.eq_fudged(Time48::from_u64(1_000_301), 300));
        assert!(!now.eq_fudged(Time48::from_u64(999_699), 300));
    }
}
