//! Resource records.
//!
//! A resource record is the basic unit of DNS data: an owner name, a
//! class, a time to live, and typed record data. The [`Record`] type
//! combines all of these; the data itself lives in the
//! [`Rdata`][crate::rdata::Rdata] union of the [rdata][crate::rdata]
//! module.

use super::iana::{Class, Rtype};
use super::name::{Name, NameError};
use super::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::rdata::{codec, FromTextError, Rdata};
use core::fmt;

//------------ Record --------------------------------------------------------

/// A DNS resource record.
///
/// The record type is carried by the record data, so a record cannot be
/// constructed whose type contradicts its data. The owner name must be
/// absolute and the TTL must fit into 31 bits, both of which
/// [`new`][Self::new] enforces.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Record {
    /// The owner of the record.
    name: Name,

    /// The class of the record.
    class: Class,

    /// The time to live value of the record.
    ttl: u32,

    /// The record data.
    data: Rdata,
}

impl Record {
    /// The largest permitted TTL value.
    pub const MAX_TTL: u32 = 0x7FFF_FFFF;

    /// Creates a new record from its parts.
    ///
    /// The owner name must be absolute and the TTL no larger than
    /// 2^31 - 1.
    pub fn new(
        name: Name,
        class: Class,
        ttl: u32,
        data: impl Into<Rdata>,
    ) -> Result<Self, RecordError> {
        if !name.is_absolute() {
            return Err(RecordError::RelativeName);
        }
        if ttl > Self::MAX_TTL {
            return Err(RecordError::InvalidTtl);
        }
        Ok(Record {
            name,
            class,
            ttl,
            data: data.into(),
        })
    }

    /// Creates a record without checking name and TTL.
    ///
    /// Used for the OPT pseudo record, which reinterprets the class and
    /// TTL fields and thus is exempt from their invariants.
    pub(crate) fn from_parts_unchecked(
        name: Name,
        class: Class,
        ttl: u32,
        data: Rdata,
    ) -> Self {
        Record {
            name,
            class,
            ttl,
            data,
        }
    }

    /// Creates a new record from the presentation format of its data.
    pub fn from_text(
        name: Name,
        rtype: Rtype,
        class: Class,
        ttl: u32,
        text: &str,
    ) -> Result<Self, RecordError> {
        let data = Rdata::from_text(rtype, text)?;
        Record::new(name, class, ttl, data)
    }

    /// Returns a reference to the owner name of the record.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.data.rtype()
    }

    /// Returns the class of the record.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the TTL of the record.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns a reference to the record data.
    pub fn data(&self) -> &Rdata {
        &self.data
    }

    /// Converts the record into its data.
    pub fn into_data(self) -> Rdata {
        self.data
    }

    /// Takes a record from the beginning of the parser.
    ///
    /// TTL values with the most significant bit set are treated as zero
    /// in accordance with RFC 2181. OPT records are exempt: their TTL
    /// field packs the extended response code, version, and flags.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let name = Name::parse(parser)?;
        let rtype = Rtype::parse(parser)?;
        let class = Class::parse(parser)?;
        let mut ttl = parser.parse_u32()?;
        if rtype != Rtype::Opt && ttl > Self::MAX_TTL {
            ttl = 0;
        }
        let rdlen = parser.parse_u16()? as usize;
        let old_limit = parser.limit_to(rdlen)?;
        let data = Rdata::parse(rtype, parser)?;
        if parser.remaining() != 0 {
            return Err(ParseError::form_error(
                "trailing data in record data",
            ));
        }
        parser.set_limit(old_limit);
        Ok(Record {
            name,
            class,
            ttl,
            data,
        })
    }

    /// Appends the record to the target.
    ///
    /// The owner name is compressed. Whether names inside the record
    /// data are eligible for compression is decided by the data's type.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_name(&self.name)?;
        self.compose_tail(target, false)
    }

    /// Appends the record in canonical form.
    ///
    /// The owner name is lowercased and nothing is compressed.
    pub fn compose_canonical(
        &self,
        target: &mut Composer,
    ) -> Result<(), ShortBuf> {
        target.append_name_canonical(&self.name)?;
        self.compose_tail(target, true)
    }

    /// Appends everything after the owner name.
    fn compose_tail(
        &self,
        target: &mut Composer,
        canonical: bool,
    ) -> Result<(), ShortBuf> {
        self.rtype().compose(target)?;
        self.class.compose(target)?;
        target.append_u32(self.ttl)?;
        let rdlen_pos = target.len();
        target.append_u16(0)?;
        match codec(self.rtype()) {
            Some(codec) => {
                if canonical {
                    (codec.canonical)(&self.data, target)?
                } else {
                    (codec.emit)(&self.data, target)?
                }
            }
            None => self.data.compose(target)?,
        }
        let rdlen = target.len() - rdlen_pos - 2;
        target.update_u16(rdlen_pos, rdlen as u16);
        Ok(())
    }
}

//--- Display

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.name,
            self.ttl,
            self.class,
            self.rtype(),
            self.data
        )
    }
}

//============ Error Types ===================================================

//------------ RecordError ---------------------------------------------------

/// A record could not be constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordError {
    /// The owner name is relative.
    RelativeName,

    /// The TTL does not fit into 31 bits.
    InvalidTtl,

    /// The record data could not be created from its text form.
    FromText(FromTextError),
}

//--- From

impl From<NameError> for RecordError {
    fn from(_: NameError) -> Self {
        RecordError::RelativeName
    }
}

impl From<FromTextError> for RecordError {
    fn from(err: FromTextError) -> Self {
        RecordError::FromText(err)
    }
}

//--- Display and Error

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordError::RelativeName => {
                f.write_str("relative owner name")
            }
            RecordError::InvalidTtl => {
                f.write_str("TTL exceeds 31 bits")
            }
            RecordError::FromText(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RecordError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn wire_round_trip() {
        let record = Record::from_text(
            name("www.example.com."),
            Rtype::A,
            Class::In,
            300,
            "1.2.3.4",
        )
        .unwrap();

        let mut target = Composer::new(512);
        record.compose(&mut target).unwrap();
        assert_eq!(
            target.as_slice(),
            b"\x03www\x07example\x03com\x00\
              \x00\x01\x00\x01\x00\x00\x01\x2C\
              \x00\x04\x01\x02\x03\x04"
        );

        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Record::parse(&mut parser).unwrap(), record);
    }

    #[test]
    fn construction_limits() {
        let data = Rdata::from_text(Rtype::A, "1.2.3.4").unwrap();
        assert_eq!(
            Record::new(name("www.example.com"), Class::In, 300, data.clone())
                .unwrap_err(),
            RecordError::RelativeName
        );
        assert_eq!(
            Record::new(name("www.example.com."), Class::In, 1 << 31, data)
                .unwrap_err(),
            RecordError::InvalidTtl
        );
    }

    #[test]
    fn parse_rejects_bad_rdlen() {
        // RDLENGTH says 3 but an A record needs 4.
        let wire = b"\x03www\x00\x00\x01\x00\x01\x00\x00\x01\x2C\
                     \x00\x03\x01\x02\x03";
        let mut parser = Parser::from_slice(wire);
        assert!(Record::parse(&mut parser).is_err());

        // RDLENGTH says 6 with two trailing octets after the address.
        let wire = b"\x03www\x00\x00\x01\x00\x01\x00\x00\x01\x2C\
                     \x00\x06\x01\x02\x03\x04\x05\x06";
        let mut parser = Parser::from_slice(wire);
        assert!(Record::parse(&mut parser).is_err());
    }

    #[test]
    fn canonical_lowercases_owner() {
        let record = Record::from_text(
            name("WWW.Example.COM."),
            Rtype::A,
            Class::In,
            300,
            "1.2.3.4",
        )
        .unwrap();
        let mut target = Composer::new(512);
        record.compose_canonical(&mut target).unwrap();
        assert!(target.as_slice().starts_with(b"\x03www\x07example\x03com\x00"));
    }
}
