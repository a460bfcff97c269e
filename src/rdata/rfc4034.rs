//! Record data from [RFC 4034]: DS, DNSKEY, RRSIG, and NSEC records.
//!
//! This RFC defines the record types for DNSSEC.
//!
//! [RFC 4034]: https://tools.ietf.org/html/rfc4034

use crate::base::iana::Rtype;
use crate::base::name::Name;
use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::utils::{base16, base64};
use bytes::Bytes;
use core::fmt;

//------------ Dnskey --------------------------------------------------------

/// DNSKEY record data.
///
/// DNSKEY records store the public key of a zone.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Dnskey {
    flags: u16,
    protocol: u8,
    algorithm: u8,
    public_key: Bytes,
}

impl Dnskey {
    /// Creates new DNSKEY record data from its components.
    pub fn new(
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Bytes,
    ) -> Self {
        Dnskey {
            flags,
            protocol,
            algorithm,
            public_key,
        }
    }

    /// Returns the flags field.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the protocol field.
    ///
    /// The value must be 3 for the key to be used in DNSSEC validation.
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Returns the security algorithm of the key.
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the public key material.
    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }

    /// Returns whether the zone key flag is set.
    pub fn is_zone_key(&self) -> bool {
        self.flags & 0x0100 != 0
    }

    /// Returns whether the secure entry point flag is set.
    pub fn is_secure_entry_point(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let flags = parser.parse_u16()?;
        let protocol = parser.parse_u8()?;
        let algorithm = parser.parse_u8()?;
        let len = parser.remaining();
        let public_key = Bytes::copy_from_slice(parser.parse_octets(len)?);
        Ok(Dnskey::new(flags, protocol, algorithm, public_key))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u16(self.flags)?;
        target.append_u8(self.protocol)?;
        target.append_u8(self.algorithm)?;
        target.append_slice(&self.public_key)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Dnskey::new(
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            Bytes::from(scanner.scan_base64_rest()?),
        ))
    }
}

//--- Display

impl fmt::Display for Dnskey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} ", self.flags, self.protocol, self.algorithm)?;
        base64::display(&self.public_key, f)
    }
}

//------------ Ds ------------------------------------------------------------

/// DS record data.
///
/// DS records refer to a DNSKEY record in the delegated zone by holding a
/// digest of it, establishing the chain of trust across a delegation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ds {
    key_tag: u16,
    algorithm: u8,
    digest_type: u8,
    digest: Bytes,
}

impl Ds {
    /// Creates new DS record data from its components.
    pub fn new(
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Bytes,
    ) -> Self {
        Ds {
            key_tag,
            algorithm,
            digest_type,
            digest,
        }
    }

    /// Returns the key tag of the referenced key.
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the security algorithm of the referenced key.
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the digest algorithm used for the digest.
    pub fn digest_type(&self) -> u8 {
        self.digest_type
    }

    /// Returns the digest of the referenced key.
    pub fn digest(&self) -> &Bytes {
        &self.digest
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let key_tag = parser.parse_u16()?;
        let algorithm = parser.parse_u8()?;
        let digest_type = parser.parse_u8()?;
        let len = parser.remaining();
        let digest = Bytes::copy_from_slice(parser.parse_octets(len)?);
        Ok(Ds::new(key_tag, algorithm, digest_type, digest))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u16(self.key_tag)?;
        target.append_u8(self.algorithm)?;
        target.append_u8(self.digest_type)?;
        target.append_slice(&self.digest)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Ds::new(
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            Bytes::from(scanner.scan_base16_rest()?),
        ))
    }
}

//--- Display

impl fmt::Display for Ds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} ",
            self.key_tag, self.algorithm, self.digest_type
        )?;
        base16::display(&self.digest, f)
    }
}

//------------ Rrsig ---------------------------------------------------------

/// RRSIG record data.
///
/// RRSIG records hold the signature over one RR set of the zone.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Rrsig {
    type_covered: Rtype,
    algorithm: u8,
    labels: u8,
    original_ttl: u32,
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer_name: Name,
    signature: Bytes,
}

impl Rrsig {
    /// Creates new RRSIG record data from its components.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: Rtype,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer_name: Name,
        signature: Bytes,
    ) -> Self {
        Rrsig {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        }
    }

    /// Returns the record type the signature covers.
    pub fn type_covered(&self) -> Rtype {
        self.type_covered
    }

    /// Returns the security algorithm of the signature.
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the number of labels of the covered RR set's owner name.
    pub fn labels(&self) -> u8 {
        self.labels
    }

    /// Returns the original TTL of the covered RR set.
    pub fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Returns the expiration time of the signature.
    ///
    /// The value is in seconds since the Unix epoch, modulo 2^32.
    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Returns the inception time of the signature.
    ///
    /// The value is in seconds since the Unix epoch, modulo 2^32.
    pub fn inception(&self) -> u32 {
        self.inception
    }

    /// Returns the key tag of the key that created the signature.
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the name of the zone that created the signature.
    pub fn signer_name(&self) -> &Name {
        &self.signer_name
    }

    /// Returns the signature itself.
    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let type_covered = Rtype::parse(parser)?;
        let algorithm = parser.parse_u8()?;
        let labels = parser.parse_u8()?;
        let original_ttl = parser.parse_u32()?;
        let expiration = parser.parse_u32()?;
        let inception = parser.parse_u32()?;
        let key_tag = parser.parse_u16()?;
        let signer_name = Name::parse(parser)?;
        let len = parser.remaining();
        let signature = Bytes::copy_from_slice(parser.parse_octets(len)?);
        Ok(Rrsig::new(
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        ))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        self.compose_head(target)?;
        target.append_name_uncompressed(&self.signer_name)?;
        target.append_slice(&self.signature)
    }

    pub fn compose_canonical(
        &self,
        target: &mut Composer,
    ) -> Result<(), ShortBuf> {
        self.compose_head(target)?;
        target.append_name_canonical(&self.signer_name)?;
        target.append_slice(&self.signature)
    }

    fn compose_head(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        self.type_covered.compose(target)?;
        target.append_u8(self.algorithm)?;
        target.append_u8(self.labels)?;
        target.append_u32(self.original_ttl)?;
        target.append_u32(self.expiration)?;
        target.append_u32(self.inception)?;
        target.append_u16(self.key_tag)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Rrsig::new(
            scanner
                .next_token()?
                .parse()
                .map_err(|_| ScanError::new("bad record type"))?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_time()?,
            scanner.scan_time()?,
            scanner.scan_int()?,
            scanner.scan_name()?,
            Bytes::from(scanner.scan_base64_rest()?),
        ))
    }
}

//--- Display

impl fmt::Display for Rrsig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} ",
            self.type_covered,
            self.algorithm,
            self.labels,
            self.original_ttl,
            self.expiration,
            self.inception,
            self.key_tag,
            self.signer_name
        )?;
        base64::display(&self.signature, f)
    }
}

//------------ Nsec ----------------------------------------------------------

/// NSEC record data.
///
/// NSEC records chain the owner names of a signed zone together in
/// canonical order, proving the nonexistence of names and types.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsec {
    next_name: Name,
    types: RtypeBitmap,
}

impl Nsec {
    /// Creates new NSEC record data from its components.
    pub fn new(next_name: Name, types: RtypeBitmap) -> Self {
        Nsec { next_name, types }
    }

    /// Returns the next owner name in canonical zone order.
    pub fn next_name(&self) -> &Name {
        &self.next_name
    }

    /// Returns the record types present at the owner name.
    pub fn types(&self) -> &RtypeBitmap {
        &self.types
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Nsec::new(
            Name::parse(parser)?,
            RtypeBitmap::parse(parser)?,
        ))
    }

    /// Appends the record data.
    ///
    /// The next name is never compressed and, per RFC 6840, not
    /// lowercased in the canonical form either.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_name_uncompressed(&self.next_name)?;
        self.types.compose(target)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let next_name = scanner.scan_name()?;
        let mut builder = RtypeBitmapBuilder::new();
        while let Some(token) = scanner.next_opt() {
            builder.add(
                token
                    .parse()
                    .map_err(|_| ScanError::new("bad record type"))?,
            );
        }
        Ok(Nsec::new(next_name, builder.finalize()))
    }
}

//--- Display

impl fmt::Display for Nsec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.next_name, self.types)
    }
}

//------------ RtypeBitmap ---------------------------------------------------

/// A bitmap of record types.
///
/// NSEC and NSEC3 records use this bitmap to express the set of record
/// types present at an owner name. On the wire the bitmap is a sequence
/// of window blocks, each a window number, a length, and up to 32 octets
/// of bits.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct RtypeBitmap {
    /// The wire format of the bitmap.
    data: Bytes,
}

impl RtypeBitmap {
    /// Creates a bitmap from its wire-format data.
    pub fn from_octets(data: Bytes) -> Result<Self, ParseError> {
        let mut check = data.as_ref();
        let mut last_window = None;
        while !check.is_empty() {
            if check.len() < 2 {
                return Err(ParseError::form_error("invalid type bitmap"));
            }
            let window = check[0];
            if let Some(last) = last_window {
                if window <= last {
                    return Err(ParseError::form_error(
                        "invalid type bitmap",
                    ));
                }
            }
            last_window = Some(window);
            let len = check[1] as usize;
            if len == 0 || len > 32 || check.len() < len + 2 {
                return Err(ParseError::form_error("invalid type bitmap"));
            }
            check = &check[len + 2..];
        }
        Ok(RtypeBitmap { data })
    }

    /// Returns the wire-format data of the bitmap.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns whether the bitmap contains the given record type.
    pub fn contains(&self, rtype: Rtype) -> bool {
        let value = rtype.to_int();
        let window = (value >> 8) as u8;
        let octet = ((value & 0xFF) >> 3) as usize;
        let mask = 0x80 >> (value & 0x07);
        let mut data = self.data.as_ref();
        while data.len() >= 2 {
            let len = data[1] as usize;
            if data[0] == window {
                return octet < len && data[2 + octet] & mask != 0;
            }
            data = &data[len + 2..];
        }
        false
    }

    /// Returns an iterator over the record types in the bitmap.
    pub fn iter(&self) -> RtypeBitmapIter<'_> {
        RtypeBitmapIter {
            data: &self.data,
            value: 0,
        }
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let len = parser.remaining();
        Self::from_octets(Bytes::copy_from_slice(parser.parse_octets(len)?))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.data)
    }
}

//--- Display

impl fmt::Display for RtypeBitmap {
    /// Formats the types space separated with a leading space.
    ///
    /// The leading space makes the format usable directly after the
    /// other fields of NSEC and NSEC3 records, which may have an empty
    /// bitmap.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rtype in self.iter() {
            write!(f, " {}", rtype)?;
        }
        Ok(())
    }
}

//------------ RtypeBitmapIter -----------------------------------------------

/// An iterator over the record types in a bitmap.
#[derive(Clone, Debug)]
pub struct RtypeBitmapIter<'a> {
    /// The remaining window blocks.
    data: &'a [u8],

    /// The next type value to check within the current window.
    value: u16,
}

impl<'a> Iterator for RtypeBitmapIter<'a> {
    type Item = Rtype;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.data.len() < 2 {
                return None;
            }
            let window = self.data[0];
            let len = self.data[1] as usize;
            while self.value < 256 {
                let octet = (self.value >> 3) as usize;
                if octet >= len {
                    break;
                }
                let mask = 0x80 >> (self.value & 0x07);
                let value = self.value;
                self.value += 1;
                if self.data[2 + octet] & mask != 0 {
                    return Some(Rtype::from_int(
                        u16::from(window) << 8 | value,
                    ));
                }
            }
            self.data = &self.data[len + 2..];
            self.value = 0;
        }
    }
}

//------------ RtypeBitmapBuilder --------------------------------------------

/// A builder for a record type bitmap.
#[derive(Clone, Debug, Default)]
pub struct RtypeBitmapBuilder {
    /// The types added so far.
    types: Vec<Rtype>,
}

impl RtypeBitmapBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record type to the bitmap.
    pub fn add(&mut self, rtype: Rtype) {
        self.types.push(rtype);
    }

    /// Assembles the bitmap.
    pub fn finalize(mut self) -> RtypeBitmap {
        self.types.sort_unstable();
        self.types.dedup();
        let mut data = Vec::new();
        let mut idx = 0;
        while idx < self.types.len() {
            let window = (self.types[idx].to_int() >> 8) as u8;
            let mut octets = [0u8; 32];
            let mut len = 0;
            while idx < self.types.len()
                && (self.types[idx].to_int() >> 8) as u8 == window
            {
                let value = self.types[idx].to_int() & 0xFF;
                let octet = (value >> 3) as usize;
                octets[octet] |= 0x80 >> (value & 0x07);
                len = len.max(octet + 1);
                idx += 1;
            }
            data.push(window);
            data.push(len as u8);
            data.extend_from_slice(&octets[..len]);
        }
        RtypeBitmap {
            data: Bytes::from(data),
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bitmap_build_and_query() {
        let mut builder = RtypeBitmapBuilder::new();
        builder.add(Rtype::A);
        builder.add(Rtype::Mx);
        builder.add(Rtype::Rrsig);
        builder.add(Rtype::Caa);
        let bitmap = builder.finalize();

        assert!(bitmap.contains(Rtype::A));
        assert!(bitmap.contains(Rtype::Mx));
        assert!(bitmap.contains(Rtype::Rrsig));
        assert!(bitmap.contains(Rtype::Caa));
        assert!(!bitmap.contains(Rtype::Aaaa));

        assert_eq!(
            bitmap.iter().collect::<Vec<_>>(),
            &[Rtype::A, Rtype::Mx, Rtype::Rrsig, Rtype::Caa]
        );
    }

    #[test]
    fn bitmap_wire_format() {
        // Example from RFC 4034, section 4.3: A, MX, RRSIG, NSEC and
        // TYPE1234.
        let mut builder = RtypeBitmapBuilder::new();
        builder.add(Rtype::A);
        builder.add(Rtype::Mx);
        builder.add(Rtype::Rrsig);
        builder.add(Rtype::Nsec);
        builder.add(Rtype::Int(1234));
        let bitmap = builder.finalize();
        assert_eq!(
            bitmap.as_slice(),
            b"\x00\x06\x40\x01\x00\x00\x00\x03\
              \x04\x1b\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
              \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
              \x00\x00\x20"
        );
    }

    #[test]
    fn bitmap_rejects_bad_wire() {
        // Windows must ascend and blocks must be non-empty.
        assert!(RtypeBitmap::from_octets(Bytes::from_static(b"\x00")).is_err());
        assert!(RtypeBitmap::from_octets(Bytes::from_static(
            b"\x01\x01\x40\x00\x01\x40"
        ))
        .is_err());
        assert!(RtypeBitmap::from_octets(Bytes::from_static(
            b"\x00\x00"
        ))
        .is_err());
    }

    #[test]
    fn rrsig_scan_time_formats() {
        let a = Rrsig::scan(&mut Scanner::new(
            "A 8 3 86400 20210101000000 1606780800 2642 example. Zm9vYmFy",
        ))
        .unwrap();
        assert_eq!(a.expiration(), 1_609_459_200);
        assert_eq!(a.inception(), 1_606_780_800);
        assert_eq!(a.signature().as_ref(), b"foobar");
    }
}
