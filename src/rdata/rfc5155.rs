//! Record data from [RFC 5155]: NSEC3 and NSEC3PARAM records.
//!
//! [RFC 5155]: https://tools.ietf.org/html/rfc5155

use super::rfc4034::{RtypeBitmap, RtypeBitmapBuilder};
use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::utils::{base16, base32};
use bytes::Bytes;
use core::fmt;

//------------ Nsec3 ---------------------------------------------------------

/// NSEC3 record data.
///
/// NSEC3 records prove the nonexistence of names and types like NSEC
/// records do but chain hashed owner names instead of plain ones.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsec3 {
    hash_algorithm: u8,
    flags: u8,
    iterations: u16,
    salt: Bytes,
    next_owner: Bytes,
    types: RtypeBitmap,
}

impl Nsec3 {
    /// Creates new NSEC3 record data from its components.
    pub fn new(
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Bytes,
        next_owner: Bytes,
        types: RtypeBitmap,
    ) -> Self {
        Nsec3 {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_owner,
            types,
        }
    }

    /// Returns the hash algorithm used for the owner names.
    pub fn hash_algorithm(&self) -> u8 {
        self.hash_algorithm
    }

    /// Returns the flags field.
    ///
    /// Only the least significant bit, the opt-out flag, is defined.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns whether the opt-out flag is set.
    pub fn opt_out(&self) -> bool {
        self.flags & 0x01 != 0
    }

    /// Returns the number of additional hash iterations.
    pub fn iterations(&self) -> u16 {
        self.iterations
    }

    /// Returns the salt mixed into the hash.
    pub fn salt(&self) -> &Bytes {
        &self.salt
    }

    /// Returns the hashed next owner name.
    pub fn next_owner(&self) -> &Bytes {
        &self.next_owner
    }

    /// Returns the record types present at the owner name.
    pub fn types(&self) -> &RtypeBitmap {
        &self.types
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let hash_algorithm = parser.parse_u8()?;
        let flags = parser.parse_u8()?;
        let iterations = parser.parse_u16()?;
        let salt_len = parser.parse_u8()? as usize;
        let salt = Bytes::copy_from_slice(parser.parse_octets(salt_len)?);
        let owner_len = parser.parse_u8()? as usize;
        let next_owner =
            Bytes::copy_from_slice(parser.parse_octets(owner_len)?);
        let types = RtypeBitmap::parse(parser)?;
        Ok(Nsec3::new(
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_owner,
            types,
        ))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u8(self.hash_algorithm)?;
        target.append_u8(self.flags)?;
        target.append_u16(self.iterations)?;
        target.append_u8(self.salt.len() as u8)?;
        target.append_slice(&self.salt)?;
        target.append_u8(self.next_owner.len() as u8)?;
        target.append_slice(&self.next_owner)?;
        self.types.compose(target)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let hash_algorithm = scanner.scan_int()?;
        let flags = scanner.scan_int()?;
        let iterations = scanner.scan_int()?;
        let salt = scan_salt(scanner)?;
        let next_owner = base32::decode_hex(scanner.next_token()?)
            .map_err(|err| {
                ScanError::new(format!("bad next owner: {}", err))
            })?;
        let mut builder = RtypeBitmapBuilder::new();
        while let Some(token) = scanner.next_opt() {
            builder.add(
                token
                    .parse()
                    .map_err(|_| ScanError::new("bad record type"))?,
            );
        }
        Ok(Nsec3::new(
            hash_algorithm,
            flags,
            iterations,
            salt,
            Bytes::from(next_owner),
            builder.finalize(),
        ))
    }
}

//--- Display

impl fmt::Display for Nsec3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} ",
            self.hash_algorithm, self.flags, self.iterations
        )?;
        display_salt(&self.salt, f)?;
        f.write_str(" ")?;
        base32::display_hex(&self.next_owner, f)?;
        write!(f, "{}", self.types)
    }
}

//------------ Nsec3param ----------------------------------------------------

/// NSEC3PARAM record data.
///
/// NSEC3PARAM records convey the hash parameters a zone's NSEC3 records
/// use to authoritative servers.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsec3param {
    hash_algorithm: u8,
    flags: u8,
    iterations: u16,
    salt: Bytes,
}

impl Nsec3param {
    /// Creates new NSEC3PARAM record data from its components.
    pub fn new(
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Bytes,
    ) -> Self {
        Nsec3param {
            hash_algorithm,
            flags,
            iterations,
            salt,
        }
    }

    /// Returns the hash algorithm used for the owner names.
    pub fn hash_algorithm(&self) -> u8 {
        self.hash_algorithm
    }

    /// Returns the flags field.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns the number of additional hash iterations.
    pub fn iterations(&self) -> u16 {
        self.iterations
    }

    /// Returns the salt mixed into the hash.
    pub fn salt(&self) -> &Bytes {
        &self.salt
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let hash_algorithm = parser.parse_u8()?;
        let flags = parser.parse_u8()?;
        let iterations = parser.parse_u16()?;
        let salt_len = parser.parse_u8()? as usize;
        let salt = Bytes::copy_from_slice(parser.parse_octets(salt_len)?);
        Ok(Nsec3param::new(hash_algorithm, flags, iterations, salt))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u8(self.hash_algorithm)?;
        target.append_u8(self.flags)?;
        target.append_u16(self.iterations)?;
        target.append_u8(self.salt.len() as u8)?;
        target.append_slice(&self.salt)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Nsec3param::new(
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scan_salt(scanner)?,
        ))
    }
}

//--- Display

impl fmt::Display for Nsec3param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} ",
            self.hash_algorithm, self.flags, self.iterations
        )?;
        display_salt(&self.salt, f)
    }
}

//------------ Helper Functions ----------------------------------------------

/// Scans a salt field, where `-` denotes the empty salt.
fn scan_salt(scanner: &mut Scanner) -> Result<Bytes, ScanError> {
    let token = scanner.next_token()?;
    if token == "-" {
        Ok(Bytes::new())
    } else {
        base16::decode(token)
            .map(Bytes::from)
            .map_err(|err| ScanError::new(format!("bad salt: {}", err)))
    }
}

/// Formats a salt field, writing `-` for the empty salt.
fn display_salt(salt: &Bytes, f: &mut fmt::Formatter) -> fmt::Result {
    if salt.is_empty() {
        f.write_str("-")
    } else {
        base16::display(salt, f)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nsec3_round_trip() {
        let nsec3 = Nsec3::scan(&mut Scanner::new(
            "1 1 12 aabbccdd 2t7b4g4vsa5smi47k61mv5bv1a22bojr MX DNSKEY NS \
             SOA NSEC3PARAM RRSIG",
        ))
        .unwrap();
        assert_eq!(nsec3.iterations(), 12);
        assert!(nsec3.opt_out());
        assert_eq!(nsec3.salt().as_ref(), b"\xAA\xBB\xCC\xDD");

        let mut target = Composer::new(512);
        nsec3.compose(&mut target).unwrap();
        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Nsec3::parse(&mut parser).unwrap(), nsec3);
    }
}
