//! Parsing and composing DNS wire-format data.
//!
//! Both parsing and composing happen on buffers holding a complete DNS
//! message. This is a reasonable choice given the limited size of DNS
//! messages and the complexities introduced by compressing domain names
//! in messages by referencing other parts of the message.
//!
//! The [`Parser`] type wraps the octets of an incoming message and maintains
//! a read position. The [`Composer`] type assembles an outgoing message into
//! a growable buffer with a hard ceiling and keeps the name compression
//! table for the message being built.

use super::name::{Label, Name};
use core::fmt;
use std::collections::HashMap;

//------------ Parser --------------------------------------------------------

/// A parse cursor over the octets of a DNS message.
///
/// The parser wraps the complete message and a current read position. All
/// `parse_*` methods advance the position and fail with
/// [`ParseError::ShortInput`] if they would move past the parser's length
/// limit. The limit normally is the end of the message but can temporarily
/// be lowered to the end of a record's data via [`limit_to`][Self::limit_to].
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    /// The octets of the complete message.
    octets: &'a [u8],

    /// The current read position.
    pos: usize,

    /// The logical length limit.
    ///
    /// Never exceeds `octets.len()`.
    len: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser atop a message's octets.
    pub fn from_slice(octets: &'a [u8]) -> Self {
        Parser {
            octets,
            pos: 0,
            len: octets.len(),
        }
    }

    /// Returns the underlying octets of the complete message.
    ///
    /// This is the same slice the parser was created with, unaffected by
    /// the current position or any length limit. Name decompression uses
    /// it to chase pointers into earlier parts of the message.
    pub fn as_slice(&self) -> &'a [u8] {
        self.octets
    }

    /// Returns the current read position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the number of octets left before the length limit.
    pub fn remaining(&self) -> usize {
        self.len - self.pos
    }

    /// Checks that at least `len` octets are left.
    pub fn check_len(&self, len: usize) -> Result<(), ParseError> {
        if self.remaining() < len {
            Err(ParseError::ShortInput)
        } else {
            Ok(())
        }
    }

    /// Repositions the parser to the given index.
    pub fn seek(&mut self, pos: usize) -> Result<(), ParseError> {
        if pos > self.len {
            Err(ParseError::ShortInput)
        } else {
            self.pos = pos;
            Ok(())
        }
    }

    /// Advances the read position by `len` octets.
    pub fn advance(&mut self, len: usize) -> Result<(), ParseError> {
        if len > self.remaining() {
            Err(ParseError::ShortInput)
        } else {
            self.pos += len;
            Ok(())
        }
    }

    /// Lowers the length limit to `len` octets past the current position.
    ///
    /// Returns the previous limit so it can be restored with
    /// [`set_limit`][Self::set_limit] once the delimited region -- normally
    /// a record's data -- has been processed.
    pub fn limit_to(&mut self, len: usize) -> Result<usize, ParseError> {
        self.check_len(len)?;
        let old = self.len;
        self.len = self.pos + len;
        Ok(old)
    }

    /// Restores a length limit previously returned by
    /// [`limit_to`][Self::limit_to].
    pub fn set_limit(&mut self, len: usize) {
        debug_assert!(len <= self.octets.len());
        self.len = len;
    }

    /// Takes the next `len` octets and advances past them.
    pub fn parse_octets(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        self.check_len(len)?;
        let res = &self.octets[self.pos..self.pos + len];
        self.pos += len;
        Ok(res)
    }

    /// Fills the given buffer with the next octets.
    pub fn parse_buf(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        buf.copy_from_slice(self.parse_octets(buf.len())?);
        Ok(())
    }

    /// Takes a `u8` from the beginning of the remaining data.
    pub fn parse_u8(&mut self) -> Result<u8, ParseError> {
        self.check_len(1)?;
        let res = self.octets[self.pos];
        self.pos += 1;
        Ok(res)
    }

    /// Takes a big-endian `u16` from the beginning of the remaining data.
    pub fn parse_u16(&mut self) -> Result<u16, ParseError> {
        let mut buf = [0u8; 2];
        self.parse_buf(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Takes a big-endian `u32` from the beginning of the remaining data.
    pub fn parse_u32(&mut self) -> Result<u32, ParseError> {
        let mut buf = [0u8; 4];
        self.parse_buf(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
}

//------------ Composer ------------------------------------------------------

/// The largest offset a compression pointer can refer to.
const POINTER_LIMIT: usize = 0x3FFF;

/// A buffer assembling the wire format of one DNS message.
///
/// The composer owns a growable buffer bounded by a hard ceiling -- the
/// caller-supplied maximum message size -- and the compression table for
/// the message being built. Its lifetime is scoped to a single encode call;
/// a failed or truncated encode never leaks state into a later one.
///
/// Appending past the ceiling fails with [`ShortBuf`]. Callers that need to
/// back out a partial write (such as a record that did not fit) remember the
/// buffer length beforehand and call [`truncate`][Self::truncate], which
/// also evicts compression table entries pointing past the new end.
#[derive(Clone, Debug)]
pub struct Composer {
    /// The octets written so far.
    target: Vec<u8>,

    /// The hard ceiling for the message size.
    limit: usize,

    /// Offsets of name suffixes already written, keyed by their
    /// lowercased wire format.
    compress: HashMap<Vec<u8>, u16>,
}

impl Composer {
    /// Creates a new composer with the given size ceiling.
    ///
    /// The ceiling is capped at the largest possible DNS message, 65,535
    /// octets.
    pub fn new(limit: usize) -> Self {
        Composer {
            target: Vec::new(),
            limit: limit.min(0xFFFF),
            compress: HashMap::new(),
        }
    }

    /// Returns the octets written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.target
    }

    /// Returns the number of octets written so far.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Returns the size ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Raises or lowers the size ceiling.
    ///
    /// The new value is capped at 65,535 octets. Already written data is
    /// not affected even if it exceeds the new ceiling.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.min(0xFFFF);
    }

    /// Extracts the assembled octets.
    pub fn finish(self) -> Vec<u8> {
        self.target
    }

    /// Appends a slice of octets.
    pub fn append_slice(&mut self, slice: &[u8]) -> Result<(), ShortBuf> {
        if self.target.len() + slice.len() > self.limit {
            return Err(ShortBuf);
        }
        self.target.extend_from_slice(slice);
        Ok(())
    }

    /// Appends a single octet.
    pub fn append_u8(&mut self, value: u8) -> Result<(), ShortBuf> {
        self.append_slice(&[value])
    }

    /// Appends a `u16` in network byte order.
    pub fn append_u16(&mut self, value: u16) -> Result<(), ShortBuf> {
        self.append_slice(&value.to_be_bytes())
    }

    /// Appends a `u32` in network byte order.
    pub fn append_u32(&mut self, value: u32) -> Result<(), ShortBuf> {
        self.append_slice(&value.to_be_bytes())
    }

    /// Overwrites the `u16` at the given position.
    ///
    /// Used for patching section counts and record data lengths after the
    /// fact.
    ///
    /// # Panics
    ///
    /// Panics if the two octets at `pos` have not been written yet.
    pub fn update_u16(&mut self, pos: usize, value: u16) {
        self.target[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// Returns the `u16` at the given position.
    ///
    /// # Panics
    ///
    /// Panics if the two octets at `pos` have not been written yet.
    pub fn u16_at(&self, pos: usize) -> u16 {
        u16::from_be_bytes([self.target[pos], self.target[pos + 1]])
    }

    /// Sets or clears a header bit at the given octet and bit position.
    ///
    /// # Panics
    ///
    /// Panics if the octet at `pos` has not been written yet.
    pub fn update_bit(&mut self, pos: usize, bit: usize, set: bool) {
        if set {
            self.target[pos] |= 1 << bit;
        } else {
            self.target[pos] &= !(1 << bit);
        }
    }

    /// Shortens the buffer to `len` octets.
    ///
    /// Compression table entries pointing at or past the new end are
    /// removed so later names cannot reference rolled-back data.
    pub fn truncate(&mut self, len: usize) {
        self.target.truncate(len);
        self.compress.retain(|_, pos| usize::from(*pos) < len);
    }

    /// Appends a domain name, compressing against earlier names.
    ///
    /// Each suffix of the name that has already been written is replaced
    /// by a pointer to its first occurrence. Suffixes written at offsets
    /// at or above 16,384 are not eligible as pointer targets and are not
    /// entered into the table.
    pub fn append_name(&mut self, name: &Name) -> Result<(), ShortBuf> {
        let mut suffix = name.clone();
        loop {
            if suffix.is_root() {
                return self.append_u8(0);
            }
            let key = suffix.to_lowercase_vec();
            if let Some(&pos) = self.compress.get(&key) {
                return self.append_u16(0xC000 | pos);
            }
            let pos = self.target.len();
            if pos <= POINTER_LIMIT {
                self.compress.insert(key, pos as u16);
            }
            let first = suffix.first();
            self.append_u8(first.len() as u8)?;
            self.append_slice(first.as_slice())?;
            suffix = suffix.parent().expect("non-root name has a parent");
        }
    }

    /// Appends a domain name without compressing it.
    ///
    /// The name neither references earlier names nor is entered into the
    /// compression table. This is the form required for names in the
    /// record data of types unknown to RFC 1035.
    pub fn append_name_uncompressed(
        &mut self,
        name: &Name,
    ) -> Result<(), ShortBuf> {
        self.append_slice(name.as_slice())
    }

    /// Appends a domain name in canonical form.
    ///
    /// Canonical form is uncompressed with all labels lowercased. It is
    /// used by DNSSEC digests and never enters the compression table.
    pub fn append_name_canonical(
        &mut self,
        name: &Name,
    ) -> Result<(), ShortBuf> {
        for label in name.iter_labels() {
            self.append_label_canonical(label)?;
        }
        Ok(())
    }

    /// Appends a label in canonical, i.e., lowercased, form.
    pub(super) fn append_label_canonical(
        &mut self,
        label: &Label,
    ) -> Result<(), ShortBuf> {
        self.append_u8(label.len() as u8)?;
        for ch in label.iter() {
            self.append_u8(ch.to_ascii_lowercase())?;
        }
        Ok(())
    }
}

//============ Error Types ===================================================

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

//--- From

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

impl From<ShortBuf> for ParseError {
    fn from(_: ShortBuf) -> Self {
        ParseError::ShortInput
    }
}

//--- Display and Error

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

//--- Display and Error

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}

//------------ ShortBuf ------------------------------------------------------

/// An attempt was made to write data past the composer's size ceiling.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShortBuf;

//--- Display and Error

impl fmt::Display for ShortBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("buffer size exceeded")
    }
}

impl std::error::Error for ShortBuf {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn parse_primitives() {
        let mut parser = Parser::from_slice(b"\x12\x34\x56\x78\x9A");
        assert_eq!(parser.parse_u16().unwrap(), 0x1234);
        assert_eq!(parser.parse_u8().unwrap(), 0x56);
        assert_eq!(parser.remaining(), 2);
        assert_eq!(parser.parse_octets(2).unwrap(), b"\x78\x9A");
        assert_eq!(parser.parse_u8(), Err(ParseError::ShortInput));
    }

    #[test]
    fn parse_limit() {
        let mut parser = Parser::from_slice(b"\x01\x02\x03\x04");
        let old = parser.limit_to(2).unwrap();
        assert_eq!(parser.remaining(), 2);
        assert_eq!(parser.parse_u16().unwrap(), 0x0102);
        assert_eq!(parser.parse_u8(), Err(ParseError::ShortInput));
        parser.set_limit(old);
        assert_eq!(parser.parse_u16().unwrap(), 0x0304);
    }

    #[test]
    fn compose_limit() {
        let mut target = Composer::new(4);
        target.append_u16(0x1234).unwrap();
        assert_eq!(target.append_u32(1), Err(ShortBuf));
        target.append_u16(0x5678).unwrap();
        assert_eq!(target.finish(), b"\x12\x34\x56\x78".to_vec());
    }

    #[test]
    fn name_compression() {
        let www = Name::from_str("www.example.com.").unwrap();
        let mail = Name::from_str("mail.Example.com.").unwrap();

        let mut target = Composer::new(512);
        target.append_name(&www).unwrap();
        target.append_name(&mail).unwrap();
        assert_eq!(
            target.as_slice(),
            b"\x03www\x07example\x03com\x00\
              \x04mail\xC0\x04"
        );
    }

    #[test]
    fn truncate_evicts_table_entries() {
        // A name rolled back out of the buffer must not remain a pointer
        // target.
        let name = Name::from_str("example.com.").unwrap();
        let mut target = Composer::new(512);
        target.append_u16(0).unwrap();
        let mark = target.len();
        target.append_name(&name).unwrap();
        target.truncate(mark);
        target.append_name(&name).unwrap();
        assert_eq!(target.as_slice(), b"\x00\x00\x07example\x03com\x00");
    }
}
