//! Building a domain name label by label.

use super::label::Label;
use super::{Name, NameError};
use bytes::Bytes;

//------------ NameBuilder ---------------------------------------------------

/// A builder assembling a domain name from octets.
///
/// The builder accumulates the octets of one label at a time. A label is
/// closed with [`end_label`][Self::end_label]; the name is completed with
/// either [`finish_absolute`][Self::finish_absolute], which appends the
/// root label, or [`finish_relative`][Self::finish_relative].
///
/// Length limits are enforced as data is appended: no label may exceed 63
/// octets and the complete name, including the terminating root label for
/// absolute names, may not exceed 255 octets.
#[derive(Clone, Debug)]
pub struct NameBuilder {
    /// The wire-format octets assembled so far.
    ///
    /// The length octet of the label currently being built is at `head`
    /// and is patched when the label ends.
    octets: Vec<u8>,

    /// The index of the current label's length octet.
    head: usize,
}

impl NameBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        NameBuilder {
            octets: vec![0],
            head: 0,
        }
    }

    /// Returns the length of the label currently being built.
    fn label_len(&self) -> usize {
        self.octets.len() - self.head - 1
    }

    /// Returns whether no octets have been appended at all.
    pub fn is_empty(&self) -> bool {
        self.head == 0 && self.octets.len() == 1
    }

    /// Appends an octet to the current label.
    pub fn push(&mut self, ch: u8) -> Result<(), NameError> {
        if self.label_len() >= Label::MAX_LEN {
            return Err(NameError::LongLabel);
        }
        // Reserve one octet for the root label of an absolute name.
        if self.octets.len() >= 254 {
            return Err(NameError::LongName);
        }
        self.octets.push(ch);
        Ok(())
    }

    /// Appends a complete label.
    pub fn append_label(&mut self, label: &[u8]) -> Result<(), NameError> {
        for &ch in label {
            self.push(ch)?;
        }
        self.end_label()
    }

    /// Ends the label currently being built.
    ///
    /// Empty labels are rejected; the root label can only be produced by
    /// [`finish_absolute`][Self::finish_absolute].
    pub fn end_label(&mut self) -> Result<(), NameError> {
        let len = self.label_len();
        if len == 0 {
            return Err(NameError::EmptyLabel);
        }
        self.octets[self.head] = len as u8;
        self.head = self.octets.len();
        self.octets.push(0);
        Ok(())
    }

    /// Returns whether the current label has content.
    pub fn in_label(&self) -> bool {
        self.label_len() > 0
    }

    /// Completes the name as an absolute name.
    ///
    /// An unfinished label is ended first. The trailing zero octet in the
    /// buffer becomes the root label.
    pub fn finish_absolute(mut self) -> Result<Name, NameError> {
        if self.in_label() {
            self.end_label()?;
        }
        debug_assert!(self.octets.len() <= 255);
        Ok(Name::from_octets_unchecked(Bytes::from(self.octets)))
    }

    /// Completes the name as a relative name.
    pub fn finish_relative(mut self) -> Result<Name, NameError> {
        if self.in_label() {
            self.end_label()?;
        }
        self.octets.truncate(self.head);
        Ok(Name::from_octets_unchecked(Bytes::from(self.octets)))
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_absolute() {
        let mut builder = NameBuilder::new();
        builder.append_label(b"www").unwrap();
        builder.append_label(b"example").unwrap();
        builder.append_label(b"com").unwrap();
        let name = builder.finish_absolute().unwrap();
        assert_eq!(name.as_slice(), b"\x03www\x07example\x03com\x00");
        assert!(name.is_absolute());
    }

    #[test]
    fn build_relative() {
        let mut builder = NameBuilder::new();
        builder.append_label(b"www").unwrap();
        let name = builder.finish_relative().unwrap();
        assert_eq!(name.as_slice(), b"\x03www");
        assert!(!name.is_absolute());
    }

    #[test]
    fn limits() {
        let mut builder = NameBuilder::new();
        assert_eq!(
            builder.append_label(&[b'x'; 64]),
            Err(NameError::LongLabel)
        );

        // 3 * 64 octets of labels leave room for one 61 octet label plus
        // the root label before the 255 octet ceiling.
        let mut builder = NameBuilder::new();
        for _ in 0..3 {
            builder.append_label(&[b'x'; 63]).unwrap();
        }
        assert_eq!(builder.append_label(&[b'x'; 62]), Err(NameError::LongName));

        let mut builder = NameBuilder::new();
        for _ in 0..3 {
            builder.append_label(&[b'x'; 63]).unwrap();
        }
        builder.append_label(&[b'x'; 61]).unwrap();
        let name = builder.finish_absolute().unwrap();
        assert_eq!(name.as_slice().len(), 255);
    }
}
