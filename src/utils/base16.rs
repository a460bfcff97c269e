//! Decoding and encoding of Base 16, i.e., hex digits.
//!
//! The Base 16 encoding defined in [RFC 4648] is a plain hex dump with
//! two characters per octet. Decoding accepts both upper and lower case
//! digits; encoding uses upper case as is customary in zone files.
//!
//! [RFC 4648]: https://tools.ietf.org/html/rfc4648

pub use super::base64::DecodeError;
use core::fmt;

//------------ Convenience Functions -----------------------------------------

/// Decodes a string with Base 16 encoded data.
pub fn decode(s: &str) -> Result<Vec<u8>, DecodeError> {
    let mut res = Vec::with_capacity(s.len() / 2);
    let mut high = None;
    for ch in s.chars() {
        let nibble = ch
            .to_digit(16)
            .ok_or(DecodeError::BadCharacter(ch))? as u8;
        match high.take() {
            Some(high) => res.push(high << 4 | nibble),
            None => high = Some(nibble),
        }
    }
    if high.is_some() {
        return Err(DecodeError::ShortInput);
    }
    Ok(res)
}

/// Encodes binary data in Base 16 and writes it into a format stream.
pub fn display<B, W>(bytes: &B, f: &mut W) -> fmt::Result
where
    B: AsRef<[u8]> + ?Sized,
    W: fmt::Write,
{
    for &ch in bytes.as_ref() {
        write!(f, "{:02X}", ch)?;
    }
    Ok(())
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_hex() {
        assert_eq!(decode("0123abCD").unwrap(), b"\x01\x23\xAB\xCD");
        assert_eq!(decode("").unwrap(), b"");
        assert_eq!(decode("012"), Err(DecodeError::ShortInput));
        assert!(matches!(
            decode("0g"),
            Err(DecodeError::BadCharacter('g'))
        ));
    }

    #[test]
    fn display_hex() {
        let mut s = String::new();
        display(b"\x01\xAB", &mut s).unwrap();
        assert_eq!(s, "01AB");
    }
}
