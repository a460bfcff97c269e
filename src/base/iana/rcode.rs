//! Response codes.

//------------ Rcode ---------------------------------------------------------

int_enum! {
    /// DNS response codes.
    ///
    /// The response code of a message is split between the lower four bits
    /// stored in the header and, if present, an eight bit extension stored
    /// in the OPT record's TTL field. This type represents the combined
    /// twelve bit value. A response code in a well-formed reply is data,
    /// not an error.
    =>
    Rcode, u16;

    /// No error condition.
    (NoError => 0, b"NOERROR")

    /// The server was unable to interpret the query.
    (FormErr => 1, b"FORMERR")

    /// The server had an internal problem.
    (ServFail => 2, b"SERVFAIL")

    /// The queried domain name does not exist.
    (NXDomain => 3, b"NXDOMAIN")

    /// The requested kind of query is not supported.
    (NotImp => 4, b"NOTIMP")

    /// The server refused to answer for policy reasons.
    (Refused => 5, b"REFUSED")

    /// A name exists that should not, used in dynamic update.
    (YXDomain => 6, b"YXDOMAIN")

    /// An RR set exists that should not, used in dynamic update.
    (YXRrset => 7, b"YXRRSET")

    /// An RR set does not exist that should, used in dynamic update.
    (NXRrset => 8, b"NXRRSET")

    /// The server is not authoritative for the zone.
    (NotAuth => 9, b"NOTAUTH")

    /// A name is not within the zone, used in dynamic update.
    (NotZone => 10, b"NOTZONE")

    /// The EDNS version is not supported.
    (BadVers => 16, b"BADVERS")
}

impl Rcode {
    /// Returns a value from a mnemonic or decimal representation.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Rcode::from_mnemonic(bytes).or_else(|| {
            core::str::from_utf8(bytes)
                .ok()
                .and_then(|r| r.parse().ok().map(Rcode::from_int))
        })
    }
}

impl core::str::FromStr for Rcode {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rcode::from_bytes(s.as_bytes()).ok_or(FromStrError(()))
    }
}

impl core::fmt::Display for Rcode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use core::fmt::Write;

        match self.to_mnemonic() {
            Some(m) => {
                for ch in m {
                    f.write_char(*ch as char)?
                }
                Ok(())
            }
            None => write!(f, "{}", self.to_int()),
        }
    }
}

impl Rcode {
    /// Returns the lower four bits stored in the message header.
    pub fn header_bits(self) -> u8 {
        (self.to_int() & 0x0F) as u8
    }

    /// Returns the upper eight bits stored in the OPT record.
    pub fn ext_bits(self) -> u8 {
        (self.to_int() >> 4) as u8
    }

    /// Combines the header bits with the extension from an OPT record.
    pub fn from_parts(header: u8, ext: u8) -> Self {
        Rcode::from_int((u16::from(ext) << 4) | u16::from(header & 0x0F))
    }
}

//------------ TsigRcode -----------------------------------------------------

int_enum! {
    /// Response codes for transaction authentication.
    ///
    /// TSIG records carry a 16 bit error field with a value from the same
    /// registry as the message response codes plus the TSIG-specific codes
    /// starting at 16. This type covers the whole space so a TSIG error
    /// can express both.
    =>
    TsigRcode, u16;

    /// No error condition.
    (NoError => 0, b"NOERROR")

    /// The server was unable to interpret the message.
    (FormErr => 1, b"FORMERR")

    /// The server is not authoritative, also used for all TSIG failures.
    (NotAuth => 9, b"NOTAUTH")

    /// The signature failed to verify.
    (BadSig => 16, b"BADSIG")

    /// The key used was not recognized.
    (BadKey => 17, b"BADKEY")

    /// The time signed lies outside the permitted window.
    (BadTime => 18, b"BADTIME")

    /// The truncation of the MAC is not acceptable.
    (BadTrunc => 22, b"BADTRUNC")
}

int_enum_str_with_decimal!(TsigRcode, u16, "unknown TSIG error code");

//--- From

impl From<Rcode> for TsigRcode {
    fn from(value: Rcode) -> Self {
        TsigRcode::from_int(value.to_int())
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extended_parts() {
        assert_eq!(Rcode::from_parts(0x00, 0x01), Rcode::BadVers);
        assert_eq!(Rcode::BadVers.header_bits(), 0x00);
        assert_eq!(Rcode::BadVers.ext_bits(), 0x01);
        assert_eq!(Rcode::NXDomain.header_bits(), 0x03);
        assert_eq!(Rcode::NXDomain.ext_bits(), 0);
    }
}
