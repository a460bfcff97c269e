//! Record types.

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource record types.
    ///
    /// Each resource record has a 16 bit type value indicating what kind of
    /// information is conveyed by the record. Values without a mnemonic are
    /// represented by [`Rtype::Int`] and can be given in text form via the
    /// RFC 3597 `TYPEnnn` notation.
    =>
    Rtype, u16;

    /// A host address.
    (A => 1, b"A")

    /// An authoritative name server.
    (Ns => 2, b"NS")

    /// The canonical name for an alias.
    (Cname => 5, b"CNAME")

    /// Marks the start of a zone of authority.
    (Soa => 6, b"SOA")

    /// A null resource record.
    (Null => 10, b"NULL")

    /// A domain name pointer.
    (Ptr => 12, b"PTR")

    /// Host information.
    (Hinfo => 13, b"HINFO")

    /// Mail exchange.
    (Mx => 15, b"MX")

    /// Text strings.
    (Txt => 16, b"TXT")

    /// IPv6 address.
    (Aaaa => 28, b"AAAA")

    /// Server selection.
    (Srv => 33, b"SRV")

    /// OPT pseudo record carrying EDNS(0) capabilities.
    (Opt => 41, b"OPT")

    /// Delegation signer.
    (Ds => 43, b"DS")

    /// DNSSEC signature.
    (Rrsig => 46, b"RRSIG")

    /// Next secure record.
    (Nsec => 47, b"NSEC")

    /// DNSSEC public key.
    (Dnskey => 48, b"DNSKEY")

    /// Hashed next secure record.
    (Nsec3 => 50, b"NSEC3")

    /// NSEC3 parameters.
    (Nsec3param => 51, b"NSEC3PARAM")

    /// Transaction signature, RFC 8945.
    (Tsig => 250, b"TSIG")

    /// Incremental zone transfer.
    (Ixfr => 251, b"IXFR")

    /// Full zone transfer.
    (Axfr => 252, b"AXFR")

    /// All records a server has available.
    (Any => 255, b"ANY")

    /// Certification authority authorization.
    (Caa => 257, b"CAA")
}

int_enum_str_with_prefix!(Rtype, "TYPE", b"TYPE", u16, "unknown record type");

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn mnemonics() {
        assert_eq!(Rtype::from_str("tsig").unwrap(), Rtype::Tsig);
        assert_eq!(Rtype::from_str("TYPE250").unwrap(), Rtype::Tsig);
        assert_eq!(Rtype::from_str("TYPE4711").unwrap(), Rtype::Int(4711));
        assert!(Rtype::from_str("no-such-type").is_err());
        assert_eq!(format!("{}", Rtype::Tsig), "TSIG");
        assert_eq!(format!("{}", Rtype::Int(4711)), "TYPE4711");
    }
}
