//! Record data.
//!
//! Each record type defines its own record data layout. This module
//! provides the [`Rdata`] tagged union over all implemented types, the
//! per-type data types themselves in their RFC-named submodules, and a
//! [registry][codec] mapping each record type to its wire and text codecs.
//!
//! Record data of types not in the registry flows through the crate as
//! opaque octets per [RFC 3597]: parsed from the RDLENGTH-delimited wire
//! region and re-emitted verbatim, with the `\# LENGTH HEX` generic
//! presentation format.
//!
//! [RFC 3597]: https://tools.ietf.org/html/rfc3597

pub mod caa;
pub mod rfc1035;
pub mod rfc2782;
pub mod rfc3596;
pub mod rfc4034;
pub mod rfc5155;
pub mod rfc6891;
pub mod tsig;

pub use self::caa::Caa;
pub use self::rfc1035::{A, Cname, Hinfo, Mx, Ns, Null, Ptr, Soa, Txt};
pub use self::rfc2782::Srv;
pub use self::rfc3596::Aaaa;
pub use self::rfc4034::{Dnskey, Ds, Nsec, Rrsig, RtypeBitmap};
pub use self::rfc5155::{Nsec3, Nsec3param};
pub use self::rfc6891::Opt;
pub use self::tsig::Tsig;

use crate::base::iana::Rtype;
use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::utils::base16;
use bytes::Bytes;
use core::fmt;

//------------ rdata_registry ------------------------------------------------

/// Generates the `Rdata` union and the codec registry in one go.
///
/// Every entry names the record type, the data type implementing it, the
/// method used for canonical emission, and the text codec if the type has
/// a presentation format.
macro_rules! rdata_registry {
    ( $( $rtype:ident => $module:ident::$rdtype:ident,
         $canonical:ident, $text:tt; )* ) => {

        //------------ Rdata --------------------------------------------

        /// The data of a resource record.
        ///
        /// This is a tagged union over the record data types known to the
        /// crate. Data of any other record type is retained as opaque
        /// octets in the [`Unknown`][Rdata::Unknown] variant.
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub enum Rdata {
            $( $rtype($module::$rdtype), )*

            /// Record data of an unimplemented record type.
            Unknown(UnknownRdata),
        }

        impl Rdata {
            /// Returns the record type of the data.
            pub fn rtype(&self) -> Rtype {
                match self {
                    $( Rdata::$rtype(_) => Rtype::$rtype, )*
                    Rdata::Unknown(data) => data.rtype(),
                }
            }

            /// Appends the wire format of the data to the target.
            pub fn compose(
                &self, target: &mut Composer
            ) -> Result<(), ShortBuf> {
                match self {
                    $( Rdata::$rtype(inner) => inner.compose(target), )*
                    Rdata::Unknown(inner) => inner.compose(target),
                }
            }

            /// Appends the canonical wire format of the data.
            ///
            /// In the canonical form used by DNSSEC, domain names inside
            /// the record data are neither compressed nor, for the record
            /// types predating RFC 3597, in their original case.
            pub fn compose_canonical(
                &self, target: &mut Composer
            ) -> Result<(), ShortBuf> {
                match self {
                    $( Rdata::$rtype(inner) => inner.$canonical(target), )*
                    Rdata::Unknown(inner) => inner.compose(target),
                }
            }
        }

        impl fmt::Display for Rdata {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self {
                    $( Rdata::$rtype(inner) => inner.fmt(f), )*
                    Rdata::Unknown(inner) => inner.fmt(f),
                }
            }
        }

        //--- From

        $(
            impl From<$module::$rdtype> for Rdata {
                fn from(inner: $module::$rdtype) -> Self {
                    Rdata::$rtype(inner)
                }
            }
        )*

        //------------ The registry -------------------------------------

        /// Returns the codec for a record type.
        ///
        /// Returns `None` for types the crate has no structured
        /// implementation for; their data travels as opaque octets.
        pub fn codec(rtype: Rtype) -> Option<&'static RdataCodec> {
            match rtype {
                $(
                    Rtype::$rtype => {
                        static CODEC: RdataCodec = RdataCodec {
                            rtype: Rtype::$rtype,
                            parse: |parser| {
                                $module::$rdtype::parse(parser)
                                    .map(Rdata::$rtype)
                            },
                            emit: |rdata, target| match rdata {
                                Rdata::$rtype(inner) => {
                                    inner.compose(target)
                                }
                                // The registry hands data to the codec
                                // of its own type only.
                                _ => unreachable!(),
                            },
                            canonical: |rdata, target| match rdata {
                                Rdata::$rtype(inner) => {
                                    inner.$canonical(target)
                                }
                                _ => unreachable!(),
                            },
                            text: rdata_registry!(
                                @text $module::$rdtype, $rtype, $text
                            ),
                        };
                        Some(&CODEC)
                    }
                )*
                _ => None
            }
        }
    };

    (@text $module:ident::$rdtype:ident, $rtype:ident, scan) => {
        Some(|scanner| {
            $module::$rdtype::scan(scanner).map(Rdata::$rtype)
        })
    };
    (@text $module:ident::$rdtype:ident, $rtype:ident, no_text) => {
        None
    };
}

rdata_registry! {
    A => rfc1035::A, compose, scan;
    Ns => rfc1035::Ns, compose_canonical, scan;
    Cname => rfc1035::Cname, compose_canonical, scan;
    Soa => rfc1035::Soa, compose_canonical, scan;
    Null => rfc1035::Null, compose, no_text;
    Ptr => rfc1035::Ptr, compose_canonical, scan;
    Hinfo => rfc1035::Hinfo, compose, scan;
    Mx => rfc1035::Mx, compose_canonical, scan;
    Txt => rfc1035::Txt, compose, scan;
    Aaaa => rfc3596::Aaaa, compose, scan;
    Srv => rfc2782::Srv, compose_canonical, scan;
    Opt => rfc6891::Opt, compose, no_text;
    Ds => rfc4034::Ds, compose, scan;
    Rrsig => rfc4034::Rrsig, compose_canonical, scan;
    Nsec => rfc4034::Nsec, compose, scan;
    Dnskey => rfc4034::Dnskey, compose, scan;
    Nsec3 => rfc5155::Nsec3, compose, scan;
    Nsec3param => rfc5155::Nsec3param, compose, scan;
    Tsig => tsig::Tsig, compose, no_text;
    Caa => caa::Caa, compose, scan;
}

//------------ RdataCodec ----------------------------------------------------

/// The codec functions for one record type.
///
/// The registry maps each implemented record type to one of these. The
/// wire functions work on the RDLENGTH-delimited region of a message;
/// compression policy is a property of the type and baked into its `emit`
/// function. `text` is absent for the meta record types OPT and TSIG,
/// which have no presentation format.
pub struct RdataCodec {
    /// The record type this codec is for.
    pub rtype: Rtype,

    /// Parses the record data from its wire format.
    pub parse: fn(&mut Parser) -> Result<Rdata, ParseError>,

    /// Emits the record data in wire format.
    pub emit: fn(&Rdata, &mut Composer) -> Result<(), ShortBuf>,

    /// Emits the record data in canonical wire format.
    pub canonical: fn(&Rdata, &mut Composer) -> Result<(), ShortBuf>,

    /// Creates the record data from its presentation format.
    pub text: Option<fn(&mut Scanner) -> Result<Rdata, ScanError>>,
}

//------------ Parsing and scanning entry points ------------------------------

impl Rdata {
    /// Parses record data of the given type.
    ///
    /// The parser must be limited to the RDLENGTH-delimited region of the
    /// record; the data of unimplemented types is taken verbatim to the
    /// end of that region.
    pub fn parse(
        rtype: Rtype,
        parser: &mut Parser,
    ) -> Result<Self, ParseError> {
        match codec(rtype) {
            Some(codec) => (codec.parse)(parser),
            None => UnknownRdata::parse(rtype, parser).map(Rdata::Unknown),
        }
    }

    /// Creates record data of the given type from its presentation
    /// format.
    ///
    /// The generic `\# LENGTH HEX` format of RFC 3597 is accepted for
    /// every type; the resulting octets are reparsed so structured types
    /// are validated. Types without a presentation format -- TSIG and
    /// OPT -- are rejected.
    pub fn from_text(
        rtype: Rtype,
        text: &str,
    ) -> Result<Self, FromTextError> {
        let mut scanner = Scanner::new(text);
        if scanner.clone().next_opt() == Some("\\#") {
            scanner.next_opt();
            return Self::from_generic_text(rtype, &mut scanner);
        }
        let scan = codec(rtype)
            .and_then(|codec| codec.text)
            .ok_or(FromTextError::NoTextFormat(rtype))?;
        let res = scan(&mut scanner)?;
        scanner.expect_end()?;
        Ok(res)
    }

    /// Creates record data from the generic RFC 3597 format.
    fn from_generic_text(
        rtype: Rtype,
        scanner: &mut Scanner,
    ) -> Result<Self, FromTextError> {
        let len: usize = scanner.scan_int()?;
        let data = scanner.scan_base16_rest()?;
        if data.len() != len {
            return Err(
                ScanError::new("generic record data length mismatch").into()
            );
        }
        let mut parser = Parser::from_slice(&data);
        let res = Rdata::parse(rtype, &mut parser)?;
        if parser.remaining() != 0 {
            return Err(
                ScanError::new("trailing generic record data").into()
            );
        }
        Ok(res)
    }
}

//------------ UnknownRdata --------------------------------------------------

/// Record data of an unimplemented record type.
///
/// The data is kept as the opaque content of the wire format's RDATA
/// field and re-emitted verbatim, as RFC 3597 demands. Text I/O uses the
/// RFC's generic `\# LENGTH HEX` format.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnknownRdata {
    /// The record type of the data.
    rtype: Rtype,

    /// The data itself.
    data: Bytes,
}

impl UnknownRdata {
    /// Creates unknown record data from the type and raw octets.
    pub fn new(rtype: Rtype, data: Bytes) -> Self {
        UnknownRdata { rtype, data }
    }

    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the raw octets of the data.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Takes the rest of the record region as unknown record data.
    pub fn parse(
        rtype: Rtype,
        parser: &mut Parser,
    ) -> Result<Self, ParseError> {
        let len = parser.remaining();
        Ok(UnknownRdata::new(
            rtype,
            Bytes::copy_from_slice(parser.parse_octets(len)?),
        ))
    }

    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_slice(&self.data)
    }
}

//--- Display

impl fmt::Display for UnknownRdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            f.write_str(" ")?;
            base16::display(&self.data, f)?;
        }
        Ok(())
    }
}

//============ Error Types ===================================================

//------------ FromTextError -------------------------------------------------

/// Record data could not be created from its presentation format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FromTextError {
    /// The record type has no presentation format at all.
    NoTextFormat(Rtype),

    /// The presentation format was invalid.
    Scan(ScanError),
}

//--- From

impl From<ScanError> for FromTextError {
    fn from(err: ScanError) -> Self {
        FromTextError::Scan(err)
    }
}

impl From<ParseError> for FromTextError {
    fn from(err: ParseError) -> Self {
        FromTextError::Scan(err.into())
    }
}

//--- Display and Error

impl fmt::Display for FromTextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FromTextError::NoTextFormat(rtype) => {
                write!(f, "no text format defined for {}", rtype)
            }
            FromTextError::Scan(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for FromTextError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_text_known_type() {
        let rdata = Rdata::from_text(Rtype::A, "1.2.3.4").unwrap();
        assert_eq!(rdata.rtype(), Rtype::A);
        assert!(matches!(rdata, Rdata::A(_)));
        assert!(Rdata::from_text(Rtype::A, "1.2.3.4 junk").is_err());
    }

    #[test]
    fn tsig_has_no_text_format() {
        let err = Rdata::from_text(Rtype::Tsig, " ").unwrap_err();
        assert_eq!(err, FromTextError::NoTextFormat(Rtype::Tsig));
        assert!(err
            .to_string()
            .contains("no text format defined for TSIG"));
    }

    #[test]
    fn opt_has_no_text_format() {
        assert!(matches!(
            Rdata::from_text(Rtype::Opt, "whatever"),
            Err(FromTextError::NoTextFormat(_))
        ));
    }

    #[test]
    fn generic_text_format() {
        // An A record in generic form is validated as an A record.
        let rdata = Rdata::from_text(Rtype::A, "\\# 4 01020304").unwrap();
        assert!(matches!(rdata, Rdata::A(_)));
        assert!(Rdata::from_text(Rtype::A, "\\# 3 010203").is_err());

        let rdata =
            Rdata::from_text(Rtype::Int(4711), "\\# 2 C000").unwrap();
        assert_eq!(rdata.rtype(), Rtype::Int(4711));
        assert_eq!(format!("{}", rdata), "\\# 2 C000");
    }

    #[test]
    fn unknown_type_needs_generic_format() {
        assert!(matches!(
            Rdata::from_text(Rtype::Int(4711), "some text"),
            Err(FromTextError::NoTextFormat(_))
        ));
    }

    #[test]
    fn unknown_round_trip() {
        let mut parser = Parser::from_slice(b"\x01\x02\x03");
        let rdata = Rdata::parse(Rtype::Int(4711), &mut parser).unwrap();
        let mut target = Composer::new(512);
        rdata.compose(&mut target).unwrap();
        assert_eq!(target.as_slice(), b"\x01\x02\x03");
    }
}
