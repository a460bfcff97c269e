//! The OPT pseudo record and EDNS(0).
//!
//! EDNS(0), defined in [RFC 6891], extends the original DNS protocol with
//! larger UDP payloads, extended response codes, and per-message flags.
//! The extension data travels in a pseudo resource record of type OPT in
//! the additional section, which reinterprets the record's fixed fields:
//! the class holds the sender's supported UDP payload size and the TTL
//! packs an extended response code, a version number, and flags.
//!
//! The [`OptRecord`] type provides a structured view over those
//! reinterpreted fields. It converts from and to a plain [`Record`] for
//! placement in a message.
//!
//! [RFC 6891]: https://tools.ietf.org/html/rfc6891

use super::iana::{Class, Rcode};
use super::name::Name;
use super::record::Record;
use crate::rdata::{Opt, Rdata};
use core::fmt;

/// The DO ("DNSSEC OK") bit in the flags field.
const FLAG_DO: u16 = 0x8000;

//------------ OptRecord -----------------------------------------------------

/// A structured view of an OPT record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptRecord {
    /// The largest UDP payload the sender can reassemble.
    udp_payload_size: u16,

    /// The upper eight bits of the extended response code.
    ext_rcode: u8,

    /// The EDNS version. Only version 0 is currently defined.
    version: u8,

    /// The EDNS flags. Only the DO bit is currently defined.
    flags: u16,

    /// The options carried in the record data.
    data: Opt,
}

impl OptRecord {
    /// Creates a new OPT record view from its fields.
    pub fn new(
        udp_payload_size: u16,
        ext_rcode: u8,
        version: u8,
        dnssec_ok: bool,
    ) -> Self {
        OptRecord {
            udp_payload_size,
            ext_rcode,
            version,
            flags: if dnssec_ok { FLAG_DO } else { 0 },
            data: Opt::new(),
        }
    }

    /// Creates the view from a plain OPT record.
    ///
    /// Returns `None` if the record is of any other type.
    pub fn from_record(record: &Record) -> Option<Self> {
        let data = match record.data() {
            Rdata::Opt(data) => data.clone(),
            _ => return None,
        };
        let ttl = record.ttl();
        Some(OptRecord {
            udp_payload_size: record.class().to_int(),
            ext_rcode: (ttl >> 24) as u8,
            version: (ttl >> 16) as u8,
            flags: ttl as u16,
            data,
        })
    }

    /// Converts the view into a plain record for a message.
    ///
    /// The owner of an OPT record is always the root name.
    pub fn into_record(self) -> Record {
        Record::from_parts_unchecked(
            Name::root(),
            Class::from_int(self.udp_payload_size),
            u32::from(self.ext_rcode) << 24
                | u32::from(self.version) << 16
                | u32::from(self.flags),
            Rdata::Opt(self.data),
        )
    }

    /// Returns the largest UDP payload size the sender supports.
    pub fn udp_payload_size(&self) -> u16 {
        self.udp_payload_size
    }

    /// Returns the upper eight bits of the extended response code.
    pub fn ext_rcode(&self) -> u8 {
        self.ext_rcode
    }

    /// Combines the extension bits with the four bits from a header.
    pub fn full_rcode(&self, header_rcode: Rcode) -> Rcode {
        Rcode::from_parts(header_rcode.header_bits(), self.ext_rcode)
    }

    /// Returns the EDNS version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns whether the DO ("DNSSEC OK") bit is set.
    pub fn dnssec_ok(&self) -> bool {
        self.flags & FLAG_DO != 0
    }

    /// Returns a reference to the options of the record.
    pub fn data(&self) -> &Opt {
        &self.data
    }

    /// Returns a mutable reference to the options of the record.
    pub fn data_mut(&mut self) -> &mut Opt {
        &mut self.data
    }
}

//--- From

impl From<OptRecord> for Record {
    fn from(opt: OptRecord) -> Self {
        opt.into_record()
    }
}

//--- Display

impl fmt::Display for OptRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EDNS: version {}; flags:{}; udp: {}",
            self.version,
            if self.dnssec_ok() { " do" } else { "" },
            self.udp_payload_size
        )
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::Rtype;

    #[test]
    fn record_round_trip() {
        let opt = OptRecord::new(1232, 0x01, 0, true);
        let record = opt.clone().into_record();
        assert_eq!(record.rtype(), Rtype::Opt);
        assert_eq!(record.class(), Class::Int(1232));
        assert_eq!(record.ttl(), 0x0100_8000);
        assert_eq!(OptRecord::from_record(&record).unwrap(), opt);
    }

    #[test]
    fn full_rcode() {
        let opt = OptRecord::new(1232, 0x01, 0, false);
        assert_eq!(opt.full_rcode(Rcode::NoError), Rcode::BadVers);
    }
}
