//! Record data from [RFC 2782]: SRV records.
//!
//! [RFC 2782]: https://tools.ietf.org/html/rfc2782

use crate::base::name::Name;
use crate::base::scan::{ScanError, Scanner};
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use core::fmt;

//------------ Srv -----------------------------------------------------------

/// SRV record data.
///
/// SRV records specify the location of the server for a specific protocol
/// and domain.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Srv {
    priority: u16,
    weight: u16,
    port: u16,
    target: Name,
}

impl Srv {
    /// Creates new Srv record data from content.
    pub fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Srv {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority of the target host.
    ///
    /// Clients attempt to contact the host with the lowest priority first.
    pub fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the weight used to select among hosts of equal priority.
    pub fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the port of the service on the target host.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the domain name of the target host.
    pub fn target(&self) -> &Name {
        &self.target
    }

    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Srv::new(
            parser.parse_u16()?,
            parser.parse_u16()?,
            parser.parse_u16()?,
            Name::parse(parser)?,
        ))
    }

    /// Appends the record data.
    ///
    /// The target name must not be compressed per RFC 2782.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_u16(self.priority)?;
        target.append_u16(self.weight)?;
        target.append_u16(self.port)?;
        target.append_name_uncompressed(&self.target)
    }

    pub fn compose_canonical(
        &self,
        target: &mut Composer,
    ) -> Result<(), ShortBuf> {
        target.append_u16(self.priority)?;
        target.append_u16(self.weight)?;
        target.append_u16(self.port)?;
        target.append_name_canonical(&self.target)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Srv::new(
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_int()?,
            scanner.scan_name()?,
        ))
    }
}

//--- Display

impl fmt::Display for Srv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}
