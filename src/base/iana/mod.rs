//! IANA definitions for the DNS.
//!
//! A number of parameters of DNS messages are given through registries
//! maintained by IANA: record types, classes, opcodes, and response codes.
//! This module provides the types for those parameters. Each of them is a
//! closed enumeration over an integer with known values carrying mnemonics;
//! unknown values are retained verbatim. Text I/O accepts both the
//! mnemonic and numeric forms.

#[macro_use]
mod macros;

pub mod class;
pub mod opcode;
pub mod rcode;
pub mod rtype;

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::{Rcode, TsigRcode};
pub use self::rtype::Rtype;
