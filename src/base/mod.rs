//! Basics.
//!
//! This module provides the types for working with DNS data: domain
//! names, questions, resource records, and whole messages, together with
//! the machinery for converting all of them from and to the wire format.
//!
//! In order to easily distinguish the directions of conversion, we use
//! the term *parsing* for extracting data from a wire-format
//! representation and *composing* for producing such a representation.
//! Both happen on buffers holding a complete DNS message, since
//! compressed domain names reference other parts of the message. The
//! fundamental types for this live in the [wire] module.
//!
//! The types for DNS data itself are arranged in submodules:
//!
//! * [charstr] for DNS character strings,
//! * [header] for the header of DNS messages,
//! * [iana] for the registry-defined parameter types,
//! * [message] for whole messages,
//! * [name] for domain names,
//! * [opt] for the OPT record used in EDNS,
//! * [question] for questions,
//! * [record] for resource records, and
//! * [scan] for reading record data from its presentation format.

pub mod charstr;
pub mod header;
pub mod iana;
pub mod message;
pub mod name;
pub mod opt;
pub mod question;
pub mod record;
pub mod scan;
pub mod wire;

pub use self::charstr::CharStr;
pub use self::header::{Flags, Header, HeaderCounts};
pub use self::iana::{Class, Opcode, Rcode, Rtype, TsigRcode};
pub use self::message::{Message, Section, TsigState};
pub use self::name::{Label, Name, NameBuilder};
pub use self::opt::OptRecord;
pub use self::question::Question;
pub use self::record::Record;
pub use self::wire::{Composer, ParseError, Parser};
