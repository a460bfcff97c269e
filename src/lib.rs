//! A TSIG-capable DNS client library.
//!
//! This crate provides the building blocks for talking to DNS servers:
//! it encodes and decodes DNS wire messages, authenticates them with
//! transaction signatures (TSIG), and drives queries over UDP and TCP
//! against recursive or authoritative servers.
//!
//! # Modules
//!
//! * [base] contains the fundamental types: domain names, questions,
//!   records, messages, and the wire format machinery;
//! * [rdata] contains the record data types and the registry of their
//!   codecs;
//! * [tsig] implements signing and verifying messages per RFC 8945;
//! * [resolv] provides a stub resolver atop the
//!   [Tokio](https://tokio.rs/) async runtime;
//! * [utils] contains the Base 16, 32, and 64 codecs the rest of the
//!   crate uses.
//!
//! # Quick start
//!
//! ```no_run
//! use std::str::FromStr;
//! use std::sync::Arc;
//! use signet::base::{Name, Question, Rtype};
//! use signet::resolv::{ResolvConf, StubResolver};
//! use signet::tsig::Key;
//!
//! let mut conf = ResolvConf::new("192.0.2.1".parse().unwrap());
//! conf.options.tsig_key = Some(Arc::new(
//!     Key::from_text("hmac-sha256", "my-key", "c2VjcmV0").unwrap(),
//! ));
//! let resolver = StubResolver::from_conf(conf);
//!
//! let question = Question::new_in(
//!     Name::from_str("www.example.com.").unwrap(),
//!     Rtype::A,
//! ).unwrap();
//! let answer = resolver
//!     .send(&signet::base::Message::new_query(question))
//!     .unwrap();
//! println!("{}", answer);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod base;
pub mod rdata;
pub mod resolv;
pub mod tsig;
pub mod utils;
