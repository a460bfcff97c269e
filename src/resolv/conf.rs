//! Resolver configuration.
//!
//! The two types [`ResolvConf`] and [`ResolvOptions`] provide a
//! process-independent description of how a resolver should behave:
//! which servers to talk to and the various knobs for doing so. A
//! configuration value is assembled once and handed to the resolver;
//! there is no hidden global configuration.

use crate::tsig::Key;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// The default DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// The default EDNS payload size advertised in queries.
///
/// The value of 1232 octets avoids IP fragmentation on nearly all
/// current networks while comfortably exceeding the 512 octet limit of
/// pre-EDNS DNS.
pub const DEFAULT_EDNS_PAYLOAD_SIZE: u16 = 1232;

/// The UDP payload limit when EDNS is not in use.
pub const NON_EDNS_PAYLOAD_SIZE: u16 = 512;

//------------ ResolvConf ----------------------------------------------------

/// Resolver configuration.
///
/// This type collects the servers to send queries to and the resolver
/// options. Servers are tried in order; once the list is exhausted,
/// retrying starts over from the beginning.
#[derive(Clone, Debug)]
pub struct ResolvConf {
    /// The servers to send queries to.
    pub servers: Vec<SocketAddr>,

    /// The resolver options.
    pub options: ResolvOptions,
}

impl ResolvConf {
    /// Creates a configuration for a single server on the default port.
    pub fn new(addr: IpAddr) -> Self {
        ResolvConf {
            servers: vec![SocketAddr::new(addr, DEFAULT_PORT)],
            options: ResolvOptions::default(),
        }
    }

    /// Creates a configuration for a single server address.
    pub fn with_server(addr: SocketAddr) -> Self {
        ResolvConf {
            servers: vec![addr],
            options: ResolvOptions::default(),
        }
    }
}

impl Default for ResolvConf {
    /// Creates a configuration pointing at localhost.
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

//------------ ResolvOptions -------------------------------------------------

/// The options of a resolver.
#[derive(Clone, Debug)]
pub struct ResolvOptions {
    /// The time to wait for a response to a single request.
    pub timeout: Duration,

    /// How many times a query is tried before giving up.
    ///
    /// Each attempt gets its own full [`timeout`][Self::timeout] and
    /// moves on to the next configured server.
    pub attempts: usize,

    /// Whether queries advertise EDNS support.
    ///
    /// If set, an OPT record with
    /// [`udp_payload_size`][Self::udp_payload_size] is added to queries
    /// that do not already carry one.
    pub use_edns: bool,

    /// The UDP payload size advertised and accepted with EDNS.
    pub udp_payload_size: u16,

    /// Whether to only use TCP.
    pub use_tcp: bool,

    /// Whether a truncated UDP response triggers a retry over TCP.
    ///
    /// If disabled, a truncated response surfaces as an error instead.
    pub tcp_fallback: bool,

    /// The key used to sign queries and verify responses.
    pub tsig_key: Option<Arc<Key>>,

    /// Whether a response failing TSIG verification is an error.
    ///
    /// By default the verification outcome is recorded on the returned
    /// message and left to the caller to inspect.
    pub require_valid_tsig: bool,
}

impl Default for ResolvOptions {
    fn default() -> Self {
        ResolvOptions {
            timeout: Duration::from_secs(5),
            attempts: 3,
            use_edns: true,
            udp_payload_size: DEFAULT_EDNS_PAYLOAD_SIZE,
            use_tcp: false,
            tcp_fallback: true,
            tsig_key: None,
            require_valid_tsig: false,
        }
    }
}
