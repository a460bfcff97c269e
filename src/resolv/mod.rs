//! A stub resolver.
//!
//! The most simple resolver possible relays all queries to one of a set
//! of pre-configured servers that do the actual work. This module
//! provides such a stub resolver driving queries over UDP with a
//! fallback to TCP, negotiating EDNS, and signing and verifying messages
//! with TSIG when a key is configured.
//!
//! The main type is [`StubResolver`]. It is constructed from a
//! [`ResolvConf`] value describing servers and options, and sends
//! [`Message`] values via [`send_async`][StubResolver::send_async] or
//! its blocking wrapper [`send`][StubResolver::send]. The serialized
//! exchange runs through the [`Transport`] seam, so tests can replace
//! the network with a transport of their own.
//!
//! A response code in a well-formed reply is data, not an error:
//! `send` returns the parsed message whatever its rcode says.

pub mod conf;
pub mod transport;

pub use self::conf::{ResolvConf, ResolvOptions};
pub use self::transport::{SocketTransport, Transport};

use crate::base::iana::TsigRcode;
use crate::base::message::{Message, Section, TsigState};
use crate::base::opt::OptRecord;
use crate::base::question::Question;
use crate::base::wire::{ParseError, ShortBuf};
use bytes::Bytes;
use core::fmt;
use std::io;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

//------------ StubResolver --------------------------------------------------

/// A DNS stub resolver.
///
/// The resolver is thread-safe: concurrent calls to
/// [`send_async`][Self::send_async] each carry their own in-flight
/// state, correlated with their responses solely through the message ID.
#[derive(Clone, Debug)]
pub struct StubResolver {
    /// The configuration of the resolver.
    conf: ResolvConf,

    /// The transport queries are sent through.
    transport: Arc<dyn Transport>,
}

impl StubResolver {
    /// Creates a new resolver using the default configuration.
    pub fn new() -> Self {
        Self::from_conf(ResolvConf::default())
    }

    /// Creates a new resolver using the given configuration.
    pub fn from_conf(conf: ResolvConf) -> Self {
        Self::with_transport(conf, Arc::new(SocketTransport::new()))
    }

    /// Creates a new resolver with its own transport.
    ///
    /// This is the seam tests use to replace the network.
    pub fn with_transport(
        conf: ResolvConf,
        transport: Arc<dyn Transport>,
    ) -> Self {
        StubResolver { conf, transport }
    }

    /// Returns a reference to the resolver's configuration.
    pub fn conf(&self) -> &ResolvConf {
        &self.conf
    }

    /// Returns a reference to the resolver's options.
    pub fn options(&self) -> &ResolvOptions {
        &self.conf.options
    }

    /// Sends a query for a single question.
    pub async fn query(
        &self,
        question: Question,
    ) -> Result<Message, Error> {
        self.send_async(&Message::new_query(question)).await
    }

    /// Sends a message and returns the parsed response.
    ///
    /// The message is prepared according to the resolver's options: a
    /// signing intent is attached if a TSIG key is configured, an OPT
    /// record is added if EDNS is enabled and the message has none, and
    /// a random message ID is assigned if the current one is zero. The
    /// query then goes out over UDP unless TCP is forced, falling back
    /// to TCP when a response arrives truncated.
    ///
    /// This is the blocking form of [`send_async`][Self::send_async]; it
    /// must not be called from within an async runtime.
    pub fn send(&self, request: &Message) -> Result<Message, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::network)?;
        runtime.block_on(self.send_async(request))
    }

    /// Sends a message and returns the parsed response.
    ///
    /// See [`send`][Self::send] for the preparation steps applied to
    /// the outgoing message.
    pub async fn send_async(
        &self,
        request: &Message,
    ) -> Result<Message, Error> {
        let options = &self.conf.options;
        if self.conf.servers.is_empty() {
            return Err(Error::network(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no servers configured",
            )));
        }
        let mut query = request.clone();

        if let Some(key) = &options.tsig_key {
            query.set_tsig(key.clone(), TsigRcode::NoError, None);
        }
        if options.use_edns && query.opt().is_none() {
            query.add_record(
                OptRecord::new(options.udp_payload_size, 0, 0, false)
                    .into_record(),
                Section::Additional,
            );
        }
        while query.header().id() == 0 {
            query.header_mut().set_random_id();
        }

        let udp_size = if options.use_edns {
            usize::from(options.udp_payload_size)
        } else {
            usize::from(conf::NON_EDNS_PAYLOAD_SIZE)
        };
        let mut use_tcp = options.use_tcp;
        let wire = query
            .to_wire_limited(if use_tcp {
                Message::MAX_LENGTH
            } else {
                udp_size
            })
            .map_err(|_| Error::QueryTooLong)?;
        use_tcp = use_tcp || wire.len() > udp_size;

        // When the query went out signed, remember the request MAC for
        // verifying the response against it.
        let request_mac = match options.tsig_key {
            Some(_) => Message::parse(&wire)
                .map_err(Error::Malformed)?
                .tsig()
                .map(|tsig| tsig.mac().clone()),
            None => None,
        };

        let mut attempt = 0;
        let mut last_error = Error::Timeout;
        while attempt < options.attempts.max(1) {
            let server =
                self.conf.servers[attempt % self.conf.servers.len()];
            let deadline = Instant::now() + options.timeout;
            let result = if use_tcp {
                self.transport.send_tcp(server, &wire, deadline).await
            } else {
                self.transport
                    .send_udp(server, &wire, udp_size, deadline)
                    .await
            };

            let bytes = match result {
                Ok(bytes) => bytes,
                Err(err @ (Error::Timeout | Error::IdMismatch)) => {
                    debug!("no response from {}: {}", server, err);
                    last_error = err;
                    attempt += 1;
                    continue;
                }
                Err(Error::Network(err)) => {
                    warn!("transport error from {}: {}", server, err);
                    last_error = Error::Network(err);
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let was_tcp = use_tcp;
            match self.process_reply(
                &query,
                bytes,
                &mut use_tcp,
                request_mac.as_deref(),
            )? {
                Some(reply) => return Ok(reply),
                None => {
                    // Moving from a truncated UDP response to TCP is
                    // not a retry; a dropped reply is.
                    if use_tcp == was_tcp {
                        attempt += 1;
                    }
                    continue;
                }
            }
        }
        Err(last_error)
    }

    /// Checks a received reply.
    ///
    /// Returns `Ok(None)` if the exchange should be retried: on a
    /// mismatched question or, having switched `use_tcp` on, after a
    /// truncated UDP response.
    fn process_reply(
        &self,
        query: &Message,
        bytes: Bytes,
        use_tcp: &mut bool,
        request_mac: Option<&[u8]>,
    ) -> Result<Option<Message>, Error> {
        let options = &self.conf.options;
        let mut reply =
            Message::parse(&bytes).map_err(Error::Malformed)?;

        if reply.header().id() != query.header().id() {
            debug!("dropping reply with unexpected message ID");
            return Ok(None);
        }
        if let (Some(mine), Some(theirs)) =
            (reply.first_question(), query.first_question())
        {
            if mine != theirs {
                debug!("dropping reply with unexpected question");
                return Ok(None);
            }
        }

        if reply.header().tc() && !*use_tcp {
            if options.tcp_fallback {
                debug!("response truncated, retrying over TCP");
                *use_tcp = true;
                return Ok(None);
            }
            return Err(Error::Truncated);
        }

        if let Some(key) = &options.tsig_key {
            let rcode = key.verify(&reply, &bytes, request_mac);
            if rcode == TsigRcode::NoError {
                reply.set_tsig_state(TsigState::Verified);
            } else {
                debug!("TSIG verification failed: {}", rcode);
                reply.set_tsig_state(TsigState::Failed(rcode));
                if options.require_valid_tsig {
                    return Err(Error::TsigVerifyFailed(rcode));
                }
            }
        }

        Ok(Some(reply))
    }
}

impl Default for StubResolver {
    fn default() -> Self {
        Self::new()
    }
}

//============ Error Types ===================================================

//------------ Error ---------------------------------------------------------

/// An error happened while resolving a query.
#[derive(Clone, Debug)]
pub enum Error {
    /// No response arrived before the deadline, all retries included.
    Timeout,

    /// A transport-level failure occurred.
    Network(Arc<io::Error>),

    /// The response could not be parsed.
    Malformed(ParseError),

    /// The query does not fit into a message.
    QueryTooLong,

    /// A response exceeded the negotiated payload size.
    OversizedResponse,

    /// Responses arrived, but none carried the expected message ID.
    ///
    /// This is recovered internally by continuing to listen; it only
    /// surfaces once the deadline of the final attempt has passed.
    IdMismatch,

    /// The response was truncated and TCP fallback was disabled.
    Truncated,

    /// The response failed TSIG verification.
    ///
    /// Only returned when
    /// [`require_valid_tsig`][ResolvOptions::require_valid_tsig] is set;
    /// otherwise the outcome is recorded on the returned message.
    TsigVerifyFailed(TsigRcode),
}

impl Error {
    /// Wraps an I/O error.
    pub fn network(err: io::Error) -> Self {
        Error::Network(Arc::new(err))
    }
}

//--- From

impl From<ShortBuf> for Error {
    fn from(_: ShortBuf) -> Self {
        Error::QueryTooLong
    }
}

//--- Display and Error

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Timeout => f.write_str("request timed out"),
            Error::Network(err) => err.fmt(f),
            Error::Malformed(err) => {
                write!(f, "malformed response: {}", err)
            }
            Error::QueryTooLong => {
                f.write_str("query exceeds maximum message size")
            }
            Error::OversizedResponse => f.write_str("oversized response"),
            Error::IdMismatch => {
                f.write_str("response with unexpected message ID")
            }
            Error::Truncated => f.write_str("truncated response"),
            Error::TsigVerifyFailed(rcode) => {
                write!(f, "TSIG verification failed: {}", rcode)
            }
        }
    }
}

impl std::error::Error for Error {}
