//! Stub resolver tests.
//!
//! The resolver's transport seam is replaced with in-process transports
//! that echo queries, script truncation, or fail, so the whole
//! prepare-send-verify pipeline can be driven without a network.

use std::net::SocketAddr;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::future::Future;
use bytes::Bytes;
use signet::base::{
    Class, Message, Name, Question, Record, Rtype, Section, TsigRcode,
};
use signet::resolv::{Error, ResolvConf, StubResolver, Transport};
use signet::tsig::Key;
use tokio::time::Instant;

fn a_question(name: &str) -> Question {
    Question::new_in(Name::from_str(name).unwrap(), Rtype::A).unwrap()
}

type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>;

//------------ EchoTransport -------------------------------------------------

/// A transport that returns the query octets as the reply.
#[derive(Debug)]
struct EchoTransport;

impl Transport for EchoTransport {
    fn send_udp<'a>(
        &'a self,
        _server: SocketAddr,
        request: &'a [u8],
        _recv_limit: usize,
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        let reply = Bytes::copy_from_slice(request);
        Box::pin(async move { Ok(reply) })
    }

    fn send_tcp<'a>(
        &'a self,
        _server: SocketAddr,
        request: &'a [u8],
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        let reply = Bytes::copy_from_slice(request);
        Box::pin(async move { Ok(reply) })
    }
}

#[test]
fn signed_query_through_echo_transport() {
    let key =
        Arc::new(Key::from_text("hmac-sha256", "example.", "12345678").unwrap());
    let mut conf = ResolvConf::default();
    conf.options.tsig_key = Some(key.clone());
    let resolver =
        StubResolver::with_transport(conf, Arc::new(EchoTransport));

    let query = Message::new_query(a_question("www.example.com."));
    let parsed = tokio_test::block_on(resolver.send_async(&query)).unwrap();

    // The resolver added the OPT record and the signing intent; the two
    // must be the last records of the additional section, in that order.
    let additional = parsed.additional();
    assert!(additional.len() >= 2);
    assert_eq!(additional[additional.len() - 2].rtype(), Rtype::Opt);
    assert_eq!(additional[additional.len() - 1].rtype(), Rtype::Tsig);
    assert!(parsed.is_signed());

    // The echoed message is a correctly signed query, so it verifies
    // against its own octets without a request MAC.
    let bytes = parsed.to_wire().unwrap();
    assert_eq!(key.verify(&parsed, &bytes, None), TsigRcode::NoError);
}

#[test]
fn blocking_send_through_echo_transport() {
    let resolver = StubResolver::with_transport(
        ResolvConf::default(),
        Arc::new(EchoTransport),
    );
    let query = Message::new_query(a_question("www.example.com."));
    let reply = resolver.send(&query).unwrap();
    assert_eq!(
        reply.first_question().unwrap().qname(),
        &Name::from_str("www.example.com.").unwrap()
    );
    // The assigned message ID survives the round trip.
    assert_ne!(reply.header().id(), 0);
}

//------------ ScriptedTransport ---------------------------------------------

/// A transport answering UDP with a truncated reply and TCP with the
/// full answer.
#[derive(Debug)]
struct TruncatingTransport {
    udp_calls: AtomicUsize,
    tcp_calls: AtomicUsize,
}

impl TruncatingTransport {
    fn new() -> Self {
        TruncatingTransport {
            udp_calls: AtomicUsize::new(0),
            tcp_calls: AtomicUsize::new(0),
        }
    }

    fn reply_for(request: &[u8], truncated: bool) -> Bytes {
        let query = Message::parse(request).unwrap();
        let mut reply = Message::new_response(&query);
        reply.header_mut().set_tc(truncated);
        if !truncated {
            reply.add_record(
                Record::from_text(
                    query.first_question().unwrap().qname().clone(),
                    Rtype::A,
                    Class::In,
                    300,
                    "192.0.2.1",
                )
                .unwrap(),
                Section::Answer,
            );
        }
        Bytes::from(reply.to_wire().unwrap())
    }
}

impl Transport for TruncatingTransport {
    fn send_udp<'a>(
        &'a self,
        _server: SocketAddr,
        request: &'a [u8],
        _recv_limit: usize,
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        self.udp_calls.fetch_add(1, Ordering::Relaxed);
        let reply = Self::reply_for(request, true);
        Box::pin(async move { Ok(reply) })
    }

    fn send_tcp<'a>(
        &'a self,
        _server: SocketAddr,
        request: &'a [u8],
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        self.tcp_calls.fetch_add(1, Ordering::Relaxed);
        let reply = Self::reply_for(request, false);
        Box::pin(async move { Ok(reply) })
    }
}

#[test]
fn truncated_udp_reply_falls_back_to_tcp() {
    let transport = Arc::new(TruncatingTransport::new());
    let resolver =
        StubResolver::with_transport(ResolvConf::default(), transport.clone());

    let query = Message::new_query(a_question("www.example.com."));
    let reply = tokio_test::block_on(resolver.send_async(&query)).unwrap();

    assert_eq!(transport.udp_calls.load(Ordering::Relaxed), 1);
    assert_eq!(transport.tcp_calls.load(Ordering::Relaxed), 1);
    assert!(!reply.header().tc());
    assert_eq!(reply.answer().len(), 1);
}

#[test]
fn truncated_reply_without_fallback_is_an_error() {
    let transport = Arc::new(TruncatingTransport::new());
    let mut conf = ResolvConf::default();
    conf.options.tcp_fallback = false;
    let resolver = StubResolver::with_transport(conf, transport.clone());

    let query = Message::new_query(a_question("www.example.com."));
    let res = tokio_test::block_on(resolver.send_async(&query));
    assert!(matches!(res, Err(Error::Truncated)));
    assert_eq!(transport.tcp_calls.load(Ordering::Relaxed), 0);
}

//------------ FailingTransport ----------------------------------------------

/// A transport that times out every request.
#[derive(Debug)]
struct TimeoutTransport {
    calls: AtomicUsize,
}

impl Transport for TimeoutTransport {
    fn send_udp<'a>(
        &'a self,
        _server: SocketAddr,
        _request: &'a [u8],
        _recv_limit: usize,
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move { Err(Error::Timeout) })
    }

    fn send_tcp<'a>(
        &'a self,
        _server: SocketAddr,
        _request: &'a [u8],
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move { Err(Error::Timeout) })
    }
}

#[test]
fn timeouts_exhaust_all_attempts() {
    let transport = Arc::new(TimeoutTransport {
        calls: AtomicUsize::new(0),
    });
    let mut conf = ResolvConf::default();
    conf.options.attempts = 4;
    conf.options.timeout = Duration::from_millis(10);
    let resolver = StubResolver::with_transport(conf, transport.clone());

    let query = Message::new_query(a_question("www.example.com."));
    let res = tokio_test::block_on(resolver.send_async(&query));
    assert!(matches!(res, Err(Error::Timeout)));
    assert_eq!(transport.calls.load(Ordering::Relaxed), 4);
}

//------------ WrongIdTransport ----------------------------------------------

/// A transport whose replies never carry the right message ID.
#[derive(Debug)]
struct WrongIdTransport;

impl Transport for WrongIdTransport {
    fn send_udp<'a>(
        &'a self,
        _server: SocketAddr,
        request: &'a [u8],
        _recv_limit: usize,
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        let query = Message::parse(request).unwrap();
        let mut reply = Message::new_response(&query);
        let id = query.header().id().wrapping_add(1);
        reply.header_mut().set_id(id);
        let reply = Bytes::from(reply.to_wire().unwrap());
        Box::pin(async move { Ok(reply) })
    }

    fn send_tcp<'a>(
        &'a self,
        _server: SocketAddr,
        _request: &'a [u8],
        _deadline: Instant,
    ) -> TransportFuture<'a> {
        Box::pin(async move { Err(Error::Timeout) })
    }
}

#[test]
fn replies_with_wrong_id_are_dropped() {
    let mut conf = ResolvConf::default();
    conf.options.attempts = 2;
    let resolver =
        StubResolver::with_transport(conf, Arc::new(WrongIdTransport));

    let query = Message::new_query(a_question("www.example.com."));
    let res = tokio_test::block_on(resolver.send_async(&query));
    assert!(res.is_err());
}
