//! Transaction signature tests.
//!
//! These exercise the interplay of the message codec and the TSIG
//! engine: signing intents, record ordering, truncation, and the
//! misbehavior of signing in place and emitting afterwards.

use std::str::FromStr;
use std::sync::Arc;
use signet::base::{
    Class, Message, Name, OptRecord, Question, Record, Rtype, Section,
    TsigRcode,
};
use signet::rdata::Rdata;
use signet::resolv::conf::DEFAULT_EDNS_PAYLOAD_SIZE;
use signet::tsig::Key;

fn test_key() -> Arc<Key> {
    Arc::new(Key::from_text("hmac-sha256", "example.", "12345678").unwrap())
}

fn a_question(name: &str) -> Question {
    Question::new_in(Name::from_str(name).unwrap(), Rtype::A).unwrap()
}

#[test]
fn tsig_query() {
    let key = test_key();

    let mut msg = Message::new_query(a_question("www.example."));
    msg.set_tsig(key.clone(), TsigRcode::NoError, None);
    let bytes = msg.to_wire_limited(512).unwrap();
    // The lower byte of the additional count must show exactly the TSIG
    // record.
    assert_eq!(bytes[11], 1);

    let parsed = Message::parse(&bytes).unwrap();
    assert_eq!(key.verify(&parsed, &bytes, None), TsigRcode::NoError);
    assert!(parsed.is_signed());
}

#[test]
fn tsig_query_stringalg() {
    for alg in [
        "hmac-md5",
        "hmac-md5.sig-alg.reg.int.",
        "hmac-sha1",
        "hmac-sha224",
        "hmac-sha256",
        "hmac-sha256.",
        "hmac-sha384",
        "hmac-sha512",
        // Legacy Java-style names remain accepted.
        "HmacMD5",
        "HmacSHA256",
    ] {
        let key =
            Arc::new(Key::from_text(alg, "example.", "12345678").unwrap());

        let mut msg = Message::new_query(a_question("www.example."));
        msg.set_tsig(key.clone(), TsigRcode::NoError, None);
        let bytes = msg.to_wire_limited(512).unwrap();
        assert_eq!(bytes[11], 1, "algorithm {}", alg);

        let parsed = Message::parse(&bytes).unwrap();
        assert_eq!(
            key.verify(&parsed, &bytes, None),
            TsigRcode::NoError,
            "algorithm {}",
            alg
        );
        assert!(parsed.is_signed());
    }
}

#[test]
fn tsig_query_stringalg_err() {
    assert!(Key::from_text("randomalg", "example.", "12345678").is_err());
}

#[test]
fn tsig_query_is_last_additional_record() {
    let key = test_key();

    let mut msg = Message::new_query(a_question("www.example."));
    msg.set_tsig(key.clone(), TsigRcode::NoError, None);
    // The OPT record is added after the signing intent; the TSIG must
    // still end up last.
    msg.add_record(
        OptRecord::new(DEFAULT_EDNS_PAYLOAD_SIZE, 0, 0, false).into_record(),
        Section::Additional,
    );
    let bytes = msg.to_wire_limited(512).unwrap();
    assert_eq!(bytes[11], 2);

    let parsed = Message::parse(&bytes).unwrap();
    let additional = parsed.additional();
    assert_eq!(additional[0].rtype(), Rtype::Opt);
    assert_eq!(additional[1].rtype(), Rtype::Tsig);
    assert_eq!(key.verify(&parsed, &bytes, None), TsigRcode::NoError);
    assert!(parsed.is_signed());
}

#[test]
fn tsig_apply_then_emit_misbehaves() {
    let key = test_key();

    let mut msg = Message::new_query(a_question("www.example.com."));
    msg.add_record(
        OptRecord::new(DEFAULT_EDNS_PAYLOAD_SIZE, 0, 0, false).into_record(),
        Section::Additional,
    );
    assert!(!msg.is_signed());

    key.apply(&mut msg, None).unwrap();
    assert!(msg.is_signed());

    // Size-capped serialization re-emits the OPT record at the end of
    // the additional section, pushing it behind the TSIG record signed
    // in place. The resulting octets no longer parse.
    let bytes = msg.to_wire_limited(Message::MAX_LENGTH).unwrap();
    assert!(Message::parse(&bytes).is_err());
}

#[test]
fn tsig_response() {
    let key = test_key();

    let mut query = Message::new_query(a_question("www.example."));
    query.set_tsig(key.clone(), TsigRcode::NoError, None);
    let qbytes = query.to_wire().unwrap();
    let qparsed = Message::parse(&qbytes).unwrap();
    let request_mac = qparsed.tsig().unwrap().mac().clone();

    let mut response = Message::new_response(&qparsed);
    response.set_tsig(key.clone(), TsigRcode::NoError, qparsed.tsig());
    response.add_record(
        Record::from_text(
            Name::from_str("www.example.").unwrap(),
            Rtype::A,
            Class::In,
            300,
            "1.2.3.4",
        )
        .unwrap(),
        Section::Answer,
    );
    let bytes = response.to_wire_limited(512).unwrap();

    let parsed = Message::parse(&bytes).unwrap();
    assert_eq!(
        key.verify(&parsed, &bytes, Some(&request_mac)),
        TsigRcode::NoError
    );
    assert!(parsed.is_signed());
}

#[test]
fn tsig_truncated() {
    let key = test_key();

    let mut query = Message::new_query(a_question("www.example."));
    query.set_tsig(key.clone(), TsigRcode::NoError, None);
    let qbytes = query.to_wire().unwrap();
    let qparsed = Message::parse(&qbytes).unwrap();
    let request_mac = qparsed.tsig().unwrap().mac().clone();

    let mut response = Message::new_response(&qparsed);
    response.set_tsig(key.clone(), TsigRcode::NoError, qparsed.tsig());
    for i in 0..40 {
        response.add_record(
            Record::from_text(
                Name::from_str("www.example.").unwrap(),
                Rtype::Txt,
                Class::In,
                300,
                &format!("foo{}", i),
            )
            .unwrap(),
            Section::Answer,
        );
    }
    let bytes = response.to_wire_limited(512).unwrap();
    assert!(bytes.len() <= 512);

    // The answers do not fit into 512 octets, so the message arrives
    // truncated but still correctly signed.
    let parsed = Message::parse(&bytes).unwrap();
    assert!(parsed.header().tc());
    assert_eq!(
        key.verify(&parsed, &bytes, Some(&request_mac)),
        TsigRcode::NoError
    );
    assert!(parsed.is_signed());
}

#[test]
fn tsig_rdata_has_no_text_format() {
    let err = Rdata::from_text(Rtype::Tsig, " ").unwrap_err();
    assert!(err.to_string().contains("no text format defined for TSIG"));
}

#[test]
fn wire_round_trip_of_signed_query() {
    // Re-parsing and re-emitting a signed message must reproduce the
    // exact octets, or MAC verification against the re-emitted form
    // would fail.
    let key = test_key();
    let mut msg = Message::new_query(a_question("www.example."));
    msg.set_tsig(key.clone(), TsigRcode::NoError, None);
    msg.add_record(
        OptRecord::new(DEFAULT_EDNS_PAYLOAD_SIZE, 0, 0, false).into_record(),
        Section::Additional,
    );
    let bytes = msg.to_wire_limited(512).unwrap();
    let parsed = Message::parse(&bytes).unwrap();
    let reemitted = parsed.to_wire().unwrap();
    assert_eq!(bytes, reemitted);
    assert_eq!(
        key.verify(&parsed, &reemitted, None),
        TsigRcode::NoError
    );
}
