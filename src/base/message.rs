//! DNS messages.
//!
//! This module provides [`Message`], an owned document model of one DNS
//! message: a header plus the question, answer, authority, and additional
//! sections. A message is built up through its mutators, serialized with
//! [`to_wire`][Message::to_wire] or
//! [`to_wire_limited`][Message::to_wire_limited], and created from
//! received octets with [`parse`][Message::parse].
//!
//!
//! # Transaction signatures
//!
//! A message can carry a *signing intent*: a TSIG key attached via
//! [`set_tsig`][Message::set_tsig]. The intent is applied during
//! [`to_wire_limited`][Message::to_wire_limited], after any truncation,
//! so the signature always covers the exact octets sent and the TSIG
//! record is always the last record of the additional section no matter
//! what was added to the message in between.
//!
//! This is different from signing a message in place via
//! [`tsig::Key::apply`][crate::tsig::Key::apply], which appends a TSIG
//! record like any other record. A message signed that way must not be
//! modified afterwards; size-capped serialization re-emits the OPT record
//! behind it and the result no longer parses.
//!
//!
//! # Truncation
//!
//! When the serialized message exceeds the caller's size cap, records
//! are dropped from the tail: the additional section first, then the
//! authority and answer sections. Dropping answer or authority records
//! sets the TC flag; dropping additional records does not. The OPT
//! record and a TSIG from a signing intent are exempt from truncation,
//! their space being reserved up front.

use super::header::{Header, HeaderCounts};
use super::iana::{Rcode, Rtype, TsigRcode};
use super::opt::OptRecord;
use super::question::Question;
use super::record::Record;
use super::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::rdata::tsig::Tsig;
use crate::rdata::Rdata;
use crate::tsig::Key;
use bytes::Bytes;
use core::fmt;
use std::sync::Arc;

//------------ Section -------------------------------------------------------

/// The three record sections of a DNS message.
///
/// The question section holds questions rather than records and is
/// addressed separately.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    /// Records answering the question.
    Answer,

    /// Records pointing toward an authority.
    Authority,

    /// Records holding additional information.
    Additional,
}

impl Section {
    /// All sections in their wire-format order.
    pub const ALL: [Section; 3] =
        [Section::Answer, Section::Authority, Section::Additional];
}

//------------ TsigState -----------------------------------------------------

/// The transaction signature state of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TsigState {
    /// The message carries no TSIG record.
    Unsigned,

    /// The message carries a TSIG record that has not been verified.
    Signed,

    /// The message's TSIG record has been verified successfully.
    Verified,

    /// Verification of the message's TSIG record failed.
    Failed(TsigRcode),
}

//------------ TsigIntent ----------------------------------------------------

/// The intent to sign a message on serialization.
#[derive(Clone, Debug)]
struct TsigIntent {
    /// The key to sign with.
    key: Arc<Key>,

    /// The error code to place into the TSIG record.
    error: TsigRcode,

    /// The MAC of the request when signing a response.
    request_mac: Option<Bytes>,
}

//------------ Message -------------------------------------------------------

/// A DNS message.
#[derive(Clone, Debug)]
pub struct Message {
    /// The message header.
    header: Header,

    /// The question section.
    questions: Vec<Question>,

    /// The answer section.
    answer: Vec<Record>,

    /// The authority section.
    authority: Vec<Record>,

    /// The additional section.
    additional: Vec<Record>,

    /// The signing intent, if any.
    intent: Option<TsigIntent>,

    /// The signature state of the message.
    tsig_state: TsigState,
}

/// # Creation
///
impl Message {
    /// Creates a new, empty message with a zero ID.
    pub fn new() -> Self {
        Self::with_id(0)
    }

    /// Creates a new, empty message with the given ID.
    pub fn with_id(id: u16) -> Self {
        let mut header = Header::new();
        header.set_id(id);
        Message {
            header,
            questions: Vec::new(),
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            intent: None,
            tsig_state: TsigState::Unsigned,
        }
    }

    /// Creates a query for the given question.
    ///
    /// The message receives a random ID and has the RD flag set.
    pub fn new_query(question: Question) -> Self {
        let mut res = Self::new();
        res.header.set_random_id();
        res.header.set_rd(true);
        res.questions.push(question);
        res
    }

    /// Creates the skeleton of a response to the given query.
    ///
    /// The response takes over the query's ID and question and has the
    /// QR flag set.
    pub fn new_response(query: &Message) -> Self {
        let mut res = Self::with_id(query.header.id());
        res.header.set_qr(true);
        res.header.set_rd(query.header.rd());
        res.questions.extend(query.questions.iter().cloned());
        res
    }
}

/// # Header and Sections
///
impl Message {
    /// Returns a reference to the message header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns a mutable reference to the message header.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns the full response code of the message.
    ///
    /// If the message carries an OPT record, its extension bits are
    /// combined with the four bits from the header.
    pub fn rcode(&self) -> Rcode {
        match self.opt() {
            Some(opt) => opt.full_rcode(self.header.rcode()),
            None => self.header.rcode(),
        }
    }

    /// Returns the questions of the message.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question of the message, if any.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Appends a question to the question section.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    /// Returns the records of the given section.
    pub fn section(&self, section: Section) -> &[Record] {
        match section {
            Section::Answer => &self.answer,
            Section::Authority => &self.authority,
            Section::Additional => &self.additional,
        }
    }

    /// Appends a record to the given section.
    pub fn add_record(&mut self, record: Record, section: Section) {
        match section {
            Section::Answer => self.answer.push(record),
            Section::Authority => self.authority.push(record),
            Section::Additional => self.additional.push(record),
        }
    }

    /// Returns the records of the answer section.
    pub fn answer(&self) -> &[Record] {
        &self.answer
    }

    /// Returns the records of the authority section.
    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    /// Returns the records of the additional section.
    pub fn additional(&self) -> &[Record] {
        &self.additional
    }

    /// Returns a view of the message's OPT record, if it has one.
    pub fn opt(&self) -> Option<OptRecord> {
        self.additional.iter().find_map(OptRecord::from_record)
    }

    /// Returns whether this message is an answer to the given query.
    ///
    /// The message must be a response carrying the query's ID, and if
    /// both messages have a question, the questions must be equal. Name
    /// comparison ignores ASCII case.
    pub fn is_answer(&self, query: &Message) -> bool {
        if !self.header.qr() || self.header.id() != query.header.id() {
            return false;
        }
        match (self.first_question(), query.first_question()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }
}

/// # Transaction Signatures
///
impl Message {
    /// Attaches a signing intent to the message.
    ///
    /// The message will be signed with the given key when it is
    /// serialized via [`to_wire_limited`][Self::to_wire_limited]. When
    /// signing a response, the TSIG record of the parsed request must be
    /// passed in so the signature is bound to the request's MAC.
    pub fn set_tsig(
        &mut self,
        key: Arc<Key>,
        error: TsigRcode,
        request: Option<&Tsig>,
    ) {
        self.intent = Some(TsigIntent {
            key,
            error,
            request_mac: request.map(|tsig| tsig.mac().clone()),
        });
    }

    /// Returns the TSIG record data of the message, if present.
    ///
    /// The TSIG record is only ever the last record of the additional
    /// section.
    pub fn tsig(&self) -> Option<&Tsig> {
        match self.additional.last().map(Record::data) {
            Some(Rdata::Tsig(tsig)) => Some(tsig),
            _ => None,
        }
    }

    /// Returns whether the message carries a transaction signature.
    pub fn is_signed(&self) -> bool {
        self.tsig_state != TsigState::Unsigned
    }

    /// Returns the signature state of the message.
    pub fn tsig_state(&self) -> TsigState {
        self.tsig_state
    }

    /// Updates the signature state after verification.
    pub(crate) fn set_tsig_state(&mut self, state: TsigState) {
        self.tsig_state = state;
    }
}

/// # Parsing
///
impl Message {
    /// Parses a message from its wire format.
    ///
    /// Fails if any name, record, or count is broken, if an OPT or TSIG
    /// record appears outside the additional section, if there is more
    /// than one OPT record, or if a TSIG record is not the very last
    /// record of the message.
    pub fn parse(wire: &[u8]) -> Result<Self, ParseError> {
        let mut parser = Parser::from_slice(wire);
        let header = Header::parse(&mut parser)?;
        let counts = HeaderCounts::parse(&mut parser)?;

        let mut questions = Vec::new();
        for _ in 0..counts.qdcount() {
            questions.push(Question::parse(&mut parser)?);
        }

        let mut sections = [Vec::new(), Vec::new(), Vec::new()];
        let section_counts =
            [counts.ancount(), counts.nscount(), counts.arcount()];
        let mut seen_opt = false;
        for (section_idx, (section, &count)) in
            sections.iter_mut().zip(&section_counts).enumerate()
        {
            let is_additional = section_idx == 2;
            for idx in 0..count {
                let record = Record::parse(&mut parser)?;
                match record.rtype() {
                    Rtype::Tsig => {
                        if !is_additional {
                            return Err(ParseError::form_error(
                                "TSIG record outside additional section",
                            ));
                        }
                        if idx + 1 != count {
                            return Err(ParseError::form_error(
                                "TSIG is not the last record",
                            ));
                        }
                    }
                    Rtype::Opt => {
                        if !is_additional || seen_opt {
                            return Err(ParseError::form_error(
                                "misplaced OPT record",
                            ));
                        }
                        seen_opt = true;
                    }
                    _ => {}
                }
                section.push(record);
            }
        }
        let [answer, authority, additional] = sections;

        let tsig_state = match additional.last().map(Record::data) {
            Some(Rdata::Tsig(_)) => TsigState::Signed,
            _ => TsigState::Unsigned,
        };

        Ok(Message {
            header,
            questions,
            answer,
            authority,
            additional,
            intent: None,
            tsig_state,
        })
    }
}

/// # Serialization
///
impl Message {
    /// The largest possible message size.
    pub const MAX_LENGTH: usize = 0xFFFF;

    /// Serializes the message without a size cap.
    ///
    /// All sections are emitted in their exact order. A signing intent
    /// is applied at the end: the TSIG record is computed over the
    /// serialized octets and appended as the final record. Fails if the
    /// message exceeds the maximum message size of 65,535 octets.
    pub fn to_wire(&self) -> Result<Vec<u8>, ShortBuf> {
        let mut target = Composer::new(Self::MAX_LENGTH);
        self.compose_header(&mut target)?;
        for question in &self.questions {
            question.compose(&mut target)?;
        }
        for section in Section::ALL {
            for record in self.section(section) {
                record.compose(&mut target)?;
            }
        }
        self.patch_counts(
            &mut target,
            self.answer.len(),
            self.authority.len(),
            self.additional.len(),
        );
        self.apply_intent(&mut target)?;
        Ok(target.finish())
    }

    /// Serializes the message with a size cap, truncating if necessary.
    ///
    /// Room for the OPT record and, if a signing intent is attached, the
    /// TSIG record is reserved up front; both are exempt from
    /// truncation. Other records are dropped from the tail of the
    /// message until it fits, and dropping answer or authority records
    /// sets the TC flag. The OPT record is re-emitted at the end of the
    /// additional section, directly before the TSIG record.
    ///
    /// The signature is computed after truncation so that it covers the
    /// exact octets of the final message.
    pub fn to_wire_limited(
        &self,
        max_size: usize,
    ) -> Result<Vec<u8>, ShortBuf> {
        let max_size = max_size.min(Self::MAX_LENGTH);
        let opts: Vec<&Record> = self
            .additional
            .iter()
            .filter(|record| record.rtype() == Rtype::Opt)
            .collect();

        // Reserve room for the records exempt from truncation.
        let mut reserve = 0;
        for opt in &opts {
            reserve += opt_record_len(opt);
        }
        if let Some(intent) = &self.intent {
            reserve += intent.key.record_length();
        }

        let mut target = Composer::new(max_size.saturating_sub(reserve));
        self.compose_header(&mut target)?;
        for question in &self.questions {
            question.compose(&mut target)?;
        }

        let mut rendered = [0usize; 3];
        'sections: for (idx, section) in Section::ALL.into_iter().enumerate()
        {
            for record in self.section(section) {
                if section == Section::Additional
                    && record.rtype() == Rtype::Opt
                {
                    continue;
                }
                let mark = target.len();
                if record.compose(&mut target).is_err() {
                    target.truncate(mark);
                    if section != Section::Additional {
                        // TC announces lost answer or authority data;
                        // additional records go quietly.
                        target.update_bit(2, 1, true);
                    }
                    break 'sections;
                }
                rendered[idx] += 1;
            }
        }

        target.set_limit(max_size);
        let mut additional = rendered[2];
        for opt in &opts {
            opt.compose(&mut target)?;
            additional += 1;
        }
        self.patch_counts(&mut target, rendered[0], rendered[1], additional);
        self.apply_intent(&mut target)?;
        Ok(target.finish())
    }

    /// Appends the header with zeroed counts.
    fn compose_header(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        self.header.compose(target)?;
        HeaderCounts::new().compose(target)
    }

    /// Patches the section counts into the target.
    fn patch_counts(
        &self,
        target: &mut Composer,
        answer: usize,
        authority: usize,
        additional: usize,
    ) {
        target.update_u16(4, self.questions.len() as u16);
        target.update_u16(6, answer as u16);
        target.update_u16(8, authority as u16);
        target.update_u16(10, additional as u16);
    }

    /// Signs the serialized message if a signing intent is attached.
    ///
    /// Appends the TSIG record behind the already serialized octets and
    /// adjusts the additional count. The MAC is computed over the
    /// octets as they are before the record is appended, i.e., with the
    /// additional count not including the TSIG record itself.
    fn apply_intent(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        let intent = match &self.intent {
            Some(intent) => intent,
            None => return Ok(()),
        };
        intent.key.sign_emitted(
            target,
            intent.error,
            intent.request_mac.as_deref(),
        )?;
        let additional = target.u16_at(10);
        target.update_u16(10, additional + 1);
        Ok(())
    }
}

/// Returns the serialized length of an OPT record.
///
/// OPT records contain no domain names, so the length is independent of
/// compression context.
fn opt_record_len(record: &Record) -> usize {
    let rdlen = match record.data() {
        Rdata::Opt(opt) => opt
            .options()
            .iter()
            .map(|option| 4 + option.data().len())
            .sum::<usize>(),
        _ => 0,
    };
    // Root owner, type, class, TTL, and RDLENGTH come to 11 octets.
    11 + rdlen
}

//--- Default

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

//--- PartialEq and Eq

impl PartialEq for Message {
    /// Compares the structural content of two messages.
    ///
    /// Signing intents and verification states are not part of the
    /// comparison.
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.questions == other.questions
            && self.answer == other.answer
            && self.authority == other.authority
            && self.additional == other.additional
    }
}

impl Eq for Message {}

//--- Display

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            ";; opcode: {}, status: {}, id: {}",
            self.header.opcode(),
            self.rcode(),
            self.header.id()
        )?;
        writeln!(f, ";; flags: {}", self.header.flags())?;
        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            writeln!(f, "; {}", question)?;
        }
        for (section, title) in [
            (Section::Answer, "ANSWER"),
            (Section::Authority, "AUTHORITY"),
            (Section::Additional, "ADDITIONAL"),
        ] {
            let records = self.section(section);
            if !records.is_empty() {
                writeln!(f, ";; {} SECTION:", title)?;
                for record in records {
                    writeln!(f, "{}", record)?;
                }
            }
        }
        Ok(())
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::Class;
    use crate::base::name::Name;
    use core::str::FromStr;

    fn question(name: &str) -> Question {
        Question::new_in(Name::from_str(name).unwrap(), Rtype::A).unwrap()
    }

    fn a_record(name: &str, addr: &str) -> Record {
        Record::from_text(
            Name::from_str(name).unwrap(),
            Rtype::A,
            Class::In,
            300,
            addr,
        )
        .unwrap()
    }

    #[test]
    fn parse_emit_round_trip() {
        let mut msg = Message::new_query(question("www.example.com."));
        msg.add_record(a_record("www.example.com.", "1.2.3.4"), Section::Answer);
        msg.add_record(
            a_record("mail.example.com.", "1.2.3.5"),
            Section::Additional,
        );

        let wire = msg.to_wire().unwrap();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed, msg);

        // Re-emitting the parsed message gives identical octets.
        assert_eq!(parsed.to_wire().unwrap(), wire);
    }

    #[test]
    fn counts_on_the_wire() {
        let mut msg = Message::new_query(question("www.example.com."));
        msg.add_record(a_record("www.example.com.", "1.2.3.4"), Section::Answer);
        let wire = msg.to_wire().unwrap();
        assert_eq!(&wire[4..12], b"\0\x01\0\x01\0\0\0\0");
    }

    #[test]
    fn truncation_sets_tc_and_drops_tail() {
        let mut msg = Message::new_query(question("www.example.com."));
        for i in 0..60 {
            msg.add_record(
                a_record(&format!("host{}.example.com.", i), "1.2.3.4"),
                Section::Answer,
            );
        }
        let wire = msg.to_wire_limited(512).unwrap();
        assert!(wire.len() <= 512);
        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.header().tc());
        assert!(parsed.answer().len() < 60);
    }

    #[test]
    fn additional_truncation_is_silent() {
        let mut msg = Message::new_query(question("www.example.com."));
        for i in 0..60 {
            msg.add_record(
                a_record(&format!("host{}.example.com.", i), "1.2.3.4"),
                Section::Additional,
            );
        }
        let wire = msg.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();
        assert!(!parsed.header().tc());
        assert!(parsed.additional().len() < 60);
    }

    #[test]
    fn opt_survives_truncation() {
        let mut msg = Message::new_query(question("www.example.com."));
        msg.add_record(
            OptRecord::new(1232, 0, 0, false).into_record(),
            Section::Additional,
        );
        for i in 0..60 {
            msg.add_record(
                a_record(&format!("host{}.example.com.", i), "1.2.3.4"),
                Section::Answer,
            );
        }
        let wire = msg.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.header().tc());
        assert!(parsed.opt().is_some());
        assert_eq!(
            parsed.additional().last().unwrap().rtype(),
            Rtype::Opt
        );
    }

    #[test]
    fn parse_rejects_tsig_in_answer() {
        // A response whose answer section claims to hold a TSIG record.
        let mut msg = Message::with_id(1);
        let tsig = Record::new(
            Name::from_str("key.example.").unwrap(),
            Class::Any,
            0,
            Rdata::Tsig(Tsig::new(
                Name::from_str("hmac-sha256.").unwrap(),
                crate::rdata::tsig::Time48::from_u64(0),
                300,
                Bytes::from_static(b"0123456789012345"),
                1,
                TsigRcode::NoError,
                Bytes::new(),
            )),
        )
        .unwrap();
        msg.add_record(tsig, Section::Answer);
        let wire = msg.to_wire().unwrap();
        assert!(Message::parse(&wire).is_err());
    }

    #[test]
    fn new_response_copies_id_and_question() {
        let query = Message::new_query(question("www.example.com."));
        let response = Message::new_response(&query);
        assert_eq!(response.header().id(), query.header().id());
        assert!(response.header().qr());
        assert!(response.is_answer(&query));
    }

    #[test]
    fn extended_rcode() {
        let mut msg = Message::new();
        msg.header_mut().set_rcode(Rcode::NoError);
        msg.add_record(
            OptRecord::new(1232, 1, 0, false).into_record(),
            Section::Additional,
        );
        assert_eq!(msg.rcode(), Rcode::BadVers);
    }
}
