//! Support for TSIG.
//!
//! This module provides support for signing message exchanges with
//! transaction signatures as defined in [RFC 8945].
//!
//! TSIG authenticates a message exchange through a secret key shared
//! between the two participants. The sender computes a keyed MAC over
//! the message it is about to send and appends it in a special record of
//! type TSIG as the last record of the additional section. The receiver
//! verifies the MAC with the same key. A response additionally digests
//! the MAC of the request, binding the two messages together.
//!
//! Keys are managed via the [`Key`] type, which ties together the secret,
//! the key's name, and the [`Algorithm`] it is used with. The usual way
//! of signing an outgoing message is attaching a key to it via
//! [`Message::set_tsig`]; the message codec then signs the final octets
//! during serialization. [`Key::apply`] signs a message in place instead,
//! which is a lower-level operation: the message must not be touched
//! afterwards. Received messages are checked with [`Key::verify`], which
//! returns the verification outcome as a [`TsigRcode`].
//!
//! For responses arriving as a sequence of messages over a stream, such
//! as the answers to an AXFR request, [`ClientSequence`] keeps the state
//! the later signatures are chained through.
//!
//! [RFC 8945]: https://tools.ietf.org/html/rfc8945
//! [`Message::set_tsig`]: crate::base::message::Message::set_tsig

use crate::base::header::HeaderSection;
use crate::base::iana::{Class, Rtype, TsigRcode};
use crate::base::message::{Message, TsigState};
use crate::base::name::Name;
use crate::base::record::Record;
use crate::base::wire::{Composer, ParseError, Parser, ShortBuf};
use crate::rdata::tsig::{Time48, Tsig};
use crate::rdata::Rdata;
use crate::utils::base64;
use bytes::Bytes;
use core::{fmt, str};
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use std::sync::Arc;

/// The default fudge in seconds, as recommended by RFC 8945.
const DEFAULT_FUDGE: u16 = 300;

/// The largest permitted run of unsigned messages in a sequence.
///
/// RFC 8945 requires at least every 100th message of a multi-message
/// answer to be signed.
const DEFAULT_MAX_UNSIGNED: usize = 99;

//------------ Key -----------------------------------------------------------

/// A key for creating and validating transaction signatures.
///
/// For the algorithms included in this implementation, keys are octet
/// strings of any size that are converted into the algorithm's native
/// key length through a well defined method. While the TSIG
/// specification allows a key to be used with any algorithm, we tie them
/// together, so each `Key` value also knows which algorithm it is for.
///
/// Keys are identified in TSIG through a name that is encoded as a
/// domain name.
#[derive(Clone)]
pub struct Key {
    /// A fresh MAC context with the key material absorbed.
    context: HmacContext,

    /// The algorithm of the key.
    algorithm: Algorithm,

    /// The name of the key as a domain name.
    name: Name,
}

/// # Creating Keys
///
impl Key {
    /// Creates a new key from its components.
    ///
    /// The name must be an absolute domain name.
    pub fn new(
        algorithm: Algorithm,
        name: Name,
        secret: &[u8],
    ) -> Result<Self, NewKeyError> {
        if !name.is_absolute() {
            return Err(NewKeyError::RelativeName);
        }
        Ok(Key {
            context: HmacContext::new(algorithm, secret),
            algorithm,
            name,
        })
    }

    /// Creates a new key from the text forms of its components.
    ///
    /// The algorithm accepts all the name forms understood by
    /// [`Algorithm::from_name`]. The secret must be in Base 64. A
    /// trailing dot on the key name is optional.
    pub fn from_text(
        algorithm: &str,
        name: &str,
        secret: &str,
    ) -> Result<Self, NewKeyError> {
        let algorithm = Algorithm::from_name(algorithm)?;
        let name = if name.ends_with('.') {
            str::FromStr::from_str(name)
        } else {
            str::FromStr::from_str(&format!("{}.", name))
        }
        .map_err(|_| NewKeyError::BadName)?;
        let secret =
            base64::decode(secret).map_err(|_| NewKeyError::BadSecret)?;
        Self::new(algorithm, name, &secret)
    }

    /// Generates a new key with random secret material.
    ///
    /// The secret is as long as the algorithm's native MAC. Returns both
    /// the key and the secret for serialization and exporting.
    pub fn generate(
        algorithm: Algorithm,
        name: Name,
    ) -> Result<(Self, Vec<u8>), NewKeyError> {
        use rand::RngCore;

        let mut secret = vec![0u8; algorithm.native_len()];
        rand::thread_rng().fill_bytes(&mut secret);
        let key = Self::new(algorithm, name, &secret)?;
        Ok((key, secret))
    }
}

/// # Access to Properties
///
impl Key {
    /// Returns the algorithm of this key.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns a reference to the name of this key.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the wire length of a TSIG record generated by this key.
    ///
    /// The length is exact: the owner of a TSIG record is this key's
    /// name, its data contains the algorithm name and a MAC of the
    /// algorithm's native length, and nothing in it is compressed.
    pub fn record_length(&self) -> usize {
        // Type, class, TTL, and RDLENGTH come to ten octets; the fixed
        // record data fields to another 16.
        self.name.len()
            + 10
            + self.algorithm.to_name().len()
            + 16
            + self.algorithm.native_len()
    }

    /// Returns a fresh MAC context for this key.
    fn context(&self) -> HmacContext {
        self.context.clone()
    }
}

/// # Signing and Verifying
///
impl Key {
    /// Signs a serialized message and appends the TSIG record.
    ///
    /// The composer must hold the complete message with its final
    /// section counts. The MAC covers those octets, the additional count
    /// thus not including the TSIG record itself; the caller adjusts the
    /// count afterwards.
    pub(crate) fn sign_emitted(
        &self,
        target: &mut Composer,
        error: TsigRcode,
        request_mac: Option<&[u8]>,
    ) -> Result<(), ShortBuf> {
        let variables =
            Variables::new(Time48::now(), DEFAULT_FUDGE, error, None);
        let mac = self.sign_message(target.as_slice(), &variables, request_mac);
        let id = u16::from_be_bytes([
            target.as_slice()[0],
            target.as_slice()[1],
        ]);
        variables.to_record(self, mac, id).compose(target)
    }

    /// Signs an already-built message in place.
    ///
    /// The message is serialized without a size cap, the MAC computed,
    /// and the TSIG record appended to the additional section as a plain
    /// record. When signing a response, pass the request's TSIG record
    /// data to bind the signature to the request MAC.
    ///
    /// The message must not be modified after this call. In particular,
    /// size-capped serialization places the OPT record behind all other
    /// additional records, so a message signed in place and then
    /// serialized with a cap no longer parses. Use
    /// [`Message::set_tsig`] unless the exact octets have to be fixed at
    /// signing time.
    pub fn apply(
        &self,
        message: &mut Message,
        request: Option<&Tsig>,
    ) -> Result<(), ShortBuf> {
        let wire = message.to_wire()?;
        let variables = Variables::new(
            Time48::now(),
            DEFAULT_FUDGE,
            TsigRcode::NoError,
            None,
        );
        let mac = self.sign_message(
            &wire,
            &variables,
            request.map(|tsig| tsig.mac().as_ref()),
        );
        let record =
            variables.to_record(self, mac, message.header().id());
        message.add_record(record, crate::base::message::Section::Additional);
        message.set_tsig_state(TsigState::Signed);
        Ok(())
    }

    /// Verifies a received message against this key.
    ///
    /// Takes both the parsed message and the exact octets it was parsed
    /// from. When the message answers a signed request, the request's
    /// MAC must be given; it is part of the signed data.
    ///
    /// The outcome is reported as a [`TsigRcode`]:
    /// [`NoError`][TsigRcode::NoError] for a good signature,
    /// [`BadKey`][TsigRcode::BadKey] if key name or algorithm do not
    /// match this key, [`BadSig`][TsigRcode::BadSig] on MAC mismatch,
    /// [`BadTime`][TsigRcode::BadTime] if the signing time is more than
    /// fudge seconds away, and [`FormErr`][TsigRcode::FormErr] if the
    /// message carries no final TSIG record at all.
    pub fn verify(
        &self,
        message: &Message,
        wire: &[u8],
        request_mac: Option<&[u8]>,
    ) -> TsigRcode {
        self.verify_at(message, wire, request_mac, Time48::now())
    }

    /// Verifies a received message at the given time.
    pub fn verify_at(
        &self,
        message: &Message,
        wire: &[u8],
        request_mac: Option<&[u8]>,
        now: Time48,
    ) -> TsigRcode {
        let (record, tsig) = match message.additional().last() {
            Some(record) => match record.data() {
                Rdata::Tsig(tsig) => (record, tsig),
                _ => return TsigRcode::FormErr,
            },
            None => return TsigRcode::FormErr,
        };
        if *record.name() != self.name
            || *tsig.algorithm() != self.algorithm.to_name()
        {
            return TsigRcode::BadKey;
        }
        let start = match tsig_offset(wire) {
            Ok(Some(start)) => start,
            _ => return TsigRcode::FormErr,
        };

        let mut context = self.context();
        if let Some(mac) = request_mac {
            // A response reporting a key or signature failure is signed
            // without the request MAC.
            if tsig.error() != TsigRcode::BadKey
                && tsig.error() != TsigRcode::BadSig
            {
                apply_mac(&mut context, mac);
            }
        }
        digest_message(&mut context, wire, start, tsig.original_id());
        Variables::from_tsig(tsig).sign(record.name(), tsig, &mut context);

        if !context.verify(tsig.mac()) {
            return TsigRcode::BadSig;
        }
        if !tsig.is_valid_at(now) {
            return TsigRcode::BadTime;
        }
        TsigRcode::NoError
    }

    /// Computes the MAC over a serialized message and the variables.
    fn sign_message(
        &self,
        wire: &[u8],
        variables: &Variables,
        request_mac: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut context = self.context();
        if let Some(mac) = request_mac {
            apply_mac(&mut context, mac);
        }
        context.update(wire);
        variables.sign(&self.name, &self.algorithm.to_name(), &mut context);
        context.finalize()
    }
}

//--- Debug

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

//------------ ClientSequence ------------------------------------------------

/// TSIG client sequence state.
///
/// This type allows a client to check a series of answers to one signed
/// request, as received for an AXFR request over a stream. It is
/// necessary because the signatures of the second and later answers are
/// generated differently from the first: each signed message digests the
/// MAC of the previous signed message, all unsigned messages in between
/// in their entirety, and a reduced block of TSIG timers.
///
/// The sequence is created from the serialized signed request via
/// [`request`][Self::request]. Each received answer is passed to
/// [`answer`][Self::answer]. After the last message of the sequence,
/// [`done`][Self::done] checks that the sequence was allowed to end,
/// since the final message of a sequence must be signed.
#[derive(Clone, Debug)]
pub struct ClientSequence {
    /// The key the sequence is signed with.
    key: Arc<Key>,

    /// The running digest for the next signed answer.
    context: HmacContext,

    /// Are we still waiting for the first answer?
    first: bool,

    /// The number of unsigned answers since the last signed one.
    unsigned: usize,

    /// The largest permitted run of unsigned answers.
    max_unsigned: usize,
}

impl ClientSequence {
    /// Creates a sequence for a serialized signed request.
    ///
    /// The request octets must be the final, signed form as sent out,
    /// i.e., the result of serializing a message with a signing intent
    /// for `key`.
    pub fn request(
        key: Arc<Key>,
        request_wire: &[u8],
    ) -> Result<Self, ValidationError> {
        let request = Message::parse(request_wire)?;
        let mac = match request.tsig() {
            Some(tsig) => tsig.mac().clone(),
            None => return Err(ValidationError::FormErr),
        };
        let mut context = key.context();
        apply_mac(&mut context, &mac);
        Ok(ClientSequence {
            key,
            context,
            first: true,
            unsigned: 0,
            max_unsigned: DEFAULT_MAX_UNSIGNED,
        })
    }

    /// Sets the largest permitted run of unsigned messages.
    ///
    /// The default is 99, the most RFC 8945 allows.
    pub fn with_max_unsigned(mut self, max: usize) -> Self {
        self.max_unsigned = max.min(DEFAULT_MAX_UNSIGNED);
        self
    }

    /// Validates the next answer of the sequence.
    ///
    /// Takes the parsed message together with the exact octets it was
    /// parsed from. Unsigned messages are folded into the running
    /// digest; signed messages are checked and then seed the digest for
    /// the next stretch. On success, the message's signature state is
    /// updated.
    pub fn answer(
        &mut self,
        message: &mut Message,
        wire: &[u8],
        now: Time48,
    ) -> Result<(), ValidationError> {
        let (name, tsig) = match message.additional().last() {
            Some(record) => match record.data() {
                Rdata::Tsig(tsig) => {
                    (record.name().clone(), tsig.clone())
                }
                _ => return self.unsigned_answer(wire),
            },
            None => return self.unsigned_answer(wire),
        };

        if name != *self.key.name()
            || *tsig.algorithm() != self.key.algorithm().to_name()
        {
            return Err(ValidationError::BadKey);
        }
        let start = match tsig_offset(wire) {
            Ok(Some(start)) => start,
            _ => return Err(ValidationError::FormErr),
        };

        // Take the running context, leaving a fresh one for the next
        // stretch of the sequence.
        let mut context = self.key.context();
        core::mem::swap(&mut self.context, &mut context);

        digest_message(&mut context, wire, start, tsig.original_id());
        let variables = Variables::from_tsig(&tsig);
        if self.first {
            variables.sign(&name, &tsig, &mut context)
        } else {
            variables.sign_timers(&mut context)
        };

        if !context.verify(tsig.mac()) {
            return Err(ValidationError::BadSig);
        }
        if !tsig.is_valid_at(now) {
            return Err(ValidationError::BadTime);
        }

        apply_mac(&mut self.context, tsig.mac());
        self.first = false;
        self.unsigned = 0;
        message.set_tsig_state(TsigState::Verified);
        Ok(())
    }

    /// Validates the end of the sequence.
    ///
    /// Specifically, this checks that the last message given to
    /// [`answer`][Self::answer] had been signed.
    pub fn done(self) -> Result<(), ValidationError> {
        // The last message must be signed, so the counter must be zero
        // here.
        if self.unsigned != 0 {
            Err(ValidationError::TooManyUnsigned)
        } else {
            Ok(())
        }
    }

    /// Returns a reference to the sequence's key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Folds an unsigned intermediate message into the digest.
    fn unsigned_answer(
        &mut self,
        wire: &[u8],
    ) -> Result<(), ValidationError> {
        if self.first {
            // The first message of a sequence must be signed.
            return Err(ValidationError::ServerUnsigned);
        }
        if self.unsigned >= self.max_unsigned {
            return Err(ValidationError::TooManyUnsigned);
        }
        self.context.update(wire);
        self.unsigned += 1;
        Ok(())
    }
}

//------------ Variables -----------------------------------------------------

/// The TSIG variables.
///
/// This type keeps the record-level values that are digested alongside
/// the message when calculating a signature.
#[derive(Clone, Debug)]
struct Variables {
    /// The time the signature in question was created.
    time_signed: Time48,

    /// The infamous fudge.
    fudge: u16,

    /// The TSIG error code.
    error: TsigRcode,

    /// The content of the 'other' field.
    ///
    /// According to the RFC, the only allowed value for this field is a
    /// time stamp, used with BADTIME errors.
    other: Option<Time48>,
}

impl Variables {
    /// Creates a new value from the parts.
    fn new(
        time_signed: Time48,
        fudge: u16,
        error: TsigRcode,
        other: Option<Time48>,
    ) -> Self {
        Variables {
            time_signed,
            fudge,
            error,
            other,
        }
    }

    /// Recreates the variables from a received TSIG record.
    fn from_tsig(tsig: &Tsig) -> Self {
        Variables::new(
            tsig.time_signed(),
            tsig.fudge(),
            tsig.error(),
            tsig.other_time(),
        )
    }

    /// Produces the TSIG record for these variables.
    fn to_record(&self, key: &Key, mac: Vec<u8>, original_id: u16) -> Record {
        let other = match self.other {
            Some(time) => Bytes::copy_from_slice(&time.into_octets()),
            None => Bytes::new(),
        };
        Record::new(
            key.name().clone(),
            Class::Any,
            0,
            Rdata::Tsig(Tsig::new(
                key.algorithm().to_name(),
                self.time_signed,
                self.fudge,
                Bytes::from(mac),
                original_id,
                self.error,
                other,
            )),
        )
        // The key name is absolute and the TTL is zero, so record
        // construction cannot fail.
        .expect("valid TSIG record")
    }

    /// Applies the variables to a signing context.
    ///
    /// This applies the full variables including key information. The
    /// key name and algorithm name are digested in canonical form.
    fn sign<A: AlgorithmName>(
        &self,
        key_name: &Name,
        algorithm: &A,
        context: &mut HmacContext,
    ) {
        // Key name, in canonical wire format
        context.update(&key_name.to_lowercase_vec());
        // CLASS (Always ANY in the current specification)
        context.update(&Class::Any.to_int().to_be_bytes());
        // TTL (Always 0 in the current specification)
        context.update(&0u32.to_be_bytes());
        // Algorithm Name (in canonical wire format)
        context.update(&algorithm.name().to_lowercase_vec());
        // Time Signed
        context.update(&self.time_signed.into_octets());
        // Fudge
        context.update(&self.fudge.to_be_bytes());
        // Error
        context.update(&self.error.to_int().to_be_bytes());
        // Other Len
        if self.other.is_some() {
            context.update(&6u16.to_be_bytes());
        } else {
            context.update(&0u16.to_be_bytes());
        }
        // Other
        if let Some(time) = self.other {
            context.update(&time.into_octets());
        }
    }

    /// Applies only the timing values to the signing context.
    ///
    /// Subsequent signed messages of a sequence digest this reduced
    /// block instead of the full variables.
    fn sign_timers(&self, context: &mut HmacContext) {
        // Time Signed
        context.update(&self.time_signed.into_octets());
        // Fudge
        context.update(&self.fudge.to_be_bytes());
    }
}

//------------ AlgorithmName -------------------------------------------------

/// Access to an algorithm name for digesting.
///
/// [`Variables::sign`] needs the algorithm name both when signing, where
/// it comes from the local key, and when verifying, where the name from
/// the received TSIG record is used.
trait AlgorithmName {
    fn name(&self) -> &Name;
}

impl AlgorithmName for Name {
    fn name(&self) -> &Name {
        self
    }
}

impl AlgorithmName for Tsig {
    fn name(&self) -> &Name {
        self.algorithm()
    }
}

//------------ Algorithm -----------------------------------------------------

/// The supported TSIG algorithms.
///
/// RFC 8945 names the HMAC algorithms through domain names. The MD5
/// algorithm, though considered weak, is still widely configured and
/// therefore included.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// Creates a value from a name in any of its accepted forms.
    ///
    /// Both the DNS names, with or without a trailing dot, and the
    /// legacy Java-style names such as `HmacSHA256` are understood,
    /// ignoring case. Unknown names are rejected.
    pub fn from_name(name: &str) -> Result<Self, AlgorithmError> {
        let name = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();
        match name.as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" | "hmacmd5" => {
                Ok(Algorithm::Md5)
            }
            "hmac-sha1" | "hmacsha1" => Ok(Algorithm::Sha1),
            "hmac-sha224" | "hmacsha224" => Ok(Algorithm::Sha224),
            "hmac-sha256" | "hmacsha256" => Ok(Algorithm::Sha256),
            "hmac-sha384" | "hmacsha384" => Ok(Algorithm::Sha384),
            "hmac-sha512" | "hmacsha512" => Ok(Algorithm::Sha512),
            _ => Err(AlgorithmError),
        }
    }

    /// Creates a value from its domain name representation.
    ///
    /// Returns `None` if the name doesn't represent a known algorithm.
    pub fn from_dname(name: &Name) -> Option<Self> {
        for algorithm in [
            Algorithm::Md5,
            Algorithm::Sha1,
            Algorithm::Sha224,
            Algorithm::Sha256,
            Algorithm::Sha384,
            Algorithm::Sha512,
        ] {
            if *name == algorithm.to_name() {
                return Some(algorithm);
            }
        }
        None
    }

    /// Returns the domain name for this algorithm.
    pub fn to_name(self) -> Name {
        Name::from_octets_unchecked(Bytes::from_static(match self {
            Algorithm::Md5 => b"\x08hmac-md5\x07sig-alg\x03reg\x03int\x00",
            Algorithm::Sha1 => b"\x09hmac-sha1\x00",
            Algorithm::Sha224 => b"\x0bhmac-sha224\x00",
            Algorithm::Sha256 => b"\x0bhmac-sha256\x00",
            Algorithm::Sha384 => b"\x0bhmac-sha384\x00",
            Algorithm::Sha512 => b"\x0bhmac-sha512\x00",
        }))
    }

    /// Returns the native length of a MAC created with this algorithm.
    pub fn native_len(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha1 => 20,
            Algorithm::Sha224 => 28,
            Algorithm::Sha256 => 32,
            Algorithm::Sha384 => 48,
            Algorithm::Sha512 => 64,
        }
    }
}

//--- FromStr

impl str::FromStr for Algorithm {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

//--- Display

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Algorithm::Md5 => "hmac-md5.sig-alg.reg.int.",
            Algorithm::Sha1 => "hmac-sha1",
            Algorithm::Sha224 => "hmac-sha224",
            Algorithm::Sha256 => "hmac-sha256",
            Algorithm::Sha384 => "hmac-sha384",
            Algorithm::Sha512 => "hmac-sha512",
        })
    }
}

//------------ HmacContext ---------------------------------------------------

/// A running MAC computation.
///
/// This folds the algorithm dispatch over the six HMAC variants into one
/// value. Contexts are cheap to clone, which both the key and the
/// sequence logic rely on.
#[derive(Clone)]
enum HmacContext {
    Md5(Hmac<Md5>),
    Sha1(Hmac<Sha1>),
    Sha224(Hmac<Sha224>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl HmacContext {
    /// Creates a fresh context for an algorithm and key material.
    fn new(algorithm: Algorithm, secret: &[u8]) -> Self {
        // HMAC accepts keys of any length.
        match algorithm {
            Algorithm::Md5 => Self::Md5(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
            Algorithm::Sha1 => Self::Sha1(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
            Algorithm::Sha224 => Self::Sha224(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
            Algorithm::Sha256 => Self::Sha256(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
            Algorithm::Sha384 => Self::Sha384(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
            Algorithm::Sha512 => Self::Sha512(
                Mac::new_from_slice(secret).expect("any key length"),
            ),
        }
    }

    /// Feeds data into the MAC computation.
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(mac) => mac.update(data),
            Self::Sha1(mac) => mac.update(data),
            Self::Sha224(mac) => mac.update(data),
            Self::Sha256(mac) => mac.update(data),
            Self::Sha384(mac) => mac.update(data),
            Self::Sha512(mac) => mac.update(data),
        }
    }

    /// Completes the computation and returns the MAC.
    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha1(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha224(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha256(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha384(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha512(mac) => mac.finalize().into_bytes().to_vec(),
        }
    }

    /// Completes the computation and compares against a received MAC.
    ///
    /// The comparison is performed in constant time.
    fn verify(self, mac: &[u8]) -> bool {
        match self {
            Self::Md5(ctx) => ctx.verify_slice(mac).is_ok(),
            Self::Sha1(ctx) => ctx.verify_slice(mac).is_ok(),
            Self::Sha224(ctx) => ctx.verify_slice(mac).is_ok(),
            Self::Sha256(ctx) => ctx.verify_slice(mac).is_ok(),
            Self::Sha384(ctx) => ctx.verify_slice(mac).is_ok(),
            Self::Sha512(ctx) => ctx.verify_slice(mac).is_ok(),
        }
    }
}

impl fmt::Debug for HmacContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("HmacContext(..)")
    }
}

//------------ Helper Functions ----------------------------------------------

/// Feeds a length-prefixed MAC into a context.
///
/// Chained MACs are digested as a 16 bit length in network byte order
/// followed by the MAC octets.
fn apply_mac(context: &mut HmacContext, mac: &[u8]) {
    context.update(&(mac.len() as u16).to_be_bytes());
    context.update(mac);
}

/// Digests the signed portion of a received message.
///
/// The signed data is the message as it looked before the TSIG record
/// was added: with the original message ID, the additional count one
/// less, and everything up to the start of the TSIG record.
fn digest_message(
    context: &mut HmacContext,
    wire: &[u8],
    tsig_start: usize,
    original_id: u16,
) {
    let mut head = HeaderSection::from_message_slice(wire);
    head.header_mut().set_id(original_id);
    head.counts_mut().dec_arcount();
    context.update(&head.to_array());
    context.update(&wire[HeaderSection::LEN..tsig_start]);
}

/// Returns the offset of the final TSIG record of a message.
///
/// Walks the wire format without assembling anything. Returns `None` if
/// the message has no additional records or its last record is not a
/// TSIG record.
fn tsig_offset(wire: &[u8]) -> Result<Option<usize>, ParseError> {
    let mut parser = Parser::from_slice(wire);
    parser.advance(4)?;
    let qdcount = parser.parse_u16()?;
    let ancount = parser.parse_u16()?;
    let nscount = parser.parse_u16()?;
    let arcount = parser.parse_u16()?;
    if arcount == 0 {
        return Ok(None);
    }
    for _ in 0..qdcount {
        Name::skip(&mut parser)?;
        parser.advance(4)?;
    }
    let mut start = 0;
    let mut rtype = Rtype::Int(0);
    for _ in 0..u32::from(ancount) + u32::from(nscount) + u32::from(arcount)
    {
        start = parser.pos();
        Name::skip(&mut parser)?;
        rtype = Rtype::parse(&mut parser)?;
        parser.advance(6)?;
        let rdlen = parser.parse_u16()? as usize;
        parser.advance(rdlen)?;
    }
    if rtype == Rtype::Tsig {
        Ok(Some(start))
    } else {
        Ok(None)
    }
}

//============ Error Types ===================================================

//------------ NewKeyError ---------------------------------------------------

/// A key couldn't be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewKeyError {
    /// The algorithm name is not known.
    BadAlgorithm,

    /// The key name is not a valid domain name.
    BadName,

    /// The key name is not absolute.
    RelativeName,

    /// The secret is not valid Base 64.
    BadSecret,
}

//--- From

impl From<AlgorithmError> for NewKeyError {
    fn from(_: AlgorithmError) -> Self {
        NewKeyError::BadAlgorithm
    }
}

//--- Display and Error

impl fmt::Display for NewKeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NewKeyError::BadAlgorithm => {
                f.write_str("unknown TSIG algorithm")
            }
            NewKeyError::BadName => f.write_str("invalid key name"),
            NewKeyError::RelativeName => {
                f.write_str("relative key name")
            }
            NewKeyError::BadSecret => {
                f.write_str("invalid Base 64 in secret")
            }
        }
    }
}

impl std::error::Error for NewKeyError {}

//------------ AlgorithmError ------------------------------------------------

/// An invalid algorithm was provided.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlgorithmError;

//--- Display and Error

impl fmt::Display for AlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid algorithm")
    }
}

impl std::error::Error for AlgorithmError {}

//------------ ValidationError -----------------------------------------------

/// A TSIG-signed message of a sequence couldn't be validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationError {
    /// The key used by the sender is not the local key.
    BadKey,

    /// The MAC did not verify.
    BadSig,

    /// The time signed lies outside the permitted window.
    BadTime,

    /// The message is broken with regard to TSIG.
    FormErr,

    /// A message that had to be signed was not.
    ServerUnsigned,

    /// Too many unsigned messages in a row.
    TooManyUnsigned,
}

impl ValidationError {
    /// Returns the TSIG response code describing the failure.
    pub fn rcode(self) -> TsigRcode {
        match self {
            ValidationError::BadKey => TsigRcode::BadKey,
            ValidationError::BadSig => TsigRcode::BadSig,
            ValidationError::BadTime => TsigRcode::BadTime,
            ValidationError::FormErr
            | ValidationError::ServerUnsigned
            | ValidationError::TooManyUnsigned => TsigRcode::FormErr,
        }
    }
}

//--- From

impl From<ParseError> for ValidationError {
    fn from(_: ParseError) -> Self {
        ValidationError::FormErr
    }
}

//--- Display and Error

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ValidationError::BadKey => f.write_str("unknown key"),
            ValidationError::BadSig => f.write_str("bad signature"),
            ValidationError::BadTime => f.write_str("bad time"),
            ValidationError::FormErr => f.write_str("format error"),
            ValidationError::ServerUnsigned => {
                f.write_str("unsigned answer")
            }
            ValidationError::TooManyUnsigned => {
                f.write_str("too many unsigned messages")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::message::Section;
    use crate::base::question::Question;
    use core::str::FromStr;

    fn test_key() -> Arc<Key> {
        Arc::new(
            Key::from_text("hmac-sha256", "example.", "12345678").unwrap(),
        )
    }

    fn query() -> Message {
        Message::new_query(
            Question::new_in(
                Name::from_str("www.example.").unwrap(),
                Rtype::A,
            )
            .unwrap(),
        )
    }

    #[test]
    fn algorithm_names() {
        for (name, algorithm) in [
            ("hmac-md5", Algorithm::Md5),
            ("hmac-md5.sig-alg.reg.int.", Algorithm::Md5),
            ("HmacMD5", Algorithm::Md5),
            ("hmac-sha1", Algorithm::Sha1),
            ("hmac-sha224", Algorithm::Sha224),
            ("hmac-sha256", Algorithm::Sha256),
            ("hmac-sha256.", Algorithm::Sha256),
            ("hmac-sha384", Algorithm::Sha384),
            ("hmac-sha512", Algorithm::Sha512),
            ("HmacSHA512", Algorithm::Sha512),
        ] {
            assert_eq!(Algorithm::from_name(name).unwrap(), algorithm);
        }
        assert!(Algorithm::from_name("randomalg").is_err());
    }

    #[test]
    fn algorithm_name_round_trip() {
        for algorithm in [
            Algorithm::Md5,
            Algorithm::Sha1,
            Algorithm::Sha224,
            Algorithm::Sha256,
            Algorithm::Sha384,
            Algorithm::Sha512,
        ] {
            assert_eq!(
                Algorithm::from_dname(&algorithm.to_name()),
                Some(algorithm)
            );
        }
        assert_eq!(
            Algorithm::from_dname(&Name::from_str("hmac-foo.").unwrap()),
            None
        );
    }

    #[test]
    fn sign_and_verify() {
        let key = test_key();
        let mut msg = query();
        msg.set_tsig(key.clone(), TsigRcode::NoError, None);
        let wire = msg.to_wire_limited(512).unwrap();

        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.is_signed());
        assert_eq!(key.verify(&parsed, &wire, None), TsigRcode::NoError);
    }

    #[test]
    fn verify_rejects_wrong_key_and_garbage() {
        let key = test_key();
        let mut msg = query();
        msg.set_tsig(key.clone(), TsigRcode::NoError, None);
        let wire = msg.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();

        let other_name =
            Arc::new(Key::from_text("hmac-sha256", "other.", "12345678").unwrap());
        assert_eq!(
            other_name.verify(&parsed, &wire, None),
            TsigRcode::BadKey
        );

        let other_alg =
            Arc::new(Key::from_text("hmac-sha1", "example.", "12345678").unwrap());
        assert_eq!(
            other_alg.verify(&parsed, &wire, None),
            TsigRcode::BadKey
        );

        let other_secret =
            Arc::new(Key::from_text("hmac-sha256", "example.", "c2VjcmV0").unwrap());
        assert_eq!(
            other_secret.verify(&parsed, &wire, None),
            TsigRcode::BadSig
        );

        // A message without a TSIG at all is a format error.
        let unsigned = query();
        let wire = unsigned.to_wire().unwrap();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(key.verify(&parsed, &wire, None), TsigRcode::FormErr);
    }

    #[test]
    fn verify_rejects_stale_time() {
        let key = test_key();
        let mut msg = query();
        msg.set_tsig(key.clone(), TsigRcode::NoError, None);
        let wire = msg.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();

        let skewed = Time48::from_u64(u64::from(Time48::now()) + 301);
        assert_eq!(
            key.verify_at(&parsed, &wire, None, skewed),
            TsigRcode::BadTime
        );
    }

    #[test]
    fn response_binds_to_request_mac() {
        let key = test_key();
        let mut request = query();
        request.set_tsig(key.clone(), TsigRcode::NoError, None);
        let request_wire = request.to_wire_limited(512).unwrap();
        let request_parsed = Message::parse(&request_wire).unwrap();
        let request_mac = request_parsed.tsig().unwrap().mac().clone();

        let mut response = Message::new_response(&request_parsed);
        response.set_tsig(
            key.clone(),
            TsigRcode::NoError,
            request_parsed.tsig(),
        );
        let wire = response.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();

        assert_eq!(
            key.verify(&parsed, &wire, Some(&request_mac)),
            TsigRcode::NoError
        );
        // Without the request MAC the digest differs.
        assert_eq!(key.verify(&parsed, &wire, None), TsigRcode::BadSig);
    }

    #[test]
    fn sequence_with_unsigned_middle() {
        let key = test_key();
        let mut request = query();
        request.set_tsig(key.clone(), TsigRcode::NoError, None);
        let request_wire = request.to_wire_limited(512).unwrap();
        let request_parsed = Message::parse(&request_wire).unwrap();

        // First answer: signed, bound to the request MAC.
        let mut first = Message::new_response(&request_parsed);
        first.set_tsig(
            key.clone(),
            TsigRcode::NoError,
            request_parsed.tsig(),
        );
        let first_wire = first.to_wire_limited(0xFFFF).unwrap();
        let first_mac =
            Message::parse(&first_wire).unwrap().tsig().unwrap().mac().clone();

        // Second answer: unsigned.
        let second = Message::new_response(&request_parsed);
        let second_wire = second.to_wire().unwrap();

        // Third answer: signed over the chain. Build it by hand the way
        // a server would: digest previous MAC, whole unsigned message,
        // this message, and the timers.
        let mut third = Message::new_response(&request_parsed);
        let third_plain = third.to_wire().unwrap();
        let variables = Variables::new(
            Time48::now(),
            DEFAULT_FUDGE,
            TsigRcode::NoError,
            None,
        );
        let mut context = key.context();
        apply_mac(&mut context, &first_mac);
        context.update(&second_wire);
        context.update(&third_plain);
        variables.sign_timers(&mut context);
        let mac = context.finalize();
        let record =
            variables.to_record(&key, mac, third.header().id());
        third.add_record(record, Section::Additional);
        let third_wire = third.to_wire().unwrap();
        let mut third = Message::parse(&third_wire).unwrap();

        // Client side: validate the whole sequence.
        let mut seq =
            ClientSequence::request(key.clone(), &request_wire).unwrap();
        let mut first = Message::parse(&first_wire).unwrap();
        seq.answer(&mut first, &first_wire, Time48::now()).unwrap();
        let mut second = Message::parse(&second_wire).unwrap();
        seq.answer(&mut second, &second_wire, Time48::now()).unwrap();
        seq.clone().done().unwrap_err();
        seq.answer(&mut third, &third_wire, Time48::now()).unwrap();
        assert_eq!(third.tsig_state(), TsigState::Verified);
        seq.done().unwrap();
    }

    #[test]
    fn generated_key_signs() {
        let (key, secret) = Key::generate(
            Algorithm::Sha384,
            Name::from_str("generated.example.").unwrap(),
        )
        .unwrap();
        assert_eq!(secret.len(), 48);
        let key = Arc::new(key);

        let mut msg = query();
        msg.set_tsig(key.clone(), TsigRcode::NoError, None);
        let wire = msg.to_wire_limited(512).unwrap();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(key.verify(&parsed, &wire, None), TsigRcode::NoError);
    }
}
