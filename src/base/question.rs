//! A single question of a DNS message.

use super::iana::{Class, Rtype};
use super::name::{Name, NameError};
use super::wire::{Composer, ParseError, Parser, ShortBuf};
use core::fmt;

//------------ Question ------------------------------------------------------

/// A question of a DNS message.
///
/// In a query, a question asks for all records of a given record type
/// owned by a given absolute domain name within a given class. The
/// question is echoed back in the response.
///
/// Two questions are equal if their names are equal ignoring ASCII case
/// and their types and classes match exactly, which is also how a
/// response's question is matched against the request's.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    /// The domain name of the question.
    qname: Name,

    /// The record type of the question.
    qtype: Rtype,

    /// The class of the question.
    qclass: Class,
}

impl Question {
    /// Creates a new question from its components.
    ///
    /// The name must be absolute.
    pub fn new(
        qname: Name,
        qtype: Rtype,
        qclass: Class,
    ) -> Result<Self, NameError> {
        if !qname.is_absolute() {
            return Err(NameError::RelativeName);
        }
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    /// Creates a new question in the IN class.
    pub fn new_in(qname: Name, qtype: Rtype) -> Result<Self, NameError> {
        Self::new(qname, qtype, Class::In)
    }

    /// Returns a reference to the domain name of the question.
    pub fn qname(&self) -> &Name {
        &self.qname
    }

    /// Returns the record type of the question.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class of the question.
    pub fn qclass(&self) -> Class {
        self.qclass
    }

    /// Takes a question from the beginning of the parser.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Question {
            qname: Name::parse(parser)?,
            qtype: Rtype::parse(parser)?,
            qclass: Class::parse(parser)?,
        })
    }

    /// Appends the question to the target, compressing the name.
    pub fn compose(&self, target: &mut Composer) -> Result<(), ShortBuf> {
        target.append_name(&self.qname)?;
        self.qtype.compose(target)?;
        self.qclass.compose(target)
    }
}

//--- Display

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn round_trip() {
        let question = Question::new_in(
            Name::from_str("www.example.com.").unwrap(),
            Rtype::A,
        )
        .unwrap();
        let mut target = Composer::new(512);
        question.compose(&mut target).unwrap();
        let mut parser = Parser::from_slice(target.as_slice());
        assert_eq!(Question::parse(&mut parser).unwrap(), question);
    }

    #[test]
    fn requires_absolute_name() {
        assert_eq!(
            Question::new_in(
                Name::from_str("www.example.com").unwrap(),
                Rtype::A
            ),
            Err(NameError::RelativeName)
        );
    }

    #[test]
    fn eq_ignores_name_case() {
        let a = Question::new_in(
            Name::from_str("www.EXAMPLE.com.").unwrap(),
            Rtype::A,
        )
        .unwrap();
        let b = Question::new_in(
            Name::from_str("www.example.com.").unwrap(),
            Rtype::A,
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
