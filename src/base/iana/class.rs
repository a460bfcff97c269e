//! Record classes.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS record classes.
    ///
    /// Essentially only the Internet class is in use today. The ANY class
    /// appears in queries and, notably, in the TSIG record where it marks
    /// the meta nature of the record. Values without a mnemonic can be
    /// given in text form via the RFC 3597 `CLASSnnn` notation.
    =>
    Class, u16;

    /// The Internet.
    (In => 1, b"IN")

    /// The Chaos network.
    (Ch => 3, b"CH")

    /// The Hesiod name service.
    (Hs => 4, b"HS")

    /// Requests a record be deleted, used in dynamic update.
    (None => 254, b"NONE")

    /// Any class.
    (Any => 255, b"ANY")
}

int_enum_str_with_prefix!(Class, "CLASS", b"CLASS", u16, "unknown class");
