//! DNS opcodes.

//------------ Opcode --------------------------------------------------------

int_enum! {
    /// DNS message opcodes.
    ///
    /// The opcode specifies the kind of query carried by a message. It is
    /// a four bit field in the second octet of the message header.
    =>
    Opcode, u8;

    /// A standard query.
    (Query => 0, b"QUERY")

    /// An inverse query, long obsolete.
    (IQuery => 1, b"IQUERY")

    /// A server status request.
    (Status => 2, b"STATUS")

    /// A zone change notification.
    (Notify => 4, b"NOTIFY")

    /// A dynamic update.
    (Update => 5, b"UPDATE")
}

int_enum_str_with_decimal!(Opcode, u8, "unknown opcode");
