//! DNS wire-format codec: message header, names, records, and the message walker.

#[macro_use]
mod macros;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod name;
pub mod records;

use core::fmt;

use bitflags::bitflags;

use crate::num::U16;

wire_enum! {
    /// Resource Record types this library recognizes on the wire.
    ///
    /// Other type values still round-trip through the parser; their rdata is delivered raw
    /// and is not structurally decoded.
    pub enum RecordType {
        A = 1,
        PTR = 12,
        TXT = 16,
        AAAA = 28,
        SRV = 33,
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

wire_enum! {
    /// Resource Record classes.
    pub enum Class {
        /// The Internet.
        IN = 1,
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Bit 15 of the class field, repurposed by mDNS.
///
/// On questions it requests a unicast response (the "QU" bit); on records it signals cache
/// replacement (the "cache-flush" bit). It is stripped from every class value before class
/// comparisons.
pub(crate) const CLASS_TOP_BIT: u16 = 0x8000;

pub(crate) const CLASS_MASK: u16 = 0x7fff;

/// The message section an entry was parsed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Question,
    Answer,
    Authority,
    Additional,
}

// Bit positions in the header flags are inverted, because RFC 1035 starts counting at the MSb.
const fn be_pos(pos: u16) -> u16 {
    15 - pos
}

bitflags! {
    #[derive(Debug, Clone, Copy)]
    #[repr(transparent)]
    struct HeaderFlags: u16 {
        /// If set, the message is a response to a query. If unset, it is a query.
        const QR = 1 << be_pos(0);
        const OPCODE = 0b1111 << Self::OPCODE_POS;
        /// Set if this response was sent from a name server that is the authority for the
        /// queried domain name. mDNS responders always set this.
        const AA = 1 << be_pos(5);
        /// Set if the message was truncated because it is longer than the maximum allowed
        /// length of the transmission channel.
        const TC = 1 << be_pos(6);
        const RCODE = 0b1111 << Self::RCODE_POS;
    }
}

impl HeaderFlags {
    const OPCODE_POS: u16 = 11;
    const RCODE_POS: u16 = 0;
}

/// The fixed 12-octet message header.
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Header {
    id: U16,
    flags: U16,
    qdcount: U16,
    ancount: U16,
    nscount: U16,
    arcount: U16,
}

impl Header {
    fn flags(&self) -> HeaderFlags {
        HeaderFlags::from_bits_retain(self.flags.get())
    }

    fn modify_flags(&mut self, with: impl FnOnce(&mut HeaderFlags)) {
        let mut flags = self.flags();
        with(&mut flags);
        self.flags = flags.bits().into();
    }

    /// Returns the 16-bit transaction ID.
    ///
    /// Responders copy this ID to the corresponding response packet. Multicast DNS-SD
    /// responses use ID 0 (RFC 6762 section 18.1).
    #[inline]
    pub fn id(&self) -> u16 {
        self.id.get()
    }

    #[inline]
    pub fn set_id(&mut self, id: u16) {
        self.id = id.into();
    }

    #[inline]
    pub fn is_query(&self) -> bool {
        !self.is_response()
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags().contains(HeaderFlags::QR)
    }

    pub fn set_response(&mut self, is_response: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::QR, is_response));
    }

    pub fn is_authority(&self) -> bool {
        self.flags().contains(HeaderFlags::AA)
    }

    pub fn set_authority(&mut self, aa: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::AA, aa));
    }

    /// Returns whether the truncation flag is set, indicating that the message did not fit
    /// in the transport channel.
    pub fn is_truncated(&self) -> bool {
        self.flags().contains(HeaderFlags::TC)
    }

    pub fn set_truncated(&mut self, trunc: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::TC, trunc));
    }

    /// Returns the raw operation code. Standard queries and responses use 0.
    pub fn opcode(&self) -> u8 {
        ((self.flags.get() & HeaderFlags::OPCODE.bits()) >> HeaderFlags::OPCODE_POS) as u8
    }

    /// Returns the raw response code. 0 means no error.
    pub fn rcode(&self) -> u8 {
        ((self.flags.get() & HeaderFlags::RCODE.bits()) >> HeaderFlags::RCODE_POS) as u8
    }

    pub fn question_count(&self) -> u16 {
        self.qdcount.get()
    }

    pub fn answer_count(&self) -> u16 {
        self.ancount.get()
    }

    pub fn authority_count(&self) -> u16 {
        self.nscount.get()
    }

    pub fn additional_count(&self) -> u16 {
        self.arcount.get()
    }

    pub(crate) fn set_question_count(&mut self, qdcount: u16) {
        self.qdcount = qdcount.into();
    }

    pub(crate) fn set_answer_count(&mut self, ancount: u16) {
        self.ancount = ancount.into();
    }

    pub(crate) fn set_authority_count(&mut self, nscount: u16) {
        self.nscount = nscount.into();
    }

    pub(crate) fn set_additional_count(&mut self, arcount: u16) {
        self.arcount = arcount.into();
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id())
            .field("flags", &self.flags())
            .field("qdcount", &self.qdcount.get())
            .field("ancount", &self.ancount.get())
            .field("nscount", &self.nscount.get())
            .field("arcount", &self.arcount.get())
            .finish()
    }
}
