//! DNS message parser.
//!
//! [`parse_message`] walks a message's four counted sections and delivers each entry to a
//! [`RecordSink`]. Parsing is strictly bounded by the message slice: a section count that
//! claims more entries than the buffer holds stops cleanly at the end of the buffer, and
//! the number of entries actually delivered is returned.

use std::mem::size_of;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::ControlFlow;

use crate::num::{U16, U32};
use crate::packet::records::{self, Srv, TxtEntry};
use crate::packet::{
    name, Class, EntryType, Header, RecordType, CLASS_MASK, CLASS_TOP_BIT,
};

fn read_u16(msg: &[u8], offset: &mut usize) -> Option<u16> {
    let bytes = msg.get(*offset..*offset + 2)?;
    *offset += 2;
    Some(bytemuck::pod_read_unaligned::<U16>(bytes).get())
}

fn read_u32(msg: &[u8], offset: &mut usize) -> Option<u32> {
    let bytes = msg.get(*offset..*offset + 4)?;
    *offset += 4;
    Some(bytemuck::pod_read_unaligned::<U32>(bytes).get())
}

/// Reads the fixed 12-octet header, or returns [`None`] for a runt message.
pub fn parse_header(msg: &[u8]) -> Option<Header> {
    let bytes = msg.get(..size_of::<Header>())?;
    Some(bytemuck::pod_read_unaligned(bytes))
}

/// A question delivered by [`parse_message`].
pub struct QuestionEvent<'a> {
    msg: &'a [u8],
    id: u16,
    name_offset: usize,
    qtype: RecordType,
    class: Class,
    unicast_requested: bool,
}

impl<'a> QuestionEvent<'a> {
    /// The transaction ID of the containing message.
    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[inline]
    pub fn qtype(&self) -> RecordType {
        self.qtype
    }

    /// The question's class with the QU bit stripped.
    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Whether the QU bit was set, asking for a unicast response.
    #[inline]
    pub fn unicast_requested(&self) -> bool {
        self.unicast_requested
    }

    /// Decodes the queried name into `scratch`.
    pub fn name<'s>(&self, scratch: &'s mut [u8]) -> &'s [u8] {
        let mut offset = self.name_offset;
        name::extract(self.msg, &mut offset, scratch)
    }

    /// Compares the queried name against a dot-separated name, ASCII case-insensitively.
    /// A trailing dot on `dotted` is ignored.
    pub fn name_is(&self, dotted: &[u8]) -> bool {
        let mut scratch = [0; name::MAX_NAME_LEN];
        let name = self.name(&mut scratch);
        let dotted = dotted.strip_suffix(b".").unwrap_or(dotted);
        !name.is_empty() && name.eq_ignore_ascii_case(dotted)
    }
}

/// A resource record delivered by [`parse_message`].
///
/// The record's rdata stays in place in the message buffer; the typed accessors invoke
/// the matching parser from [`records`](crate::packet::records) on demand.
pub struct RecordEvent<'a> {
    msg: &'a [u8],
    entry: EntryType,
    id: u16,
    name_offset: usize,
    rtype: RecordType,
    class: Class,
    cache_flush: bool,
    ttl: u32,
    rdata_offset: usize,
    rdata_len: usize,
}

impl<'a> RecordEvent<'a> {
    /// The section this record was parsed from.
    #[inline]
    pub fn entry(&self) -> EntryType {
        self.entry
    }

    /// The transaction ID of the containing message.
    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[inline]
    pub fn rtype(&self) -> RecordType {
        self.rtype
    }

    /// The record's class with the cache-flush bit stripped.
    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Whether the record's mDNS cache-flush bit was set.
    #[inline]
    pub fn cache_flush(&self) -> bool {
        self.cache_flush
    }

    /// The record's time to live, in seconds.
    #[inline]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// The offset of the record's rdata within the message.
    #[inline]
    pub fn rdata_offset(&self) -> usize {
        self.rdata_offset
    }

    /// The raw rdata. Its end is guaranteed to lie within the message.
    pub fn rdata(&self) -> &'a [u8] {
        &self.msg[self.rdata_offset..self.rdata_offset + self.rdata_len]
    }

    /// Decodes the record's owner name into `scratch`.
    pub fn name<'s>(&self, scratch: &'s mut [u8]) -> &'s [u8] {
        let mut offset = self.name_offset;
        name::extract(self.msg, &mut offset, scratch)
    }

    /// Decodes PTR rdata into `scratch`.
    pub fn ptr<'s>(&self, scratch: &'s mut [u8]) -> &'s [u8] {
        records::parse_ptr(self.msg, self.rdata_offset, self.rdata_len, scratch)
    }

    /// Decodes SRV rdata, materializing the target name into `scratch`.
    pub fn srv<'s>(&self, scratch: &'s mut [u8]) -> Srv<'s> {
        records::parse_srv(self.msg, self.rdata_offset, self.rdata_len, scratch)
    }

    /// Decodes A rdata.
    pub fn a(&self) -> Option<Ipv4Addr> {
        records::parse_a(self.msg, self.rdata_offset, self.rdata_len)
    }

    /// Decodes AAAA rdata.
    pub fn aaaa(&self) -> Option<Ipv6Addr> {
        records::parse_aaaa(self.msg, self.rdata_offset, self.rdata_len)
    }

    /// Decodes TXT rdata into `entries`, returning the recognized entry count.
    pub fn txt(&self, entries: &mut [TxtEntry<'a>]) -> usize {
        records::parse_txt(self.msg, self.rdata_offset, self.rdata_len, entries)
    }
}

/// Consumer of parsed message entries.
///
/// Returning [`ControlFlow::Break`] from either method aborts the current parse.
pub trait RecordSink {
    /// Called once per entry of the question section.
    fn on_question(&mut self, question: &QuestionEvent<'_>) -> ControlFlow<()> {
        let _ = question;
        ControlFlow::Continue(())
    }

    /// Called once per resource record of the answer, authority, and additional sections.
    fn on_record(&mut self, record: &RecordEvent<'_>) -> ControlFlow<()>;
}

impl<F> RecordSink for F
where
    F: FnMut(&RecordEvent<'_>) -> ControlFlow<()>,
{
    fn on_record(&mut self, record: &RecordEvent<'_>) -> ControlFlow<()> {
        self(record)
    }
}

/// Parses a DNS message and delivers every entry to `sink`.
///
/// When `filter` is set, only resource records of that type are delivered; this is how a
/// caller that issued several queries on one socket narrows a receive pass to the type it
/// most recently asked for. Questions are always delivered.
///
/// Returns the number of entries delivered. Parsing stops early, without an error, when
/// a record runs past the end of the message; entries delivered up to that point stay
/// delivered.
pub fn parse_message<S: RecordSink + ?Sized>(
    msg: &[u8],
    filter: Option<RecordType>,
    sink: &mut S,
) -> usize {
    let Some(header) = parse_header(msg) else {
        return 0;
    };
    let id = header.id();
    let mut offset = size_of::<Header>();
    let mut delivered = 0;

    for _ in 0..header.question_count() {
        let name_offset = offset;
        if !name::skip(msg, &mut offset) {
            return delivered;
        }
        let Some(qtype) = read_u16(msg, &mut offset) else {
            return delivered;
        };
        let Some(qclass) = read_u16(msg, &mut offset) else {
            return delivered;
        };
        let question = QuestionEvent {
            msg,
            id,
            name_offset,
            qtype: RecordType(qtype),
            class: Class(qclass & CLASS_MASK),
            unicast_requested: qclass & CLASS_TOP_BIT != 0,
        };
        delivered += 1;
        if sink.on_question(&question).is_break() {
            return delivered;
        }
    }

    let sections = [
        (EntryType::Answer, header.answer_count()),
        (EntryType::Authority, header.authority_count()),
        (EntryType::Additional, header.additional_count()),
    ];
    for (entry, count) in sections {
        for _ in 0..count {
            let name_offset = offset;
            if !name::skip(msg, &mut offset) {
                return delivered;
            }
            let Some(rtype) = read_u16(msg, &mut offset) else {
                return delivered;
            };
            let Some(rclass) = read_u16(msg, &mut offset) else {
                return delivered;
            };
            let Some(ttl) = read_u32(msg, &mut offset) else {
                return delivered;
            };
            let Some(rdata_len) = read_u16(msg, &mut offset) else {
                return delivered;
            };
            let rdata_len = usize::from(rdata_len);
            let rdata_offset = offset;
            if rdata_offset + rdata_len > msg.len() {
                return delivered;
            }
            offset += rdata_len;

            let rtype = RecordType(rtype);
            if filter.is_some_and(|want| want != rtype) {
                continue;
            }
            let record = RecordEvent {
                msg,
                entry,
                id,
                name_offset,
                rtype,
                class: Class(rclass & CLASS_MASK),
                cache_flush: rclass & CLASS_TOP_BIT != 0,
                ttl,
                rdata_offset,
                rdata_len,
            };
            delivered += 1;
            if sink.on_record(&record).is_break() {
                return delivered;
            }
        }
    }

    delivered
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use expect_test::{expect, Expect};

    use super::*;

    fn parse_hex(s: &str) -> Vec<u8> {
        s.as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16).unwrap();
                let lo = (pair[1] as char).to_digit(16).unwrap();
                (hi * 16 + lo) as u8
            })
            .collect()
    }

    #[derive(Default)]
    struct FormatSink {
        out: String,
    }

    impl RecordSink for FormatSink {
        fn on_question(&mut self, q: &QuestionEvent<'_>) -> ControlFlow<()> {
            let mut scratch = [0; 256];
            writeln!(
                self.out,
                "Q: {}\t{:?}\t{:?}",
                q.name(&mut scratch).escape_ascii(),
                q.class(),
                q.qtype(),
            )
            .unwrap();
            ControlFlow::Continue(())
        }

        fn on_record(&mut self, r: &RecordEvent<'_>) -> ControlFlow<()> {
            let tag = match r.entry() {
                EntryType::Question => "Q",
                EntryType::Answer => "ANS",
                EntryType::Authority => "AUTH",
                EntryType::Additional => "ADDL",
            };
            let mut scratch = [0; 256];
            write!(
                self.out,
                "{}: {}\t{}\t{:?}\t{:?}\t",
                tag,
                r.name(&mut scratch).escape_ascii(),
                r.ttl(),
                r.class(),
                r.rtype(),
            )
            .unwrap();
            let mut rdata_scratch = [0; 256];
            match r.rtype() {
                RecordType::PTR => {
                    writeln!(self.out, "{}", r.ptr(&mut rdata_scratch).escape_ascii())
                }
                RecordType::SRV => {
                    let srv = r.srv(&mut rdata_scratch);
                    writeln!(
                        self.out,
                        "{} {} {} {}",
                        srv.priority,
                        srv.weight,
                        srv.port,
                        srv.target.escape_ascii(),
                    )
                }
                RecordType::A => writeln!(self.out, "{:?}", r.a()),
                RecordType::AAAA => writeln!(self.out, "{:?}", r.aaaa()),
                _ => writeln!(self.out, "{:02x?}", r.rdata()),
            }
            .unwrap();
            ControlFlow::Continue(())
        }
    }

    fn check_decode(packet: &str, expect: Expect) {
        let msg = parse_hex(packet);
        let header = parse_header(&msg).unwrap();

        let mut sink = FormatSink::default();
        let dir = if header.is_response() { "response" } else { "query" };
        let aa = if header.is_authority() { ", AA" } else { "" };
        writeln!(sink.out, "{} (id={}{})", dir, header.id(), aa).unwrap();
        parse_message(&msg, None, &mut sink);

        expect.assert_eq(&sink.out);
    }

    #[test]
    fn decode_discovery_query() {
        check_decode(
            "303900000001000000000000095f7365727669636573075f646e732d7364045f756470056c6f63616c00000c0001",
            expect![[r#"
                query (id=12345)
                Q: _services._dns-sd._udp.local	IN	PTR
            "#]],
        );
    }

    #[test]
    fn decode_discovery_response() {
        check_decode(
            "303984000001000100000000095f7365727669636573075f646e732d7364045f756470056c6f63616c00000c0001c00c000c00010000000a000e065f6361636865045f746370c023",
            expect![[r#"
                response (id=12345, AA)
                Q: _services._dns-sd._udp.local	IN	PTR
                ANS: _services._dns-sd._udp.local	10	IN	PTR	_cache._tcp.local
            "#]],
        );
    }

    #[test]
    fn runt_message_delivers_nothing() {
        struct Panicker;
        impl RecordSink for Panicker {
            fn on_record(&mut self, _: &RecordEvent<'_>) -> ControlFlow<()> {
                panic!("no record should be delivered");
            }
        }
        assert_eq!(parse_message(&[0; 11], None, &mut Panicker), 0);
    }

    #[test]
    fn overlong_section_count_stops_cleanly() {
        // Header claims five answers; the buffer holds one.
        let mut msg = parse_hex("000084000000000500000000");
        msg.extend_from_slice(&[1, b'a', 0]); // name "a."
        msg.extend_from_slice(&[0, 1, 0, 1]); // type A, class IN
        msg.extend_from_slice(&[0, 0, 0, 60]); // ttl
        msg.extend_from_slice(&[0, 4, 192, 168, 0, 1]); // rdlength + rdata

        let mut seen = 0;
        let mut sink = |r: &RecordEvent<'_>| {
            assert_eq!(r.a(), Some(Ipv4Addr::new(192, 168, 0, 1)));
            assert!(r.rdata_offset() + r.rdata().len() <= msg.len());
            seen += 1;
            ControlFlow::Continue(())
        };
        assert_eq!(parse_message(&msg, None, &mut sink), 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn oversized_rdata_is_not_delivered() {
        let mut msg = parse_hex("000084000000000100000000");
        msg.extend_from_slice(&[1, b'a', 0]);
        msg.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 60]);
        msg.extend_from_slice(&[0, 200, 1, 2, 3]); // rdlength 200, 3 bytes present

        let mut sink = |_: &RecordEvent<'_>| -> ControlFlow<()> {
            panic!("truncated record must not be delivered");
        };
        assert_eq!(parse_message(&msg, None, &mut sink), 0);
    }

    #[test]
    fn class_top_bit_is_stripped() {
        // One question and one answer, both with bit 15 set in the class field.
        let mut msg = parse_hex("000000000001000100000000");
        msg.extend_from_slice(&[1, b'a', 0, 0, 12, 0x80, 1]);
        msg.extend_from_slice(&[1, b'a', 0, 0, 1, 0x80, 1, 0, 0, 0, 60, 0, 4, 1, 2, 3, 4]);

        struct Sink {
            questions: usize,
            records: usize,
        }
        impl RecordSink for Sink {
            fn on_question(&mut self, q: &QuestionEvent<'_>) -> ControlFlow<()> {
                assert_eq!(q.class(), Class::IN);
                assert!(q.unicast_requested());
                self.questions += 1;
                ControlFlow::Continue(())
            }
            fn on_record(&mut self, r: &RecordEvent<'_>) -> ControlFlow<()> {
                assert_eq!(r.class(), Class::IN);
                assert!(r.cache_flush());
                self.records += 1;
                ControlFlow::Continue(())
            }
        }
        let mut sink = Sink {
            questions: 0,
            records: 0,
        };
        assert_eq!(parse_message(&msg, None, &mut sink), 2);
        assert_eq!((sink.questions, sink.records), (1, 1));
    }

    #[test]
    fn filter_narrows_to_one_type() {
        // An A answer followed by an AAAA answer.
        let mut msg = parse_hex("000084000000000200000000");
        msg.extend_from_slice(&[1, b'a', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 1, 2, 3, 4]);
        msg.extend_from_slice(&[1, b'a', 0, 0, 28, 0, 1, 0, 0, 0, 60, 0, 16]);
        msg.extend_from_slice(&[0; 16]);

        let mut types = Vec::new();
        let mut sink = |r: &RecordEvent<'_>| {
            types.push(r.rtype());
            ControlFlow::Continue(())
        };
        assert_eq!(parse_message(&msg, Some(RecordType::AAAA), &mut sink), 1);
        assert_eq!(types, [RecordType::AAAA]);
    }

    #[test]
    fn break_aborts_iteration() {
        let mut msg = parse_hex("000084000000000200000000");
        msg.extend_from_slice(&[1, b'a', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 1, 2, 3, 4]);
        msg.extend_from_slice(&[1, b'b', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 5, 6, 7, 8]);

        let mut seen = 0;
        let mut sink = |_: &RecordEvent<'_>| {
            seen += 1;
            ControlFlow::Break(())
        };
        assert_eq!(parse_message(&msg, None, &mut sink), 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn malformed_name_does_not_derail_later_records() {
        // First answer's name has a reserved length prefix; its A rdata still parses and
        // the second answer is reached.
        let mut msg = parse_hex("000084000000000200000000");
        msg.extend_from_slice(&[0x40]); // malformed name, skipped leniently
        msg.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 1, 2, 3, 4]);
        msg.extend_from_slice(&[1, b'b', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 5, 6, 7, 8]);

        let mut names = Vec::new();
        let mut sink = |r: &RecordEvent<'_>| {
            let mut scratch = [0; 64];
            names.push(r.name(&mut scratch).to_vec());
            ControlFlow::Continue(())
        };
        assert_eq!(parse_message(&msg, None, &mut sink), 2);
        assert_eq!(names, [b"".to_vec(), b"b".to_vec()]);
    }
}
