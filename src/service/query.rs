//! Service queries and the compressed service-answer frame.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::packet::decoder::{parse_message, RecordSink};
use crate::packet::encoder::Writer;
use crate::packet::error::Error;
use crate::packet::{Class, Header, RecordType};
use crate::service::{HOST_TTL, SERVICE_TTL};
use crate::transport::Transport;

/// Encodes a single-question query for `(name, rtype, IN)` into `buf`.
pub fn encode_query(
    buf: &mut [u8],
    id: u16,
    rtype: RecordType,
    name: &[u8],
) -> Result<usize, Error> {
    let mut header = Header::default();
    header.set_id(id);
    header.set_question_count(1);

    let mut w = Writer::new(buf);
    w.write_header(&header);
    w.write_name(name)?;
    w.write_u16(rtype.0);
    w.write_u16(Class::IN.0);
    w.finish()
}

/// Sends a query for `(name, rtype, IN)` to the multicast group.
///
/// This free function keeps no state; use [`QuerySocket`] when received records should be
/// narrowed to the most recently queried type.
pub fn send<T: Transport>(
    transport: &T,
    buf: &mut [u8],
    rtype: RecordType,
    name: &[u8],
    id: u16,
) -> io::Result<()> {
    let len = encode_query(buf, id, rtype, name)?;
    log::trace!("query: {:02x?}", &buf[..len]);
    transport.send_to(&buf[..len], transport.multicast_dest())
}

/// Receives one datagram and delivers its entries to `sink`, narrowed to records of type
/// `filter` when one is given.
pub fn recv<T: Transport, S: RecordSink>(
    transport: &T,
    buf: &mut [u8],
    filter: Option<RecordType>,
    sink: &mut S,
) -> io::Result<(usize, SocketAddr)> {
    let (len, from) = transport.recv_from(buf)?;
    log::trace!("raw recv from {}: {:02x?}", from, &buf[..len]);
    Ok((parse_message(&buf[..len], filter, sink), from))
}

/// Everything a service answer advertises about one instance.
///
/// `service` is the full service type (`_http._tcp.local.`); `instance` and `hostname`
/// are the leading labels of the instance name and host name. `txt` is raw TXT rdata, a
/// sequence of length-prefixed strings, and is omitted from the frame when empty, as are
/// the address records when unset.
pub struct ServiceAnswer<'a> {
    pub service: &'a [u8],
    pub instance: &'a [u8],
    pub hostname: &'a [u8],
    pub port: u16,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub txt: &'a [u8],
}

/// Encodes a service answer into `buf` and returns its length.
///
/// The frame bundles up to five records:
///
/// 1. Answer: PTR `<service>` to `<instance>.<service>`.
/// 2. Additional: SRV `<instance>.<service>` to `(0, 0, port, <hostname>.local.)`.
/// 3. Additional: A `<hostname>.local.`, if an IPv4 address is given.
/// 4. Additional: AAAA `<hostname>.local.`, if an IPv6 address is given.
/// 5. Additional: TXT `<instance>.<service>`, if `txt` is non-empty.
///
/// Names are compressed: the service name is written once in the PTR record, the
/// instance and host names are label-plus-pointer forms, and the A/AAAA/TXT owner names
/// are bare pointers.
pub fn encode_answer(
    buf: &mut [u8],
    id: u16,
    answer: &ServiceAnswer<'_>,
) -> Result<usize, Error> {
    let additional = 1
        + u16::from(answer.ipv4.is_some())
        + u16::from(answer.ipv6.is_some())
        + u16::from(!answer.txt.is_empty());

    let mut header = Header::default();
    header.set_id(id);
    header.set_response(true);
    header.set_authority(true);
    header.set_answer_count(1);
    header.set_additional_count(additional);

    let mut w = Writer::new(buf);
    w.write_header(&header);

    // PTR <service> -> <instance>.<service>. The final label of the service name (the
    // "local" suffix) doubles as the compression target for the host name below.
    let service_offset = w.pos();
    let local_offset = w.write_name(answer.service)?;
    w.write_u16(RecordType::PTR.0);
    w.write_u16(Class::IN.0);
    w.write_u32(SERVICE_TTL);
    let len_at = w.pos();
    w.write_u16(0);
    let instance_offset = w.pos();
    w.write_name_with_ref(answer.instance, service_offset as u16)?;
    w.write_u16_at(len_at, (w.pos() - instance_offset) as u16);

    // SRV <instance>.<service> -> <hostname>.local.
    w.write_name_ref(instance_offset as u16);
    w.write_u16(RecordType::SRV.0);
    w.write_u16(Class::IN.0);
    w.write_u32(SERVICE_TTL);
    let len_at = w.pos();
    w.write_u16(0);
    let rdata_start = w.pos();
    w.write_u16(0); // priority
    w.write_u16(0); // weight
    w.write_u16(answer.port);
    let hostname_offset = w.pos();
    w.write_name_with_ref(answer.hostname, local_offset as u16)?;
    w.write_u16_at(len_at, (w.pos() - rdata_start) as u16);

    if let Some(ipv4) = answer.ipv4 {
        w.write_name_ref(hostname_offset as u16);
        w.write_u16(RecordType::A.0);
        w.write_u16(Class::IN.0);
        w.write_u32(HOST_TTL);
        w.write_u16(4);
        w.write_slice(&ipv4.octets());
    }

    if let Some(ipv6) = answer.ipv6 {
        w.write_name_ref(hostname_offset as u16);
        w.write_u16(RecordType::AAAA.0);
        w.write_u16(Class::IN.0);
        w.write_u32(HOST_TTL);
        w.write_u16(16);
        w.write_slice(&ipv6.octets());
    }

    if !answer.txt.is_empty() {
        w.write_name_ref(instance_offset as u16);
        w.write_u16(RecordType::TXT.0);
        w.write_u16(Class::IN.0);
        w.write_u32(SERVICE_TTL);
        w.write_u16(answer.txt.len() as u16);
        w.write_slice(answer.txt);
    }

    w.finish()
}

/// Sends a service answer to `dest`, the sender of a service query, echoing its
/// transaction ID.
pub fn answer<T: Transport>(
    transport: &T,
    dest: SocketAddr,
    buf: &mut [u8],
    id: u16,
    answer: &ServiceAnswer<'_>,
) -> io::Result<()> {
    let len = encode_answer(buf, id, answer)?;
    log::trace!("service answer to {}: {:02x?}", dest, &buf[..len]);
    transport.send_to(&buf[..len], dest)
}

/// A transport paired with the type of the query most recently sent on it.
///
/// Receive passes through this wrapper only deliver records matching that type, which
/// demultiplexes responses when several queries have been issued on the same socket.
pub struct QuerySocket<T: Transport> {
    transport: T,
    last_type: Option<RecordType>,
    next_id: u16,
}

impl<T: Transport> QuerySocket<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last_type: None,
            next_id: 1,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a query for `(name, rtype, IN)` and returns the transaction ID it was
    /// assigned. Subsequent [`QuerySocket::recv`] calls only deliver records of `rtype`.
    pub fn send(&mut self, buf: &mut [u8], rtype: RecordType, name: &[u8]) -> io::Result<u16> {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        send(&self.transport, buf, rtype, name, id)?;
        self.last_type = Some(rtype);
        Ok(id)
    }

    /// Receives one datagram, delivering only records that match the last query sent.
    pub fn recv<S: RecordSink>(
        &self,
        buf: &mut [u8],
        sink: &mut S,
    ) -> io::Result<(usize, SocketAddr)> {
        recv(&self.transport, buf, self.last_type, sink)
    }
}
