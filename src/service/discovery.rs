//! Service-type discovery: the DNS-SD meta-query and its answer.

use std::io;
use std::net::SocketAddr;

use crate::packet::decoder::{parse_message, RecordSink};
use crate::packet::encoder::Writer;
use crate::packet::error::Error;
use crate::packet::{Class, Header, RecordType};
use crate::service::{DISCOVERY_NAME, SERVICE_TTL};
use crate::transport::Transport;

/// Encodes the discovery query into `buf` and returns its length.
///
/// The frame is a standard query (flags 0, id 0) with a single PTR IN question for
/// `_services._dns-sd._udp.local.`.
pub fn encode_query(buf: &mut [u8]) -> Result<usize, Error> {
    let mut header = Header::default();
    header.set_question_count(1);

    let mut w = Writer::new(buf);
    w.write_header(&header);
    w.write_name(DISCOVERY_NAME)?;
    w.write_u16(RecordType::PTR.0);
    w.write_u16(Class::IN.0);
    w.finish()
}

/// Sends the discovery query to the multicast group.
pub fn send<T: Transport>(transport: &T, buf: &mut [u8]) -> io::Result<()> {
    let len = encode_query(buf)?;
    log::trace!("discovery query: {:02x?}", &buf[..len]);
    transport.send_to(&buf[..len], transport.multicast_dest())
}

/// Receives one datagram and delivers its entries to `sink`.
///
/// Responders answer the discovery query with PTR records naming their service types;
/// collect those from [`RecordSink::on_record`]. Returns the number of entries delivered
/// and the source address.
pub fn recv<T: Transport, S: RecordSink>(
    transport: &T,
    buf: &mut [u8],
    sink: &mut S,
) -> io::Result<(usize, SocketAddr)> {
    let (len, from) = transport.recv_from(buf)?;
    log::trace!("raw recv from {}: {:02x?}", from, &buf[..len]);
    Ok((parse_message(&buf[..len], None, sink), from))
}

/// Encodes a discovery answer advertising `service` into `buf` and returns its length.
///
/// The frame is an authoritative response carrying one PTR answer that maps the discovery
/// name to the offered service type. The transaction ID is 0, as RFC 6762 section 18.1
/// requires for multicast responses.
pub fn encode_answer(buf: &mut [u8], service: &[u8]) -> Result<usize, Error> {
    let mut header = Header::default();
    header.set_response(true);
    header.set_authority(true);
    header.set_answer_count(1);

    let mut w = Writer::new(buf);
    w.write_header(&header);
    w.write_name(DISCOVERY_NAME)?;
    w.write_u16(RecordType::PTR.0);
    w.write_u16(Class::IN.0);
    w.write_u32(SERVICE_TTL);
    let len_at = w.pos();
    w.write_u16(0);
    let rdata_start = w.pos();
    w.write_name(service)?;
    w.write_u16_at(len_at, (w.pos() - rdata_start) as u16);
    w.finish()
}

/// Sends a discovery answer for `service` to `dest`, the sender of a discovery query.
pub fn answer<T: Transport>(
    transport: &T,
    dest: SocketAddr,
    buf: &mut [u8],
    service: &[u8],
) -> io::Result<()> {
    let len = encode_answer(buf, service)?;
    log::trace!("discovery answer to {}: {:02x?}", dest, &buf[..len]);
    transport.send_to(&buf[..len], dest)
}
