//! DNS-SD operations: the four fixed message shapes of RFC 6763.
//!
//! Each operation is a thin composition over the wire codec with preset flags and record
//! layouts. [`discovery`] covers browsing for service types; [`query`] covers resolving
//! instances of one service. The operations keep no state between calls; the one piece of
//! state the protocol wants (filtering a receive pass by the last query sent) lives in the
//! explicit [`query::QuerySocket`] wrapper.

use std::io;
use std::net::SocketAddr;

use crate::packet::decoder::{parse_message, RecordSink};
use crate::transport::Transport;

pub mod discovery;
pub mod query;

/// The meta-query name every DNS-SD responder answers (RFC 6763 section 9).
pub const DISCOVERY_NAME: &[u8] = b"_services._dns-sd._udp.local.";

/// TTL for emitted service records (PTR, SRV, TXT), in seconds. Kept short so stale
/// instances age out of peers quickly.
pub const SERVICE_TTL: u32 = 10;

/// TTL for emitted host records (A, AAAA), in seconds.
pub const HOST_TTL: u32 = 60;

/// Receives one datagram on a responder socket and delivers its entries to `sink`.
///
/// Inbound questions arrive through [`RecordSink::on_question`]; a responder answers them
/// with [`discovery::answer`] and [`query::answer`] directed at the returned source
/// address. Returns the number of entries delivered along with that address.
pub fn listen<T: Transport, S: RecordSink>(
    transport: &T,
    buf: &mut [u8],
    sink: &mut S,
) -> io::Result<(usize, SocketAddr)> {
    let (len, from) = transport.recv_from(buf)?;
    log::trace!("raw recv from {}: {:02x?}", from, &buf[..len]);
    Ok((parse_message(&buf[..len], None, sink), from))
}
