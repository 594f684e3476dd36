//! Multicast DNS and DNS-Based Service Discovery, as specified by RFC 6762 and RFC 6763.
//!
//! The crate is built around a zero-allocation wire codec: every message is read from and
//! written into a caller-owned byte buffer, and decoded domain names are materialized into
//! caller-supplied scratch space. On top of the codec, [`service`] provides the four fixed
//! DNS-SD message shapes (discovery query/answer and service query/answer), and
//! [`transport`] provides multicast UDP sockets for both address families.
//!
//! The codec is hardened against untrusted network input: it never reads past the end of a
//! message, detects and rejects name-compression loops, and recovers from malformed names
//! by skipping them instead of aborting the whole message.

use std::net::{Ipv4Addr, Ipv6Addr};

mod num;
pub mod packet;
pub mod service;
pub mod transport;

pub use packet::error::Error;

/// The well-known mDNS port (RFC 6762 section 2).
pub const MDNS_PORT: u16 = 5353;

/// The link-local IPv4 multicast group mDNS operates on.
pub const MDNS_GROUP_V4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The link-local IPv6 multicast group mDNS operates on.
pub const MDNS_GROUP_V6: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

/// Size of mDNS message buffers.
///
/// mDNS works entirely within a local network, so messages are sized to fit a single
/// Ethernet frame rather than the 512-byte unicast DNS limit.
pub const MDNS_BUFFER_SIZE: usize = 1500;
