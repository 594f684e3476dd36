//! Multicast UDP transports for mDNS.
//!
//! The codec never touches sockets directly: everything network-facing goes through the
//! narrow [`Transport`] trait, which models an opaque datagram channel. The two provided
//! implementations cover the IPv4 and IPv6 mDNS groups; socket peculiarities (address
//! reuse, group membership, hop limits) stay behind their constructors.

use std::io;
use std::net::{
    Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, UdpSocket,
};

use socket2::{Domain, Protocol, Socket, Type};

use crate::{MDNS_GROUP_V4, MDNS_GROUP_V6, MDNS_PORT};

/// An opaque datagram channel the DNS-SD operations send and receive on.
pub trait Transport {
    fn send_to(&self, data: &[u8], dest: SocketAddr) -> io::Result<()>;

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// The multicast group and port queries are sent to.
    fn multicast_dest(&self) -> SocketAddr;
}

/// mDNS over the IPv4 group `224.0.0.251`.
pub struct Ipv4Transport {
    sock: UdpSocket,
}

impl Ipv4Transport {
    /// Opens a querier socket: bound to an ephemeral port, joined to the group so
    /// multicast responses are received, with outbound multicast TTL 1.
    pub fn querier() -> io::Result<Self> {
        let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        sock.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;
        sock.join_multicast_v4(&MDNS_GROUP_V4, &Ipv4Addr::UNSPECIFIED)?;
        sock.set_multicast_ttl_v4(1)?;
        Ok(Self { sock: sock.into() })
    }

    /// Opens a responder socket: bound to port 5353 with address reuse so it can coexist
    /// with other local responders, joined to the group, loopback enabled.
    pub fn responder() -> io::Result<Self> {
        let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        sock.set_reuse_address(true)?;
        sock.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, MDNS_PORT).into())?;
        sock.join_multicast_v4(&MDNS_GROUP_V4, &Ipv4Addr::UNSPECIFIED)?;
        sock.set_multicast_ttl_v4(1)?;
        sock.set_multicast_loop_v4(true)?;
        Ok(Self { sock: sock.into() })
    }

    /// The underlying socket, for read timeouts and similar configuration.
    pub fn socket(&self) -> &UdpSocket {
        &self.sock
    }
}

impl Transport for Ipv4Transport {
    fn send_to(&self, data: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.sock.send_to(data, dest).map(drop)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.sock.recv_from(buf)
    }

    fn multicast_dest(&self) -> SocketAddr {
        SocketAddrV4::new(MDNS_GROUP_V4, MDNS_PORT).into()
    }
}

/// mDNS over the IPv6 group `ff02::fb`.
pub struct Ipv6Transport {
    sock: UdpSocket,
}

impl Ipv6Transport {
    /// Opens a querier socket bound to an ephemeral port, with outbound hop limit 1.
    pub fn querier() -> io::Result<Self> {
        let sock = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        sock.set_only_v6(true)?;
        sock.bind(&SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0).into())?;
        sock.join_multicast_v6(&MDNS_GROUP_V6, 0)?;
        sock.set_multicast_hops_v6(1)?;
        Ok(Self { sock: sock.into() })
    }

    /// Opens a responder socket on port 5353, joined to the group.
    pub fn responder() -> io::Result<Self> {
        let sock = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        sock.set_only_v6(true)?;
        sock.set_reuse_address(true)?;
        sock.bind(&SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, MDNS_PORT, 0, 0).into())?;
        sock.join_multicast_v6(&MDNS_GROUP_V6, 0)?;
        sock.set_multicast_hops_v6(1)?;
        sock.set_multicast_loop_v6(true)?;
        Ok(Self { sock: sock.into() })
    }

    /// The underlying socket, for read timeouts and similar configuration.
    pub fn socket(&self) -> &UdpSocket {
        &self.sock
    }
}

impl Transport for Ipv6Transport {
    fn send_to(&self, data: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.sock.send_to(data, dest).map(drop)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.sock.recv_from(buf)
    }

    fn multicast_dest(&self) -> SocketAddr {
        SocketAddrV6::new(MDNS_GROUP_V6, MDNS_PORT, 0, 0).into()
    }
}
