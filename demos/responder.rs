//! Answers discovery and service queries for a single advertised instance.

use std::{io, net::IpAddr, ops::ControlFlow};

use lancast::packet::decoder::{QuestionEvent, RecordEvent, RecordSink};
use lancast::packet::RecordType;
use lancast::service::{self, discovery, query, DISCOVERY_NAME};
use lancast::transport::Ipv4Transport;
use lancast::MDNS_BUFFER_SIZE;

const SERVICE: &[u8] = b"_chat._tcp.local.";
const INSTANCE: &[u8] = b"rusty";
const HOSTNAME: &[u8] = b"rusty";
const PORT: u16 = 4000;

/// Collects the questions of one inbound message that this responder can answer.
#[derive(Default)]
struct Questions {
    discovery: bool,
    service: Option<u16>,
}

impl RecordSink for Questions {
    fn on_question(&mut self, q: &QuestionEvent<'_>) -> ControlFlow<()> {
        if q.qtype() != RecordType::PTR {
            return ControlFlow::Continue(());
        }
        if q.name_is(DISCOVERY_NAME) {
            self.discovery = true;
        } else if q.name_is(SERVICE) {
            self.service = Some(q.id());
        }
        ControlFlow::Continue(())
    }

    fn on_record(&mut self, _: &RecordEvent<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

fn main() -> io::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let addr = if_addrs::get_if_addrs()?
        .into_iter()
        .find_map(|interface| match interface.ip() {
            IpAddr::V4(ip) if ip.is_private() => Some(ip),
            _ => None,
        })
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no private IPv4 address")
        })?;

    let transport = Ipv4Transport::responder()?;
    log::info!(
        "advertising {} at {}:{}",
        String::from_utf8_lossy(SERVICE),
        addr,
        PORT,
    );

    let mut buf = [0; MDNS_BUFFER_SIZE];
    let mut out = [0; MDNS_BUFFER_SIZE];
    loop {
        let mut questions = Questions::default();
        let (_, from) = service::listen(&transport, &mut buf, &mut questions)?;

        if questions.discovery {
            discovery::answer(&transport, from, &mut out, SERVICE)?;
        }
        if let Some(id) = questions.service {
            let answer = query::ServiceAnswer {
                service: SERVICE,
                instance: INSTANCE,
                hostname: HOSTNAME,
                port: PORT,
                ipv4: Some(addr),
                ipv6: None,
                txt: b"",
            };
            query::answer(&transport, from, &mut out, id, &answer)?;
        }
    }
}
