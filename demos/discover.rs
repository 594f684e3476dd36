//! Browses the service types advertised on the local network.

use std::{io, ops::ControlFlow, time::Duration};

use lancast::packet::decoder::RecordEvent;
use lancast::packet::RecordType;
use lancast::service::discovery;
use lancast::transport::Ipv4Transport;
use lancast::MDNS_BUFFER_SIZE;

fn main() -> io::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let transport = Ipv4Transport::querier()?;
    transport
        .socket()
        .set_read_timeout(Some(Duration::from_millis(500)))?;

    let mut buf = [0; MDNS_BUFFER_SIZE];
    discovery::send(&transport, &mut buf)?;

    let mut services: Vec<String> = Vec::new();
    loop {
        let mut sink = |record: &RecordEvent<'_>| {
            if record.rtype() == RecordType::PTR {
                let mut scratch = [0; 256];
                let service = String::from_utf8_lossy(record.ptr(&mut scratch)).into_owned();
                if !service.is_empty() && !services.contains(&service) {
                    println!("{}", service);
                    services.push(service);
                }
            }
            ControlFlow::Continue(())
        };
        match discovery::recv(&transport, &mut buf, &mut sink) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                break;
            }
            Err(e) => return Err(e),
        }
    }

    println!();
    println!("discovered {} service type(s)", services.len());
    Ok(())
}
