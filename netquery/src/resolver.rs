//! Enumeration of the system resolver's IPv4 nameservers, read from
//! `/etc/resolv.conf`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::Ipv4Addr;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Returns the configured IPv4 nameservers in configuration order.
///
/// Entries that are not IPv4 addresses are skipped; everything here is
/// IPv4-only end to end.
pub fn nameservers() -> io::Result<Vec<Ipv4Addr>> {
    log::debug!("reading nameservers from {}", RESOLV_CONF);
    let file = match File::open(RESOLV_CONF) {
        Ok(file) => file,
        Err(err) => {
            log::warn!("could not open {}: {}", RESOLV_CONF, err);
            return Err(err);
        }
    };
    parse_resolv_conf(BufReader::new(file))
}

/// Collects the addresses of `nameserver` lines. Comments, options and
/// unparseable addresses are ignored.
fn parse_resolv_conf<R: BufRead>(reader: R) -> io::Result<Vec<Ipv4Addr>> {
    let mut servers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("nameserver") {
            continue;
        }
        let address = match tokens.next() {
            Some(address) => address,
            None => continue,
        };
        match address.parse::<Ipv4Addr>() {
            Ok(addr) => {
                log::debug!("found nameserver {}", addr);
                servers.push(addr);
            }
            Err(_) => {
                log::debug!("skipping non-IPv4 nameserver {}", address);
            }
        }
    }
    Ok(servers)
}
