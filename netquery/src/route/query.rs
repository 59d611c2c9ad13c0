//! # Default Route Query
//!
//! ## Purpose
//!
//! One-shot, synchronous discovery of the host's default IPv4 gateway: send
//! a route-dump request, collect the reply, and scan it for the first
//! main-table IPv4 route that names a gateway.
//!
//! ## How it works
//!
//! A `NETLINK_ROUTE` socket is opened and bound for the duration of one
//! query; the dump request carries sequence number 0 and this process id,
//! and the reply is collected into a fixed 8192-byte buffer. The scan keeps
//! a gateway candidate local to each record and stops at the first hit. A
//! dump with main-table routes but no gateway yields the all-zeros address,
//! keeping "no default configured" apart from "no routes at all", which is
//! an error.

use crate::route::reader::{RouteError, RouteSocket as _, read_dump};
use crate::route::wire::{Messages, RouteMsg, RouteRequest};
use netlink_sys::{Socket, SocketAddr};
use std::io;
use std::net::Ipv4Addr;

/// Capacity of the dump buffer, calibrated for a full main-table dump.
pub const DUMP_BUF_LEN: usize = 8192;

/// Returns the gateway of the host's default IPv4 route.
///
/// The all-zeros address means the main table holds routes but none of them
/// names a gateway.
pub fn default_route() -> Result<Ipv4Addr, RouteError> {
    log::debug!("querying the default route");
    let mut socket = Socket::new(netlink_sys::constants::NETLINK_ROUTE).map_err(|err| {
        log::warn!("could not open the routing socket: {}", err);
        RouteError::Io(err)
    })?;
    socket.bind(&SocketAddr::new(0, 0)).map_err(|err| {
        log::warn!("could not bind the routing socket: {}", err);
        RouteError::Io(err)
    })?;

    let request = RouteRequest {
        seq: 0,
        pid: std::process::id(),
    };
    let encoded = request.encode();
    let sent = socket.send_request(&encoded).map_err(|err| {
        log::warn!("could not send the dump request: {}", err);
        RouteError::Io(err)
    })?;
    if sent != encoded.len() {
        log::warn!("dump request truncated by the socket layer");
        return Err(RouteError::Io(io::Error::other("Failed to send request")));
    }

    let mut buf = [0u8; DUMP_BUF_LEN];
    let len = read_dump(&socket, &mut buf, request.seq, request.pid)?;
    find_gateway(&buf[..len])
}

/// Scans a dump buffer for the first main-table IPv4 route that names a
/// gateway.
pub fn find_gateway(buf: &[u8]) -> Result<Ipv4Addr, RouteError> {
    let mut route_count = 0usize;

    for msg in Messages::new(buf) {
        if msg.header.kind != libc::RTM_NEWROUTE {
            continue;
        }
        let route = match RouteMsg::parse(msg.payload) {
            Some(route) => route,
            None => continue,
        };
        if route.family() != libc::AF_INET as u8 || route.table() != libc::RT_TABLE_MAIN {
            continue;
        }
        route_count += 1;

        // Candidate local to this record, first hit wins overall.
        let mut gateway = None;
        for attr in route.attrs() {
            match attr.kind {
                libc::RTA_GATEWAY => {
                    gateway = attr.as_ipv4();
                    if gateway.is_some() {
                        break;
                    }
                }
                libc::RTA_DST => {
                    log::trace!("route destination {:?}", attr.as_ipv4());
                }
                libc::RTA_OIF => {
                    log::trace!("route output interface {:?}", attr.as_u32());
                }
                _ => {}
            }
        }
        if let Some(addr) = gateway {
            log::debug!("default route via {}", addr);
            return Ok(addr);
        }
    }

    if route_count > 0 {
        log::warn!(
            "no gateway among {} main-table routes, falling back to the all-zeros address",
            route_count
        );
        return Ok(Ipv4Addr::UNSPECIFIED);
    }
    log::warn!("route dump contains no main-table IPv4 routes");
    Err(RouteError::NoRoute)
}

//
// ================================================================================================
//   UNITTESTS
// ================================================================================================
//
#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::wire::{attr, envelope, route_payload};

    const AF_INET: u8 = libc::AF_INET as u8;
    const MAIN: u8 = libc::RT_TABLE_MAIN;

    fn route_msg(family: u8, table: u8, attrs: &[Vec<u8>]) -> Vec<u8> {
        envelope(
            libc::RTM_NEWROUTE,
            libc::NLM_F_MULTI as u16,
            0,
            0,
            &route_payload(family, table, attrs),
        )
    }

    #[test]
    fn gateway_of_a_main_table_route_is_found() {
        let buf = route_msg(
            AF_INET,
            MAIN,
            &[
                attr(libc::RTA_OIF, &2u32.to_ne_bytes()),
                attr(libc::RTA_GATEWAY, &[192, 168, 1, 254]),
            ],
        );
        assert_eq!(find_gateway(&buf).unwrap(), Ipv4Addr::new(192, 168, 1, 254));
    }

    #[test]
    fn routes_without_gateway_fall_back_to_zeros() {
        let buf = route_msg(
            AF_INET,
            MAIN,
            &[
                attr(libc::RTA_DST, &[10, 0, 0, 0]),
                attr(libc::RTA_OIF, &3u32.to_ne_bytes()),
            ],
        );
        assert_eq!(find_gateway(&buf).unwrap(), Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn empty_dump_is_a_hard_failure() {
        assert!(matches!(find_gateway(&[]), Err(RouteError::NoRoute)));
    }

    #[test]
    fn other_tables_families_and_kinds_are_skipped() {
        let mut buf = Vec::new();
        // A link record, an IPv6 route and a local-table route come first.
        buf.extend_from_slice(&envelope(16, 0, 0, 0, &[0u8; 16]));
        buf.extend_from_slice(&route_msg(
            libc::AF_INET6 as u8,
            MAIN,
            &[attr(libc::RTA_GATEWAY, &[1, 2, 3, 4])],
        ));
        buf.extend_from_slice(&route_msg(
            AF_INET,
            255,
            &[attr(libc::RTA_GATEWAY, &[5, 6, 7, 8])],
        ));
        buf.extend_from_slice(&route_msg(
            AF_INET,
            MAIN,
            &[attr(libc::RTA_GATEWAY, &[172, 16, 0, 1])],
        ));
        assert_eq!(find_gateway(&buf).unwrap(), Ipv4Addr::new(172, 16, 0, 1));
    }

    #[test]
    fn first_gateway_in_dump_order_wins() {
        let mut buf = route_msg(AF_INET, MAIN, &[attr(libc::RTA_GATEWAY, &[10, 0, 0, 1])]);
        buf.extend_from_slice(&route_msg(
            AF_INET,
            MAIN,
            &[attr(libc::RTA_GATEWAY, &[10, 0, 0, 2])],
        ));
        assert_eq!(find_gateway(&buf).unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn undersized_gateway_attr_is_not_a_gateway() {
        let mut buf = route_msg(AF_INET, MAIN, &[attr(libc::RTA_GATEWAY, &[1, 2])]);
        buf.extend_from_slice(&route_msg(
            AF_INET,
            MAIN,
            &[attr(libc::RTA_GATEWAY, &[10, 1, 1, 1])],
        ));
        assert_eq!(find_gateway(&buf).unwrap(), Ipv4Addr::new(10, 1, 1, 1));
    }

    #[test]
    fn short_route_payload_is_skipped() {
        let buf = envelope(libc::RTM_NEWROUTE, 0, 0, 0, &[0u8; 8]);
        assert!(matches!(find_gateway(&buf), Err(RouteError::NoRoute)));
    }
}
