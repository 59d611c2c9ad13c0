//! # Routing Wire Format
//!
//! ## Purpose
//!
//! This module encodes the route-dump request and decodes the kernel's reply
//! byte by byte. The reply is a stream of self-describing records: a 16-byte
//! envelope (length, type, flags, sequence number, port id) frames each
//! message, and a route message starts with a fixed 12-byte descriptor
//! followed by length-prefixed attribute records padded to a 4-byte boundary.
//!
//! ## How it works
//!
//! All fields are read from explicit byte offsets with `from_ne_bytes`; the
//! wire format is host-endian and nothing here casts a buffer into a struct.
//! Every cursor advance is bounded by the declared length of the enclosing
//! record, so a lying length field ends iteration instead of reading out of
//! bounds.
//!
//! ## Main components
//!
//! - `RouteRequest`: Builds the get-route dump request.
//! - `MsgHeader` and `Messages`: Envelope decoding and message framing.
//! - `RouteMsg` and `Attrs`: Route descriptor fields and attribute walking.

use std::net::Ipv4Addr;

/// Byte length of the fixed message envelope.
pub const NLMSG_HDR_LEN: usize = 16;
/// Byte length of the fixed route descriptor behind the envelope.
pub const RTM_MSG_LEN: usize = 12;
/// Byte length of an attribute record header.
pub const RTA_HDR_LEN: usize = 4;
/// Byte length of an encoded route-dump request.
pub const ROUTE_REQUEST_LEN: usize = NLMSG_HDR_LEN + RTM_MSG_LEN;

/// Rounds a record length up to the 4-byte wire alignment.
pub const fn align_to_4(len: usize) -> usize {
    (len + 3) & !3
}

/// The fixed envelope prefixing every message, in host byte order.
#[derive(Clone, Copy, Debug)]
pub struct MsgHeader {
    /// Total message length, the envelope included.
    pub len: u32,
    /// Message type.
    pub kind: u16,
    /// Envelope flags.
    pub flags: u16,
    /// Sequence number echoed from the request.
    pub seq: u32,
    /// Port id of the requesting socket.
    pub pid: u32,
}

impl MsgHeader {
    /// Decodes one envelope from the start of `buf`, or `None` when fewer
    /// than [`NLMSG_HDR_LEN`] bytes are available.
    pub fn parse(buf: &[u8]) -> Option<MsgHeader> {
        if buf.len() < NLMSG_HDR_LEN {
            return None;
        }
        Some(MsgHeader {
            len: u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]),
            kind: u16::from_ne_bytes([buf[4], buf[5]]),
            flags: u16::from_ne_bytes([buf[6], buf[7]]),
            seq: u32::from_ne_bytes([buf[8], buf[9], buf[10], buf[11]]),
            pid: u32::from_ne_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}

/// Parameters of a route-dump request.
#[derive(Clone, Copy, Debug)]
pub struct RouteRequest {
    pub seq: u32,
    pub pid: u32,
}

impl RouteRequest {
    /// Encodes the request: a get-route envelope with the dump flags set,
    /// followed by a zeroed route descriptor, which asks for the routes of
    /// every family and table.
    pub fn encode(&self) -> [u8; ROUTE_REQUEST_LEN] {
        let mut buf = [0u8; ROUTE_REQUEST_LEN];
        buf[0..4].copy_from_slice(&(ROUTE_REQUEST_LEN as u32).to_ne_bytes());
        buf[4..6].copy_from_slice(&libc::RTM_GETROUTE.to_ne_bytes());
        buf[6..8]
            .copy_from_slice(&((libc::NLM_F_REQUEST | libc::NLM_F_DUMP) as u16).to_ne_bytes());
        buf[8..12].copy_from_slice(&self.seq.to_ne_bytes());
        buf[12..16].copy_from_slice(&self.pid.to_ne_bytes());
        buf
    }
}

/// One complete message: its envelope and the payload the envelope frames.
#[derive(Clone, Copy, Debug)]
pub struct Message<'a> {
    pub header: MsgHeader,
    pub payload: &'a [u8],
}

/// Iterator over the envelope-framed messages of a dump buffer.
///
/// Iteration ends at the first envelope whose declared length underruns the
/// envelope itself or overruns the remaining buffer.
pub struct Messages<'a> {
    buf: &'a [u8],
}

impl<'a> Messages<'a> {
    pub fn new(buf: &'a [u8]) -> Messages<'a> {
        Messages { buf }
    }
}

impl<'a> Iterator for Messages<'a> {
    type Item = Message<'a>;

    fn next(&mut self) -> Option<Message<'a>> {
        let header = MsgHeader::parse(self.buf)?;
        let total = header.len as usize;
        if total < NLMSG_HDR_LEN || total > self.buf.len() {
            self.buf = &[];
            return None;
        }
        let payload = &self.buf[NLMSG_HDR_LEN..total];
        // The final message may omit its alignment padding.
        let advance = align_to_4(total).min(self.buf.len());
        self.buf = &self.buf[advance..];
        Some(Message { header, payload })
    }
}

/// A route message payload: the fixed descriptor plus its attribute records.
///
/// Only the address family and the routing-table id are consumed here; the
/// other descriptor fields are carried through untouched.
#[derive(Clone, Copy, Debug)]
pub struct RouteMsg<'a> {
    payload: &'a [u8],
}

impl<'a> RouteMsg<'a> {
    /// Wraps a route message payload, or `None` when it is too short to hold
    /// the descriptor.
    pub fn parse(payload: &'a [u8]) -> Option<RouteMsg<'a>> {
        if payload.len() < RTM_MSG_LEN {
            return None;
        }
        Some(RouteMsg { payload })
    }

    /// Address family of the route.
    pub fn family(&self) -> u8 {
        self.payload[0]
    }

    /// Routing table the route belongs to.
    pub fn table(&self) -> u8 {
        self.payload[4]
    }

    /// Iterates the attribute records following the descriptor.
    pub fn attrs(&self) -> Attrs<'a> {
        Attrs::new(&self.payload[RTM_MSG_LEN..])
    }
}

/// One attribute record: a type tag and its raw payload.
#[derive(Clone, Copy, Debug)]
pub struct Attr<'a> {
    pub kind: u16,
    pub payload: &'a [u8],
}

impl<'a> Attr<'a> {
    /// The payload as an IPv4 address, or `None` unless it is exactly four
    /// bytes long.
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        match *self.payload {
            [a, b, c, d] => Some(Ipv4Addr::new(a, b, c, d)),
            _ => None,
        }
    }

    /// The payload as a host-order `u32`, or `None` unless it is exactly
    /// four bytes long.
    pub fn as_u32(&self) -> Option<u32> {
        match *self.payload {
            [a, b, c, d] => Some(u32::from_ne_bytes([a, b, c, d])),
            _ => None,
        }
    }
}

/// Iterator over attribute records.
///
/// Iteration ends at the first record whose declared length underruns its
/// own header or overruns the remaining payload. Record lengths exclude the
/// alignment padding, so the cursor advances by the padded length.
pub struct Attrs<'a> {
    buf: &'a [u8],
}

impl<'a> Attrs<'a> {
    pub fn new(buf: &'a [u8]) -> Attrs<'a> {
        Attrs { buf }
    }
}

impl<'a> Iterator for Attrs<'a> {
    type Item = Attr<'a>;

    fn next(&mut self) -> Option<Attr<'a>> {
        if self.buf.len() < RTA_HDR_LEN {
            return None;
        }
        let len = u16::from_ne_bytes([self.buf[0], self.buf[1]]) as usize;
        let kind = u16::from_ne_bytes([self.buf[2], self.buf[3]]);
        if len < RTA_HDR_LEN || len > self.buf.len() {
            self.buf = &[];
            return None;
        }
        let payload = &self.buf[RTA_HDR_LEN..len];
        let advance = align_to_4(len).min(self.buf.len());
        self.buf = &self.buf[advance..];
        Some(Attr { kind, payload })
    }
}

/// Builds one envelope-framed message, padded to the wire alignment.
#[cfg(test)]
pub(crate) fn envelope(kind: u16, flags: u16, seq: u32, pid: u32, payload: &[u8]) -> Vec<u8> {
    let total = NLMSG_HDR_LEN + payload.len();
    let mut buf = Vec::with_capacity(align_to_4(total));
    buf.extend_from_slice(&(total as u32).to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(&flags.to_ne_bytes());
    buf.extend_from_slice(&seq.to_ne_bytes());
    buf.extend_from_slice(&pid.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf.resize(align_to_4(total), 0);
    buf
}

/// Builds one attribute record, padded to the wire alignment.
#[cfg(test)]
pub(crate) fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
    let total = RTA_HDR_LEN + payload.len();
    let mut buf = Vec::with_capacity(align_to_4(total));
    buf.extend_from_slice(&(total as u16).to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf.resize(align_to_4(total), 0);
    buf
}

/// Builds a route message payload: a descriptor with the given family and
/// table, followed by the concatenated attribute records.
#[cfg(test)]
pub(crate) fn route_payload(family: u8, table: u8, attrs: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = vec![0u8; RTM_MSG_LEN];
    buf[0] = family;
    buf[4] = table;
    for a in attrs {
        buf.extend_from_slice(a);
    }
    buf
}

//
// ================================================================================================
//   UNITTESTS
// ================================================================================================
//
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout_is_bit_exact() {
        let encoded = RouteRequest { seq: 7, pid: 4242 }.encode();
        assert_eq!(encoded.len(), 28);
        assert_eq!(u32::from_ne_bytes(encoded[0..4].try_into().unwrap()), 28);
        assert_eq!(
            u16::from_ne_bytes(encoded[4..6].try_into().unwrap()),
            libc::RTM_GETROUTE
        );
        assert_eq!(
            u16::from_ne_bytes(encoded[6..8].try_into().unwrap()),
            (libc::NLM_F_REQUEST | libc::NLM_F_DUMP) as u16
        );
        assert_eq!(u32::from_ne_bytes(encoded[8..12].try_into().unwrap()), 7);
        assert_eq!(u32::from_ne_bytes(encoded[12..16].try_into().unwrap()), 4242);
        // The route descriptor stays zeroed: any family, any table.
        assert!(encoded[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn header_round_trips_through_parse() {
        let buf = envelope(24, 2, 9, 1234, &[0u8; 12]);
        let header = MsgHeader::parse(&buf).unwrap();
        assert_eq!(header.len, 28);
        assert_eq!(header.kind, 24);
        assert_eq!(header.flags, 2);
        assert_eq!(header.seq, 9);
        assert_eq!(header.pid, 1234);
    }

    #[test]
    fn short_buffer_has_no_header() {
        assert!(MsgHeader::parse(&[0u8; 15]).is_none());
        assert!(MsgHeader::parse(&[]).is_none());
    }

    #[test]
    fn messages_walk_aligned_records() {
        let mut buf = envelope(100, 0, 0, 0, &[1u8; 13]); // 29 bytes, padded to 32
        buf.extend_from_slice(&envelope(101, 0, 0, 0, &[2u8; 4]));
        let msgs: Vec<_> = Messages::new(&buf).collect();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].header.kind, 100);
        assert_eq!(msgs[0].payload, &[1u8; 13]);
        assert_eq!(msgs[1].header.kind, 101);
        assert_eq!(msgs[1].payload, &[2u8; 4]);
    }

    #[test]
    fn lying_length_ends_message_iteration() {
        let good = envelope(100, 0, 0, 0, &[0u8; 4]);
        let mut buf = good.clone();
        buf.extend_from_slice(&good);
        // Second envelope claims more bytes than the buffer holds.
        let at = good.len();
        buf[at..at + 4].copy_from_slice(&200u32.to_ne_bytes());
        let msgs: Vec<_> = Messages::new(&buf).collect();
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn undersized_length_ends_message_iteration() {
        let mut buf = envelope(100, 0, 0, 0, &[0u8; 4]);
        buf[0..4].copy_from_slice(&8u32.to_ne_bytes()); // below the envelope size
        assert_eq!(Messages::new(&buf).count(), 0);
    }

    #[test]
    fn route_descriptor_fields() {
        let payload = route_payload(2, 254, &[]);
        let route = RouteMsg::parse(&payload).unwrap();
        assert_eq!(route.family(), 2);
        assert_eq!(route.table(), 254);
        assert_eq!(route.attrs().count(), 0);
        assert!(RouteMsg::parse(&payload[..RTM_MSG_LEN - 1]).is_none());
    }

    #[test]
    fn attrs_walk_padded_records() {
        let mut buf = attr(1, &[9]); // 5 bytes, padded to 8
        buf.extend_from_slice(&attr(5, &[192, 168, 0, 1]));
        let attrs: Vec<_> = Attrs::new(&buf).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].kind, 1);
        assert_eq!(attrs[0].payload, &[9]);
        assert_eq!(attrs[1].kind, 5);
        assert_eq!(attrs[1].as_ipv4(), Some(Ipv4Addr::new(192, 168, 0, 1)));
    }

    #[test]
    fn attr_length_underrun_ends_iteration() {
        let mut buf = attr(1, &[1, 2, 3, 4]);
        buf[0..2].copy_from_slice(&2u16.to_ne_bytes()); // below its own header
        assert_eq!(Attrs::new(&buf).count(), 0);
    }

    #[test]
    fn attr_length_overrun_ends_iteration() {
        let first = attr(1, &[1, 2, 3, 4]);
        let mut buf = first.clone();
        buf.extend_from_slice(&attr(2, &[5, 6, 7, 8]));
        let at = first.len();
        buf[at..at + 2].copy_from_slice(&64u16.to_ne_bytes());
        let attrs: Vec<_> = Attrs::new(&buf).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].kind, 1);
    }

    #[test]
    fn ipv4_payloads_must_be_four_bytes() {
        let short = attr(5, &[10, 0, 0]);
        let attrs: Vec<_> = Attrs::new(&short).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].as_ipv4(), None);
        assert_eq!(attrs[0].as_u32(), None);
    }
}
