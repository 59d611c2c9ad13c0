//
// reader.rs - Dump Response Accumulation
//
// Purpose:
//   Collects one complete routing-dump response from a datagram socket into a
//   caller-supplied buffer, validating every envelope on the way.
//
// How it works:
//   - Datagrams are appended behind an explicit write cursor; capacity is
//     checked before every receive and a response that cannot fit is an
//     error, never a silent truncation.
//   - Every envelope in a received datagram is validated against the bytes
//     actually read, so a lying length field can never push a later read out
//     of bounds.
//   - Terminal markers end the read: an error report fails it with the
//     kernel's errno; the done marker, or a reply without the multipart
//     flag, completes it.
//   - Datagrams whose sequence number or port id do not match the request
//     are dropped and the read keeps waiting.
//
// Main components:
//   - RouteSocket: The two-method transport the reader drives.
//   - read_dump(): The accumulation loop.
//   - RouteError: Error type shared by the whole route query.
//

use crate::route::wire::{MsgHeader, NLMSG_HDR_LEN, align_to_4};
use std::io;

const MSG_ERROR: u16 = libc::NLMSG_ERROR as u16;
const MSG_DONE: u16 = libc::NLMSG_DONE as u16;
const FLAG_MULTI: u16 = libc::NLM_F_MULTI as u16;

/// Transport used by [`read_dump`]: one send of an encoded request, then
/// datagram-sized receives.
pub trait RouteSocket {
    /// Sends one encoded request, returning the number of bytes queued.
    fn send_request(&self, buf: &[u8]) -> io::Result<usize>;
    /// Receives one datagram into `buf`, returning its length. A datagram
    /// larger than `buf` arrives truncated, as usual for datagram sockets.
    fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<usize>;
}

impl RouteSocket for netlink_sys::Socket {
    fn send_request(&self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf, 0)
    }

    fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut chunk = buf;
        self.recv(&mut chunk, 0)
    }
}

/// Reads one complete dump response into `buf`, appending datagrams until
/// the done marker, a kernel error report, or a single non-multipart reply.
///
/// Only datagrams whose leading sequence number and port id match `seq` and
/// `pid` are kept; foreign traffic is dropped and the read continues.
/// Returns the number of accumulated bytes, which never includes the done
/// marker.
pub fn read_dump<S: RouteSocket>(
    socket: &S,
    buf: &mut [u8],
    seq: u32,
    pid: u32,
) -> Result<usize, RouteError> {
    let mut used = 0;

    loop {
        let remaining = buf.len() - used;
        if remaining < NLMSG_HDR_LEN {
            log::warn!("dump response does not fit into {} bytes", buf.len());
            return Err(RouteError::BufferFull);
        }
        let readlen = socket.recv_datagram(&mut buf[used..]).map_err(|err| {
            log::warn!("receive failed: {}", err);
            RouteError::Io(err)
        })?;
        let datagram = &buf[used..used + readlen];

        let first = match MsgHeader::parse(datagram) {
            Some(header) => header,
            None => {
                log::warn!("received {} bytes, not enough for an envelope", readlen);
                return Err(RouteError::Malformed("truncated envelope"));
            }
        };
        // Terminal reports end the read no matter who they are addressed to;
        // everything else that is uncorrelated is spurious traffic.
        if (first.seq != seq || first.pid != pid)
            && first.kind != MSG_DONE
            && first.kind != MSG_ERROR
        {
            log::trace!(
                "ignoring foreign datagram (seq {}, port id {})",
                first.seq,
                first.pid
            );
            continue;
        }

        // Walk every message in the datagram: recent kernels append the done
        // marker behind the last batch of records instead of sending it in a
        // datagram of its own.
        let mut offset = 0;
        while let Some(header) = MsgHeader::parse(&datagram[offset..]) {
            let total = header.len as usize;
            if total < NLMSG_HDR_LEN || total > readlen - offset {
                return Err(overrun(readlen == remaining, buf.len()));
            }
            if header.kind == MSG_ERROR {
                if total < NLMSG_HDR_LEN + 4 {
                    log::warn!("error report too short to carry an errno");
                    return Err(RouteError::Malformed("error report without errno"));
                }
                let at = offset + NLMSG_HDR_LEN;
                let errno = -i32::from_ne_bytes([
                    datagram[at],
                    datagram[at + 1],
                    datagram[at + 2],
                    datagram[at + 3],
                ]);
                log::warn!("kernel rejected the dump request: errno {}", errno);
                return Err(RouteError::Kernel(errno));
            }
            if header.kind == MSG_DONE {
                return Ok(used + offset);
            }
            offset = (offset + align_to_4(total)).min(readlen);
        }
        if offset < readlen {
            return Err(overrun(readlen == remaining, buf.len()));
        }

        used += readlen;
        if first.flags & FLAG_MULTI == 0 {
            return Ok(used);
        }
    }
}

/// A declared length pointing past the datagram either means the datagram
/// was cut down to the space we had left, or the envelope lies.
fn overrun(datagram_was_cut: bool, capacity: usize) -> RouteError {
    if datagram_was_cut {
        log::warn!("dump response does not fit into {} bytes", capacity);
        RouteError::BufferFull
    } else {
        log::warn!("envelope length exceeds the received datagram");
        RouteError::Malformed("envelope length exceeds datagram")
    }
}

/// Failures surfaced by the route dump query.
#[derive(Debug)]
pub enum RouteError {
    /// The response does not fit into the fixed dump buffer.
    BufferFull,
    /// An envelope failed structural validation.
    Malformed(&'static str),
    /// The kernel answered the dump with an error report carrying this errno.
    Kernel(i32),
    /// The dump completed without a single usable route record.
    NoRoute,
    /// Socket transport failure.
    Io(io::Error),
}
