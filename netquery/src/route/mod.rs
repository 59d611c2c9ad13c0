//! # Default IPv4 Route Discovery
//!
//! ## Purpose
//!
//! This module finds the gateway of the host's default IPv4 route by asking
//! the kernel for a dump of its routing tables over a raw `NETLINK_ROUTE`
//! socket and scanning the reply for the first main-table route that names a
//! gateway.
//!
//! ## How it works
//!
//! The wire format is decoded by hand: every message is framed by a fixed
//! 16-byte envelope carrying its own length, and route messages nest a list
//! of length-prefixed attribute records behind a fixed route descriptor. The
//! `wire` module does the bounds-checked framing and `reader` accumulates the
//! possibly multi-part dump response into one buffer; `query` drives the
//! request and applies the selection policy.
//!
//! ## Main components
//!
//! - `default_route()`: One-shot query for the default gateway.
//! - `read_dump()`: Collects a dump response from a [`RouteSocket`].
//! - `find_gateway()`: Pure scan of a collected dump buffer.
//! - `RouteError`: Everything that can go wrong, from socket failures to a
//!   dump with no routes at all.

pub mod query;
pub mod reader;
pub mod wire;

pub use query::{DUMP_BUF_LEN, default_route, find_gateway};
pub use reader::{RouteError, RouteSocket, read_dump};
