// Public modules and re-exports
pub mod endian;
pub mod hostname;
pub mod resolver;
pub mod route;

pub use endian::{
    host_to_little_endian, host_to_network, is_big_endian, little_endian_to_host, network_to_host,
};
pub use hostname::{domain_from_fqdn, domain_name, fqdn, hostname, hostname_from_fqdn};
pub use resolver::nameservers;
pub use route::{RouteError, RouteSocket, default_route, find_gateway, read_dump};
