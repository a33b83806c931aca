//! Geolocation Module
//!
//! IPv4 address to country resolution over a sorted range table.

mod index;
mod range;

pub use index::GeoRangeIndex;
pub use range::{parse_ipv4, IpRange};

/// Country returned when an address cannot be resolved.
pub const UNKNOWN_COUNTRY: &str = "Unknown";
